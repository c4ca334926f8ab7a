use crate::adapter::{AdapterEvent, AdapterEventKind, AdapterFactory, ConnectivityState, LinkTag};
use crate::link::{LinkId, LinkPhase, NegotiationOutcome, NegotiationStep, PeerLink};
use crate::signaling::SignalingOutput;
use crate::viewer::{ViewerBehavior, ViewerCommand, ViewerHandle, ViewerSnapshot};
use castroom_core::{IceCandidate, ParticipantId};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const MAX_EARLY_CANDIDATES: usize = 64;

/// Viewer side actor: at most one link, to the host that offered last.
///
/// Offers are answered on the link's worker. A renegotiation offer from the
/// same host link reuses the existing adapter. Once a link is torn down,
/// offers from that host are refused until the viewer joins a room again.
pub struct ViewerSession {
    link: Option<PeerLink>,
    /// Host whose link was torn down most recently. Terminal until the next
    /// room join.
    closed_host: Option<ParticipantId>,
    early_candidates: VecDeque<(ParticipantId, IceCandidate)>,
    next_link_id: u64,

    command_rx: mpsc::Receiver<ViewerCommand>,

    adapter_rx: mpsc::Receiver<AdapterEvent>,
    adapter_tx: mpsc::Sender<AdapterEvent>,

    outcome_rx: mpsc::Receiver<NegotiationOutcome>,
    outcome_tx: mpsc::Sender<NegotiationOutcome>,

    factory: Arc<dyn AdapterFactory>,
    signaling: Box<dyn SignalingOutput>,
    behavior: Box<dyn ViewerBehavior>,
}

impl ViewerSession {
    pub fn new(
        command_rx: mpsc::Receiver<ViewerCommand>,
        factory: Arc<dyn AdapterFactory>,
        signaling: Box<dyn SignalingOutput>,
        behavior: Box<dyn ViewerBehavior>,
    ) -> Self {
        let (adapter_tx, adapter_rx) = mpsc::channel(256);
        let (outcome_tx, outcome_rx) = mpsc::channel(256);

        Self {
            link: None,
            closed_host: None,
            early_candidates: VecDeque::new(),
            next_link_id: 0,
            command_rx,
            adapter_rx,
            adapter_tx,
            outcome_rx,
            outcome_tx,
            factory,
            signaling,
            behavior,
        }
    }

    pub fn spawn(
        factory: Arc<dyn AdapterFactory>,
        signaling: Box<dyn SignalingOutput>,
        behavior: Box<dyn ViewerBehavior>,
    ) -> ViewerHandle {
        let (tx, rx) = mpsc::channel(100);
        let session = Self::new(rx, factory, signaling, behavior);
        tokio::spawn(session.run());
        ViewerHandle::new(tx)
    }

    pub async fn run(mut self) {
        info!("Viewer session started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Shutting down viewer session.");
                            break;
                        }
                    }
                }

                Some(evt) = self.adapter_rx.recv() => {
                    self.handle_adapter_event(evt).await;
                }

                Some(outcome) = self.outcome_rx.recv() => {
                    self.handle_outcome(outcome).await;
                }
            }
        }

        if let Some(link) = self.link.take() {
            link.close();
        }
        info!("Viewer session finished");
    }

    async fn handle_command(&mut self, cmd: ViewerCommand) {
        match cmd {
            ViewerCommand::OfferReceived {
                host_id,
                sdp,
                negotiation,
            } => self.on_offer_received(host_id, sdp, negotiation),
            ViewerCommand::RemoteIceCandidate { from, candidate } => {
                self.on_remote_ice_candidate(from, candidate)
            }
            ViewerCommand::HostLeft { host_id } => self.on_host_left(host_id).await,
            ViewerCommand::JoinedRoom => self.on_joined_room(),
            ViewerCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn on_offer_received(&mut self, host_id: ParticipantId, sdp: String, negotiation: Option<u64>) {
        match self.link.as_mut() {
            Some(link) if link.peer_id() == host_id && link.continues(negotiation) => {
                let generation = link.accept_offer(sdp, negotiation);
                info!("Renegotiation offer from {} at {}", host_id, generation);
                return;
            }
            Some(link) if link.peer_id() == host_id => {
                info!(
                    "Offer {:?} from {} starts a new link, releasing link {}",
                    negotiation,
                    host_id,
                    link.link_id()
                );
                self.release_link();
            }
            Some(link) => {
                info!("Offer from new host {}, releasing link to {}", host_id, link.peer_id());
                self.release_link();
            }
            None if self.closed_host == Some(host_id) => {
                debug!("Discarding offer from {}: link closed", host_id);
                return;
            }
            None => {}
        }

        self.next_link_id += 1;
        let tag = LinkTag {
            peer_id: host_id,
            link_id: LinkId(self.next_link_id),
        };

        let mut link = PeerLink::spawn(
            tag,
            Arc::clone(&self.factory),
            self.adapter_tx.clone(),
            self.outcome_tx.clone(),
        );
        let generation = link.accept_offer(sdp, negotiation);
        info!("Opened link {} to host {} at {}", tag.link_id, host_id, generation);

        for (from, candidate) in self.early_candidates.drain(..) {
            if from == host_id {
                link.add_remote_candidate(candidate);
            } else {
                debug!("Dropping early ICE candidate from {}", from);
            }
        }
        self.closed_host = None;
        self.link = Some(link);
    }

    fn on_remote_ice_candidate(&mut self, from: ParticipantId, candidate: IceCandidate) {
        match &self.link {
            Some(link) if link.peer_id() == from => link.add_remote_candidate(candidate),
            Some(link) => debug!(
                "Discarding ICE candidate from {}: linked to {}",
                from,
                link.peer_id()
            ),
            None if self.closed_host == Some(from) => {
                debug!("Discarding ICE candidate from {}: link closed", from)
            }
            None => {
                if self.early_candidates.len() >= MAX_EARLY_CANDIDATES {
                    warn!("Too many early ICE candidates, dropping one from {}", from);
                    return;
                }
                self.early_candidates.push_back((from, candidate));
            }
        }
    }

    async fn on_host_left(&mut self, host_id: Option<ParticipantId>) {
        self.early_candidates.clear();

        let Some(link) = &self.link else {
            debug!("Host left with no link open");
            return;
        };
        let linked_host = link.peer_id();
        if host_id.is_some_and(|id| id != linked_host) {
            debug!("Ignoring departure of {:?}, linked to {}", host_id, linked_host);
            return;
        }

        info!("Host {} left", linked_host);
        self.release_link();
        self.behavior.on_host_left(linked_host).await;
    }

    fn on_joined_room(&mut self) {
        if let Some(link) = self.link.take() {
            info!("Joined a room, dropping link to {}", link.peer_id());
            link.close();
        }
        self.closed_host = None;
        self.early_candidates.clear();
    }

    /// Terminal for the current link.
    fn release_link(&mut self) {
        if let Some(link) = self.link.take() {
            self.closed_host = Some(link.peer_id());
            link.close();
        }
    }

    fn live_link(&mut self, link_id: LinkId) -> Option<&mut PeerLink> {
        self.link.as_mut().filter(|link| link.link_id() == link_id)
    }

    async fn handle_adapter_event(&mut self, event: AdapterEvent) {
        let tag = event.tag;
        let Some(link) = self.live_link(tag.link_id) else {
            debug!("Dropping adapter event for stale link {}", tag.link_id);
            return;
        };

        match event.kind {
            AdapterEventKind::LocalCandidate(candidate) => {
                self.signaling.send_ice(tag.peer_id, candidate).await;
            }
            AdapterEventKind::Connectivity(state) => {
                if state.is_terminal() {
                    info!("Link to host {} reported {:?}", tag.peer_id, state);
                    self.release_link();
                    return;
                }
                if link.set_connectivity(state) {
                    info!("Connected to host {}", tag.peer_id);
                    self.behavior.on_connected(tag.peer_id).await;
                } else if state == ConnectivityState::Disconnected {
                    warn!("Link to host {} disconnected, waiting for recovery", tag.peer_id);
                }
            }
            AdapterEventKind::RemoteTrack(track) => {
                info!("Received {:?} track {} from {}", track.kind, track.track_id, tag.peer_id);
                self.behavior.on_remote_track(tag.peer_id, track).await;
            }
        }
    }

    async fn handle_outcome(&mut self, outcome: NegotiationOutcome) {
        let tag = outcome.tag;
        let Some(link) = self.live_link(tag.link_id) else {
            debug!("Discarding result for closed link {}", tag.link_id);
            return;
        };
        let current = link.is_current(tag.link_id, outcome.generation);

        match outcome.result {
            // Every answer the adapter produced goes out; the host matches it
            // against its outstanding offer by the negotiation tag.
            Ok(NegotiationStep::AnswerReady { sdp, negotiation }) => {
                link.answer_sent(outcome.generation);
                self.signaling.send_answer(tag.peer_id, sdp, negotiation).await;
                debug!("Sent answer {} to {}", outcome.generation, tag.peer_id);
            }
            Ok(step) => warn!("Unexpected {:?} on viewer link to {}", step, tag.peer_id),
            Err(e) if current || e.is_link_fatal() => {
                error!("Negotiation with host {} failed: {}", tag.peer_id, e);
                self.release_link();
            }
            Err(e) => debug!("Ignoring failure of superseded round {}: {}", outcome.generation, e),
        }
    }

    fn snapshot(&self) -> ViewerSnapshot {
        let queued_candidates = self.early_candidates.len();
        match &self.link {
            Some(link) => ViewerSnapshot {
                host_id: Some(link.peer_id()),
                phase: Some(link.phase()),
                link_id: Some(link.link_id()),
                generation: Some(link.generation()),
                queued_candidates,
            },
            None => ViewerSnapshot {
                host_id: self.closed_host,
                phase: self.closed_host.map(|_| LinkPhase::Closed),
                link_id: None,
                generation: None,
                queued_candidates,
            },
        }
    }
}
