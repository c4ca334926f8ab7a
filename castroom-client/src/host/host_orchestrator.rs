use crate::adapter::{AdapterEvent, AdapterEventKind, AdapterFactory, ConnectivityState, LinkTag};
use crate::host::{HostCommand, HostHandle, HostSnapshot, ViewerLinkSnapshot};
use crate::link::{
    LinkAction, LinkId, LinkPhase, NegotiationOutcome, NegotiationStep, PeerLink, compute_action,
};
use crate::media::MediaBundle;
use crate::signaling::SignalingOutput;
use castroom_core::{IceCandidate, ParticipantId};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Remote candidates kept per viewer while no link exists yet.
const MAX_EARLY_CANDIDATES: usize = 64;
/// Ids with early candidates queued. New ids beyond this are not tracked
/// until they are announced.
const MAX_EARLY_PEERS: usize = 64;

enum ViewerSlot {
    /// Known viewer, no link yet.
    Pending,
    Linked(PeerLink),
    /// The link was torn down. Late messages for this viewer are dropped.
    Closed,
}

impl ViewerSlot {
    fn phase(&self) -> LinkPhase {
        match self {
            ViewerSlot::Pending => LinkPhase::Pending,
            ViewerSlot::Linked(link) => link.phase(),
            ViewerSlot::Closed => LinkPhase::Closed,
        }
    }
}

/// Host side actor. Owns one [`PeerLink`] per viewer and decides, through
/// [`compute_action`], when each viewer gets an offer.
///
/// All state lives inside the actor task, so joins, leaves, media changes and
/// negotiation results are applied one at a time. Negotiation itself runs on
/// per-link workers and reports back as [`NegotiationOutcome`]s.
pub struct HostOrchestrator {
    viewers: HashMap<ParticipantId, ViewerSlot>,
    early_candidates: HashMap<ParticipantId, VecDeque<IceCandidate>>,
    media: Option<Arc<MediaBundle>>,
    next_link_id: u64,

    command_rx: mpsc::Receiver<HostCommand>,

    adapter_rx: mpsc::Receiver<AdapterEvent>,
    adapter_tx: mpsc::Sender<AdapterEvent>,

    outcome_rx: mpsc::Receiver<NegotiationOutcome>,
    outcome_tx: mpsc::Sender<NegotiationOutcome>,

    factory: Arc<dyn AdapterFactory>,
    signaling: Box<dyn SignalingOutput>,
}

impl HostOrchestrator {
    pub fn new(
        command_rx: mpsc::Receiver<HostCommand>,
        factory: Arc<dyn AdapterFactory>,
        signaling: Box<dyn SignalingOutput>,
    ) -> Self {
        let (adapter_tx, adapter_rx) = mpsc::channel(256);
        let (outcome_tx, outcome_rx) = mpsc::channel(256);

        Self {
            viewers: HashMap::new(),
            early_candidates: HashMap::new(),
            media: None,
            next_link_id: 0,
            command_rx,
            adapter_rx,
            adapter_tx,
            outcome_rx,
            outcome_tx,
            factory,
            signaling,
        }
    }

    /// Spawns the actor and returns its handle. The actor stops once every
    /// handle is dropped.
    pub fn spawn(factory: Arc<dyn AdapterFactory>, signaling: Box<dyn SignalingOutput>) -> HostHandle {
        let (tx, rx) = mpsc::channel(100);
        let orchestrator = Self::new(rx, factory, signaling);
        tokio::spawn(orchestrator.run());
        HostHandle::new(tx)
    }

    pub async fn run(mut self) {
        info!("Host orchestrator started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Shutting down host orchestrator.");
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

        for (viewer_id, slot) in self.viewers.drain() {
            if let ViewerSlot::Linked(link) = slot {
                debug!("Closing link to {} on shutdown", viewer_id);
                link.close();
            }
        }
        info!("Host orchestrator finished");
    }

    async fn handle_command(&mut self, cmd: HostCommand) {
        match cmd {
            HostCommand::ViewerJoined { viewer_id } => self.on_viewer_joined(viewer_id),
            HostCommand::ViewerLeft { viewer_id } => self.on_viewer_left(viewer_id),
            HostCommand::MediaAvailable { bundle } => self.on_local_media_available(bundle).await,
            HostCommand::MediaStopped => self.on_local_media_stopped().await,
            HostCommand::AnswerReceived {
                viewer_id,
                sdp,
                negotiation,
            } => self.on_answer_received(viewer_id, sdp, negotiation),
            HostCommand::RemoteIceCandidate {
                viewer_id,
                candidate,
            } => self.on_remote_ice_candidate(viewer_id, candidate),
            HostCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn on_viewer_joined(&mut self, viewer_id: ParticipantId) {
        match self.viewers.get(&viewer_id) {
            Some(ViewerSlot::Pending) | Some(ViewerSlot::Linked(_)) => {
                debug!("Viewer {} already known, ignoring duplicate join", viewer_id);
                return;
            }
            Some(ViewerSlot::Closed) => info!("Viewer {} rejoined", viewer_id),
            None => info!("Viewer {} joined", viewer_id),
        }

        self.viewers.insert(viewer_id, ViewerSlot::Pending);
        self.reconcile(viewer_id);
    }

    /// The relay sends nothing more from a departed id, so its entry goes away
    /// entirely. A later join with the same id starts from scratch.
    fn on_viewer_left(&mut self, viewer_id: ParticipantId) {
        self.early_candidates.remove(&viewer_id);
        match self.viewers.remove(&viewer_id) {
            Some(ViewerSlot::Linked(link)) => {
                info!("Viewer {} left", viewer_id);
                link.close();
            }
            Some(_) => info!("Viewer {} left", viewer_id),
            None => debug!("Unknown viewer {} left", viewer_id),
        }
    }

    async fn on_local_media_available(&mut self, bundle: Arc<MediaBundle>) {
        match &self.media {
            Some(current) if Arc::ptr_eq(current, &bundle) => {
                debug!("Media bundle unchanged, nothing to renegotiate");
                return;
            }
            Some(_) => {
                info!("Media bundle replaced, renegotiating all links");
                self.detach_all();
            }
            None => {
                info!("Local media available ({} tracks)", bundle.len());
                self.signaling.send_host_state(true).await;
            }
        }
        self.media = Some(bundle);

        let viewer_ids: Vec<_> = self.viewers.keys().copied().collect();
        for viewer_id in viewer_ids {
            self.reconcile(viewer_id);
        }
    }

    async fn on_local_media_stopped(&mut self) {
        if self.media.take().is_none() {
            return;
        }
        info!("Local media stopped");
        self.detach_all();
        self.signaling.send_host_state(false).await;
    }

    fn on_answer_received(&mut self, viewer_id: ParticipantId, sdp: String, negotiation: Option<u64>) {
        let Some(ViewerSlot::Linked(link)) = self.viewers.get_mut(&viewer_id) else {
            debug!("Discarding answer from {}: no live link", viewer_id);
            return;
        };
        if !link.apply_answer(sdp, negotiation) {
            debug!(
                "Discarding answer from {} (negotiation {:?}) in phase {}",
                viewer_id,
                negotiation,
                link.phase()
            );
        }
    }

    fn on_remote_ice_candidate(&mut self, viewer_id: ParticipantId, candidate: IceCandidate) {
        match self.viewers.get(&viewer_id) {
            Some(ViewerSlot::Linked(link)) => link.add_remote_candidate(candidate),
            Some(ViewerSlot::Closed) => {
                debug!("Discarding ICE candidate from {}: link closed", viewer_id)
            }
            None if !self.early_candidates.contains_key(&viewer_id)
                && self.early_candidates.len() >= MAX_EARLY_PEERS =>
            {
                warn!("Too many unannounced peers sending ICE, dropping one from {}", viewer_id)
            }
            Some(ViewerSlot::Pending) | None => {
                let queue = self.early_candidates.entry(viewer_id).or_default();
                if queue.len() >= MAX_EARLY_CANDIDATES {
                    warn!("Too many early ICE candidates from {}, dropping", viewer_id);
                    return;
                }
                queue.push_back(candidate);
            }
        }
    }

    /// Brings one viewer in line with the current media state.
    fn reconcile(&mut self, viewer_id: ParticipantId) {
        let Some(slot) = self.viewers.get_mut(&viewer_id) else {
            return;
        };
        let tracks_attached = matches!(slot, ViewerSlot::Linked(link) if link.tracks_attached());

        match compute_action(self.media.is_some(), slot.phase(), tracks_attached) {
            LinkAction::Noop => {}
            LinkAction::CreateLinkAndOffer => self.open_link(viewer_id),
            LinkAction::RenegotiateOffer => {
                if let ViewerSlot::Linked(link) = slot {
                    let generation = link.start_offer(self.media.clone());
                    info!("Renegotiating with {} at {}", viewer_id, generation);
                }
            }
        }
    }

    fn open_link(&mut self, viewer_id: ParticipantId) {
        self.next_link_id += 1;
        let tag = LinkTag {
            peer_id: viewer_id,
            link_id: LinkId(self.next_link_id),
        };

        let mut link = PeerLink::spawn(
            tag,
            Arc::clone(&self.factory),
            self.adapter_tx.clone(),
            self.outcome_tx.clone(),
        );
        let generation = link.start_offer(self.media.clone());
        info!("Opened link {} to {} at {}", tag.link_id, viewer_id, generation);

        if let Some(queued) = self.early_candidates.remove(&viewer_id) {
            debug!("Applying {} early ICE candidates from {}", queued.len(), viewer_id);
            for candidate in queued {
                link.add_remote_candidate(candidate);
            }
        }
        self.viewers.insert(viewer_id, ViewerSlot::Linked(link));
    }

    fn detach_all(&mut self) {
        for slot in self.viewers.values_mut() {
            if let ViewerSlot::Linked(link) = slot {
                link.detach();
            }
        }
    }

    /// Terminal. Leaves a tombstone so late messages for the viewer are dropped.
    fn close_link(&mut self, viewer_id: ParticipantId) {
        if let Some(ViewerSlot::Linked(link)) = self.viewers.insert(viewer_id, ViewerSlot::Closed) {
            link.close();
        }
    }

    fn live_link(&mut self, tag: LinkTag) -> Option<&mut PeerLink> {
        match self.viewers.get_mut(&tag.peer_id) {
            Some(ViewerSlot::Linked(link)) if link.link_id() == tag.link_id => Some(link),
            _ => None,
        }
    }

    async fn handle_adapter_event(&mut self, event: AdapterEvent) {
        let tag = event.tag;
        let Some(link) = self.live_link(tag) else {
            debug!("Dropping adapter event for stale link {} of {}", tag.link_id, tag.peer_id);
            return;
        };

        match event.kind {
            AdapterEventKind::LocalCandidate(candidate) => {
                self.signaling.send_ice(tag.peer_id, candidate).await;
            }
            AdapterEventKind::Connectivity(state) => {
                if state.is_terminal() {
                    info!("Link to {} reported {:?}", tag.peer_id, state);
                    self.close_link(tag.peer_id);
                    return;
                }
                if link.set_connectivity(state) {
                    info!("Viewer {} connected", tag.peer_id);
                } else if state == ConnectivityState::Disconnected {
                    warn!("Link to {} disconnected, waiting for recovery", tag.peer_id);
                }
            }
            AdapterEventKind::RemoteTrack(track) => {
                debug!("Ignoring remote track {} from viewer {}", track.track_id, tag.peer_id);
            }
        }
    }

    async fn handle_outcome(&mut self, outcome: NegotiationOutcome) {
        let tag = outcome.tag;
        let Some(link) = self.live_link(tag) else {
            debug!("Discarding result for closed link {} of {}", tag.link_id, tag.peer_id);
            return;
        };
        if let Err(e) = &outcome.result {
            if e.is_link_fatal() {
                error!("Failed to open link to {}: {}", tag.peer_id, e);
                self.close_link(tag.peer_id);
                return;
            }
        }
        if !link.is_current(tag.link_id, outcome.generation) {
            debug!(
                "Discarding stale {} result for {} (now at {})",
                outcome.generation,
                tag.peer_id,
                link.generation()
            );
            return;
        }

        match outcome.result {
            Ok(NegotiationStep::OfferReady { sdp }) => {
                link.offer_sent(outcome.generation);
                self.signaling
                    .send_offer(tag.peer_id, sdp, outcome.generation.value())
                    .await;
                debug!("Sent offer {} to {}", outcome.generation, tag.peer_id);
            }
            Ok(NegotiationStep::AnswerApplied) => {
                link.answer_applied(outcome.generation);
                debug!("Answer {} from {} applied", outcome.generation, tag.peer_id);
            }
            Ok(NegotiationStep::AnswerReady { .. }) => {
                warn!("Unexpected answer step on host link to {}", tag.peer_id);
            }
            Err(e) => {
                error!("Negotiation with {} failed: {}", tag.peer_id, e);
                self.close_link(tag.peer_id);
            }
        }
    }

    fn snapshot(&self) -> HostSnapshot {
        let mut viewers: Vec<_> = self
            .viewers
            .iter()
            .map(|(viewer_id, slot)| {
                let (link_id, attached_tracks) = match slot {
                    ViewerSlot::Linked(link) => (Some(link.link_id()), link.attached_track_count()),
                    _ => (None, 0),
                };
                ViewerLinkSnapshot {
                    viewer_id: *viewer_id,
                    phase: slot.phase(),
                    link_id,
                    attached_tracks,
                    queued_candidates: self.early_candidates.get(viewer_id).map_or(0, |q| q.len()),
                }
            })
            .collect();
        viewers.sort_by_key(|v| v.viewer_id);

        HostSnapshot {
            has_local_media: self.media.is_some(),
            viewers,
        }
    }
}
