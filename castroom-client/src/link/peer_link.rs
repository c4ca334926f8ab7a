use crate::adapter::{AdapterEvent, AdapterFactory, ConnectivityState, LinkTag};
use crate::link::link_worker::{LinkOp, NegotiationOutcome, spawn_link_worker};
use crate::link::{Generation, LinkId, LinkPhase};
use crate::media::MediaBundle;
use castroom_core::{IceCandidate, ParticipantId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Negotiation state of one host↔viewer pair, shared by both sides.
///
/// The adapter is created and driven on the link's worker, so the owner never
/// awaits a negotiation step and other links keep moving. Ops submitted
/// before the adapter exists wait for it. Dropping the link stops the worker
/// and closes the adapter.
pub struct PeerLink {
    tag: LinkTag,
    generation: Generation,
    phase: LinkPhase,
    attached: Option<Arc<MediaBundle>>,
    awaiting_answer: bool,
    answered: Option<Generation>,
    /// Viewer: negotiation tag of the last offer accepted on this link.
    offered: Option<u64>,
    transport_connected: bool,
    ops: mpsc::UnboundedSender<LinkOp>,
    _close_guard: oneshot::Sender<()>,
}

impl PeerLink {
    pub(crate) fn spawn(
        tag: LinkTag,
        factory: Arc<dyn AdapterFactory>,
        events: mpsc::Sender<AdapterEvent>,
        outcomes: mpsc::Sender<NegotiationOutcome>,
    ) -> Self {
        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = oneshot::channel();
        spawn_link_worker(tag, factory, events, ops_rx, close_rx, outcomes);

        Self {
            tag,
            generation: Generation::default(),
            phase: LinkPhase::Negotiating(Generation::default()),
            attached: None,
            awaiting_answer: false,
            answered: None,
            offered: None,
            transport_connected: false,
            ops: ops_tx,
            _close_guard: close_tx,
        }
    }

    pub fn peer_id(&self) -> ParticipantId {
        self.tag.peer_id
    }

    pub fn link_id(&self) -> LinkId {
        self.tag.link_id
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn phase(&self) -> LinkPhase {
        self.phase
    }

    pub fn tracks_attached(&self) -> bool {
        self.attached.is_some()
    }

    pub fn attached_track_count(&self) -> usize {
        self.attached.as_ref().map_or(0, |b| b.len())
    }

    /// Whether a result tagged `(link_id, generation)` still applies to this link.
    pub fn is_current(&self, link_id: LinkId, generation: Generation) -> bool {
        self.tag.link_id == link_id && self.generation == generation
    }

    fn submit(&self, op: LinkOp) {
        // The worker only stops once this link is dropped.
        let _ = self.ops.send(op);
    }

    /// Host: begin a new offer round, attaching `bundle` first if given.
    pub(crate) fn start_offer(&mut self, bundle: Option<Arc<MediaBundle>>) -> Generation {
        let generation = self.generation.next();
        self.generation = generation;
        self.phase = LinkPhase::Negotiating(generation);
        self.awaiting_answer = false;

        if let Some(bundle) = bundle {
            self.attached = Some(Arc::clone(&bundle));
            self.submit(LinkOp::Attach { generation, bundle });
        }
        self.submit(LinkOp::CreateOffer { generation });
        generation
    }

    /// Host: the offer for `generation` was handed to the bus.
    pub(crate) fn offer_sent(&mut self, generation: Generation) {
        self.phase = LinkPhase::OfferSent(generation);
        self.awaiting_answer = true;
    }

    /// Host: queue the viewer's answer if it belongs to the outstanding offer.
    ///
    /// An answer carrying an older negotiation tag, a duplicate answer, or an
    /// answer with no offer outstanding is refused.
    pub(crate) fn apply_answer(&mut self, sdp: String, negotiation: Option<u64>) -> bool {
        let LinkPhase::OfferSent(generation) = self.phase else {
            return false;
        };
        if !self.awaiting_answer || negotiation.is_some_and(|n| n != generation.value()) {
            return false;
        }
        self.awaiting_answer = false;
        self.submit(LinkOp::ApplyAnswer { generation, sdp });
        true
    }

    /// Host: the answer for `generation` is in place.
    pub(crate) fn answer_applied(&mut self, generation: Generation) {
        self.answered = Some(generation);
        self.promote();
    }

    /// Viewer: whether an offer tagged `negotiation` belongs to this link.
    ///
    /// A host link numbers its offers upward from 1, so a tag that does not
    /// move past the last accepted one comes from a fresh link on the host
    /// side. Untagged offers are taken as continuations.
    pub(crate) fn continues(&self, negotiation: Option<u64>) -> bool {
        match (self.offered, negotiation) {
            (Some(last), Some(next)) => next > last,
            _ => true,
        }
    }

    /// Viewer: apply a (re)offer on this same link and produce an answer.
    pub(crate) fn accept_offer(&mut self, sdp: String, negotiation: Option<u64>) -> Generation {
        if negotiation.is_some() {
            self.offered = negotiation;
        }
        let generation = self.generation.next();
        self.generation = generation;
        self.phase = LinkPhase::Negotiating(generation);
        self.submit(LinkOp::AcceptOffer {
            generation,
            sdp,
            negotiation,
        });
        generation
    }

    /// Viewer: the answer for `generation` went out.
    pub(crate) fn answer_sent(&mut self, generation: Generation) {
        if generation != self.generation {
            return;
        }
        self.phase = LinkPhase::AnswerSent(generation);
        self.answered = Some(generation);
        self.promote();
    }

    pub(crate) fn detach(&mut self) {
        if self.attached.take().is_some() {
            self.submit(LinkOp::Detach);
        }
    }

    pub(crate) fn add_remote_candidate(&self, candidate: IceCandidate) {
        self.submit(LinkOp::AddCandidate(candidate));
    }

    /// Records a non-terminal connectivity report. Returns true when the
    /// transport just became connected.
    pub(crate) fn set_connectivity(&mut self, state: ConnectivityState) -> bool {
        let was_connected = self.transport_connected;
        self.transport_connected = state == ConnectivityState::Connected;
        self.promote();
        self.transport_connected && !was_connected
    }

    /// Connected means: transport up and the current round answered.
    fn promote(&mut self) {
        let ready = self.transport_connected && self.answered == Some(self.generation);
        if ready && matches!(self.phase, LinkPhase::OfferSent(_) | LinkPhase::AnswerSent(_)) {
            debug!("Link to {} connected at {}", self.tag.peer_id, self.generation);
            self.phase = LinkPhase::Connected(self.generation);
        }
    }

    /// Terminal. The worker stops and closes the adapter.
    pub(crate) fn close(self) {
        debug!(
            "Closing link {} to {} at {}",
            self.tag.link_id, self.tag.peer_id, self.phase
        );
    }
}
