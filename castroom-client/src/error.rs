use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("orchestrator has shut down")]
    Shutdown,
}

/// Which step of a link's negotiation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStage {
    CreateAdapter,
    AttachTracks,
    CreateOffer,
    ApplyAnswer,
    AcceptOffer,
}

impl fmt::Display for NegotiationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationStage::CreateAdapter => "create adapter",
            NegotiationStage::AttachTracks => "attach tracks",
            NegotiationStage::CreateOffer => "create offer",
            NegotiationStage::ApplyAnswer => "apply answer",
            NegotiationStage::AcceptOffer => "accept offer",
        };
        f.write_str(name)
    }
}

/// A negotiation step failed. Scoped to a single link.
#[derive(Debug, Error)]
#[error("{stage} failed: {reason}")]
pub struct NegotiationError {
    pub stage: NegotiationStage,
    pub reason: String,
}

impl NegotiationError {
    pub fn new(stage: NegotiationStage, err: anyhow::Error) -> Self {
        Self {
            stage,
            reason: format!("{err:#}"),
        }
    }

    /// The link never got an adapter, so no later round can succeed.
    pub fn is_link_fatal(&self) -> bool {
        self.stage == NegotiationStage::CreateAdapter
    }
}
