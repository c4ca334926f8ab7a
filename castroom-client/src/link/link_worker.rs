use crate::adapter::{AdapterEvent, AdapterFactory, LinkTag, PeerLinkAdapter};
use crate::error::{NegotiationError, NegotiationStage};
use crate::link::Generation;
use crate::media::MediaBundle;
use castroom_core::{IceCandidate, SessionDescription};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Work queued for a single link. Ops run strictly in order, one at a time.
pub(crate) enum LinkOp {
    Attach {
        generation: Generation,
        bundle: Arc<MediaBundle>,
    },
    Detach,
    CreateOffer {
        generation: Generation,
    },
    ApplyAnswer {
        generation: Generation,
        sdp: String,
    },
    AcceptOffer {
        generation: Generation,
        sdp: String,
        negotiation: Option<u64>,
    },
    AddCandidate(IceCandidate),
}

#[derive(Debug)]
pub enum NegotiationStep {
    /// Host: the local offer is set and ready to send.
    OfferReady { sdp: String },
    /// Host: the viewer's answer was applied.
    AnswerApplied,
    /// Viewer: the local answer is set and ready to send.
    AnswerReady {
        sdp: String,
        negotiation: Option<u64>,
    },
}

/// Result of an asynchronous negotiation step, reported back to the owner.
#[derive(Debug)]
pub struct NegotiationOutcome {
    pub tag: LinkTag,
    pub generation: Generation,
    pub result: Result<NegotiationStep, NegotiationError>,
}

/// Creates the link's adapter, then runs its ops against it until the link
/// is dropped, then closes the adapter. A result still in flight at that
/// point is delivered but no longer matches any live link.
///
/// A failed creation is reported once as a [`NegotiationStage::CreateAdapter`]
/// error and the worker stops.
pub(crate) fn spawn_link_worker(
    tag: LinkTag,
    factory: Arc<dyn AdapterFactory>,
    events: mpsc::Sender<AdapterEvent>,
    mut ops: mpsc::UnboundedReceiver<LinkOp>,
    mut closed: oneshot::Receiver<()>,
    outcomes: mpsc::Sender<NegotiationOutcome>,
) {
    tokio::spawn(async move {
        let adapter = match factory.create(tag, events).await {
            Ok(adapter) => adapter,
            Err(e) => {
                let _ = outcomes
                    .send(NegotiationOutcome {
                        tag,
                        generation: Generation::default(),
                        result: Err(NegotiationError::new(NegotiationStage::CreateAdapter, e)),
                    })
                    .await;
                return;
            }
        };

        loop {
            let op = tokio::select! {
                biased;
                _ = &mut closed => break,
                op = ops.recv() => match op {
                    Some(op) => op,
                    None => break,
                },
            };

            if let Some(outcome) = run_op(tag, adapter.as_ref(), op).await {
                if outcomes.send(outcome).await.is_err() {
                    break;
                }
            }
        }

        if let Err(e) = adapter.close().await {
            debug!("Adapter close for {} link {} failed: {:?}", tag.peer_id, tag.link_id, e);
        }
        debug!("Link worker for {} link {} finished", tag.peer_id, tag.link_id);
    });
}

async fn run_op(tag: LinkTag, adapter: &dyn PeerLinkAdapter, op: LinkOp) -> Option<NegotiationOutcome> {
    let outcome = |generation, result| {
        Some(NegotiationOutcome {
            tag,
            generation,
            result,
        })
    };

    match op {
        LinkOp::Attach { generation, bundle } => {
            for track in bundle.tracks() {
                if let Err(e) = adapter.attach_track(track).await {
                    return outcome(
                        generation,
                        Err(NegotiationError::new(NegotiationStage::AttachTracks, e)),
                    );
                }
            }
            None
        }

        LinkOp::Detach => {
            if let Err(e) = adapter.detach_tracks().await {
                warn!("Failed to detach tracks for {}: {:?}", tag.peer_id, e);
            }
            None
        }

        LinkOp::CreateOffer { generation } => {
            let result = async {
                let offer = adapter.create_offer().await?;
                let sdp = offer.sdp.clone();
                adapter.set_local_description(offer).await?;
                Ok::<_, anyhow::Error>(sdp)
            }
            .await
            .map(|sdp| NegotiationStep::OfferReady { sdp })
            .map_err(|e| NegotiationError::new(NegotiationStage::CreateOffer, e));
            outcome(generation, result)
        }

        LinkOp::ApplyAnswer { generation, sdp } => {
            let result = adapter
                .set_remote_description(SessionDescription::answer(sdp))
                .await
                .map(|()| NegotiationStep::AnswerApplied)
                .map_err(|e| NegotiationError::new(NegotiationStage::ApplyAnswer, e));
            outcome(generation, result)
        }

        LinkOp::AcceptOffer {
            generation,
            sdp,
            negotiation,
        } => {
            let result = async {
                adapter
                    .set_remote_description(SessionDescription::offer(sdp))
                    .await?;
                let answer = adapter.create_answer().await?;
                let sdp = answer.sdp.clone();
                adapter.set_local_description(answer).await?;
                Ok::<_, anyhow::Error>(sdp)
            }
            .await
            .map(|sdp| NegotiationStep::AnswerReady { sdp, negotiation })
            .map_err(|e| NegotiationError::new(NegotiationStage::AcceptOffer, e));
            outcome(generation, result)
        }

        LinkOp::AddCandidate(candidate) => {
            // Best effort: duplicates and late candidates fail routinely.
            if let Err(e) = adapter.add_remote_candidate(candidate).await {
                warn!("Failed to add ICE candidate for {}: {:?}", tag.peer_id, e);
            }
            None
        }
    }
}
