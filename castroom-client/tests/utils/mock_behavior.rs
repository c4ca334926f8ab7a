use async_trait::async_trait;
use castroom_client::{RemoteTrack, ViewerBehavior};
use castroom_core::ParticipantId;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub enum ViewerEvent {
    Track {
        host_id: ParticipantId,
        track: RemoteTrack,
    },
    Connected {
        host_id: ParticipantId,
    },
    HostLeft {
        host_id: ParticipantId,
    },
}

/// A ViewerBehavior that records every callback.
#[derive(Clone, Default)]
pub struct TestViewerBehavior {
    events: Arc<Mutex<Vec<ViewerEvent>>>,
}

impl TestViewerBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_events(&self) -> Vec<ViewerEvent> {
        self.events.lock().await.clone()
    }

    pub async fn wait_for_events(&self, count: usize, timeout_ms: u64) -> bool {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.events.lock().await.len() >= count {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    pub async fn has_connected(&self, host: &ParticipantId) -> bool {
        self.events
            .lock()
            .await
            .iter()
            .any(|e| matches!(e, ViewerEvent::Connected { host_id } if host_id == host))
    }

    pub async fn has_host_left(&self, host: &ParticipantId) -> bool {
        self.events
            .lock()
            .await
            .iter()
            .any(|e| matches!(e, ViewerEvent::HostLeft { host_id } if host_id == host))
    }

    pub async fn tracks_from(&self, host: &ParticipantId) -> Vec<RemoteTrack> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                ViewerEvent::Track { host_id, track } if host_id == host => Some(track.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ViewerBehavior for TestViewerBehavior {
    async fn on_remote_track(&self, host_id: ParticipantId, track: RemoteTrack) {
        tracing::info!("[TestBehavior] track {} from {}", track.track_id, host_id);
        self.events
            .lock()
            .await
            .push(ViewerEvent::Track { host_id, track });
    }

    async fn on_connected(&self, host_id: ParticipantId) {
        self.events
            .lock()
            .await
            .push(ViewerEvent::Connected { host_id });
    }

    async fn on_host_left(&self, host_id: ParticipantId) {
        self.events.lock().await.push(ViewerEvent::HostLeft { host_id });
    }
}
