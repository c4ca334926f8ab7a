use anyhow::Result;
use async_trait::async_trait;
use castroom::client::{
    BusRouter, RemoteTrack, RoleHandle, RoomParticipantRegistry, SignalingConfig,
    TransportConfig, ViewerBehavior, ViewerSession, WebRtcAdapterFactory, WsSignalingClient,
};
use castroom::{ParticipantId, Role, RoomCode};
use colored::*;
use std::sync::Arc;
use tracing::info;

/// Prints what arrives from the host.
struct ConsoleViewer {
    registry: RoomParticipantRegistry,
}

impl ConsoleViewer {
    fn host_name(&self, host_id: ParticipantId) -> String {
        self.registry
            .get(&host_id)
            .map(|p| p.name)
            .unwrap_or_else(|| host_id.to_string())
    }
}

#[async_trait]
impl ViewerBehavior for ConsoleViewer {
    async fn on_remote_track(&self, host_id: ParticipantId, track: RemoteTrack) {
        println!(
            "{} {:?} track {} from {}",
            "🎞  Receiving".cyan(),
            track.kind,
            track.track_id,
            self.host_name(host_id)
        );
    }

    async fn on_connected(&self, host_id: ParticipantId) {
        println!("{} {}", "✅ Connected to".green().bold(), self.host_name(host_id));
    }

    async fn on_host_left(&self, host_id: ParticipantId) {
        println!("{} {}", "👋 Host left:".yellow(), self.host_name(host_id));
    }
}

pub async fn run(url: &str, room: RoomCode, name: String) -> Result<()> {
    println!(
        "{} {} as {}",
        "👀 Watching room".green().bold(),
        room.to_string().bold(),
        name.cyan()
    );

    let config = SignalingConfig::new(url, room, name, Role::Viewer);
    let (client, events, _supervisor) = WsSignalingClient::connect(config);

    let registry = RoomParticipantRegistry::new();
    let behavior = ConsoleViewer {
        registry: registry.clone(),
    };
    let factory = Arc::new(WebRtcAdapterFactory::new(TransportConfig::default()));
    let viewer = ViewerSession::spawn(factory, Box::new(client), Box::new(behavior));

    let router = BusRouter::new(registry, RoleHandle::Viewer(viewer));
    let mut router_task = tokio::spawn(router.run(events));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted, leaving room"),
        _ = &mut router_task => info!("Signaling ended"),
    }
    Ok(())
}
