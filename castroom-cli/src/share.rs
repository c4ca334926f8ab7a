use anyhow::{Context, Result};
use castroom::client::{
    BusRouter, HostOrchestrator, MediaBundle, RoleHandle, RoomParticipantRegistry,
    SignalingConfig, TransportConfig, WebRtcAdapterFactory, WsSignalingClient,
};
use castroom::{Role, RoomCode};
use colored::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub async fn run(url: &str, room: RoomCode, name: String, media_delay_secs: u64) -> Result<()> {
    println!(
        "{} {} as {}",
        "🎬 Hosting room".green().bold(),
        room.to_string().bold(),
        name.cyan()
    );

    let config = SignalingConfig::new(url, room, name, Role::Host);
    let (client, events, _supervisor) = WsSignalingClient::connect(config);

    let factory = Arc::new(WebRtcAdapterFactory::new(TransportConfig::default()));
    let host = HostOrchestrator::spawn(factory, Box::new(client));

    let registry = RoomParticipantRegistry::new();
    let router = BusRouter::new(registry, RoleHandle::Host(host.clone()));
    let mut router_task = tokio::spawn(router.run(events));

    tokio::time::sleep(Duration::from_secs(media_delay_secs)).await;
    host.media_available(Arc::new(MediaBundle::screen("screen", false)))
        .await
        .context("Host orchestrator stopped before media was published")?;
    println!("{}", "🖥  Screen is live".cyan());

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping share");
            let _ = host.media_stopped().await;
        }
        _ = &mut router_task => info!("Signaling ended"),
    }

    let snapshot = host.snapshot().await.ok();
    if let Some(snapshot) = snapshot {
        println!(
            "{} {} viewer(s) connected at exit",
            "👋 Done.".green().bold(),
            snapshot.active_links().len()
        );
    }
    Ok(())
}
