use castroom_core::{BusEvent, ClientSignal, ParticipantId, Role, RoomCode};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::utils::STEP_TIMEOUT_MS;

/// A bare WebSocket participant speaking the relay's JSON protocol.
pub struct WsPeer {
    pub id: ParticipantId,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsPeer {
    /// Connects and consumes the `welcome` event.
    pub async fn connect(url: &str) -> Self {
        let (mut socket, _) = connect_async(url).await.expect("ws connect failed");
        let id = match next_event(&mut socket, STEP_TIMEOUT_MS).await {
            Some(BusEvent::Welcome { id }) => id,
            other => panic!("expected welcome, got {other:?}"),
        };
        Self { id, socket }
    }

    pub async fn send(&mut self, signal: ClientSignal) {
        let json = serde_json::to_string(&signal).expect("serialize failed");
        self.socket
            .send(Message::Text(json))
            .await
            .expect("ws send failed");
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.socket
            .send(Message::Text(text.to_owned()))
            .await
            .expect("ws send failed");
    }

    pub async fn join(&mut self, room: &RoomCode, name: &str, role: Role) {
        self.send(ClientSignal::JoinRoom {
            room: room.clone(),
            name: name.to_owned(),
            role,
        })
        .await;
    }

    pub async fn recv(&mut self) -> Option<BusEvent> {
        next_event(&mut self.socket, STEP_TIMEOUT_MS).await
    }

    /// Skips events until one matches.
    pub async fn recv_until(&mut self, pred: impl Fn(&BusEvent) -> bool) -> BusEvent {
        loop {
            match self.recv().await {
                Some(event) if pred(&event) => return event,
                Some(_) => continue,
                None => panic!("no matching event before timeout"),
            }
        }
    }

    /// True if nothing arrives within `ms`.
    pub async fn is_quiet(&mut self, ms: u64) -> bool {
        next_event(&mut self.socket, ms).await.is_none()
    }

    pub async fn close(mut self) {
        let _ = self.socket.close(None).await;
    }
}

async fn next_event(
    socket: &mut WebSocketStream<MaybeTlsStream<TcpStream>>,
    timeout_ms: u64,
) -> Option<BusEvent> {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);

    loop {
        let msg = tokio::time::timeout_at(deadline, socket.next()).await.ok()??;
        match msg.ok()? {
            Message::Text(text) => {
                return Some(serde_json::from_str(&text).expect("invalid bus event"));
            }
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}
