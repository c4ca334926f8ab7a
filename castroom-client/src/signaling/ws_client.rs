use crate::signaling::{SignalingConfig, SignalingOutput};
use async_trait::async_trait;
use castroom_core::{BusEvent, ClientSignal, IceCandidate, ParticipantId};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{error, info, warn};

struct ClientInner {
    /// Present only while a connection is up.
    outbound: RwLock<Option<mpsc::UnboundedSender<ClientSignal>>>,
    local_id: RwLock<Option<ParticipantId>>,
}

/// WebSocket connection to the relay.
///
/// Joins the configured room on every (re)connection and streams the
/// relay's events. Nothing else is replayed after a reconnect.
#[derive(Clone)]
pub struct WsSignalingClient {
    inner: Arc<ClientInner>,
}

impl WsSignalingClient {
    /// Starts the connection supervisor. It runs until the event receiver is dropped.
    pub fn connect(config: SignalingConfig) -> (Self, mpsc::Receiver<BusEvent>, JoinHandle<()>) {
        let inner = Arc::new(ClientInner {
            outbound: RwLock::new(None),
            local_id: RwLock::new(None),
        });
        let (events_tx, events_rx) = mpsc::channel(256);

        let task = tokio::spawn(supervise(Arc::clone(&inner), config, events_tx));
        (Self { inner }, events_rx, task)
    }

    /// The id the relay assigned on the current connection.
    pub async fn local_id(&self) -> Option<ParticipantId> {
        *self.inner.local_id.read().await
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.outbound.read().await.is_some()
    }

    /// Returns false if the signal was dropped because the bus is down.
    pub async fn send_signal(&self, signal: ClientSignal) -> bool {
        let guard = self.inner.outbound.read().await;
        let Some(tx) = guard.as_ref() else {
            warn!("Signaling disconnected, dropping {:?}", signal);
            return false;
        };
        if let Err(e) = tx.send(signal) {
            warn!("Signaling connection closing, dropping {:?}", e.0);
            return false;
        }
        true
    }
}

#[async_trait]
impl SignalingOutput for WsSignalingClient {
    async fn send_offer(&self, to: ParticipantId, sdp: String, negotiation: u64) {
        self.send_signal(ClientSignal::Offer {
            to: Some(to),
            sdp,
            negotiation: Some(negotiation),
        })
        .await;
    }

    async fn send_answer(&self, to: ParticipantId, sdp: String, negotiation: Option<u64>) {
        self.send_signal(ClientSignal::Answer {
            to: Some(to),
            sdp,
            negotiation,
        })
        .await;
    }

    async fn send_ice(&self, to: ParticipantId, candidate: IceCandidate) {
        self.send_signal(ClientSignal::IceCandidate {
            to: Some(to),
            candidate,
        })
        .await;
    }

    async fn send_host_state(&self, is_sharing: bool) {
        self.send_signal(ClientSignal::HostState { is_sharing }).await;
    }
}

async fn supervise(
    inner: Arc<ClientInner>,
    config: SignalingConfig,
    events_tx: mpsc::Sender<BusEvent>,
) {
    loop {
        match connect_async(config.url.as_str()).await {
            Ok((socket, _)) => {
                info!("Connected to relay at {}", config.url);
                run_connection(&inner, &config, socket, events_tx.clone()).await;
                warn!("Signaling connection to {} lost", config.url);
            }
            Err(e) => warn!("Failed to connect to relay at {}: {}", config.url, e),
        }

        *inner.outbound.write().await = None;
        *inner.local_id.write().await = None;

        if events_tx.is_closed() {
            info!("Event receiver dropped, stopping signaling client");
            break;
        }
        tokio::time::sleep(config.reconnect_delay).await;
    }
}

async fn run_connection(
    inner: &Arc<ClientInner>,
    config: &SignalingConfig,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    events_tx: mpsc::Sender<BusEvent>,
) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ClientSignal>();

    let _ = tx.send(ClientSignal::JoinRoom {
        room: config.room.clone(),
        name: config.display_name.clone(),
        role: config.role,
    });
    *inner.outbound.write().await = Some(tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(signal) = rx.recv().await {
            match serde_json::to_string(&signal) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to serialize client signal: {}", e),
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let inner = Arc::clone(inner);

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<BusEvent>(&text) {
                        Ok(event) => {
                            if let BusEvent::Welcome { id } = &event {
                                info!("Relay assigned participant id {}", id);
                                *inner.local_id.write().await = Some(*id);
                            }
                            if events_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid bus event from relay: {:?}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };
}
