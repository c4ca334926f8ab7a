use crate::config::RelayConfig;
use crate::room::{RoomInfo, RoomMeta, RoomState, generate_room_code};
use anyhow::{Result, bail};
use castroom_core::{BusEvent, ClientSignal, IceCandidate, Participant, ParticipantId, Role, RoomCode};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub const ROOM_NOT_FOUND: &str = "room-not-found";
pub const ROOM_CREATE_FAILED: &str = "room-create-failed";

struct RelayInner {
    /// Connected sockets: participant -> outgoing event queue.
    peers: DashMap<ParticipantId, mpsc::UnboundedSender<BusEvent>>,
    /// Which room each joined participant is in.
    members: DashMap<ParticipantId, RoomCode>,
    rooms: DashMap<RoomCode, RoomState>,
    config: RelayConfig,
}

/// Room bookkeeping and event forwarding. Cheap to clone.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl RelayService {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                peers: DashMap::new(),
                members: DashMap::new(),
                rooms: DashMap::new(),
                config,
            }),
        }
    }

    /// Registers a freshly connected socket and greets it with its id.
    pub fn connect(&self, tx: mpsc::UnboundedSender<BusEvent>) -> ParticipantId {
        let id = ParticipantId::new();
        self.inner.peers.insert(id, tx);
        self.send(&id, BusEvent::Welcome { id });
        id
    }

    pub fn disconnect(&self, id: &ParticipantId) {
        self.inner.peers.remove(id);
        self.leave_room(id);
    }

    pub fn create_room(&self) -> Result<RoomCode> {
        let config = &self.inner.config;
        for _ in 0..config.create_attempts {
            let code = generate_room_code(config.room_code_len);
            if let Entry::Vacant(entry) = self.inner.rooms.entry(code.clone()) {
                entry.insert(RoomState::default());
                info!("Created room {}", code);
                return Ok(code);
            }
        }
        bail!(
            "no free room code after {} attempts",
            config.create_attempts
        )
    }

    pub fn room_info(&self, room: &RoomCode) -> Option<RoomInfo> {
        self.inner.rooms.get(room).map(|state| RoomInfo {
            room: room.clone(),
            meta: RoomMeta {
                participants: state.participants().to_vec(),
                host_online: state.host().is_some(),
            },
        })
    }

    /// Applies one message received from `from`'s socket.
    pub fn handle_signal(&self, from: ParticipantId, signal: ClientSignal) {
        match signal {
            ClientSignal::CreateRoom => match self.create_room() {
                Ok(room) => {
                    self.send(&from, BusEvent::RoomCreated { room });
                }
                Err(e) => {
                    error!("Failed to create room for {}: {:#}", from, e);
                    self.send(
                        &from,
                        BusEvent::JoinError {
                            error: ROOM_CREATE_FAILED.to_owned(),
                        },
                    );
                }
            },

            ClientSignal::JoinRoom { room, name, role } => self.join_room(from, room, name, role),

            ClientSignal::Offer {
                to,
                sdp,
                negotiation,
            } => self.forward(
                from,
                to,
                BusEvent::Offer {
                    from,
                    sdp,
                    negotiation,
                },
            ),

            ClientSignal::Answer {
                to,
                sdp,
                negotiation,
            } => {
                if to.is_none() {
                    warn!("Answer from {} without a target, dropping", from);
                    return;
                }
                self.forward(
                    from,
                    to,
                    BusEvent::Answer {
                        from,
                        sdp,
                        negotiation,
                    },
                );
            }

            ClientSignal::IceCandidate { to, candidate } => self.forward_ice(from, to, candidate),

            ClientSignal::ChatMessage { text } => {
                let Some((room, sender)) = self.member(&from) else {
                    warn!("Chat from {} outside any room", from);
                    return;
                };
                self.broadcast(
                    &room,
                    BusEvent::ChatMessage {
                        from,
                        name: sender.name,
                        text,
                    },
                    None,
                );
            }

            ClientSignal::HostState { is_sharing } => {
                let Some(room) = self.room_of(&from) else {
                    return;
                };
                let accepted = match self.inner.rooms.get_mut(&room) {
                    Some(mut state) if state.is_host(&from) => {
                        state.set_host_sharing(is_sharing);
                        true
                    }
                    _ => false,
                };
                if !accepted {
                    warn!("Ignoring host-state from non-host {}", from);
                    return;
                }
                self.broadcast(&room, BusEvent::HostState { is_sharing }, Some(&from));
            }
        }
    }

    fn join_room(&self, from: ParticipantId, room: RoomCode, name: String, role: Role) {
        // A second join on the same socket moves the participant.
        self.leave_room(&from);

        let participant = Participant {
            id: from,
            name: name.clone(),
            role,
        };

        let (participants, host, existing_viewers, host_sharing) = {
            let Some(mut state) = self.inner.rooms.get_mut(&room) else {
                info!("{} tried to join unknown room {}", from, room);
                self.send(
                    &from,
                    BusEvent::JoinError {
                        error: ROOM_NOT_FOUND.to_owned(),
                    },
                );
                return;
            };
            state.join(participant);
            let viewers: Vec<_> = state
                .viewers()
                .filter(|p| p.id != from)
                .map(|p| (p.id, p.name.clone()))
                .collect();
            (
                state.participants().to_vec(),
                state.host(),
                viewers,
                state.host_sharing(),
            )
        };
        self.inner.members.insert(from, room.clone());
        info!("{} ({}) joined room {} as {}", name, from, room, role);

        self.send(
            &from,
            BusEvent::Joined {
                room: room.clone(),
                host_online: host.is_some(),
                participants,
            },
        );
        self.broadcast(
            &room,
            BusEvent::ParticipantJoined {
                id: from,
                name: name.clone(),
                role,
            },
            Some(&from),
        );

        match role {
            Role::Viewer => {
                if let Some(host) = host {
                    self.send(
                        &host,
                        BusEvent::ViewerArrived {
                            viewer_id: from,
                            viewer_name: name,
                        },
                    );
                }
                if host_sharing {
                    self.send(&from, BusEvent::HostState { is_sharing: true });
                }
            }
            Role::Host => {
                for (viewer_id, viewer_name) in existing_viewers {
                    self.send(
                        &from,
                        BusEvent::ViewerArrived {
                            viewer_id,
                            viewer_name,
                        },
                    );
                }
            }
        }
    }

    fn leave_room(&self, id: &ParticipantId) {
        let Some((_, room)) = self.inner.members.remove(id) else {
            return;
        };
        let left = self
            .inner
            .rooms
            .get_mut(&room)
            .and_then(|mut state| state.leave(id));
        let Some((participant, was_host)) = left else {
            return;
        };

        info!("{} ({}) left room {}", participant.name, id, room);
        self.broadcast(
            &room,
            BusEvent::ParticipantLeft {
                id: *id,
                name: participant.name,
            },
            None,
        );
        if was_host {
            self.broadcast(&room, BusEvent::HostLeft, None);
        }
    }

    fn forward_ice(&self, from: ParticipantId, to: Option<ParticipantId>, candidate: IceCandidate) {
        self.forward(from, to, BusEvent::IceCandidate { from, candidate });
    }

    /// Sends to `to` if it shares `from`'s room, or to every other member.
    fn forward(&self, from: ParticipantId, to: Option<ParticipantId>, event: BusEvent) {
        let Some(room) = self.room_of(&from) else {
            warn!("Signal from {} outside any room, dropping", from);
            return;
        };

        match to {
            Some(target) => {
                if self.room_of(&target).as_ref() != Some(&room) {
                    debug!("Target {} is not in room {}, dropping", target, room);
                    return;
                }
                self.send(&target, event);
            }
            None => self.broadcast(&room, event, Some(&from)),
        }
    }

    fn room_of(&self, id: &ParticipantId) -> Option<RoomCode> {
        self.inner.members.get(id).map(|room| room.value().clone())
    }

    fn member(&self, id: &ParticipantId) -> Option<(RoomCode, Participant)> {
        let room = self.room_of(id)?;
        let participant = self.inner.rooms.get(&room)?.get(id).cloned()?;
        Some((room, participant))
    }

    fn broadcast(&self, room: &RoomCode, event: BusEvent, except: Option<&ParticipantId>) {
        let Some(members) = self.inner.rooms.get(room).map(|state| state.member_ids()) else {
            return;
        };
        for id in members.iter().filter(|id| Some(*id) != except) {
            self.send(id, event.clone());
        }
    }

    fn send(&self, to: &ParticipantId, event: BusEvent) -> bool {
        let Some(peer) = self.inner.peers.get(to) else {
            debug!("Attempted to send to disconnected participant {}", to);
            return false;
        };
        if let Err(e) = peer.send(event) {
            error!("Failed to queue event for {}: {:?}", to, e.0);
            return false;
        }
        true
    }
}
