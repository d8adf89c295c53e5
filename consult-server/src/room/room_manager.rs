use crate::room::{Admission, Room, RoomCommand};
use crate::signaling::{ConnectionId, SignalingOutput};
use consult_core::{RoomId, ServerFrame, ServerMessage, SignalEnvelope, UserId};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Presence tracker: owns every room's roster and routes signaling frames
/// between the members of a room.
///
/// All mutation and delivery for one room happens while its map entry is
/// held, so members observe roster snapshots in the same order.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, Room>>,
    signaling: Arc<dyn SignalingOutput>,
    capacity: usize,
}

impl RoomManager {
    pub fn new(signaling: Arc<dyn SignalingOutput>, capacity: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            signaling,
            capacity,
        }
    }

    pub fn handle(&self, room_id: &RoomId, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                connection,
                user_id,
            } => self.join(room_id, connection, user_id),
            RoomCommand::Leave { connection } => self.remove(room_id, &connection, "leave"),
            RoomCommand::Disconnect { connection } => {
                self.remove(room_id, &connection, "disconnect")
            }
            RoomCommand::Relay {
                connection,
                envelope,
            } => self.relay(room_id, &connection, envelope),
        }
    }

    pub fn roster(&self, room_id: &RoomId) -> Vec<UserId> {
        self.rooms
            .get(room_id)
            .map(|room| room.roster())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn join(&self, room_id: &RoomId, connection: ConnectionId, user_id: UserId) {
        let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room_id);
            Room::new(room_id.clone(), self.capacity)
        });

        match room.admit(user_id.clone(), connection.clone()) {
            Ok(Admission::Joined) => info!("User {} joined room {}", user_id, room_id),
            Ok(Admission::Replaced { previous }) => {
                info!(
                    "User {} rejoined room {} (replacing connection {})",
                    user_id, room_id, previous
                );
            }
            Ok(Admission::AlreadyJoined) => debug!("User {} already in room {}", user_id, room_id),
            Err(rejection) => {
                warn!(
                    "Rejecting {} from room {}: {}",
                    user_id,
                    room_id,
                    rejection.reason()
                );
                let frame = ServerFrame::Control(ServerMessage::JoinRejected {
                    room: room_id.clone(),
                    reason: rejection.reason(),
                });
                self.signaling.send_frame(&connection, &frame);
                return;
            }
        }

        self.broadcast_presence(&room);
    }

    fn remove(&self, room_id: &RoomId, connection: &ConnectionId, why: &str) {
        let now_empty = {
            let Some(mut room) = self.rooms.get_mut(room_id) else {
                return;
            };
            let Some(member) = room.remove_connection(connection) else {
                return;
            };
            info!("User {} left room {} ({})", member.user_id, room_id, why);

            self.broadcast_presence(&room);
            room.is_empty()
        };

        if now_empty
            && self
                .rooms
                .remove_if(room_id, |_, room| room.is_empty())
                .is_some()
        {
            info!("Room {} is empty, destroyed", room_id);
        }
    }

    fn relay(&self, room_id: &RoomId, connection: &ConnectionId, mut envelope: SignalEnvelope) {
        let Some(room) = self.rooms.get(room_id) else {
            warn!(
                "Dropping '{}' from {}: room {} does not exist",
                envelope.payload.action(),
                connection,
                room_id
            );
            return;
        };
        let Some(sender) = room.member_by_connection(connection) else {
            warn!(
                "Dropping '{}' from {}: connection has not joined {}",
                envelope.payload.action(),
                connection,
                room_id
            );
            return;
        };

        if envelope.user_id != sender.user_id {
            debug!(
                "Rewriting sender {} -> {} on '{}'",
                envelope.user_id,
                sender.user_id,
                envelope.payload.action()
            );
            envelope.user_id = sender.user_id.clone();
        }

        match &envelope.target_user {
            Some(target) => {
                let Some(member) = room.member(target) else {
                    warn!(
                        "Dropping '{}' from {}: {} is not in room {}",
                        envelope.payload.action(),
                        envelope.user_id,
                        target,
                        room_id
                    );
                    return;
                };
                debug!(
                    "Relaying '{}' {} -> {}",
                    envelope.payload.action(),
                    envelope.user_id,
                    target
                );
                self.signaling
                    .send_frame(&member.connection, &ServerFrame::Signal(envelope.clone()));
            }
            None => {
                let frame = ServerFrame::Signal(envelope.clone());
                for member in room.members() {
                    if &member.connection != connection {
                        self.signaling.send_frame(&member.connection, &frame);
                    }
                }
            }
        }
    }

    fn broadcast_presence(&self, room: &Room) {
        let frame = ServerFrame::Control(ServerMessage::PresenceUpdate {
            users: room.roster(),
        });
        for member in room.members() {
            self.signaling.send_frame(&member.connection, &frame);
        }
    }
}
