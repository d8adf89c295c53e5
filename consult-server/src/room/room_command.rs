use crate::signaling::ConnectionId;
use consult_core::{SignalEnvelope, SignalPayload, UserId};

/// Commands delivered to a room by the socket layer.
#[derive(Debug)]
pub enum RoomCommand {
    /// A connection announced itself as `user_id`.
    Join {
        connection: ConnectionId,
        user_id: UserId,
    },

    /// Untargeted `leave`: the sender leaves the roster.
    Leave { connection: ConnectionId },

    /// Offer, answer, ICE candidate or a targeted `leave` (hang-up).
    Relay {
        connection: ConnectionId,
        envelope: SignalEnvelope,
    },

    /// The socket went away.
    Disconnect { connection: ConnectionId },
}

impl RoomCommand {
    pub fn from_envelope(connection: ConnectionId, envelope: SignalEnvelope) -> Self {
        match (&envelope.payload, &envelope.target_user) {
            (SignalPayload::Join, _) => RoomCommand::Join {
                connection,
                user_id: envelope.user_id,
            },
            (SignalPayload::Leave, None) => RoomCommand::Leave { connection },
            _ => RoomCommand::Relay {
                connection,
                envelope,
            },
        }
    }
}
