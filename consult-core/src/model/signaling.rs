use crate::model::room::RoomId;
use crate::model::session::{IceCandidate, SessionDescription};
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Client-originated control message. `user_id` is the sender; a missing
/// `target_user` addresses every other member of the room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignalEnvelope {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user: Option<UserId>,
    #[serde(flatten)]
    pub payload: SignalPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SignalPayload {
    Join,
    Leave,
    Offer { sdp: SessionDescription },
    Answer { sdp: SessionDescription },
    IceCandidate { candidate: IceCandidate },
}

impl SignalPayload {
    pub fn action(&self) -> &'static str {
        match self {
            SignalPayload::Join => "join",
            SignalPayload::Leave => "leave",
            SignalPayload::Offer { .. } => "offer",
            SignalPayload::Answer { .. } => "answer",
            SignalPayload::IceCandidate { .. } => "ice_candidate",
        }
    }
}

impl SignalEnvelope {
    pub fn broadcast(user_id: UserId, payload: SignalPayload) -> Self {
        Self {
            user_id,
            target_user: None,
            payload,
        }
    }

    pub fn to(user_id: UserId, target: UserId, payload: SignalPayload) -> Self {
        Self {
            user_id,
            target_user: Some(target),
            payload,
        }
    }
}

/// Server-originated control message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    PresenceUpdate { users: Vec<UserId> },
    IceConfig { ice_servers: Vec<IceServerConfig> },
    JoinRejected { room: RoomId, reason: String },
}

/// Anything a client can receive on its signaling socket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ServerFrame {
    Control(ServerMessage),
    Signal(SignalEnvelope),
}
