use crate::media::MediaKind;
use crate::negotiator::NegotiationState;
use consult_core::RoomId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to open signaling connection: {0}")]
    Connect(String),

    #[error("invalid signaling url: {0}")]
    InvalidUrl(String),

    #[error("could not obtain an auth token: {0}")]
    Auth(String),

    #[error("signaling connection is closed")]
    Closed,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaAccessError {
    #[error("camera/microphone access was denied, check your permissions")]
    PermissionDenied,

    #[error("no {0} device found, check that it is connected and not in use")]
    DeviceNotFound(MediaKind),

    #[error("neither audio nor video was requested")]
    NothingRequested,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("cannot {op} while {state}")]
    InvalidState {
        op: &'static str,
        state: NegotiationState,
    },

    #[error("peer connection is closed")]
    Closed,

    #[error("malformed session description: {0}")]
    Malformed(String),

    #[error("peer connection failed: {0}")]
    Backend(String),
}

/// Failures reported to the caller of a session operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    #[error(transparent)]
    MediaAccess(#[from] MediaAccessError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error("not ready: {0}")]
    NotReady(&'static str),

    #[error("the call ended before the operation completed")]
    Cancelled,

    #[error("room {room} rejected the join: {reason}")]
    Rejected { room: RoomId, reason: String },
}
