use crate::backend::RemoteTrack;
use consult_core::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    LocalHangup,
    RemoteHangup,
    PeerLeft,
    ConnectionFailed,
    NegotiationFailed,
    TransportLost,
    SessionLeft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    RosterChanged(Vec<UserId>),
    IncomingCall { from: UserId },
    Connected { peer: UserId },
    RemoteTrack { peer: UserId, track: RemoteTrack },
    CallEnded { peer: UserId, reason: EndReason },
    /// Human-readable failure meant for display.
    Failed { message: String },
}
