use crate::media::MediaKind;
use consult_core::{CallId, IceCandidate};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: MediaKind,
}

#[derive(Debug, Clone)]
pub enum PeerEventKind {
    LocalCandidate(IceCandidate),
    RemoteTrack(RemoteTrack),
    ConnectionState(PeerConnectionState),
}

/// Emitted by a backend from its own callbacks. `call_id` lets the session
/// drop events from a connection it has already torn down.
#[derive(Debug, Clone)]
pub struct PeerEvent {
    pub call_id: CallId,
    pub kind: PeerEventKind,
}

pub type PeerEventSink = mpsc::UnboundedSender<PeerEvent>;
