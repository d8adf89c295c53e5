use crate::signaling::ConnectionId;
use consult_core::ServerFrame;

/// Implemented by the socket layer so rooms can push frames to connections.
///
/// Called while a room entry is locked: implementations must not block.
pub trait SignalingOutput: Send + Sync {
    fn send_frame(&self, connection: &ConnectionId, frame: &ServerFrame);
}
