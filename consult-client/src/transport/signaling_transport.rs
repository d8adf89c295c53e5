use crate::error::TransportError;
use crate::transport::signaling_channel::SignalingChannel;
use async_trait::async_trait;
use consult_core::RoomId;

/// Opens one bidirectional signaling connection per room.
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    async fn connect(&self, room: &RoomId) -> Result<SignalingChannel, TransportError>;
}
