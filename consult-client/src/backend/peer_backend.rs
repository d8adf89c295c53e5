use crate::backend::peer_event::PeerEventSink;
use crate::error::NegotiationError;
use crate::media::MediaTrack;
use async_trait::async_trait;
use consult_core::{CallId, IceCandidate, IceServerConfig, SessionDescription};
use std::sync::Arc;

/// The media engine underneath one peer connection. It performs the
/// operations it is asked to; ordering is enforced by `SessionNegotiator`.
///
/// A local offer cannot be rolled back. A connection that loses glare is
/// closed and replaced by a fresh one from the factory.
#[async_trait]
pub trait PeerBackend: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError>;

    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError>;

    async fn set_local_description(
        &self,
        desc: &SessionDescription,
    ) -> Result<(), NegotiationError>;

    async fn set_remote_description(
        &self,
        desc: &SessionDescription,
    ) -> Result<(), NegotiationError>;

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<(), NegotiationError>;

    async fn attach_track(&self, track: &Arc<MediaTrack>) -> Result<(), NegotiationError>;

    async fn close(&self) -> Result<(), NegotiationError>;
}

#[async_trait]
pub trait PeerBackendFactory: Send + Sync {
    async fn create(
        &self,
        call_id: CallId,
        ice_servers: &[IceServerConfig],
        events: PeerEventSink,
    ) -> Result<Box<dyn PeerBackend>, NegotiationError>;
}
