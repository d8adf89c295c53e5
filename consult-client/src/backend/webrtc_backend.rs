use crate::backend::peer_backend::{PeerBackend, PeerBackendFactory};
use crate::backend::peer_event::{
    PeerConnectionState, PeerEvent, PeerEventKind, PeerEventSink, RemoteTrack,
};
use crate::error::NegotiationError;
use crate::media::{MediaKind, MediaTrack};
use async_trait::async_trait;
use consult_core::{CallId, IceCandidate, IceServerConfig, SessionDescription};
use std::sync::Arc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

fn backend_err(err: webrtc::Error) -> NegotiationError {
    NegotiationError::Backend(err.to_string())
}

fn to_rtc_ice_servers(servers: &[IceServerConfig]) -> Vec<RTCIceServer> {
    servers
        .iter()
        .map(|s| RTCIceServer {
            urls: s.urls.clone(),
            username: s.username.clone().unwrap_or_default(),
            credential: s.credential.clone().unwrap_or_default(),
        })
        .collect()
}

fn map_state(state: RTCPeerConnectionState) -> PeerConnectionState {
    match state {
        RTCPeerConnectionState::Connecting => PeerConnectionState::Connecting,
        RTCPeerConnectionState::Connected => PeerConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => PeerConnectionState::Failed,
        RTCPeerConnectionState::Closed => PeerConnectionState::Closed,
        _ => PeerConnectionState::New,
    }
}

#[derive(Default)]
pub struct WebRtcBackendFactory;

#[async_trait]
impl PeerBackendFactory for WebRtcBackendFactory {
    async fn create(
        &self,
        call_id: CallId,
        ice_servers: &[IceServerConfig],
        events: PeerEventSink,
    ) -> Result<Box<dyn PeerBackend>, NegotiationError> {
        let backend = WebRtcBackend::new(call_id, ice_servers, events).await?;
        Ok(Box::new(backend))
    }
}

/// One `RTCPeerConnection` with its callbacks wired to a [`PeerEventSink`].
pub struct WebRtcBackend {
    call_id: CallId,
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcBackend {
    pub async fn new(
        call_id: CallId,
        ice_servers: &[IceServerConfig],
        events: PeerEventSink,
    ) -> Result<Self, NegotiationError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs().map_err(backend_err)?;
        let registry = register_default_interceptors(Registry::new(), &mut m).map_err(backend_err)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: to_rtc_ice_servers(ice_servers),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(backend_err)?,
        );

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection {} state changed: {:?}", call_id, s);
                    let _ = tx.send(PeerEvent {
                        call_id,
                        kind: PeerEventKind::ConnectionState(map_state(s)),
                    });
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx.send(PeerEvent {
                    call_id,
                    kind: PeerEventKind::LocalCandidate(IceCandidate::from(init)),
                });
            })
        }));

        let track_tx = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => MediaKind::Audio,
                        _ => MediaKind::Video,
                    };
                    debug!("Remote {} track arrived on {}", kind, call_id);
                    let _ = tx.send(PeerEvent {
                        call_id,
                        kind: PeerEventKind::RemoteTrack(RemoteTrack {
                            id: track.id(),
                            stream_id: track.stream_id(),
                            kind,
                        }),
                    });
                })
            },
        ));

        Ok(Self {
            call_id,
            peer_connection,
        })
    }

    pub fn call_id(&self) -> CallId {
        self.call_id
    }
}

fn from_rtc(desc: RTCSessionDescription) -> Result<SessionDescription, NegotiationError> {
    SessionDescription::try_from(desc)
        .map_err(|t| NegotiationError::Malformed(format!("unexpected sdp type {t}")))
}

fn to_rtc(desc: &SessionDescription) -> Result<RTCSessionDescription, NegotiationError> {
    RTCSessionDescription::try_from(desc).map_err(|e| NegotiationError::Malformed(e.to_string()))
}

#[async_trait]
impl PeerBackend for WebRtcBackend {
    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(backend_err)?;
        from_rtc(offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(backend_err)?;
        from_rtc(answer)
    }

    async fn set_local_description(
        &self,
        desc: &SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.peer_connection
            .set_local_description(to_rtc(desc)?)
            .await
            .map_err(backend_err)
    }

    async fn set_remote_description(
        &self,
        desc: &SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.peer_connection
            .set_remote_description(to_rtc(desc)?)
            .await
            .map_err(backend_err)
    }

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<(), NegotiationError> {
        self.peer_connection
            .add_ice_candidate(candidate.clone().into())
            .await
            .map_err(backend_err)
    }

    async fn attach_track(&self, track: &Arc<MediaTrack>) -> Result<(), NegotiationError> {
        let Some(sink) = track.sink() else {
            warn!("Track {} has no sink, not sending it", track.id());
            return Ok(());
        };
        let local: Arc<dyn TrackLocal + Send + Sync> = sink.clone();
        self.peer_connection
            .add_track(local)
            .await
            .map_err(backend_err)?;
        Ok(())
    }

    async fn close(&self) -> Result<(), NegotiationError> {
        self.peer_connection.close().await.map_err(backend_err)
    }
}
