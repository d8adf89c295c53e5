pub mod test_real_call;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use consult_client::{
    CallController, ClientConfig, SampleTrackDevices, SessionHandle, SessionState, TokenProvider,
    WebRtcBackendFactory, WsTransport,
};
use consult_core::{RoomId, UserId};
use consult_server::{AllowAnyToken, AppState, ServerConfig, TokenVerifier, serve_on};
use tokio::net::TcpListener;

/// Real ICE needs longer than the in-process budget.
const CONNECT_WAIT: Duration = Duration::from_secs(15);

/// A signaling server on an ephemeral loopback port that pushes no ICE
/// servers, so peers connect over host candidates only.
pub async fn spawn_server_with(verifier: Arc<dyn TokenVerifier>) -> SocketAddr {
    let state = Arc::new(AppState::new(
        ServerConfig {
            ice_servers: Vec::new(),
            ..Default::default()
        },
        verifier,
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_on(listener, state));
    addr
}

pub async fn spawn_server() -> SocketAddr {
    spawn_server_with(Arc::new(AllowAnyToken)).await
}

/// A controller on the production stack: WebSocket signaling, webrtc-rs
/// connections and sample tracks.
pub fn real_controller(addr: SocketAddr, user: &str, tokens: Arc<dyn TokenProvider>) -> CallController {
    let url = format!("ws://{addr}");
    let config = ClientConfig {
        signaling_url: url.clone(),
        ice_servers: Vec::new(),
    };
    CallController::new(
        config,
        Arc::new(WsTransport::with_tokens(url, tokens)),
        Arc::new(SampleTrackDevices::new(user)),
        Arc::new(WebRtcBackendFactory),
    )
}

pub async fn join(controller: &CallController, room: &str, user: &str) -> SessionHandle {
    controller
        .join(RoomId::from(room), UserId::from(user))
        .await
        .expect("join failed")
}

pub async fn wait_connected(handle: &SessionHandle, expected: SessionState) {
    let mut states = handle.state_changes();
    tokio::time::timeout(CONNECT_WAIT, states.wait_for(|s| *s == expected))
        .await
        .unwrap_or_else(|_| panic!("{} never reached {:?}", handle.user_id(), expected))
        .expect("session state channel closed");
}
