pub mod session_tests;
pub mod socket_tests;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::Level;

use consult_client::{
    CallController, CallEvent, ClientConfig, SessionHandle, SessionState,
};
use consult_core::{RoomId, UserId};
use consult_server::{AppState, ServerConfig};

use crate::utils::{LocalTransport, MockBackendFactory, MockMediaDevices, MockOptions};

const WAIT: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_server() -> Arc<AppState> {
    Arc::new(AppState::default())
}

pub fn create_server_with(config: ServerConfig) -> Arc<AppState> {
    Arc::new(AppState::new(config, Arc::new(consult_server::AllowAnyToken)))
}

/// One browser tab: a controller wired to the shared in-process server.
pub struct TestClient {
    pub controller: CallController,
    pub transport: LocalTransport,
    pub backends: MockBackendFactory,
    pub media: MockMediaDevices,
}

impl TestClient {
    pub fn new(server: &Arc<AppState>) -> Self {
        Self::with_options(server, MockOptions::default())
    }

    pub fn with_options(server: &Arc<AppState>, options: MockOptions) -> Self {
        let transport = LocalTransport::new(server.clone());
        let backends = MockBackendFactory::with_options(options);
        let media = MockMediaDevices::new();
        let controller = CallController::new(
            ClientConfig::default(),
            Arc::new(transport.clone()),
            Arc::new(media.clone()),
            Arc::new(backends.clone()),
        );
        Self {
            controller,
            transport,
            backends,
            media,
        }
    }

    pub async fn join(&self, room: &str, user: &str) -> SessionHandle {
        self.controller
            .join(RoomId::from(room), UserId::from(user))
            .await
            .expect("join failed")
    }
}

pub fn users(ids: &[&str]) -> Vec<UserId> {
    ids.iter().map(|id| UserId::from(*id)).collect()
}

pub async fn wait_for_state(handle: &SessionHandle, expected: SessionState) {
    let mut states = handle.state_changes();
    tokio::time::timeout(WAIT, states.wait_for(|s| *s == expected))
        .await
        .unwrap_or_else(|_| panic!("{} never reached {:?}", handle.user_id(), expected))
        .expect("session state channel closed");
}

pub async fn wait_for_roster(handle: &SessionHandle, expected: &[&str]) {
    let mut expected = users(expected);
    expected.sort();
    let mut roster = handle.roster_changes();
    tokio::time::timeout(
        WAIT,
        roster.wait_for(|r| {
            let mut r = r.clone();
            r.sort();
            r == expected
        }),
    )
    .await
    .unwrap_or_else(|_| panic!("{} never saw roster {:?}", handle.user_id(), expected))
    .expect("roster channel closed");
}

/// Polls `check` until it holds or the wait budget runs out.
pub async fn eventually(what: &str, check: impl Fn() -> bool) {
    let poll = async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    if tokio::time::timeout(WAIT, poll).await.is_err() {
        panic!("timed out waiting for {what}");
    }
}

pub async fn next_event(
    rx: &mut broadcast::Receiver<CallEvent>,
    matches: impl Fn(&CallEvent) -> bool,
) -> CallEvent {
    let find = async {
        loop {
            match rx.recv().await {
                Ok(event) if matches(&event) => return event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(e) => panic!("event stream ended: {e}"),
            }
        }
    };
    tokio::time::timeout(WAIT, find)
        .await
        .expect("expected event never arrived")
}

/// Everything already delivered to `rx`, without waiting.
pub fn drain_events(rx: &mut broadcast::Receiver<CallEvent>) -> Vec<CallEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

/// Two joined users with local media on, ready to call each other.
pub async fn two_party(
    server: &Arc<AppState>,
    room: &str,
    caller: &str,
    callee: &str,
) -> (TestClient, SessionHandle, TestClient, SessionHandle) {
    let a = TestClient::new(server);
    let b = TestClient::new(server);
    let a_session = a.join(room, caller).await;
    let b_session = b.join(room, callee).await;
    wait_for_roster(&a_session, &[caller, callee]).await;
    wait_for_roster(&b_session, &[caller, callee]).await;

    a_session
        .start_local_media(Default::default())
        .await
        .expect("caller media");
    b_session
        .start_local_media(Default::default())
        .await
        .expect("callee media");
    (a, a_session, b, b_session)
}
