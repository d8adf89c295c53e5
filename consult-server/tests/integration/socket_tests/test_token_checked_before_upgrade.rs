use std::sync::Arc;

use consult_core::{ServerFrame, ServerMessage};
use consult_server::{AppState, ServerConfig, StaticToken};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error;

use crate::integration::init_tracing;
use crate::integration::socket_tests::{next_frame, open, presence_url, spawn_server};

fn guarded_state() -> Arc<AppState> {
    Arc::new(AppState::new(
        ServerConfig::default(),
        Arc::new(StaticToken("s3cret".to_owned())),
    ))
}

#[tokio::test]
async fn test_wrong_token_gets_401() {
    init_tracing();
    let state = guarded_state();
    let addr = spawn_server(state.clone()).await;

    for token in [None, Some("guess")] {
        let err = connect_async(presence_url(addr, "appt-42", token))
            .await
            .err()
            .expect("upgrade must be refused");
        let Error::Http(response) = err else {
            panic!("expected an HTTP rejection, got {err:?}");
        };
        assert_eq!(response.status().as_u16(), 401);
    }
    assert_eq!(state.signaling.connection_count(), 0);
}

#[tokio::test]
async fn test_right_token_gets_ice_config() {
    init_tracing();
    let addr = spawn_server(guarded_state()).await;

    let mut socket = open(addr, "appt-42", Some("s3cret")).await;

    assert!(matches!(
        next_frame(&mut socket).await,
        ServerFrame::Control(ServerMessage::IceConfig { .. })
    ));
}
