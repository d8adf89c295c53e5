use consult_core::{IceServerConfig, RoomId, ServerFrame, ServerMessage};
use consult_server::{AllowAnyToken, AppState, ServerConfig};
use std::sync::Arc;

use crate::integration::{init_tracing, users};

#[tokio::test]
async fn test_ice_config_is_first_frame() {
    init_tracing();
    let turn = IceServerConfig {
        urls: vec!["turn:turn.example.org:3478".into()],
        username: Some("svc".into()),
        credential: Some("secret".into()),
    };
    let state = AppState::new(
        ServerConfig {
            ice_servers: vec![turn.clone()],
            ..Default::default()
        },
        Arc::new(AllowAnyToken),
    );
    let room = RoomId::from("appt-42");

    let (connection, mut frames) = state.open_connection();
    state.dispatch_text(&room, &connection, r#"{"action":"join","user_id":"dr-smith"}"#);

    assert_eq!(
        frames.recv().await,
        Some(ServerFrame::Control(ServerMessage::IceConfig {
            ice_servers: vec![turn]
        }))
    );
    assert_eq!(
        frames.recv().await,
        Some(ServerFrame::Control(ServerMessage::PresenceUpdate {
            users: users(&["dr-smith"])
        }))
    );
}

#[tokio::test]
async fn test_garbage_text_is_ignored() {
    init_tracing();
    let state = AppState::default();
    let room = RoomId::from("appt-42");
    let (connection, _frames) = state.open_connection();

    state.dispatch_text(&room, &connection, "not json");
    state.dispatch_text(&room, &connection, r#"{"action":"teleport","user_id":"x"}"#);

    assert_eq!(state.room_manager.room_count(), 0);
}

#[tokio::test]
async fn test_close_connection_leaves_room() {
    init_tracing();
    let state = AppState::default();
    let room = RoomId::from("appt-42");
    let (smith, _smith_frames) = state.open_connection();
    let (patient, mut patient_frames) = state.open_connection();
    state.dispatch_text(&room, &smith, r#"{"action":"join","user_id":"dr-smith"}"#);
    state.dispatch_text(&room, &patient, r#"{"action":"join","user_id":"patient-7"}"#);

    state.close_connection(&room, &smith);

    assert_eq!(state.room_manager.roster(&room), users(&["patient-7"]));
    assert_eq!(state.signaling.connection_count(), 1);
    let mut last = None;
    while let Ok(frame) = patient_frames.try_recv() {
        last = Some(frame);
    }
    assert_eq!(
        last,
        Some(ServerFrame::Control(ServerMessage::PresenceUpdate {
            users: users(&["patient-7"])
        }))
    );
}
