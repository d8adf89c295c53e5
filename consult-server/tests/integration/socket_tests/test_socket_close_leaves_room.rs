use std::sync::Arc;

use consult_core::{RoomId, ServerFrame, ServerMessage};
use consult_server::AppState;
use futures::SinkExt;
use tokio_tungstenite::tungstenite::Message;

use crate::integration::socket_tests::{Socket, next_frame, open, spawn_server};
use crate::integration::{init_tracing, users};

async fn join(socket: &mut Socket, user: &str) {
    let text = format!(r#"{{"action":"join","user_id":"{user}"}}"#);
    socket.send(Message::Text(text.into())).await.unwrap();
}

/// Reads until a roster equal to `expected` shows up.
async fn wait_for_presence(socket: &mut Socket, expected: &[&str]) {
    let expected = users(expected);
    loop {
        if let ServerFrame::Control(ServerMessage::PresenceUpdate { users }) =
            next_frame(socket).await
            && users == expected
        {
            return;
        }
    }
}

#[tokio::test]
async fn test_dropped_socket_leaves_room() {
    init_tracing();
    let state = Arc::new(AppState::default());
    let addr = spawn_server(state.clone()).await;
    let room = RoomId::from("appt-42");

    let mut smith = open(addr, "appt-42", None).await;
    join(&mut smith, "dr-smith").await;
    wait_for_presence(&mut smith, &["dr-smith"]).await;

    let mut patient = open(addr, "appt-42", None).await;
    join(&mut patient, "patient-7").await;
    wait_for_presence(&mut patient, &["dr-smith", "patient-7"]).await;
    wait_for_presence(&mut smith, &["dr-smith", "patient-7"]).await;

    // No close handshake: the TCP stream just goes away.
    drop(patient);

    wait_for_presence(&mut smith, &["dr-smith"]).await;
    assert_eq!(state.room_manager.roster(&room), users(&["dr-smith"]));
}

#[tokio::test]
async fn test_offer_relayed_between_sockets() {
    init_tracing();
    let addr = spawn_server(Arc::new(AppState::default())).await;

    let mut smith = open(addr, "appt-42", None).await;
    join(&mut smith, "dr-smith").await;
    wait_for_presence(&mut smith, &["dr-smith"]).await;
    let mut patient = open(addr, "appt-42", None).await;
    join(&mut patient, "patient-7").await;
    wait_for_presence(&mut smith, &["dr-smith", "patient-7"]).await;
    wait_for_presence(&mut patient, &["dr-smith", "patient-7"]).await;

    let offer = r#"{"action":"offer","user_id":"spoofed","target_user":"patient-7","sdp":{"type":"offer","sdp":"v=0"}}"#;
    smith.send(Message::Text(offer.to_owned().into())).await.unwrap();

    let ServerFrame::Signal(envelope) = next_frame(&mut patient).await else {
        panic!("expected the relayed offer");
    };
    assert_eq!(envelope.user_id.as_str(), "dr-smith");
    assert_eq!(envelope.payload.action(), "offer");
}
