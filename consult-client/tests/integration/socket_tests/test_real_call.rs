use std::sync::Arc;

use consult_client::{CallError, CallPhase, FixedToken, NoToken, SessionState, TransportError};
use consult_core::{RoomId, UserId};
use consult_server::StaticToken;

use crate::integration::socket_tests::{
    join, real_controller, spawn_server, spawn_server_with, wait_connected,
};
use crate::integration::{init_tracing, wait_for_roster};

const IN_CALL: SessionState = SessionState::Joined(CallPhase::InCall);
const IDLE: SessionState = SessionState::Joined(CallPhase::Idle);

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_call_connects_over_real_stack() {
    init_tracing();
    let addr = spawn_server().await;
    let a = real_controller(addr, "dr-smith", Arc::new(NoToken));
    let b = real_controller(addr, "patient-7", Arc::new(NoToken));
    let smith = join(&a, "appt-42", "dr-smith").await;
    let patient = join(&b, "appt-42", "patient-7").await;
    wait_for_roster(&smith, &["dr-smith", "patient-7"]).await;
    smith.start_local_media(Default::default()).await.unwrap();
    patient.start_local_media(Default::default()).await.unwrap();

    smith.call(UserId::from("patient-7")).await.unwrap();

    wait_connected(&smith, IN_CALL).await;
    wait_connected(&patient, IN_CALL).await;

    smith.end_call().await.unwrap();
    wait_connected(&patient, IDLE).await;
    assert!(patient.local_tracks().is_empty());

    a.shutdown().await;
    b.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_glare_connects_over_real_stack() {
    init_tracing();
    let addr = spawn_server().await;
    let a = real_controller(addr, "alice", Arc::new(NoToken));
    let b = real_controller(addr, "bob", Arc::new(NoToken));
    let alice = join(&a, "appt-42", "alice").await;
    let bob = join(&b, "appt-42", "bob").await;
    wait_for_roster(&alice, &["alice", "bob"]).await;
    wait_for_roster(&bob, &["alice", "bob"]).await;
    alice.start_local_media(Default::default()).await.unwrap();
    bob.start_local_media(Default::default()).await.unwrap();

    // Either side may already be answering when its own call runs; only
    // the outcome matters.
    let _ = tokio::join!(
        alice.call(UserId::from("bob")),
        bob.call(UserId::from("alice"))
    );

    wait_connected(&alice, IN_CALL).await;
    wait_connected(&bob, IN_CALL).await;
    assert!(alice.failure().is_none());
    assert!(bob.failure().is_none());

    a.shutdown().await;
    b.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_join_needs_the_server_token() {
    init_tracing();
    let addr = spawn_server_with(Arc::new(StaticToken("s3cret".to_owned()))).await;

    let anonymous = real_controller(addr, "dr-smith", Arc::new(NoToken));
    let err = anonymous
        .join(RoomId::from("appt-42"), UserId::from("dr-smith"))
        .await
        .err()
        .expect("a join without the token must fail");
    assert!(matches!(
        err,
        CallError::Transport(TransportError::Connect(_))
    ));

    let trusted = real_controller(addr, "dr-smith", Arc::new(FixedToken("s3cret".to_owned())));
    let session = join(&trusted, "appt-42", "dr-smith").await;
    assert_eq!(session.state(), IDLE);
    trusted.shutdown().await;
}
