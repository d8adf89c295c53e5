use consult_client::{CallError, CallPhase, MediaAccessError, MediaConstraints, SessionState};
use consult_core::UserId;

use crate::integration::{TestClient, create_server, eventually, init_tracing, wait_for_roster};

#[tokio::test]
async fn test_denied_media_blocks_call() {
    init_tracing();
    let server = create_server();
    let a = TestClient::new(&server);
    let b = TestClient::new(&server);
    let smith = a.join("appt-42", "dr-smith").await;
    b.join("appt-42", "patient-7").await;
    wait_for_roster(&smith, &["dr-smith", "patient-7"]).await;
    a.media.deny(MediaAccessError::PermissionDenied);

    let err = smith
        .start_local_media(MediaConstraints::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CallError::MediaAccess(MediaAccessError::PermissionDenied)
    );

    let err = smith.call(UserId::from("patient-7")).await.unwrap_err();
    assert!(matches!(err, CallError::NotReady(_)));
    assert_eq!(a.backends.created(), 0);
    assert_eq!(smith.state(), SessionState::Joined(CallPhase::Idle));
}

#[tokio::test]
async fn test_media_arriving_after_end_call_is_released() {
    init_tracing();
    let server = create_server();
    let a = TestClient::new(&server);
    let smith = a.join("appt-42", "dr-smith").await;
    let gate = a.media.hold();

    let pending = {
        let smith = smith.clone();
        tokio::spawn(async move { smith.start_local_media(MediaConstraints::default()).await })
    };
    eventually("acquisition starts", || a.media.acquisitions() == 1).await;

    smith.end_call().await.unwrap();
    gate.notify_one();

    let result = pending.await.unwrap();
    assert_eq!(result, Err(CallError::Cancelled));
    assert!(a.media.all_stopped());
    assert!(smith.local_tracks().is_empty());
}

#[tokio::test]
async fn test_mute_toggles_tracks_without_stopping() {
    init_tracing();
    let server = create_server();
    let a = TestClient::new(&server);
    let smith = a.join("appt-42", "dr-smith").await;

    assert!(!smith.set_video_enabled(false).await.unwrap());

    smith
        .start_local_media(MediaConstraints::audio_only())
        .await
        .unwrap();
    assert!(smith.set_audio_enabled(false).await.unwrap());
    assert!(!smith.set_video_enabled(false).await.unwrap());

    let tracks = smith.local_tracks();
    assert_eq!(tracks.len(), 1);
    assert!(!tracks[0].is_enabled());
    assert!(!tracks[0].is_stopped());

    assert!(smith.set_audio_enabled(true).await.unwrap());
    assert!(tracks[0].is_enabled());
}

#[tokio::test]
async fn test_restarting_media_replaces_previous_tracks() {
    init_tracing();
    let server = create_server();
    let a = TestClient::new(&server);
    let smith = a.join("appt-42", "dr-smith").await;

    smith.start_local_media(MediaConstraints::default()).await.unwrap();
    let first = smith.local_tracks();
    smith.start_local_media(MediaConstraints::default()).await.unwrap();

    assert!(first.iter().all(|t| t.is_stopped()));
    assert!(smith.local_tracks().iter().all(|t| !t.is_stopped()));
}
