use consult_client::{
    MediaConstraints, MediaDevices, NegotiationState, OfferOutcome, SampleTrackDevices,
    SessionNegotiator, WebRtcBackend,
};
use consult_core::{CallId, SdpType, UserId};
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::integration::negotiator_tests::negotiator;
use crate::utils::{BackendCall, count};

#[tokio::test]
async fn test_lower_id_keeps_its_offer() {
    init_tracing();
    let (mut alice, alice_log) = negotiator("alice", "bob");
    let (mut bob, bob_log) = negotiator("bob", "alice");

    let alice_offer = alice.create_offer().await.unwrap();
    let bob_offer = bob.create_offer().await.unwrap();

    let at_alice = alice.receive_offer(bob_offer).await.unwrap();
    assert_eq!(at_alice, OfferOutcome::GlareKeptLocal);
    assert_eq!(alice.state(), NegotiationState::HaveLocalOffer);
    assert_eq!(count(&alice_log.lock().unwrap(), &BackendCall::Close), 0);

    let at_bob = bob.receive_offer(alice_offer.clone()).await.unwrap();
    assert_eq!(at_bob, OfferOutcome::GlareYielded(alice_offer.clone()));
    assert_eq!(bob.state(), NegotiationState::Closed);
    {
        let log = bob_log.lock().unwrap();
        assert_eq!(count(&log, &BackendCall::Close), 1);
        assert!(!log.contains(&BackendCall::SetRemote(SdpType::Offer)));
    }

    let (mut bob_again, fresh_log) = negotiator("bob", "alice");
    let OfferOutcome::Answered(answer) = bob_again.receive_offer(alice_offer).await.unwrap() else {
        panic!("a fresh connection answers the winning offer");
    };
    assert_eq!(bob_again.state(), NegotiationState::Stable);
    assert!(!fresh_log.lock().unwrap().contains(&BackendCall::CreateOffer));

    alice.receive_answer(answer).await.unwrap();
    assert_eq!(alice.state(), NegotiationState::Stable);
}

async fn webrtc_negotiator(local: &str, remote: &str) -> SessionNegotiator {
    let call_id = CallId::new();
    let (events, _rx) = mpsc::unbounded_channel();
    let backend = WebRtcBackend::new(call_id, &[], events)
        .await
        .expect("peer connection");
    let mut negotiator =
        SessionNegotiator::new(call_id, UserId::from(local), UserId::from(remote), Box::new(backend));

    let media = SampleTrackDevices::new(local)
        .acquire(MediaConstraints::audio_only())
        .await
        .expect("sample tracks");
    for track in media.tracks() {
        negotiator.attach_track(track).await.expect("attach");
    }
    negotiator
}

#[tokio::test(flavor = "multi_thread")]
async fn test_glare_settles_on_webrtc_connections() {
    init_tracing();
    let mut alice = webrtc_negotiator("alice", "bob").await;
    let mut bob = webrtc_negotiator("bob", "alice").await;

    let alice_offer = alice.create_offer().await.unwrap();
    let bob_offer = bob.create_offer().await.unwrap();

    assert_eq!(
        alice.receive_offer(bob_offer).await.unwrap(),
        OfferOutcome::GlareKeptLocal
    );
    let OfferOutcome::GlareYielded(winning) = bob.receive_offer(alice_offer).await.unwrap() else {
        panic!("bob holds the higher id and must yield");
    };
    assert_eq!(bob.state(), NegotiationState::Closed);

    let mut bob_again = webrtc_negotiator("bob", "alice").await;
    let OfferOutcome::Answered(answer) = bob_again.receive_offer(winning).await.unwrap() else {
        panic!("the replacement connection answers");
    };
    assert_eq!(answer.sdp_type, SdpType::Answer);
    alice.receive_answer(answer).await.unwrap();

    assert_eq!(alice.state(), NegotiationState::Stable);
    assert_eq!(bob_again.state(), NegotiationState::Stable);

    alice.close().await;
    bob_again.close().await;
}
