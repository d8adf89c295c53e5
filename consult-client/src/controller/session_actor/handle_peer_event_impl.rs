use crate::backend::{PeerConnectionState, PeerEvent, PeerEventKind};
use crate::controller::call_event::{CallEvent, EndReason};
use crate::controller::session_actor::SessionActor;
use crate::controller::session_state::CallPhase;
use consult_core::SignalPayload;
use tracing::{debug, info, warn};

impl SessionActor {
    pub(super) async fn handle_peer_event(&mut self, event: PeerEvent) {
        let Some(call) = self
            .call
            .as_mut()
            .filter(|c| c.negotiator.call_id() == event.call_id)
        else {
            debug!("Dropping event from stale connection {}", event.call_id);
            return;
        };
        let peer = call.peer.clone();

        match event.kind {
            PeerEventKind::LocalCandidate(candidate) => {
                let _ = self.send_signal(Some(peer), SignalPayload::IceCandidate { candidate });
            }

            PeerEventKind::RemoteTrack(track) => {
                info!("Remote {} track from {}", track.kind, peer);
                call.remote_tracks.push(track.clone());
                self.emit(CallEvent::RemoteTrack { peer, track });
            }

            PeerEventKind::ConnectionState(state) => match state {
                PeerConnectionState::Connected => {
                    call.transport_connected = true;
                    self.check_connected();
                }
                PeerConnectionState::Disconnected => {
                    warn!("Connection to {} interrupted, waiting for recovery", peer);
                }
                PeerConnectionState::Failed | PeerConnectionState::Closed => {
                    warn!("Connection to {} {:?}", peer, state);
                    self.emit(CallEvent::Failed {
                        message: format!("The connection to {peer} was lost"),
                    });
                    self.end_call(EndReason::ConnectionFailed, true).await;
                }
                PeerConnectionState::New | PeerConnectionState::Connecting => {}
            },
        }
    }

    /// Announces the call once media flows and negotiation has settled.
    pub(super) fn check_connected(&mut self) {
        let Some(call) = self.call.as_mut() else {
            return;
        };
        if call.announced || !call.transport_connected || !call.negotiator.is_ready() {
            return;
        }
        call.announced = true;
        let peer = call.peer.clone();
        info!("{} in call with {}", self.user_id, peer);
        self.set_phase(CallPhase::InCall);
        self.emit(CallEvent::Connected { peer });
    }
}
