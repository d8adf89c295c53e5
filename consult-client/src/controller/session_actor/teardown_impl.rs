use crate::controller::call_event::{CallEvent, EndReason};
use crate::controller::session_actor::SessionActor;
use crate::controller::session_state::{CallPhase, SessionState};
use crate::error::{CallError, TransportError};
use consult_core::SignalPayload;
use tracing::{info, warn};

impl SessionActor {
    /// Releases every call-scoped resource and returns to `Idle`. Repeated
    /// calls only re-assert `Idle`.
    pub(super) async fn end_call(&mut self, reason: EndReason, notify_peer: bool) {
        if let Some(mut call) = self.call.take() {
            call.negotiator.close().await;
            if notify_peer && self.sender.is_open() {
                let _ = self.send_signal(Some(call.peer.clone()), SignalPayload::Leave);
            }
            info!("{}: call with {} ended ({:?})", self.user_id, call.peer, reason);
            self.emit(CallEvent::CallEnded {
                peer: call.peer,
                reason,
            });
        }

        self.media_epoch += 1;
        if let Some(media) = self.media.take() {
            media.stop();
            self.publish_tracks();
        }
        self.set_phase(CallPhase::Idle);
    }

    /// Voluntary exit: hang up, tell the room, close the connection.
    pub(super) async fn leave(&mut self) {
        if self.is_left() {
            return;
        }
        self.end_call(EndReason::SessionLeft, true).await;
        if self.sender.is_open() {
            let _ = self.send_signal(None, SignalPayload::Leave);
        }
        self.sender.close();
        self.state_tx.send_replace(SessionState::Left);
        info!("{} left room {}", self.user_id, self.room_id);
    }

    pub(super) async fn transport_lost(&mut self, reason: &str) {
        if self.is_left() {
            return;
        }
        warn!("{}: signaling lost: {}", self.user_id, reason);
        self.shut_down(
            EndReason::TransportLost,
            CallError::Transport(TransportError::Closed),
            "The connection to the call server was lost".to_owned(),
        )
        .await;
    }

    /// Forced exit after a failure the session cannot recover from.
    pub(super) async fn shut_down(&mut self, reason: EndReason, error: CallError, message: String) {
        self.end_call(reason, false).await;
        self.sender.close();
        self.failure_tx.send_replace(Some(error));
        self.emit(CallEvent::Failed { message });
        self.state_tx.send_replace(SessionState::Left);
    }
}
