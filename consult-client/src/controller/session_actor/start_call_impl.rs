use crate::controller::call_event::{CallEvent, EndReason};
use crate::controller::session_actor::{ActiveCall, SessionActor};
use crate::controller::session_state::CallPhase;
use crate::error::{CallError, NegotiationError};
use crate::negotiator::SessionNegotiator;
use crate::media::MediaTrack;
use consult_core::{CallId, SessionDescription, SignalPayload, UserId};
use std::sync::Arc;
use tracing::{error, info};

impl SessionActor {
    pub(super) async fn new_negotiator(
        &self,
        peer: UserId,
    ) -> Result<SessionNegotiator, NegotiationError> {
        let call_id = CallId::new();
        let backend = self
            .backends
            .create(call_id, &self.ice_servers, self.peer_tx.clone())
            .await?;
        Ok(SessionNegotiator::new(
            call_id,
            self.user_id.clone(),
            peer,
            backend,
        ))
    }

    /// Swaps the call's connection for a new one carrying the live local
    /// tracks. The old connection is closed; its late events carry a stale
    /// call id and are dropped.
    pub(super) async fn replace_connection(&mut self) -> Result<(), NegotiationError> {
        let Some(peer) = self.call.as_ref().map(|c| c.peer.clone()) else {
            return Err(NegotiationError::Closed);
        };
        let mut negotiator = self.new_negotiator(peer.clone()).await?;
        for track in self.live_tracks() {
            negotiator.attach_track(&track).await?;
        }

        let Some(call) = self.call.as_mut() else {
            negotiator.close().await;
            return Err(NegotiationError::Closed);
        };
        let mut previous = std::mem::replace(call, ActiveCall::new(peer, negotiator));
        previous.negotiator.close().await;
        info!(
            "{}: call {} replaced by {}",
            self.user_id,
            previous.negotiator.call_id(),
            call.negotiator.call_id()
        );
        Ok(())
    }

    pub(super) async fn start_call(&mut self, target: UserId) -> Result<(), CallError> {
        if !self.sender.is_open() {
            return Err(CallError::NotReady("signaling connection is not open"));
        }
        let Some(media) = self.media.as_ref().filter(|m| !m.is_stopped()) else {
            return Err(CallError::NotReady("local media has not been started"));
        };
        if target == self.user_id {
            return Err(CallError::NotReady("cannot call yourself"));
        }
        if !self.roster_tx.borrow().contains(&target) {
            return Err(CallError::NotReady("that user is not in the room"));
        }
        if let Some(call) = &self.call {
            return Err(NegotiationError::InvalidState {
                op: "create offer",
                state: call.negotiator.state(),
            }
            .into());
        }

        let tracks = media.tracks().to_vec();
        let negotiator = self.new_negotiator(target.clone()).await?;
        self.call = Some(ActiveCall::new(target.clone(), negotiator));
        self.set_phase(CallPhase::Negotiating);

        let offer = match self.prepare_offer(&tracks).await {
            Ok(offer) => offer,
            Err(e) => {
                self.abort_call(&e).await;
                return Err(e.into());
            }
        };

        info!("{} sending offer to {}", self.user_id, target);
        self.send_signal(Some(target), SignalPayload::Offer { sdp: offer })?;
        Ok(())
    }

    async fn prepare_offer(
        &mut self,
        tracks: &[Arc<MediaTrack>],
    ) -> Result<SessionDescription, NegotiationError> {
        let Some(call) = self.call.as_mut() else {
            return Err(NegotiationError::Closed);
        };
        for track in tracks {
            call.negotiator.attach_track(track).await?;
        }
        call.negotiator.create_offer().await
    }

    /// Reports a negotiation failure and tears the call down.
    pub(super) async fn abort_call(&mut self, err: &NegotiationError) {
        error!("{}: call negotiation failed: {}", self.user_id, err);
        self.emit(CallEvent::Failed {
            message: format!("The call could not be established: {err}"),
        });
        self.end_call(EndReason::NegotiationFailed, true).await;
    }
}
