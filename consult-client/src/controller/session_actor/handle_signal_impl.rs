use crate::controller::call_event::{CallEvent, EndReason};
use crate::controller::session_actor::{ActiveCall, SessionActor};
use crate::controller::session_state::CallPhase;
use crate::error::{CallError, NegotiationError};
use crate::negotiator::{AnswerOutcome, CandidateOutcome, OfferOutcome};
use consult_core::{
    IceCandidate, ServerFrame, ServerMessage, SessionDescription, SignalEnvelope, SignalPayload,
    UserId,
};
use tracing::{debug, info, warn};

impl SessionActor {
    pub(super) async fn handle_frame(&mut self, frame: ServerFrame) {
        match frame {
            ServerFrame::Control(ServerMessage::PresenceUpdate { users }) => {
                self.on_roster(users).await;
            }

            ServerFrame::Control(ServerMessage::IceConfig { ice_servers }) => {
                info!("Received ICE config: {} server(s)", ice_servers.len());
                if !ice_servers.is_empty() {
                    self.ice_servers = ice_servers;
                }
            }

            ServerFrame::Control(ServerMessage::JoinRejected { room, reason }) => {
                warn!("Room {} rejected {}: {}", room, self.user_id, reason);
                let message = format!("Could not join the call: {reason}");
                self.shut_down(
                    EndReason::SessionLeft,
                    CallError::Rejected { room, reason },
                    message,
                )
                .await;
            }

            ServerFrame::Signal(envelope) => self.handle_signal(envelope).await,
        }
    }

    async fn handle_signal(&mut self, envelope: SignalEnvelope) {
        if envelope.user_id == self.user_id {
            return;
        }
        if let Some(target) = &envelope.target_user
            && target != &self.user_id
        {
            debug!("Dropping {} meant for {}", envelope.payload.action(), target);
            return;
        }

        let from = envelope.user_id;
        match envelope.payload {
            SignalPayload::Offer { sdp } => self.on_offer(from, sdp).await,
            SignalPayload::Answer { sdp } => self.on_answer(from, sdp).await,
            SignalPayload::IceCandidate { candidate } => self.on_candidate(from, candidate).await,
            SignalPayload::Leave => self.on_remote_leave(from).await,
            SignalPayload::Join => debug!("{} announced itself", from),
        }
    }

    async fn on_roster(&mut self, users: Vec<UserId>) {
        debug!("Roster for {}: {:?}", self.room_id, users);
        self.roster_tx.send_replace(users.clone());

        let peer_gone = self
            .call
            .as_ref()
            .is_some_and(|call| !users.contains(&call.peer));
        self.emit(CallEvent::RosterChanged(users));

        if peer_gone {
            info!("{}: peer left the room, ending call", self.user_id);
            self.end_call(EndReason::PeerLeft, false).await;
        }
    }

    async fn on_offer(&mut self, from: UserId, offer: SessionDescription) {
        match self.call.as_ref().map(|c| c.peer.clone()) {
            Some(current) if current != from => {
                warn!(
                    "{}: ignoring offer from {} while in a call with {}",
                    self.user_id, from, current
                );
                return;
            }
            Some(_) => {}
            None => {
                if let Err(e) = self.accept_incoming(from.clone()).await {
                    if self.call.is_none() {
                        let _ = self.send_signal(Some(from), SignalPayload::Leave);
                    }
                    self.abort_call(&e).await;
                    return;
                }
            }
        }

        let Some(call) = self.call.as_mut() else {
            return;
        };
        let first = call.negotiator.receive_offer(offer).await;
        let outcome = match first {
            Ok(OfferOutcome::GlareYielded(offer)) => self.answer_on_fresh_connection(offer).await,
            other => other,
        };

        match outcome {
            Ok(OfferOutcome::Answered(answer)) => {
                info!("{} answering {}", self.user_id, from);
                if self
                    .send_signal(Some(from), SignalPayload::Answer { sdp: answer })
                    .is_ok()
                {
                    self.check_connected();
                }
            }
            Ok(OfferOutcome::GlareKeptLocal | OfferOutcome::GlareYielded(_)) => {}
            Err(e) => self.abort_call(&e).await,
        }
    }

    /// Our offer lost glare and its connection is closed. Rebuild the call
    /// on a new connection and apply the winning offer there.
    async fn answer_on_fresh_connection(
        &mut self,
        offer: SessionDescription,
    ) -> Result<OfferOutcome, NegotiationError> {
        self.replace_connection().await?;
        let Some(call) = self.call.as_mut() else {
            return Err(NegotiationError::Closed);
        };
        call.negotiator.receive_offer(offer).await
    }

    /// Creates the connection for an unsolicited offer and attaches
    /// whatever local media is live.
    async fn accept_incoming(&mut self, from: UserId) -> Result<(), NegotiationError> {
        self.emit(CallEvent::IncomingCall { from: from.clone() });

        let negotiator = self.new_negotiator(from.clone()).await?;
        self.call = Some(ActiveCall::new(from, negotiator));
        self.set_phase(CallPhase::Negotiating);

        let tracks = self.live_tracks();
        if tracks.is_empty() {
            warn!("{}: answering without local media", self.user_id);
        }
        if let Some(call) = self.call.as_mut() {
            for track in &tracks {
                call.negotiator.attach_track(track).await?;
            }
        }
        Ok(())
    }

    async fn on_answer(&mut self, from: UserId, answer: SessionDescription) {
        let Some(call) = self.call.as_mut().filter(|c| c.peer == from) else {
            warn!("{}: answer from {} matches no call", self.user_id, from);
            return;
        };
        match call.negotiator.receive_answer(answer).await {
            Ok(AnswerOutcome::Applied) => self.check_connected(),
            Ok(AnswerOutcome::IgnoredDuplicate) => {}
            Err(e) => self.abort_call(&e).await,
        }
    }

    async fn on_candidate(&mut self, from: UserId, candidate: IceCandidate) {
        let Some(call) = self.call.as_mut().filter(|c| c.peer == from) else {
            debug!("{}: candidate from {} matches no call", self.user_id, from);
            return;
        };
        match call.negotiator.add_remote_candidate(candidate).await {
            Ok(CandidateOutcome::Applied) => debug!("Applied candidate from {}", from),
            Ok(CandidateOutcome::Queued) => debug!("Queued candidate from {}", from),
            Err(NegotiationError::Closed) => {}
            Err(e) => warn!("{}: candidate from {} rejected: {}", self.user_id, from, e),
        }
    }

    async fn on_remote_leave(&mut self, from: UserId) {
        if self.call.as_ref().is_some_and(|c| c.peer == from) {
            info!("{} hung up", from);
            self.end_call(EndReason::RemoteHangup, false).await;
        } else {
            debug!("{}: leave from {} matches no call", self.user_id, from);
        }
    }
}
