use crate::backend::PeerBackend;
use crate::error::NegotiationError;
use crate::media::MediaTrack;
use crate::negotiator::candidate_queue::CandidateQueue;
use crate::negotiator::negotiation_state::NegotiationState;
use consult_core::{CallId, IceCandidate, SdpType, SessionDescription, UserId};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferOutcome {
    /// The offer was applied; send this answer back to the offerer.
    Answered(SessionDescription),
    /// Both sides offered at once and ours wins; the remote offer is dropped.
    GlareKeptLocal,
    /// Both sides offered at once and the remote wins. This connection is
    /// closed; answer the returned offer on a fresh one.
    GlareYielded(SessionDescription),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Applied,
    IgnoredDuplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOutcome {
    Applied,
    Queued,
}

/// Drives one peer connection through offer/answer.
///
/// Remote candidates are applied only once the connection is `Stable`.
/// Earlier ones wait in a [`CandidateQueue`] which is drained, in arrival
/// order, the moment `Stable` is reached. Operations issued in the wrong
/// state are rejected without touching the backend. A backend failure or a
/// description of the wrong type closes the connection.
pub struct SessionNegotiator {
    call_id: CallId,
    local_user: UserId,
    remote_user: UserId,
    state: NegotiationState,
    backend: Box<dyn PeerBackend>,
    pending: CandidateQueue,
    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,
    applied_candidates: usize,
}

impl SessionNegotiator {
    pub fn new(
        call_id: CallId,
        local_user: UserId,
        remote_user: UserId,
        backend: Box<dyn PeerBackend>,
    ) -> Self {
        Self {
            call_id,
            local_user,
            remote_user,
            state: NegotiationState::Idle,
            backend,
            pending: CandidateQueue::new(),
            local_description: None,
            remote_description: None,
            applied_candidates: 0,
        }
    }

    pub fn call_id(&self) -> CallId {
        self.call_id
    }

    pub fn remote_user(&self) -> &UserId {
        &self.remote_user
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local_description.as_ref()
    }

    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote_description.as_ref()
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending.len()
    }

    pub fn applied_candidates(&self) -> usize {
        self.applied_candidates
    }

    /// Both descriptions are set and no remote candidate is waiting.
    pub fn is_ready(&self) -> bool {
        self.state == NegotiationState::Stable && self.pending.is_empty()
    }

    /// Glare rule: the lexicographically lower user id keeps its offer.
    pub fn wins_glare(&self) -> bool {
        self.local_user < self.remote_user
    }

    fn reject(&self, op: &'static str) -> NegotiationError {
        match self.state {
            NegotiationState::Closed => NegotiationError::Closed,
            state => {
                warn!("Call {}: cannot {} while {}", self.call_id, op, state);
                NegotiationError::InvalidState { op, state }
            }
        }
    }

    async fn fail(&mut self, op: &'static str, err: NegotiationError) -> NegotiationError {
        error!("Call {}: {} failed: {}", self.call_id, op, err);
        self.close().await;
        err
    }

    pub async fn attach_track(&mut self, track: &Arc<MediaTrack>) -> Result<(), NegotiationError> {
        if self.state == NegotiationState::Closed {
            return Err(NegotiationError::Closed);
        }
        if let Err(e) = self.backend.attach_track(track).await {
            return Err(self.fail("attach track", e).await);
        }
        debug!("Call {}: attached {} track {}", self.call_id, track.kind(), track.id());
        Ok(())
    }

    pub async fn create_offer(&mut self) -> Result<SessionDescription, NegotiationError> {
        if self.state != NegotiationState::Idle {
            return Err(self.reject("create offer"));
        }

        let offer = match self.backend.create_offer().await {
            Ok(offer) => offer,
            Err(e) => return Err(self.fail("create offer", e).await),
        };
        if let Err(e) = self.backend.set_local_description(&offer).await {
            return Err(self.fail("set local offer", e).await);
        }

        self.local_description = Some(offer.clone());
        self.state = NegotiationState::HaveLocalOffer;
        info!("Call {}: offer created for {}", self.call_id, self.remote_user);
        Ok(offer)
    }

    /// Applies a remote offer and answers it. If we have an outstanding
    /// offer of our own, glare is resolved first.
    pub async fn receive_offer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<OfferOutcome, NegotiationError> {
        if self.state == NegotiationState::Closed {
            return Err(NegotiationError::Closed);
        }
        if offer.sdp_type != SdpType::Offer {
            let err = NegotiationError::Malformed(
                "offer message carries a non-offer description".to_owned(),
            );
            return Err(self.fail("accept offer", err).await);
        }

        match self.state {
            NegotiationState::Idle => {}
            NegotiationState::HaveLocalOffer if self.wins_glare() => {
                warn!(
                    "Call {}: glare with {}, keeping local offer",
                    self.call_id, self.remote_user
                );
                return Ok(OfferOutcome::GlareKeptLocal);
            }
            NegotiationState::HaveLocalOffer => {
                warn!(
                    "Call {}: glare with {}, yielding to the remote offer",
                    self.call_id, self.remote_user
                );
                self.close().await;
                return Ok(OfferOutcome::GlareYielded(offer));
            }
            _ => return Err(self.reject("accept offer")),
        }

        if let Err(e) = self.backend.set_remote_description(&offer).await {
            return Err(self.fail("set remote offer", e).await);
        }
        self.remote_description = Some(offer);
        self.state = NegotiationState::HaveRemoteOffer;

        let answer = self.create_answer().await?;
        Ok(OfferOutcome::Answered(answer))
    }

    pub async fn create_answer(&mut self) -> Result<SessionDescription, NegotiationError> {
        if self.state != NegotiationState::HaveRemoteOffer {
            return Err(self.reject("create answer"));
        }

        let answer = match self.backend.create_answer().await {
            Ok(answer) => answer,
            Err(e) => return Err(self.fail("create answer", e).await),
        };
        if let Err(e) = self.backend.set_local_description(&answer).await {
            return Err(self.fail("set local answer", e).await);
        }

        self.local_description = Some(answer.clone());
        self.enter_stable().await;
        Ok(answer)
    }

    pub async fn receive_answer(
        &mut self,
        answer: SessionDescription,
    ) -> Result<AnswerOutcome, NegotiationError> {
        if self.state == NegotiationState::Closed {
            return Err(NegotiationError::Closed);
        }
        if answer.sdp_type != SdpType::Answer {
            let err = NegotiationError::Malformed(
                "answer message carries a non-answer description".to_owned(),
            );
            return Err(self.fail("accept answer", err).await);
        }

        match self.state {
            NegotiationState::HaveLocalOffer => {}
            NegotiationState::Stable => {
                warn!(
                    "Call {}: duplicate answer from {} ignored",
                    self.call_id, self.remote_user
                );
                return Ok(AnswerOutcome::IgnoredDuplicate);
            }
            _ => return Err(self.reject("accept answer")),
        }

        if let Err(e) = self.backend.set_remote_description(&answer).await {
            return Err(self.fail("set remote answer", e).await);
        }
        self.remote_description = Some(answer);
        self.enter_stable().await;
        Ok(AnswerOutcome::Applied)
    }

    /// Applies `candidate` now if the connection is stable, otherwise queues
    /// it. A candidate the backend refuses is reported but does not close
    /// the connection.
    pub async fn add_remote_candidate(
        &mut self,
        candidate: IceCandidate,
    ) -> Result<CandidateOutcome, NegotiationError> {
        match self.state {
            NegotiationState::Closed => Err(NegotiationError::Closed),
            NegotiationState::Stable => {
                self.backend.add_ice_candidate(&candidate).await?;
                self.applied_candidates += 1;
                Ok(CandidateOutcome::Applied)
            }
            state => {
                debug!("Call {}: queueing candidate while {}", self.call_id, state);
                self.pending.enqueue(candidate);
                Ok(CandidateOutcome::Queued)
            }
        }
    }

    async fn enter_stable(&mut self) {
        self.state = NegotiationState::Stable;
        info!("Call {}: negotiation with {} is stable", self.call_id, self.remote_user);
        let report = self.pending.drain_into(self.backend.as_ref()).await;
        self.applied_candidates += report.applied;
    }

    /// Idempotent.
    pub async fn close(&mut self) {
        if self.state == NegotiationState::Closed {
            return;
        }
        self.state = NegotiationState::Closed;
        self.pending.clear();
        if let Err(e) = self.backend.close().await {
            warn!("Call {}: error while closing peer connection: {}", self.call_id, e);
        }
        info!("Call {}: peer connection closed", self.call_id);
    }
}
