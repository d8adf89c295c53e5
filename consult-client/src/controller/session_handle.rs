use crate::controller::call_event::CallEvent;
use crate::controller::session_command::SessionCommand;
use crate::controller::session_state::SessionState;
use crate::error::{CallError, TransportError};
use crate::media::{MediaConstraints, MediaDevices, MediaKind, MediaTrack};
use consult_core::{RoomId, UserId};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{info, warn};

const SESSION_GONE: CallError = CallError::NotReady("the session has left the room");

pub(crate) struct SessionWatches {
    pub state: watch::Receiver<SessionState>,
    pub roster: watch::Receiver<Vec<UserId>>,
    pub local_tracks: watch::Receiver<Vec<Arc<MediaTrack>>>,
    pub failure: watch::Receiver<Option<CallError>>,
    pub events: broadcast::Sender<CallEvent>,
}

struct HandleInner {
    room_id: RoomId,
    user_id: UserId,
    commands: mpsc::Sender<SessionCommand>,
    watches: SessionWatches,
    media: Arc<dyn MediaDevices>,
}

/// Caller-facing side of a joined room. Clones share one session; when the
/// last clone (and the owning controller) is dropped the session leaves.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<HandleInner>,
}

impl SessionHandle {
    pub(crate) fn new(
        room_id: RoomId,
        user_id: UserId,
        commands: mpsc::Sender<SessionCommand>,
        watches: SessionWatches,
        media: Arc<dyn MediaDevices>,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                room_id,
                user_id,
                commands,
                watches,
                media,
            }),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.inner.room_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.inner.user_id
    }

    pub fn state(&self) -> SessionState {
        *self.inner.watches.state.borrow()
    }

    pub fn is_left(&self) -> bool {
        self.state() == SessionState::Left
    }

    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.inner.watches.state.clone()
    }

    /// Latest presence snapshot, including this user.
    pub fn roster(&self) -> Vec<UserId> {
        self.inner.watches.roster.borrow().clone()
    }

    pub fn roster_changes(&self) -> watch::Receiver<Vec<UserId>> {
        self.inner.watches.roster.clone()
    }

    pub fn local_tracks(&self) -> Vec<Arc<MediaTrack>> {
        self.inner.watches.local_tracks.borrow().clone()
    }

    /// Why the session was forced out of the room, if it was.
    pub fn failure(&self) -> Option<CallError> {
        self.inner.watches.failure.borrow().clone()
    }

    /// Resolves once the server lists this user in the roster. Fails if the
    /// session ends first.
    pub(crate) async fn admitted(&self) -> Result<(), CallError> {
        let mut roster = self.roster_changes();
        let mut state = self.state_changes();
        loop {
            if self.is_left() {
                return Err(self
                    .failure()
                    .unwrap_or(CallError::Transport(TransportError::Closed)));
            }
            if roster.borrow_and_update().contains(&self.inner.user_id) {
                return Ok(());
            }
            let changed = tokio::select! {
                r = roster.changed() => r,
                r = state.changed() => r,
            };
            if changed.is_err() && !self.is_left() {
                return Err(CallError::Transport(TransportError::Closed));
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CallEvent> {
        self.inner.watches.events.subscribe()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, CallError> {
        let (reply, rx) = oneshot::channel();
        self.inner
            .commands
            .send(make(reply))
            .await
            .map_err(|_| SESSION_GONE)?;
        rx.await.map_err(|_| SESSION_GONE)
    }

    /// Opens local capture. If the call ends while devices are still being
    /// opened, the acquired tracks are stopped and `Cancelled` is returned.
    pub async fn start_local_media(&self, constraints: MediaConstraints) -> Result<(), CallError> {
        let epoch = self
            .request(|reply| SessionCommand::BeginMedia { reply })
            .await?;

        let media = self.inner.media.acquire(constraints).await.map_err(|e| {
            warn!("Local media unavailable for {}: {}", self.inner.user_id, e);
            CallError::MediaAccess(e)
        })?;

        // A failed send hands the session back inside the error; dropping
        // it stops the tracks.
        self.request(|reply| SessionCommand::AttachMedia {
            epoch,
            media,
            reply,
        })
        .await?
    }

    /// Offers a call to `target`. Requires local media and an open signaling
    /// connection.
    pub async fn call(&self, target: UserId) -> Result<(), CallError> {
        info!("{} calling {}", self.inner.user_id, target);
        self.request(|reply| SessionCommand::Call { target, reply })
            .await?
    }

    /// Hangs up and releases local media. Safe to call any number of times.
    pub async fn end_call(&self) -> Result<(), CallError> {
        match self.request(|reply| SessionCommand::EndCall { reply }).await {
            Err(CallError::NotReady(_)) => Ok(()),
            other => other,
        }
    }

    /// Leaves the room. Safe to call any number of times.
    pub async fn leave(&self) -> Result<(), CallError> {
        match self.request(|reply| SessionCommand::Leave { reply }).await {
            Err(CallError::NotReady(_)) => Ok(()),
            other => other,
        }
    }

    /// Returns `false` when there is no local audio track to switch.
    pub async fn set_audio_enabled(&self, enabled: bool) -> Result<bool, CallError> {
        self.set_track_enabled(MediaKind::Audio, enabled).await
    }

    /// Returns `false` when there is no local video track to switch.
    pub async fn set_video_enabled(&self, enabled: bool) -> Result<bool, CallError> {
        self.set_track_enabled(MediaKind::Video, enabled).await
    }

    async fn set_track_enabled(&self, kind: MediaKind, enabled: bool) -> Result<bool, CallError> {
        self.request(|reply| SessionCommand::SetTrackEnabled {
            kind,
            enabled,
            reply,
        })
        .await
    }
}
