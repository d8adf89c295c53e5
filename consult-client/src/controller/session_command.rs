use crate::error::CallError;
use crate::media::{LocalMediaSession, MediaKind};
use consult_core::UserId;
use tokio::sync::oneshot;

pub(crate) enum SessionCommand {
    /// Reserves a media epoch before devices are opened.
    BeginMedia {
        reply: oneshot::Sender<u64>,
    },
    AttachMedia {
        epoch: u64,
        media: LocalMediaSession,
        reply: oneshot::Sender<Result<(), CallError>>,
    },
    Call {
        target: UserId,
        reply: oneshot::Sender<Result<(), CallError>>,
    },
    EndCall {
        reply: oneshot::Sender<()>,
    },
    Leave {
        reply: oneshot::Sender<()>,
    },
    SetTrackEnabled {
        kind: MediaKind,
        enabled: bool,
        reply: oneshot::Sender<bool>,
    },
}
