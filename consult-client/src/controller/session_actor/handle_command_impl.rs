use crate::controller::call_event::EndReason;
use crate::controller::session_actor::SessionActor;
use crate::controller::session_command::SessionCommand;
use crate::error::CallError;
use crate::media::LocalMediaSession;
use tracing::{debug, info};

impl SessionActor {
    pub(super) async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::BeginMedia { reply } => {
                let _ = reply.send(self.media_epoch);
            }

            SessionCommand::AttachMedia {
                epoch,
                media,
                reply,
            } => {
                let _ = reply.send(self.attach_media(epoch, media));
            }

            SessionCommand::Call { target, reply } => {
                let result = self.start_call(target).await;
                let _ = reply.send(result);
            }

            SessionCommand::EndCall { reply } => {
                self.end_call(EndReason::LocalHangup, true).await;
                let _ = reply.send(());
            }

            SessionCommand::SetTrackEnabled {
                kind,
                enabled,
                reply,
            } => {
                let switched = self
                    .media
                    .as_ref()
                    .map(|m| m.set_enabled(kind, enabled))
                    .unwrap_or(0);
                debug!(
                    "{} set {} enabled={} on {} track(s)",
                    self.user_id, kind, enabled, switched
                );
                let _ = reply.send(switched > 0);
            }

            // Normally intercepted by `run`.
            SessionCommand::Leave { reply } => {
                self.leave().await;
                let _ = reply.send(());
            }
        }
    }

    fn attach_media(&mut self, epoch: u64, media: LocalMediaSession) -> Result<(), CallError> {
        if epoch != self.media_epoch {
            info!(
                "{}: local media arrived after the call ended, releasing it",
                self.user_id
            );
            media.stop();
            return Err(CallError::Cancelled);
        }
        if let Some(previous) = self.media.replace(media) {
            previous.stop();
        }
        if self.call.is_some() {
            debug!("{}: local media started during a call, not renegotiating", self.user_id);
        }
        self.publish_tracks();
        Ok(())
    }
}
