use crate::media::media_track::{MediaKind, MediaTrack};
use std::sync::Arc;
use tracing::info;

/// Capture tracks obtained by one `acquire` call. Dropping the session
/// stops every track.
#[derive(Debug)]
pub struct LocalMediaSession {
    tracks: Vec<Arc<MediaTrack>>,
}

impl LocalMediaSession {
    pub fn new(tracks: Vec<Arc<MediaTrack>>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Arc<MediaTrack>] {
        &self.tracks
    }

    pub fn has_kind(&self, kind: MediaKind) -> bool {
        self.tracks.iter().any(|t| t.kind() == kind)
    }

    /// Returns how many tracks of `kind` were switched.
    pub fn set_enabled(&self, kind: MediaKind, enabled: bool) -> usize {
        let mut switched = 0;
        for track in self.tracks.iter().filter(|t| t.kind() == kind) {
            track.set_enabled(enabled);
            switched += 1;
        }
        switched
    }

    pub fn is_stopped(&self) -> bool {
        self.tracks.iter().all(|t| t.is_stopped())
    }

    /// Stops every track; returns how many were still live.
    pub fn stop(&self) -> usize {
        let stopped = self.tracks.iter().filter(|t| t.stop()).count();
        if stopped > 0 {
            info!("Released {} local media track(s)", stopped);
        }
        stopped
    }
}

impl Drop for LocalMediaSession {
    fn drop(&mut self) {
        self.stop();
    }
}
