use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use webrtc::media::Sample;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => f.write_str("audio"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// A single local capture track.
///
/// `enabled` is the mute switch and can flip back and forth. `stopped` is
/// terminal: once stopped the track never produces media again.
pub struct MediaTrack {
    id: String,
    kind: MediaKind,
    enabled: AtomicBool,
    stopped: AtomicBool,
    sink: Option<Arc<TrackLocalStaticSample>>,
}

impl MediaTrack {
    pub fn new(kind: MediaKind, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            sink: None,
        }
    }

    /// Track backed by a webrtc sample sink that can be attached to a peer connection.
    pub fn with_sink(kind: MediaKind, sink: Arc<TrackLocalStaticSample>) -> Self {
        let id = sink.id().to_owned();
        Self {
            sink: Some(sink),
            ..Self::new(kind, id)
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn sink(&self) -> Option<&Arc<TrackLocalStaticSample>> {
        self.sink.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Returns `true` only for the call that actually stopped the track.
    pub fn stop(&self) -> bool {
        let first = !self.stopped.swap(true, Ordering::AcqRel);
        if first {
            debug!("Stopped {} track {}", self.kind, self.id);
        }
        first
    }

    /// Feeds one captured sample to the sink. Muted or stopped tracks drop it.
    pub async fn write_sample(&self, sample: &Sample) -> Result<bool, webrtc::Error> {
        if self.is_stopped() || !self.is_enabled() {
            return Ok(false);
        }
        match &self.sink {
            Some(sink) => {
                sink.write_sample(sample).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("enabled", &self.is_enabled())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
