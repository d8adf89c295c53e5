use crate::error::MediaAccessError;
use crate::media::local_media::LocalMediaSession;
use crate::media::media_devices::{MediaConstraints, MediaDevices};
use crate::media::media_track::{MediaKind, MediaTrack};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Devices backed by webrtc sample tracks. The application writes encoded
/// frames into them through [`MediaTrack::write_sample`].
pub struct SampleTrackDevices {
    stream_id: String,
    microphone: bool,
    camera: bool,
}

impl SampleTrackDevices {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            microphone: true,
            camera: true,
        }
    }

    pub fn without_camera(mut self) -> Self {
        self.camera = false;
        self
    }

    pub fn without_microphone(mut self) -> Self {
        self.microphone = false;
        self
    }

    fn track(&self, kind: MediaKind) -> Arc<MediaTrack> {
        let (mime_type, clock_rate, channels) = match kind {
            MediaKind::Audio => (MIME_TYPE_OPUS, 48000, 2),
            MediaKind::Video => (MIME_TYPE_VP8, 90000, 0),
        };
        let codec = RTCRtpCodecCapability {
            mime_type: mime_type.to_owned(),
            clock_rate,
            channels,
            ..Default::default()
        };
        let track_id = format!("{}-{}", kind, Uuid::new_v4());
        let sink = TrackLocalStaticSample::new(codec, track_id, self.stream_id.clone());
        Arc::new(MediaTrack::with_sink(kind, Arc::new(sink)))
    }
}

#[async_trait]
impl MediaDevices for SampleTrackDevices {
    async fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> Result<LocalMediaSession, MediaAccessError> {
        if !constraints.audio && !constraints.video {
            return Err(MediaAccessError::NothingRequested);
        }
        if constraints.audio && !self.microphone {
            return Err(MediaAccessError::DeviceNotFound(MediaKind::Audio));
        }
        if constraints.video && !self.camera {
            return Err(MediaAccessError::DeviceNotFound(MediaKind::Video));
        }

        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(self.track(MediaKind::Audio));
        }
        if constraints.video {
            tracks.push(self.track(MediaKind::Video));
        }
        info!(
            "Acquired {} sample track(s) for stream {}",
            tracks.len(),
            self.stream_id
        );
        Ok(LocalMediaSession::new(tracks))
    }
}
