use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

/// SDP payload exchanged once per negotiation round. The body is opaque.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Network reachability hint, in the browser's `RTCIceCandidateInit` shape.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod rtc {
    use super::{IceCandidate, SdpType, SessionDescription};
    use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
    use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
    use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

    impl TryFrom<&SessionDescription> for RTCSessionDescription {
        type Error = webrtc::Error;

        fn try_from(desc: &SessionDescription) -> Result<Self, Self::Error> {
            match desc.sdp_type {
                SdpType::Offer => RTCSessionDescription::offer(desc.sdp.clone()),
                SdpType::Answer => RTCSessionDescription::answer(desc.sdp.clone()),
            }
        }
    }

    impl TryFrom<RTCSessionDescription> for SessionDescription {
        type Error = RTCSdpType;

        fn try_from(desc: RTCSessionDescription) -> Result<Self, Self::Error> {
            match desc.sdp_type {
                RTCSdpType::Offer => Ok(SessionDescription::offer(desc.sdp)),
                RTCSdpType::Answer => Ok(SessionDescription::answer(desc.sdp)),
                other => Err(other),
            }
        }
    }

    impl From<IceCandidate> for RTCIceCandidateInit {
        fn from(c: IceCandidate) -> Self {
            RTCIceCandidateInit {
                candidate: c.candidate,
                sdp_mid: c.sdp_mid,
                sdp_mline_index: c.sdp_m_line_index,
                username_fragment: c.username_fragment,
            }
        }
    }

    impl From<RTCIceCandidateInit> for IceCandidate {
        fn from(c: RTCIceCandidateInit) -> Self {
            IceCandidate {
                candidate: c.candidate,
                sdp_mid: c.sdp_mid,
                sdp_m_line_index: c.sdp_mline_index,
                username_fragment: c.username_fragment,
            }
        }
    }
}
