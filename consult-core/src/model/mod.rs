mod call;
mod room;
mod session;
mod signaling;
mod user;

pub use call::CallId;
pub use room::RoomId;
pub use session::{IceCandidate, SdpType, SessionDescription};
pub use signaling::{IceServerConfig, ServerFrame, ServerMessage, SignalEnvelope, SignalPayload};
pub use user::UserId;
