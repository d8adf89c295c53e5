mod peer_backend;
mod peer_event;
mod webrtc_backend;

pub use peer_backend::*;
pub use peer_event::*;
pub use webrtc_backend::*;
