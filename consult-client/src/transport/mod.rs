mod signaling_channel;
mod signaling_transport;
mod token_provider;
mod ws_transport;

pub use signaling_channel::*;
pub use signaling_transport::*;
pub use token_provider::*;
pub use ws_transport::*;
