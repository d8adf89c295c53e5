mod call_controller;
mod call_event;
mod session_actor;
mod session_command;
mod session_handle;
mod session_state;

pub use call_controller::*;
pub use call_event::*;
pub use session_handle::*;
pub use session_state::*;
