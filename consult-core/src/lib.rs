pub mod model;

pub use model::*;

pub mod utils {
    pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

    /// Room capacity of a 1:1 appointment call.
    pub const DEFAULT_ROOM_CAPACITY: usize = 2;
}
