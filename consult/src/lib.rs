pub use consult_core::{CallId, RoomId, UserId};

pub mod model {
    pub use consult_core::model::*;
}

pub mod utils {
    pub use consult_core::utils::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use consult_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use consult_client::*;
}
