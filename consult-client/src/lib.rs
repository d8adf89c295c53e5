mod backend;
mod config;
mod controller;
mod error;
mod media;
mod negotiator;
mod transport;

pub use backend::*;
pub use config::*;
pub use controller::*;
pub use error::*;
pub use media::*;
pub use negotiator::*;
pub use transport::*;
