mod local_media;
mod media_devices;
mod media_track;
mod sample_devices;

pub use local_media::*;
pub use media_devices::*;
pub use media_track::*;
pub use sample_devices::*;
