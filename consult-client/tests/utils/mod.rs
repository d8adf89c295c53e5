
pub use local_transport::*;
pub use mock_backend::*;
pub use mock_media::*;
