use consult_core::IceServerConfig;
use consult_core::utils::{DEFAULT_ROOM_CAPACITY, DEFAULT_STUN_ADDR};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Members admitted per room. Two for appointment calls; raise it for
    /// the multi-peer room variant.
    pub room_capacity: usize,
    /// Pushed to every client on connect.
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            room_capacity: DEFAULT_ROOM_CAPACITY,
            ice_servers: vec![IceServerConfig::stun(DEFAULT_STUN_ADDR)],
        }
    }
}
