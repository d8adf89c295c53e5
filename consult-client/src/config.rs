use consult_core::IceServerConfig;
use consult_core::utils::DEFAULT_STUN_ADDR;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the signaling server, e.g. `ws://localhost:3000`.
    pub signaling_url: String,
    /// Used until the server pushes its own `ice_config`.
    pub ice_servers: Vec<IceServerConfig>,
}

impl ClientConfig {
    pub fn new(signaling_url: impl Into<String>) -> Self {
        Self {
            signaling_url: signaling_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: "ws://127.0.0.1:3000".to_owned(),
            ice_servers: vec![IceServerConfig::stun(DEFAULT_STUN_ADDR)],
        }
    }
}
