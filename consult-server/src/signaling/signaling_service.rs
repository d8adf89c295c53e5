use crate::signaling::{ConnectionId, SignalingOutput};
use consult_core::{IceServerConfig, ServerFrame, ServerMessage};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

struct SignalingInner {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<ServerFrame>>,
    ice_servers: Vec<IceServerConfig>,
}

/// Registry of open signaling sockets.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                connections: DashMap::new(),
                ice_servers,
            }),
        }
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    /// Registers a new socket and queues the ICE configuration as its first frame.
    pub fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerFrame>) {
        let connection = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let _ = tx.send(ServerFrame::Control(ServerMessage::IceConfig {
            ice_servers: self.get_ice_servers(),
        }));
        self.inner.connections.insert(connection.clone(), tx);
        debug!("Connection {} registered", connection);

        (connection, rx)
    }

    pub fn disconnect(&self, connection: &ConnectionId) {
        self.inner.connections.remove(connection);
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }
}

impl SignalingOutput for SignalingService {
    fn send_frame(&self, connection: &ConnectionId, frame: &ServerFrame) {
        let Some(tx) = self.inner.connections.get(connection) else {
            warn!(
                "Attempted to send frame to disconnected connection {}",
                connection
            );
            return;
        };
        if tx.send(frame.clone()).is_err() {
            warn!("Connection {} writer has gone away", connection);
        }
    }
}
