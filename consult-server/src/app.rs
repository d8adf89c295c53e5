use crate::config::ServerConfig;
use crate::room::{RoomCommand, RoomManager};
use crate::signaling::{AllowAnyToken, ConnectionId, SignalingService, TokenVerifier, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use consult_core::{RoomId, ServerFrame, SignalEnvelope};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

pub struct AppState {
    pub signaling: SignalingService,
    pub room_manager: RoomManager,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(config: ServerConfig, verifier: Arc<dyn TokenVerifier>) -> Self {
        let signaling = SignalingService::new(config.ice_servers);
        let room_manager = RoomManager::new(Arc::new(signaling.clone()), config.room_capacity);

        Self {
            signaling,
            room_manager,
            verifier,
        }
    }

    /// Registers a socket; frames addressed to it arrive on the receiver.
    pub fn open_connection(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerFrame>) {
        self.signaling.connect()
    }

    /// Parses and routes one text frame from a client.
    pub fn dispatch_text(&self, room: &RoomId, connection: &ConnectionId, text: &str) {
        match serde_json::from_str::<SignalEnvelope>(text) {
            Ok(envelope) => self.dispatch(room, connection, envelope),
            Err(e) => warn!("Invalid signal from {}: {}", connection, e),
        }
    }

    pub fn dispatch(&self, room: &RoomId, connection: &ConnectionId, envelope: SignalEnvelope) {
        let cmd = RoomCommand::from_envelope(connection.clone(), envelope);
        self.room_manager.handle(room, cmd);
    }

    /// Transport disconnect counts as leaving the room.
    pub fn close_connection(&self, room: &RoomId, connection: &ConnectionId) {
        self.room_manager.handle(
            room,
            RoomCommand::Disconnect {
                connection: connection.clone(),
            },
        );
        self.signaling.disconnect(connection);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default(), Arc::new(AllowAnyToken))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws/presence/{room_id}", get(ws_handler))
        .layer(cors)
        .with_state(state)
}

/// Binds `addr` and serves signaling until the future is dropped or the
/// listener fails.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    serve_on(listener, state).await
}

/// Serves signaling on an already bound listener.
pub async fn serve_on(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    info!("Signaling server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .await
        .context("signaling server stopped")?;
    Ok(())
}
