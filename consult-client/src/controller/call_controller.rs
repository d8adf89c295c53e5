use crate::backend::PeerBackendFactory;
use crate::config::ClientConfig;
use crate::controller::session_actor::SessionActor;
use crate::controller::session_handle::SessionHandle;
use crate::error::{CallError, TransportError};
use crate::media::MediaDevices;
use crate::transport::SignalingTransport;
use consult_core::{RoomId, SignalEnvelope, SignalPayload, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

const ADMISSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Entry point for the calling side. Holds the collaborators every session
/// needs and at most one live session per room.
pub struct CallController {
    config: ClientConfig,
    transport: Arc<dyn SignalingTransport>,
    media: Arc<dyn MediaDevices>,
    backends: Arc<dyn PeerBackendFactory>,
    sessions: Mutex<HashMap<RoomId, SessionHandle>>,
    /// One join at a time per room. Held across connect and admission so
    /// the session map itself is only ever locked briefly.
    join_gates: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl CallController {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn SignalingTransport>,
        media: Arc<dyn MediaDevices>,
        backends: Arc<dyn PeerBackendFactory>,
    ) -> Self {
        Self {
            config,
            transport,
            media,
            backends,
            sessions: Mutex::new(HashMap::new()),
            join_gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connects to `room_id`, announces `user_id` and waits until the server
    /// lists it in the roster. Joining a room that already has a live
    /// session returns that session.
    pub async fn join(&self, room_id: RoomId, user_id: UserId) -> Result<SessionHandle, CallError> {
        let gate = self.join_gate(&room_id).await;
        let _joining = gate.lock().await;

        if let Some(existing) = self.session(&room_id).await {
            if existing.user_id() != &user_id {
                warn!(
                    "Room {} is already joined as {}, ignoring {}",
                    room_id,
                    existing.user_id(),
                    user_id
                );
            }
            return Ok(existing);
        }

        let channel = self.transport.connect(&room_id).await?;
        channel
            .sender
            .send(SignalEnvelope::broadcast(user_id.clone(), SignalPayload::Join))?;
        info!("{} joining room {}", user_id, room_id);

        let handle = SessionActor::spawn(
            room_id.clone(),
            user_id,
            channel,
            self.backends.clone(),
            self.media.clone(),
            self.config.ice_servers.clone(),
        );

        let admitted = tokio::time::timeout(ADMISSION_TIMEOUT, handle.admitted()).await;
        match admitted {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Join to room {} failed: {}", room_id, e);
                return Err(e);
            }
            Err(_) => {
                let _ = handle.leave().await;
                return Err(CallError::Transport(TransportError::Connect(
                    "timed out waiting for the room roster".to_owned(),
                )));
            }
        }

        self.sessions.lock().await.insert(room_id, handle.clone());
        Ok(handle)
    }

    async fn join_gate(&self, room_id: &RoomId) -> Arc<Mutex<()>> {
        self.join_gates
            .lock()
            .await
            .entry(room_id.clone())
            .or_default()
            .clone()
    }

    pub async fn session(&self, room_id: &RoomId) -> Option<SessionHandle> {
        let sessions = self.sessions.lock().await;
        sessions.get(room_id).filter(|h| !h.is_left()).cloned()
    }

    /// Leaves every joined room.
    pub async fn shutdown(&self) {
        let handles: Vec<SessionHandle> = self.sessions.lock().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            let _ = handle.leave().await;
        }
    }
}
