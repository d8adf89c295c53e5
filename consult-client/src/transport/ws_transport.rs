use crate::error::TransportError;
use crate::transport::signaling_channel::{Outbound, SignalingChannel, TransportEvent};
use crate::transport::signaling_transport::SignalingTransport;
use crate::transport::token_provider::{NoToken, TokenProvider};
use async_trait::async_trait;
use consult_core::{RoomId, ServerFrame};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

/// WebSocket signaling against `{base}/ws/presence/{room}`.
pub struct WsTransport {
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl WsTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_tokens(base_url, Arc::new(NoToken))
    }

    pub fn with_tokens(base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            base_url: base_url.into(),
            tokens,
        }
    }

    pub fn endpoint(&self, room: &RoomId, token: Option<&str>) -> Result<Url, TransportError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        let scheme = url.scheme().to_owned();
        match scheme.as_str() {
            "ws" | "wss" => {}
            "http" => set_scheme(&mut url, "ws")?,
            "https" => set_scheme(&mut url, "wss")?,
            other => {
                return Err(TransportError::InvalidUrl(format!(
                    "unsupported scheme {other}"
                )));
            }
        }
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["ws", "presence", room.as_str()]);
        if let Some(token) = token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }
}

fn set_scheme(url: &mut Url, scheme: &str) -> Result<(), TransportError> {
    url.set_scheme(scheme)
        .map_err(|_| TransportError::InvalidUrl(url.to_string()))
}

#[async_trait]
impl SignalingTransport for WsTransport {
    async fn connect(&self, room: &RoomId) -> Result<SignalingChannel, TransportError> {
        let token = self.tokens.token().await?;
        let url = self.endpoint(room, token.as_deref())?;

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        info!("Signaling connected to room {}", room);

        let (mut ws_write, mut ws_read) = ws_stream.split();
        let (channel, link) = SignalingChannel::pair();
        let open = link.open_flag();
        let mut outbound = link.outbound;
        let events = link.events;

        tokio::spawn(async move {
            while let Some(message) = outbound.recv().await {
                match message {
                    Outbound::Signal(envelope) => {
                        let text = match serde_json::to_string(&envelope) {
                            Ok(text) => text,
                            Err(e) => {
                                warn!("Failed to encode {} message: {}", envelope.payload.action(), e);
                                continue;
                            }
                        };
                        if ws_write.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Outbound::Close => {
                        let _ = ws_write.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            debug!("Signaling writer finished");
        });

        let room_id = room.clone();
        tokio::spawn(async move {
            let mut failure = None;
            while let Some(msg) = ws_read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ServerFrame>(text.as_str()) {
                            Ok(frame) => {
                                let _ = events.send(TransportEvent::Frame(frame));
                            }
                            Err(e) => warn!("Ignoring malformed signaling frame: {}", e),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        failure = Some(e.to_string());
                        break;
                    }
                }
            }
            open.store(false, std::sync::atomic::Ordering::Release);
            match failure {
                Some(reason) => {
                    warn!("Signaling connection to room {} failed: {}", room_id, reason);
                    let _ = events.send(TransportEvent::Error(reason));
                }
                None => {
                    info!("Signaling connection to room {} closed", room_id);
                    let _ = events.send(TransportEvent::Closed);
                }
            }
        });

        Ok(channel)
    }
}
