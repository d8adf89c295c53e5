use crate::backend::{PeerBackendFactory, PeerEvent, PeerEventSink, RemoteTrack};
use crate::controller::call_event::CallEvent;
use crate::controller::session_command::SessionCommand;
use crate::controller::session_handle::{SessionHandle, SessionWatches};
use crate::controller::session_state::{CallPhase, SessionState};
use crate::error::{CallError, TransportError};
use crate::media::{LocalMediaSession, MediaDevices, MediaTrack};
use crate::negotiator::SessionNegotiator;
use crate::transport::{ChannelSender, SignalingChannel, TransportEvent};
use consult_core::{IceServerConfig, RoomId, SignalEnvelope, SignalPayload, UserId};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{info, warn};

mod handle_command_impl;
mod handle_peer_event_impl;
mod handle_signal_impl;
mod start_call_impl;
mod teardown_impl;

const COMMAND_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 128;

/// The one call this session is negotiating or holding.
struct ActiveCall {
    peer: UserId,
    negotiator: SessionNegotiator,
    remote_tracks: Vec<RemoteTrack>,
    transport_connected: bool,
    announced: bool,
}

impl ActiveCall {
    fn new(peer: UserId, negotiator: SessionNegotiator) -> Self {
        Self {
            peer,
            negotiator,
            remote_tracks: Vec::new(),
            transport_connected: false,
            announced: false,
        }
    }
}

/// Owns all mutable state of one joined room. Commands from handles,
/// signaling frames and peer connection callbacks are serialized through
/// `run`, so no handler ever races another.
pub(crate) struct SessionActor {
    room_id: RoomId,
    user_id: UserId,

    sender: ChannelSender,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    command_rx: mpsc::Receiver<SessionCommand>,

    /// Cloned into every backend so its callbacks land back in `run`.
    peer_tx: PeerEventSink,
    peer_rx: mpsc::UnboundedReceiver<PeerEvent>,
    backends: Arc<dyn PeerBackendFactory>,
    ice_servers: Vec<IceServerConfig>,

    media: Option<LocalMediaSession>,
    /// Bumped on every teardown; late media from an older epoch is discarded.
    media_epoch: u64,
    call: Option<ActiveCall>,

    state_tx: watch::Sender<SessionState>,
    roster_tx: watch::Sender<Vec<UserId>>,
    tracks_tx: watch::Sender<Vec<Arc<MediaTrack>>>,
    failure_tx: watch::Sender<Option<CallError>>,
    events_tx: broadcast::Sender<CallEvent>,
}

impl SessionActor {
    pub(crate) fn spawn(
        room_id: RoomId,
        user_id: UserId,
        channel: SignalingChannel,
        backends: Arc<dyn PeerBackendFactory>,
        media_devices: Arc<dyn MediaDevices>,
        ice_servers: Vec<IceServerConfig>,
    ) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Joined(CallPhase::Idle));
        let (roster_tx, roster_rx) = watch::channel(Vec::new());
        let (tracks_tx, tracks_rx) = watch::channel(Vec::new());
        let (failure_tx, failure_rx) = watch::channel(None);
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);

        let watches = SessionWatches {
            state: state_rx,
            roster: roster_rx,
            local_tracks: tracks_rx,
            failure: failure_rx,
            events: events_tx.clone(),
        };
        let handle = SessionHandle::new(
            room_id.clone(),
            user_id.clone(),
            command_tx,
            watches,
            media_devices,
        );

        let actor = Self {
            room_id,
            user_id,
            sender: channel.sender,
            transport_rx: channel.events,
            command_rx,
            peer_tx,
            peer_rx,
            backends,
            ice_servers,
            media: None,
            media_epoch: 0,
            call: None,
            state_tx,
            roster_tx,
            tracks_tx,
            failure_tx,
            events_tx,
        };
        tokio::spawn(actor.run());
        handle
    }

    async fn run(mut self) {
        info!("Session {} joined room {}", self.user_id, self.room_id);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Leave { reply }) => {
                            self.leave().await;
                            let _ = reply.send(());
                        }
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All handles for {} dropped, leaving room", self.user_id);
                            self.leave().await;
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    match evt {
                        Some(TransportEvent::Frame(frame)) => self.handle_frame(frame).await,
                        Some(TransportEvent::Error(reason)) => self.transport_lost(&reason).await,
                        Some(TransportEvent::Closed) | None => {
                            self.transport_lost("connection closed").await
                        }
                    }
                }

                Some(evt) = self.peer_rx.recv() => self.handle_peer_event(evt).await,
            }

            if self.is_left() {
                break;
            }
        }

        info!("Session {} in room {} finished", self.user_id, self.room_id);
    }

    fn is_left(&self) -> bool {
        *self.state_tx.borrow() == SessionState::Left
    }

    fn set_phase(&self, phase: CallPhase) {
        if !self.is_left() {
            self.state_tx.send_replace(SessionState::Joined(phase));
        }
    }

    fn emit(&self, event: CallEvent) {
        // No subscribers is fine.
        let _ = self.events_tx.send(event);
    }

    fn send_signal(
        &self,
        target: Option<UserId>,
        payload: SignalPayload,
    ) -> Result<(), TransportError> {
        let action = payload.action();
        let envelope = SignalEnvelope {
            user_id: self.user_id.clone(),
            target_user: target,
            payload,
        };
        self.sender.send(envelope).inspect_err(|e| {
            warn!("{} could not send {}: {}", self.user_id, action, e);
        })
    }

    /// Local tracks that can still be sent.
    fn live_tracks(&self) -> Vec<Arc<MediaTrack>> {
        self.media
            .as_ref()
            .filter(|m| !m.is_stopped())
            .map(|m| m.tracks().to_vec())
            .unwrap_or_default()
    }

    fn publish_tracks(&self) {
        let tracks = self
            .media
            .as_ref()
            .map(|m| m.tracks().to_vec())
            .unwrap_or_default();
        self.tracks_tx.send_replace(tracks);
    }
}
