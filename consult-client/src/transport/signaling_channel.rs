use crate::error::TransportError;
use consult_core::{ServerFrame, SignalEnvelope};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

/// What a transport reports back to its session.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Frame(ServerFrame),
    Closed,
    Error(String),
}

/// What a session asks its transport to do.
#[derive(Debug, Clone)]
pub enum Outbound {
    Signal(SignalEnvelope),
    Close,
}

/// Session side of the outbound half. Cheap to clone; every clone observes
/// the same open/closed flag.
#[derive(Debug, Clone)]
pub struct ChannelSender {
    tx: mpsc::UnboundedSender<Outbound>,
    open: Arc<AtomicBool>,
}

impl ChannelSender {
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.tx.is_closed()
    }

    /// Fails with [`TransportError::Closed`] once the connection is gone.
    pub fn send(&self, envelope: SignalEnvelope) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        self.tx.send(Outbound::Signal(envelope)).map_err(|_| {
            self.open.store(false, Ordering::Release);
            TransportError::Closed
        })
    }

    /// Idempotent.
    pub fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            debug!("Closing signaling channel");
            let _ = self.tx.send(Outbound::Close);
        }
    }
}

/// Session side of a connection: a sender and the event stream.
pub struct SignalingChannel {
    pub sender: ChannelSender,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Transport side of a connection, handed to the tasks that move frames.
pub struct ChannelLink {
    pub outbound: mpsc::UnboundedReceiver<Outbound>,
    pub events: mpsc::UnboundedSender<TransportEvent>,
    open: Arc<AtomicBool>,
}

impl ChannelLink {
    /// Marks the connection dead so further sends are refused.
    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
    }

    pub fn open_flag(&self) -> Arc<AtomicBool> {
        self.open.clone()
    }
}

impl SignalingChannel {
    pub fn pair() -> (SignalingChannel, ChannelLink) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(true));

        let channel = SignalingChannel {
            sender: ChannelSender {
                tx: out_tx,
                open: open.clone(),
            },
            events: event_rx,
        };
        let link = ChannelLink {
            outbound: out_rx,
            events: event_tx,
            open,
        };
        (channel, link)
    }
}
