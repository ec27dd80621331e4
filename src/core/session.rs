//! Transport session state machine
//!
//! A [`TransportSession`] drives one concrete transport link through the
//! Closed/Open lifecycle. While Open, a spawned receive loop drains the
//! link and forwards inbound batches as [`SessionEvent`]s; send
//! confirmations and unsolicited closes travel the same channel, so the
//! consumer sees a single ordered stream.
//!
//! Every event carries the session generation current when it was emitted.
//! Open and close both bump the generation, which lets the consumer
//! discard confirmations addressed to a session that has since been closed
//! or reopened.

use super::transport::{
    create_link, TransportConfig, TransportError, TransportKind, TransportLink,
};
use bytes::Bytes;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No resource held; only `open` is valid
    Closed,
    /// Resource held; `send` is valid and the receive loop is running
    Open,
}

/// Events emitted by a session onto the shared channel.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A write completed; the log record is built on this confirmation
    Sent {
        /// Which transport sent
        kind: TransportKind,
        /// Session generation at send time
        generation: u64,
        /// Bytes accepted by the transport
        bytes: usize,
    },
    /// A batch of bytes arrived
    Received {
        /// Which transport received
        kind: TransportKind,
        /// Session generation at receive time
        generation: u64,
        /// The drained bytes, never empty
        data: Bytes,
        /// Sender endpoint for datagram transports
        peer: Option<SocketAddr>,
    },
    /// A fatal fault closed the session without a user close
    ClosedUnexpectedly {
        /// Which transport failed
        kind: TransportKind,
        /// Session generation at fault time
        generation: u64,
        /// Diagnostic text
        reason: String,
    },
}

/// Receiving half of the session event channel.
///
/// Shared by every session a coordinator owns; consumed from one logical
/// loop.
pub struct SessionEvents(mpsc::Receiver<SessionEvent>);

impl SessionEvents {
    /// Wait for the next event; `None` when every sender is gone.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        self.0.recv().await
    }

    /// Take an already-queued event without waiting.
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        self.0.try_recv().ok()
    }
}

/// Create the event channel shared by a coordinator's sessions.
pub fn event_channel() -> (mpsc::Sender<SessionEvent>, SessionEvents) {
    let (tx, rx) = mpsc::channel(1024);
    (tx, SessionEvents(rx))
}

/// State machine for one transport.
pub struct TransportSession {
    id: Uuid,
    kind: TransportKind,
    config: TransportConfig,
    state: Arc<RwLock<SessionState>>,
    generation: Arc<AtomicU64>,
    link: Option<Arc<Mutex<Box<dyn TransportLink>>>>,
    event_tx: mpsc::Sender<SessionEvent>,
}

impl TransportSession {
    /// Create a closed session holding its configuration.
    pub fn new(config: TransportConfig, event_tx: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: config.kind(),
            config,
            state: Arc::new(RwLock::new(SessionState::Closed)),
            generation: Arc::new(AtomicU64::new(0)),
            link: None,
            event_tx,
        }
    }

    /// Session identity for trace correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Which transport this session drives.
    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// True while Open.
    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Generation current events are tagged with.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// The configuration the next open will use.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Replace the configuration; rejected while Open.
    pub fn set_config(&mut self, config: TransportConfig) -> Result<(), TransportError> {
        if self.is_open() {
            return Err(TransportError::Config(
                "configuration is immutable while the session is open".to_string(),
            ));
        }
        self.config = config;
        Ok(())
    }

    /// Acquire the transport resource and start the receive loop.
    ///
    /// Valid only from Closed; on failure the session stays Closed and the
    /// error carries the OS diagnostic.
    pub async fn open(&mut self) -> Result<String, TransportError> {
        if self.is_open() {
            return Err(TransportError::Open {
                target: self.config.label(),
                reason: "session is already open".to_string(),
            });
        }

        let mut link = create_link(&self.config);
        link.open().await?;
        let label = link.label();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.state.write() = SessionState::Open;
        let link = Arc::new(Mutex::new(link));
        self.link = Some(link.clone());

        tracing::debug!(session = %self.id, kind = %self.kind, %label, "session opened");

        tokio::spawn(receive_loop(
            self.kind,
            generation,
            link,
            self.state.clone(),
            self.generation.clone(),
            self.event_tx.clone(),
        ));

        Ok(match self.kind {
            TransportKind::Serial => format!("Opened serial port \"{label}\""),
            _ => format!("{} bound at {label}", self.kind),
        })
    }

    /// Release the transport resource; idempotent, valid from either state.
    pub async fn close(&mut self) -> String {
        // bumping first retires the receive loop and any queued events
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.state.write() = SessionState::Closed;

        if let Some(link) = self.link.take() {
            link.lock().await.close().await;
            tracing::debug!(session = %self.id, kind = %self.kind, "session closed");
        }

        match self.kind {
            TransportKind::Serial => "Serial port closed".to_string(),
            _ => format!("{} closed", self.kind),
        }
    }

    /// Write a buffer through the link.
    ///
    /// Fails with [`TransportError::NotOpen`] when Closed, without touching
    /// the transport. On success the accepted byte count is returned and a
    /// [`SessionEvent::Sent`] confirmation is queued behind any events
    /// already in flight.
    pub async fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if !self.is_open() {
            return Err(TransportError::NotOpen);
        }
        let link = self.link.as_ref().ok_or(TransportError::NotOpen)?.clone();

        let written = link.lock().await.send(data).await?;

        let _ = self
            .event_tx
            .send(SessionEvent::Sent {
                kind: self.kind,
                generation: self.generation(),
                bytes: written,
            })
            .await;

        Ok(written)
    }

    /// Identity label: port name, or bound endpoint once open.
    pub async fn label(&self) -> String {
        match &self.link {
            Some(link) => link.lock().await.label(),
            None => self.config.label(),
        }
    }

    /// Label for send records: port name or destination endpoint.
    pub async fn send_target(&self) -> String {
        match &self.link {
            Some(link) => link.lock().await.send_target(),
            None => self.config.label(),
        }
    }

    /// Bound local endpoint, for socket transports while open.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match &self.link {
            Some(link) => link.lock().await.local_addr(),
            None => None,
        }
    }
}

/// Drain the link until the session is retired or the link faults.
async fn receive_loop(
    kind: TransportKind,
    my_generation: u64,
    link: Arc<Mutex<Box<dyn TransportLink>>>,
    state: Arc<RwLock<SessionState>>,
    generation: Arc<AtomicU64>,
    event_tx: mpsc::Sender<SessionEvent>,
) {
    loop {
        if generation.load(Ordering::SeqCst) != my_generation
            || *state.read() != SessionState::Open
        {
            break;
        }

        let result = { link.lock().await.receive().await };

        match result {
            Ok(inbound) if !inbound.data.is_empty() => {
                let event = SessionEvent::Received {
                    kind,
                    generation: my_generation,
                    data: inbound.data,
                    peer: inbound.peer,
                };
                if event_tx.send(event).await.is_err() {
                    break;
                }
            }
            Ok(_) => {
                tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
            }
            Err(e) => {
                // only fault the session this loop still belongs to
                if generation.load(Ordering::SeqCst) == my_generation {
                    *state.write() = SessionState::Closed;
                    link.lock().await.close().await;
                    tracing::warn!(%kind, error = %e, "transport fault, session auto-closed");
                    let _ = event_tx
                        .send(SessionEvent::ClosedUnexpectedly {
                            kind,
                            generation: my_generation,
                            reason: e.to_string(),
                        })
                        .await;
                }
                break;
            }
        }
    }
}
