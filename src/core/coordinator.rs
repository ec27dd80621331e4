//! Session coordination
//!
//! Routes user actions to the active transport session, turns session
//! events into traffic records and counter updates, and feeds the input
//! histories. All methods are called from one logical loop; the sessions'
//! I/O tasks only ever talk back through the event channel.

use super::codec;
use super::filter::{self, FilterSpec};
use super::history::{HistoryKind, HistorySet};
use super::session::{event_channel, SessionEvent, SessionEvents, TransportSession};
use super::traffic::{ByteCounters, TrafficLogger, TrafficRecord};
use super::transport::{
    SerialConfig, TransportConfig, TransportError, TransportKind, UdpConfig,
};
use bytes::Bytes;
use std::fmt;

/// Whether a status is reporting success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Normal status
    Info,
    /// Failure status; the presentation layer reverts toggles on these
    Error,
}

/// A status line for the presentation layer.
///
/// Callers branch on [`Status::is_error`]; the rendered form carries the
/// legacy `[Error]` prefix the status bar colors on.
#[derive(Debug, Clone)]
pub struct Status {
    severity: Severity,
    text: String,
}

impl Status {
    /// A success status.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    /// A failure status.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }

    /// True for failure statuses.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// The plain status text, without the error marker.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Info => write!(f, "{}", self.text),
            Severity::Error => write!(f, "[Error] {}", self.text),
        }
    }
}

/// What processing one session event produced.
#[derive(Debug)]
pub enum Output {
    /// A traffic record ready for the scrollback view
    Record(TrafficRecord),
    /// A session closed without a user close; revert its open indicator
    SessionClosed {
        /// Which transport closed
        kind: TransportKind,
        /// The error status to show
        status: Status,
    },
}

struct PendingSend {
    kind: TransportKind,
    generation: u64,
    data: Bytes,
    text: String,
}

/// Routes user actions and session events through the message pipeline.
pub struct SessionCoordinator {
    serial: TransportSession,
    udp: TransportSession,
    active: TransportKind,
    logger: TrafficLogger,
    history: HistorySet,
    filter_enabled: bool,
    filter_text: String,
    pending_send: Option<PendingSend>,
}

impl SessionCoordinator {
    /// Build a coordinator with both sessions closed.
    ///
    /// Returns the event stream the caller's loop must drain through
    /// [`SessionCoordinator::process_event`].
    pub fn new(
        serial: SerialConfig,
        udp: UdpConfig,
        history: HistorySet,
    ) -> (Self, SessionEvents) {
        let (event_tx, events) = event_channel();
        let coordinator = Self {
            serial: TransportSession::new(TransportConfig::Serial(serial), event_tx.clone()),
            udp: TransportSession::new(TransportConfig::Udp(udp), event_tx),
            active: TransportKind::Serial,
            logger: TrafficLogger::new(),
            history,
            filter_enabled: false,
            filter_text: String::new(),
            pending_send: None,
        };
        (coordinator, events)
    }

    /// The session for a kind; `None` for kinds with no implementation.
    pub fn session(&self, kind: TransportKind) -> Option<&TransportSession> {
        match kind {
            TransportKind::Serial => Some(&self.serial),
            TransportKind::Udp => Some(&self.udp),
            TransportKind::Tcp => None,
        }
    }

    fn session_mut(&mut self, kind: TransportKind) -> Option<&mut TransportSession> {
        match kind {
            TransportKind::Serial => Some(&mut self.serial),
            TransportKind::Udp => Some(&mut self.udp),
            TransportKind::Tcp => None,
        }
    }

    /// Currently selected transport tab.
    pub fn active(&self) -> TransportKind {
        self.active
    }

    /// Running byte totals.
    pub fn counters(&self) -> ByteCounters {
        self.logger.counters()
    }

    /// The input histories.
    pub fn history(&self) -> &HistorySet {
        &self.history
    }

    /// Clear one history category (the user's explicit clear action).
    pub fn clear_history(&mut self, kind: HistoryKind) {
        self.history.clear(kind);
    }

    /// Toggle the filter section on traffic records.
    pub fn set_filter_enabled(&mut self, enabled: bool) {
        self.filter_enabled = enabled;
    }

    /// True while records carry a filter section.
    pub fn filter_enabled(&self) -> bool {
        self.filter_enabled
    }

    /// Set the filter spec text; canonicalized when a record is built.
    pub fn set_filter_text(&mut self, text: &str) {
        self.filter_text = text.to_string();
    }

    /// Current filter text (canonical once a record has been built).
    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    /// Replace the serial configuration; rejected while that session is open.
    pub fn set_serial_config(&mut self, config: SerialConfig) -> Result<(), TransportError> {
        self.serial.set_config(TransportConfig::Serial(config))
    }

    /// Replace the UDP configuration; rejected while that session is open.
    pub fn set_udp_config(&mut self, config: UdpConfig) -> Result<(), TransportError> {
        self.udp.set_config(TransportConfig::Udp(config))
    }

    /// The user pressed open on a transport tab.
    pub async fn user_opens(&mut self, kind: TransportKind) -> Status {
        let result = match self.session_mut(kind) {
            Some(session) => session.open().await,
            None => Err(TransportError::Unsupported(kind)),
        };
        match result {
            Ok(message) => {
                if let (TransportKind::Udp, TransportConfig::Udp(cfg)) =
                    (kind, self.udp.config())
                {
                    let ip = cfg.bind_ip.clone();
                    let port = cfg.bind_port.to_string();
                    self.history.add(HistoryKind::RecvIp, &ip);
                    self.history.add(HistoryKind::RecvPort, &port);
                }
                Status::info(message)
            }
            Err(e) => Status::error(e.to_string()),
        }
    }

    /// The user pressed close on a transport tab.
    pub async fn user_closes(&mut self, kind: TransportKind) -> Status {
        match self.session_mut(kind) {
            Some(session) => {
                let message = session.close().await;
                if self.pending_send.as_ref().is_some_and(|p| p.kind == kind) {
                    self.pending_send = None;
                }
                Status::info(message)
            }
            None => Status::error(TransportError::Unsupported(kind).to_string()),
        }
    }

    /// The user pressed send with the given text.
    ///
    /// Blank text is a no-op; encoding failures and transport errors come
    /// back as error statuses without any state change.
    pub async fn user_sends(&mut self, kind: TransportKind, text: &str) -> Status {
        if text.trim().is_empty() {
            return Status::info("");
        }

        let data = match codec::encode_input(text) {
            Ok(data) => data,
            Err(e) => return Status::error(e.to_string()),
        };

        let (result, generation, target) = match self.session_mut(kind) {
            Some(session) => {
                let result = session.send(&data).await;
                let generation = session.generation();
                let target = session.send_target().await;
                (result, generation, target)
            }
            None => return Status::error(TransportError::Unsupported(kind).to_string()),
        };

        match result {
            Ok(accepted) => {
                self.pending_send = Some(PendingSend {
                    kind,
                    generation,
                    data,
                    text: text.to_string(),
                });
                Status::info(format!("{accepted} bytes written to {target}"))
            }
            Err(e) => Status::error(e.to_string()),
        }
    }

    /// The user switched to another transport tab.
    pub fn user_switches_active(&mut self, kind: TransportKind) -> Status {
        self.active = kind;
        Status::info(format!("Active transport: {kind}"))
    }

    /// Handle one session event; `None` when it produced nothing to show
    /// (stale generation, empty batch).
    pub async fn process_event(&mut self, event: SessionEvent) -> Option<Output> {
        match event {
            SessionEvent::Sent {
                kind, generation, ..
            } => {
                // a stale confirmation must not consume a newer pending send
                let matches = self
                    .pending_send
                    .as_ref()
                    .is_some_and(|p| p.kind == kind && p.generation == generation);
                if !matches {
                    return None;
                }
                let pending = self.pending_send.take()?;
                let session = self.session(kind)?;
                if !session.is_open() || session.generation() != generation {
                    return None;
                }
                let label = session.send_target().await;

                let spec = self.record_filter_spec();
                let record =
                    self.logger
                        .record_send(kind, &label, &pending.data, spec.as_ref());

                self.history.add(HistoryKind::SendText, &pending.text);
                if let (TransportKind::Udp, TransportConfig::Udp(cfg)) =
                    (kind, self.udp.config())
                {
                    let ip = cfg.dest_ip.clone();
                    let port = cfg.dest_port.to_string();
                    self.history.add(HistoryKind::DestIp, &ip);
                    self.history.add(HistoryKind::DestPort, &port);
                }

                Some(Output::Record(record))
            }

            SessionEvent::Received {
                kind,
                generation,
                data,
                peer,
            } => {
                let session = self.session(kind)?;
                if !session.is_open() || session.generation() != generation {
                    return None;
                }
                let label = match peer {
                    Some(addr) => addr.to_string(),
                    None => session.label().await,
                };

                let spec = self.record_filter_spec();
                let record = self
                    .logger
                    .record_receive(kind, &label, &data, spec.as_ref())?;
                Some(Output::Record(record))
            }

            SessionEvent::ClosedUnexpectedly {
                kind,
                generation,
                reason,
            } => {
                let session = self.session(kind)?;
                if session.generation() != generation {
                    return None;
                }
                if self.pending_send.as_ref().is_some_and(|p| p.kind == kind) {
                    self.pending_send = None;
                }
                Some(Output::SessionClosed {
                    kind,
                    status: Status::error(format!("{kind} closed unexpectedly: {reason}")),
                })
            }
        }
    }

    /// The filter spec for the record being built, when filtering is on.
    ///
    /// Canonicalizes the filter text in place and records it in history,
    /// so history dedup always sees the canonical form.
    fn record_filter_spec(&mut self) -> Option<FilterSpec> {
        if !self.filter_enabled {
            return None;
        }
        let canonical = filter::canonicalize(&self.filter_text);
        let spec = filter::parse_spec(&canonical);
        self.history.add(HistoryKind::FilterText, &canonical);
        self.filter_text = canonical;
        Some(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> (SessionCoordinator, SessionEvents) {
        SessionCoordinator::new(
            SerialConfig::default(),
            UdpConfig::new("127.0.0.1", 0),
            HistorySet::default(),
        )
    }

    #[tokio::test]
    async fn test_send_on_closed_session_is_error() {
        let (mut coordinator, _events) = coordinator();
        let status = coordinator.user_sends(TransportKind::Udp, "hello").await;
        assert!(status.is_error());
        assert!(status.to_string().starts_with("[Error] "));
    }

    #[tokio::test]
    async fn test_blank_send_is_noop() {
        let (mut coordinator, mut events) = coordinator();
        let status = coordinator.user_sends(TransportKind::Udp, "   ").await;
        assert!(!status.is_error());
        assert!(events.try_next().is_none());
    }

    #[tokio::test]
    async fn test_tcp_has_no_implementation() {
        let (mut coordinator, _events) = coordinator();
        let status = coordinator.user_opens(TransportKind::Tcp).await;
        assert!(status.is_error());
        assert!(status.text().contains("not supported"));
    }

    #[tokio::test]
    async fn test_bad_hex_token_is_encoding_error() {
        let (mut coordinator, _events) = coordinator();
        coordinator.user_opens(TransportKind::Udp).await;
        let status = coordinator.user_sends(TransportKind::Udp, "[4G]").await;
        assert!(status.is_error());
        assert!(status.text().contains("invalid hex digit"));
    }

    #[tokio::test]
    async fn test_switch_active() {
        let (mut coordinator, _events) = coordinator();
        coordinator.user_switches_active(TransportKind::Udp);
        assert_eq!(coordinator.active(), TransportKind::Udp);
    }
}
