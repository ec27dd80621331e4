//! Traffic record assembly and byte accounting
//!
//! Every confirmed send and every non-empty receive becomes one
//! [`TrafficRecord`], rendered for the scrollback view and counted into
//! the running byte totals. Records are not retained by the core; the
//! counters are the only state that outlives them.

use super::codec;
use super::filter::{self, FilterSpec};
use super::transport::TransportKind;
use chrono::{DateTime, Local};
use serde::Serialize;

/// Data direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    /// Outbound traffic
    Sent,
    /// Inbound traffic
    Received,
}

impl Direction {
    /// The header tag for this direction.
    pub fn tag(&self) -> &'static str {
        match self {
            Direction::Sent => "Send to",
            Direction::Received => "Recv from",
        }
    }
}

/// Cumulative byte totals, mutated only on confirmed events.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ByteCounters {
    /// Total bytes sent
    pub total_sent: u64,
    /// Total bytes received
    pub total_received: u64,
}

/// One formatted traffic event.
#[derive(Debug, Clone, Serialize)]
pub struct TrafficRecord {
    /// Event time
    pub timestamp: DateTime<Local>,
    /// Sent or Received; the presentation wrapper keys off this
    pub direction: Direction,
    /// Transport that carried the bytes
    pub kind: TransportKind,
    /// Port name or endpoint the bytes went to / came from
    pub label: String,
    /// Payload length
    pub byte_count: usize,
    /// Payload rendered as display text
    pub text: String,
    /// Payload rendered as spaced uppercase hex
    pub hex: String,
    /// Filtered view, present only while filtering is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl TrafficRecord {
    fn new(
        direction: Direction,
        kind: TransportKind,
        label: &str,
        data: &[u8],
        filter: Option<String>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            direction,
            kind,
            label: label.to_string(),
            byte_count: data.len(),
            text: codec::render_display(data),
            hex: codec::render_hex(data),
            filter,
        }
    }

    /// Render the record as a markup-escaped scrollback block:
    /// header line, hex line, optional filter line.
    pub fn render(&self) -> String {
        let mut block = format!(
            "{} [{} <{}>\"{}\" - {} Bytes]: {}",
            self.timestamp.format("%H:%M:%S"),
            self.direction.tag(),
            self.kind,
            self.label,
            self.byte_count,
            self.text,
        );
        block.push_str(&format!("\n====== Hex: {}", self.hex));
        if let Some(ref filtered) = self.filter {
            block.push_str(&format!("\n++++++ Filter: {filtered}"));
        }
        codec::escape_markup(&block)
    }
}

/// Builds traffic records and owns the byte counters.
#[derive(Debug, Default)]
pub struct TrafficLogger {
    counters: ByteCounters,
}

impl TrafficLogger {
    /// Create a logger with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current totals.
    pub fn counters(&self) -> ByteCounters {
        self.counters
    }

    /// Record a confirmed send, counting its bytes.
    pub fn record_send(
        &mut self,
        kind: TransportKind,
        label: &str,
        data: &[u8],
        spec: Option<&FilterSpec>,
    ) -> TrafficRecord {
        self.counters.total_sent += data.len() as u64;
        let filtered = spec.map(|s| filter::apply(data, s));
        TrafficRecord::new(Direction::Sent, kind, label, data, filtered)
    }

    /// Record a receive, counting its bytes.
    ///
    /// An empty buffer produces no record and leaves the counters
    /// untouched.
    pub fn record_receive(
        &mut self,
        kind: TransportKind,
        label: &str,
        data: &[u8],
        spec: Option<&FilterSpec>,
    ) -> Option<TrafficRecord> {
        if data.is_empty() {
            return None;
        }
        self.counters.total_received += data.len() as u64;
        let filtered = spec.map(|s| filter::apply(data, s));
        Some(TrafficRecord::new(
            Direction::Received,
            kind,
            label,
            data,
            filtered,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::parse_spec;

    #[test]
    fn test_record_send_counts_and_renders() {
        let mut logger = TrafficLogger::new();
        let record = logger.record_send(TransportKind::Serial, "COM3", &[0x41, 0x42], None);

        assert_eq!(logger.counters().total_sent, 2);
        assert_eq!(logger.counters().total_received, 0);
        assert_eq!(record.byte_count, 2);
        assert_eq!(record.hex, "41 42");
        assert_eq!(record.text, "AB");

        let rendered = record.render();
        assert!(rendered.contains("[Send to &lt;SerialPort&gt;&quot;COM3&quot; - 2 Bytes]: AB"));
        assert!(rendered.contains("====== Hex: 41 42"));
        assert!(!rendered.contains("++++++ Filter:"));
    }

    #[test]
    fn test_record_receive_empty_is_skipped() {
        let mut logger = TrafficLogger::new();
        assert!(logger
            .record_receive(TransportKind::Udp, "127.0.0.1:9000", &[], None)
            .is_none());
        assert_eq!(logger.counters().total_received, 0);
    }

    #[test]
    fn test_record_receive_accumulates() {
        let mut logger = TrafficLogger::new();
        logger.record_receive(TransportKind::Udp, "peer", b"abc", None);
        logger.record_receive(TransportKind::Udp, "peer", b"de", None);
        assert_eq!(logger.counters().total_received, 5);
    }

    #[test]
    fn test_filter_section_when_active() {
        let mut logger = TrafficLogger::new();
        let spec = parse_spec("0,2,5");
        let record = logger
            .record_receive(TransportKind::Serial, "COM3", b"ABCD", Some(&spec))
            .unwrap();
        assert_eq!(record.filter.as_deref(), Some("41(A) 43(C)"));
        assert!(record.render().contains("++++++ Filter: 41(A) 43(C)"));
    }

    #[test]
    fn test_control_bytes_escaped_in_text_section() {
        let mut logger = TrafficLogger::new();
        let record = logger
            .record_receive(TransportKind::Serial, "COM3", b"ok\r\n", None)
            .unwrap();
        assert_eq!(record.text, "ok\\r\\n");
    }
}
