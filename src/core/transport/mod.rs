//! Transport layer for the supported connection types
//!
//! Supports:
//! - Serial ports (RS-232, RS-485, USB-Serial)
//! - UDP sockets (single local endpoint, optional connected mode)
//!
//! TCP is enumerated for tab selection but has no implementation.

mod serial;
mod udp;

pub use serial::{
    list_ports, SerialConfig, SerialFlowControl, SerialLink, SerialParity, BAUD_PRESETS,
};
pub use udp::{UdpConfig, UdpLink};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use thiserror::Error;

/// Transport kind identifier, one per UI tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportKind {
    /// Serial port
    Serial,
    /// TCP (no implementation)
    Tcp,
    /// UDP socket
    Udp,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => write!(f, "SerialPort"),
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
        }
    }
}

/// Transport error types
#[derive(Error, Debug)]
pub enum TransportError {
    /// Operation attempted on a closed session
    #[error("session is not open")]
    NotOpen,

    /// Resource acquisition failed, carries the OS diagnostic
    #[error("failed to open {target}: {reason}")]
    Open {
        /// Port name or endpoint being opened
        target: String,
        /// OS-level diagnostic text
        reason: String,
    },

    /// A write failed partially or completely
    #[error("write to {target} failed: {reason}")]
    Write {
        /// Port name or endpoint being written
        target: String,
        /// OS-level diagnostic text
        reason: String,
    },

    /// Fatal runtime fault, the session auto-closed
    #[error("session closed unexpectedly: {0}")]
    ClosedUnexpectedly(String),

    /// The kind has no transport implementation
    #[error("{0} transport is not supported")]
    Unsupported(TransportKind),

    /// Configuration rejected before any open attempt
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One drained batch of inbound bytes.
///
/// `peer` is the sender endpoint for datagram transports, `None` for
/// stream-like transports.
#[derive(Debug, Clone)]
pub struct Inbound {
    /// Drained bytes, possibly empty when nothing was available
    pub data: Bytes,
    /// Sender endpoint, when the transport reports one
    pub peer: Option<SocketAddr>,
}

impl Inbound {
    /// An empty batch with no peer.
    pub fn empty() -> Self {
        Self {
            data: Bytes::new(),
            peer: None,
        }
    }
}

/// Uniform contract a concrete transport implements.
///
/// `receive` returns immediately with whatever is available (an empty
/// [`Inbound`] when nothing is); the session's receive loop provides the
/// pacing. A fatal error from any method means the underlying resource is
/// gone.
#[async_trait]
pub trait TransportLink: Send {
    /// Acquire the underlying resource.
    async fn open(&mut self) -> Result<(), TransportError>;

    /// Release the underlying resource; idempotent.
    async fn close(&mut self);

    /// True while the resource is held.
    fn is_open(&self) -> bool;

    /// Write a buffer, returning the accepted byte count.
    async fn send(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Drain currently available bytes.
    async fn receive(&mut self) -> Result<Inbound, TransportError>;

    /// Which kind this link is.
    fn kind(&self) -> TransportKind;

    /// Identity for status messages (port name, bound endpoint).
    fn label(&self) -> String;

    /// Label for send records (port name, destination endpoint).
    fn send_target(&self) -> String {
        self.label()
    }

    /// Bound local endpoint, for socket transports.
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }
}

/// Per-kind configuration selected before open.
#[derive(Debug, Clone)]
pub enum TransportConfig {
    /// Serial port configuration
    Serial(SerialConfig),
    /// UDP endpoint configuration
    Udp(UdpConfig),
}

impl TransportConfig {
    /// The kind this configuration belongs to.
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Serial(_) => TransportKind::Serial,
            Self::Udp(_) => TransportKind::Udp,
        }
    }

    /// Identity label while no link is open.
    pub fn label(&self) -> String {
        match self {
            Self::Serial(cfg) => cfg.port.clone(),
            Self::Udp(cfg) => format!("{}:{}", cfg.bind_ip, cfg.bind_port),
        }
    }
}

/// Create a link instance from configuration.
pub fn create_link(config: &TransportConfig) -> Box<dyn TransportLink> {
    match config {
        TransportConfig::Serial(cfg) => Box::new(SerialLink::new(cfg.clone())),
        TransportConfig::Udp(cfg) => Box::new(UdpLink::new(cfg.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(TransportKind::Serial.to_string(), "SerialPort");
        assert_eq!(TransportKind::Tcp.to_string(), "TCP");
        assert_eq!(TransportKind::Udp.to_string(), "UDP");
    }

    #[test]
    fn test_config_label() {
        let cfg = TransportConfig::Udp(UdpConfig::default());
        assert!(cfg.label().contains(':'));
    }
}
