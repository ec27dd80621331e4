//! # Commlink Core Library
//!
//! A multi-platform serial/UDP communication library built around a
//! transport-agnostic message pipeline:
//! - Serial ports (RS-232, RS-485, USB-Serial adapters)
//! - UDP sockets (single local endpoint, optional connected mode)
//!
//! ## Features
//!
//! - Bracket-hex send grammar (`AB[0D 0A]` sends `AB` followed by CR LF)
//! - Timestamped traffic records with hex and filter sections
//! - Byte-offset filtering of fixed-layout frames
//! - Bounded, deduplicated input histories
//! - Running byte counters over confirmed traffic
//!
//! ## Example
//!
//! ```rust,no_run
//! use commlink_core::{SerialConfig, SessionCoordinator, TransportKind, UdpConfig};
//! use commlink_core::core::history::HistorySet;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let serial = SerialConfig::new("/dev/ttyUSB0", 9600);
//!     let (mut coordinator, mut events) =
//!         SessionCoordinator::new(serial, UdpConfig::default(), HistorySet::default());
//!
//!     let status = coordinator.user_opens(TransportKind::Serial).await;
//!     println!("{status}");
//!     coordinator.user_sends(TransportKind::Serial, "[41 42]").await;
//!
//!     while let Some(event) = events.next().await {
//!         if let Some(output) = coordinator.process_event(event).await {
//!             println!("{output:?}");
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod core;

// Re-exports for convenience
pub use crate::config::{AppConfig, SetupConfig};
pub use crate::core::codec::{encode_input, escape_markup, parse_hex, render_display, render_hex, EncodingError};
pub use crate::core::coordinator::{Output, SessionCoordinator, Severity, Status};
pub use crate::core::filter::FilterSpec;
pub use crate::core::history::{HistoryKind, HistoryList, HistorySet};
pub use crate::core::session::{SessionEvent, SessionEvents, SessionState, TransportSession};
pub use crate::core::traffic::{ByteCounters, Direction, TrafficLogger, TrafficRecord};
pub use crate::core::transport::{
    list_ports, SerialConfig, SerialFlowControl, SerialParity, TransportConfig, TransportError,
    TransportKind, UdpConfig,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
