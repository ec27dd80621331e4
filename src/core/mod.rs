//! Core module containing the transport-agnostic message pipeline
//!
//! This module provides:
//! - Transport layer for the supported connection types (Serial, UDP)
//! - Session state machine with a shared open/close/send/receive contract
//! - Byte codec for user input and traffic display
//! - Byte-offset filtering for traffic records
//! - Traffic record assembly with running byte counters
//! - Bounded input history
//! - Session coordination between user actions and transport events

pub mod codec;
pub mod coordinator;
pub mod filter;
pub mod history;
pub mod session;
pub mod traffic;
pub mod transport;
