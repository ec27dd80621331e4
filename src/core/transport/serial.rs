//! Serial port transport implementation

use super::{Inbound, TransportError, TransportKind, TransportLink};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;

/// Baud rates offered by the presentation layer; any positive value is
/// accepted at open time.
pub const BAUD_PRESETS: &[u32] = &[9600, 19200, 38400, 57600, 115200];

/// Serial port flow control type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SerialFlowControl {
    /// No flow control
    #[default]
    None,
    /// Hardware flow control (RTS/CTS)
    Hardware,
    /// Software flow control (XON/XOFF)
    Software,
}

impl std::str::FromStr for SerialFlowControl {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hw" | "hardware" | "rts/cts" => Ok(Self::Hardware),
            "sw" | "software" | "xon/xoff" => Ok(Self::Software),
            _ => Ok(Self::None),
        }
    }
}

/// Serial port parity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SerialParity {
    /// No parity
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

impl std::str::FromStr for SerialParity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "odd" | "o" => Ok(Self::Odd),
            "even" | "e" => Ok(Self::Even),
            _ => Ok(Self::None),
        }
    }
}

/// Serial port configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Port name (e.g., COM3, /dev/ttyUSB0)
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits (5, 6, 7, 8)
    pub data_bits: u8,
    /// Stop bits (1, 2)
    pub stop_bits: u8,
    /// Parity
    pub parity: SerialParity,
    /// Flow control
    pub flow_control: SerialFlowControl,
}

impl SerialConfig {
    /// Create a new serial configuration with default settings
    pub fn new(port: &str, baud_rate: u32) -> Self {
        Self {
            port: port.to_string(),
            baud_rate,
            data_bits: 8,
            stop_bits: 1,
            parity: SerialParity::None,
            flow_control: SerialFlowControl::None,
        }
    }

    /// Set data bits
    #[must_use]
    pub fn data_bits(mut self, bits: u8) -> Self {
        self.data_bits = bits;
        self
    }

    /// Set stop bits
    #[must_use]
    pub fn stop_bits(mut self, bits: u8) -> Self {
        self.stop_bits = bits;
        self
    }

    /// Set parity
    #[must_use]
    pub fn parity(mut self, parity: SerialParity) -> Self {
        self.parity = parity;
        self
    }

    /// Set flow control
    #[must_use]
    pub fn flow_control(mut self, flow: SerialFlowControl) -> Self {
        self.flow_control = flow;
        self
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new("COM1", 115200)
    }
}

/// Serial port link
pub struct SerialLink {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialLink {
    /// Create a new serial link; the port is acquired on `open`.
    pub fn new(config: SerialConfig) -> Self {
        Self { config, port: None }
    }
}

#[async_trait]
impl TransportLink for SerialLink {
    async fn open(&mut self) -> Result<(), TransportError> {
        let data_bits = match self.config.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        };

        let stop_bits = match self.config.stop_bits {
            2 => StopBits::Two,
            _ => StopBits::One,
        };

        let parity = match self.config.parity {
            SerialParity::Odd => Parity::Odd,
            SerialParity::Even => Parity::Even,
            SerialParity::None => Parity::None,
        };

        let flow_control = match self.config.flow_control {
            SerialFlowControl::Hardware => FlowControl::Hardware,
            SerialFlowControl::Software => FlowControl::Software,
            SerialFlowControl::None => FlowControl::None,
        };

        let port = serialport::new(&self.config.port, self.config.baud_rate)
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(parity)
            .flow_control(flow_control)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|e| TransportError::Open {
                target: self.config.port.clone(),
                reason: e.to_string(),
            })?;

        self.port = Some(port);
        Ok(())
    }

    async fn close(&mut self) {
        self.port = None;
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;

        port.write_all(data)
            .and_then(|()| port.flush())
            .map_err(|e| TransportError::Write {
                target: self.config.port.clone(),
                reason: e.to_string(),
            })?;

        Ok(data.len())
    }

    async fn receive(&mut self) -> Result<Inbound, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;

        let mut buffer = vec![0u8; 4096];
        match port.read(&mut buffer) {
            Ok(0) => Err(TransportError::ClosedUnexpectedly(format!(
                "{} reached end of stream",
                self.config.port
            ))),
            Ok(n) => {
                buffer.truncate(n);
                Ok(Inbound {
                    data: Bytes::from(buffer),
                    peer: None,
                })
            }
            // 100ms poll timeout, nothing arrived
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(Inbound::empty()),
            Err(e) => Err(TransportError::ClosedUnexpectedly(e.to_string())),
        }
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Serial
    }

    fn label(&self) -> String {
        self.config.port.clone()
    }
}

/// List available serial ports
pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>, TransportError> {
    serialport::available_ports().map_err(|e| TransportError::Io(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let cfg = SerialConfig::new("/dev/ttyUSB0", 9600)
            .data_bits(8)
            .stop_bits(1)
            .parity(SerialParity::None)
            .flow_control(SerialFlowControl::None);
        assert_eq!(cfg.port, "/dev/ttyUSB0");
        assert_eq!(cfg.baud_rate, 9600);
        assert_eq!(cfg.data_bits, 8);
    }

    #[test]
    fn test_parity_from_str() {
        assert_eq!("even".parse::<SerialParity>().unwrap(), SerialParity::Even);
        assert_eq!("o".parse::<SerialParity>().unwrap(), SerialParity::Odd);
        assert_eq!("none".parse::<SerialParity>().unwrap(), SerialParity::None);
    }

    #[tokio::test]
    async fn test_send_before_open_fails() {
        let mut link = SerialLink::new(SerialConfig::default());
        assert!(matches!(
            link.send(b"AT").await,
            Err(TransportError::NotOpen)
        ));
    }
}
