//! UDP transport implementation
//!
//! Binds a single local endpoint. In connected mode the socket is fixed to
//! the configured destination; otherwise each send targets the destination
//! currently configured and every receive reports the sender.

use super::{Inbound, TransportError, TransportKind, TransportLink};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// UDP endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdpConfig {
    /// Local bind address
    pub bind_ip: String,
    /// Local bind port (0 lets the OS pick)
    pub bind_port: u16,
    /// Destination address
    pub dest_ip: String,
    /// Destination port
    pub dest_port: u16,
    /// Fix the socket to the destination at open time
    pub connected: bool,
}

impl UdpConfig {
    /// Create a configuration binding the given local endpoint.
    pub fn new(bind_ip: &str, bind_port: u16) -> Self {
        Self {
            bind_ip: bind_ip.to_string(),
            bind_port,
            dest_ip: "127.0.0.1".to_string(),
            dest_port: 0,
            connected: false,
        }
    }

    /// Set the destination endpoint
    #[must_use]
    pub fn destination(mut self, ip: &str, port: u16) -> Self {
        self.dest_ip = ip.to_string();
        self.dest_port = port;
        self
    }

    /// Enable connected mode
    #[must_use]
    pub fn connected(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }

    /// Destination as `ip:port`
    pub fn dest_addr(&self) -> String {
        format!("{}:{}", self.dest_ip, self.dest_port)
    }

    /// Bind endpoint as `ip:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_ip, self.bind_port)
    }
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self::new("0.0.0.0", 0)
    }
}

/// UDP socket link
pub struct UdpLink {
    config: UdpConfig,
    socket: Option<UdpSocket>,
    local_addr: Option<SocketAddr>,
}

impl UdpLink {
    /// Create a new UDP link; the socket is bound on `open`.
    pub fn new(config: UdpConfig) -> Self {
        Self {
            config,
            socket: None,
            local_addr: None,
        }
    }
}

#[async_trait]
impl TransportLink for UdpLink {
    async fn open(&mut self) -> Result<(), TransportError> {
        let bind_addr = self.config.bind_addr();
        let socket = UdpSocket::bind(&bind_addr)
            .await
            .map_err(|e| TransportError::Open {
                target: bind_addr.clone(),
                reason: e.to_string(),
            })?;

        if self.config.connected {
            socket
                .connect(self.config.dest_addr())
                .await
                .map_err(|e| TransportError::Open {
                    target: self.config.dest_addr(),
                    reason: e.to_string(),
                })?;
        }

        self.local_addr = socket.local_addr().ok();
        self.socket = Some(socket);
        Ok(())
    }

    async fn close(&mut self) {
        self.socket = None;
        self.local_addr = None;
    }

    fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotOpen)?;

        let written = if self.config.connected {
            socket.send(data).await
        } else {
            socket.send_to(data, self.config.dest_addr()).await
        }
        .map_err(|e| TransportError::Write {
            target: self.config.dest_addr(),
            reason: e.to_string(),
        })?;

        if written < data.len() {
            return Err(TransportError::Write {
                target: self.config.dest_addr(),
                reason: format!("short datagram write: {} of {} bytes", written, data.len()),
            });
        }

        Ok(written)
    }

    async fn receive(&mut self) -> Result<Inbound, TransportError> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotOpen)?;

        let mut buffer = vec![0u8; 4096];
        match socket.try_recv_from(&mut buffer) {
            Ok((n, peer)) => {
                buffer.truncate(n);
                Ok(Inbound {
                    data: Bytes::from(buffer),
                    peer: Some(peer),
                })
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(Inbound::empty()),
            // connected-mode sockets surface ICMP refusals here; not fatal
            Err(ref e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                Ok(Inbound::empty())
            }
            Err(e) => Err(TransportError::ClosedUnexpectedly(e.to_string())),
        }
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Udp
    }

    fn label(&self) -> String {
        self.local_addr
            .map(|a| a.to_string())
            .unwrap_or_else(|| self.config.bind_addr())
    }

    fn send_target(&self) -> String {
        self.config.dest_addr()
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_addrs() {
        let cfg = UdpConfig::new("127.0.0.1", 9000).destination("10.0.0.2", 9001);
        assert_eq!(cfg.bind_addr(), "127.0.0.1:9000");
        assert_eq!(cfg.dest_addr(), "10.0.0.2:9001");
    }

    #[tokio::test]
    async fn test_open_binds_local_endpoint() {
        let mut link = UdpLink::new(UdpConfig::new("127.0.0.1", 0));
        link.open().await.unwrap();
        assert!(link.is_open());
        let addr = link.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(link.label(), addr.to_string());
        link.close().await;
        assert!(!link.is_open());
    }

    #[tokio::test]
    async fn test_send_before_open_fails() {
        let mut link = UdpLink::new(UdpConfig::default());
        assert!(matches!(
            link.send(b"hi").await,
            Err(TransportError::NotOpen)
        ));
    }

    #[tokio::test]
    async fn test_datagram_round_trip() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let peer_addr = peer.local_addr().unwrap();

        let config = UdpConfig::new("127.0.0.1", 0)
            .destination("127.0.0.1", peer_addr.port());
        let mut link = UdpLink::new(config);
        link.open().await.unwrap();

        link.send(&[0x41, 0x42]).await.unwrap();
        let mut buf = [0u8; 16];
        let (n, from) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0x41, 0x42]);
        assert_eq!(from, link.local_addr().unwrap());

        peer.send_to(b"pong", from).await.unwrap();
        // try_recv needs the datagram to have landed
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let inbound = link.receive().await.unwrap();
        assert_eq!(&inbound.data[..], b"pong");
        assert_eq!(inbound.peer, Some(peer_addr));
    }
}
