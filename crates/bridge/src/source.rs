//! Where datagrams come from.

use crate::config::BridgeConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Largest datagram accepted.
pub const MAX_DATAGRAM_SIZE: usize = 65_535;

/// A stream of whole datagrams.
///
/// `recv` waits for the next datagram; `Ok(None)` means the source is closed
/// and will never produce another one.
#[async_trait]
pub trait DatagramSource: Send {
    async fn recv(&mut self) -> io::Result<Option<Vec<u8>>>;

    /// Label used in logs.
    fn describe(&self) -> String;
}

/// UDP socket bound to the configured endpoint.
#[derive(Debug)]
pub struct UdpDatagramSource {
    socket: UdpSocket,
    local_addr: SocketAddr,
    multicast: Option<Ipv4Addr>,
    buf: Vec<u8>,
}

impl UdpDatagramSource {
    /// Bind to `config.listen_addr()` and join the multicast group the
    /// protocol uses, if any.
    pub async fn bind(config: &BridgeConfig) -> Result<Self> {
        let addr = config.listen_addr();
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("Failed to bind telemetry socket on {addr}"))?;
        let multicast = config.multicast();
        if let Some(group) = multicast {
            socket
                .join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)
                .with_context(|| format!("Failed to join multicast group {group}"))?;
        }
        let local_addr = socket.local_addr().context("Failed to read bound address")?;
        info!(
            addr = %local_addr,
            multicast = ?multicast,
            protocol = %config.protocol,
            "Telemetry socket bound"
        );
        Ok(Self {
            socket,
            local_addr,
            multicast,
            buf: vec![0u8; MAX_DATAGRAM_SIZE],
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl DatagramSource for UdpDatagramSource {
    async fn recv(&mut self) -> io::Result<Option<Vec<u8>>> {
        let (len, peer) = self.socket.recv_from(&mut self.buf).await?;
        debug!(len, %peer, "Datagram received");
        Ok(self.buf.get(..len).map(<[u8]>::to_vec))
    }

    fn describe(&self) -> String {
        match self.multicast {
            Some(group) => format!("udp://{} (multicast {group})", self.local_addr),
            None => format!("udp://{}", self.local_addr),
        }
    }
}

/// In-memory source fed through a channel; closes when every sender is
/// dropped.
#[derive(Debug)]
pub struct ChannelDatagramSource {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl ChannelDatagramSource {
    pub fn new(capacity: usize) -> (mpsc::Sender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx })
    }
}

#[async_trait]
impl DatagramSource for ChannelDatagramSource {
    async fn recv(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.rx.recv().await)
    }

    fn describe(&self) -> String {
        "channel".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencockpit_test_helpers::prelude::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_channel_source_waits_then_delivers() -> TestResult {
        let (tx, mut source) = ChannelDatagramSource::new(4);
        {
            let mut recv = task::spawn(source.recv());
            assert_pending!(recv.poll());
            tx.try_send(b"{}".to_vec())?;
            assert!(recv.is_woken());
            let received = assert_ready!(recv.poll())?;
            assert_eq!(received, Some(b"{}".to_vec()));
        }

        drop(tx);
        let mut closed = task::spawn(source.recv());
        assert_eq!(assert_ready!(closed.poll())?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_udp_source_round_trip() -> TestResult {
        let config = BridgeConfig {
            port: Some(0),
            ..BridgeConfig::default()
        };
        let mut source = UdpDatagramSource::bind(&config).await?;
        let target = source.local_addr();
        assert!(source.describe().starts_with("udp://127.0.0.1:"));

        let sender = UdpSocket::bind("127.0.0.1:0").await?;
        sender.send_to(br#"{"leds":{"HOOK":1}}"#, target).await?;

        let received = source.recv().await?;
        assert_eq!(received.as_deref(), Some(&br#"{"leds":{"HOOK":1}}"#[..]));
        Ok(())
    }
}
