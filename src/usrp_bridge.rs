use std::io;
use std::net::SocketAddr;

use anyhow::Context;
use async_trait::async_trait;
use tokio::net::UdpSocket;

/// Source of raw datagrams, one per `receive` call.
#[async_trait]
pub trait DatagramSource: Send + Sync {
    /// Wait for the next datagram, copy it into `buf` and return its length
    /// and sender. An error leaves the source usable for the next call.
    async fn receive(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}

/// UDP listener for inbound USRP packets. Receive-only; the socket is closed
/// when this is dropped.
pub struct UsrpBridge {
    socket: UdpSocket,
}

impl UsrpBridge {
    pub async fn bind(addr: SocketAddr) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("Error listening on UDP {}", addr))?;
        log::info!("Listening on UDP {} for USRP packets...", socket.local_addr()?);
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl DatagramSource for UsrpBridge {
    async fn receive(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn localhost(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    #[tokio::test]
    async fn bind_assigns_port() {
        let bridge = UsrpBridge::bind(localhost(0)).await.expect("bind must succeed");
        assert_ne!(bridge.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn bind_conflict_is_an_error() {
        let first = UsrpBridge::bind(localhost(0)).await.unwrap();
        let taken = first.local_addr().unwrap();
        assert!(UsrpBridge::bind(taken).await.is_err());
    }

    #[tokio::test]
    async fn datagram_boundaries_are_preserved() {
        let bridge = UsrpBridge::bind(localhost(0)).await.unwrap();
        let target = bridge.local_addr().unwrap();

        let sender = UdpSocket::bind(localhost(0)).await.unwrap();
        let sender_addr = sender.local_addr().unwrap();
        sender.send_to(&[1u8; 10], target).await.unwrap();
        sender.send_to(&[2u8; 352], target).await.unwrap();

        let mut buf = vec![0u8; 1024];

        let (len, from) = bridge.receive(&mut buf).await.unwrap();
        assert_eq!(len, 10);
        assert_eq!(from, sender_addr);
        assert!(buf[..len].iter().all(|&b| b == 1));

        let (len, from) = bridge.receive(&mut buf).await.unwrap();
        assert_eq!(len, 352);
        assert_eq!(from, sender_addr);
        assert!(buf[..len].iter().all(|&b| b == 2));
    }
}
