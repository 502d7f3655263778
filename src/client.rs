//! Single round-trip UDP transport.
//!
//! Each [`UdpClient::send`] binds a fresh socket, writes the encoded message once,
//! reads one datagram back and decodes it. There is no retry and no timeout; wrap
//! the call in `tokio::time::timeout` if one is needed.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use bytes::Bytes;
use tokio::net::{lookup_host, ToSocketAddrs, UdpSocket};
use tracing::{debug, instrument, warn};

use crate::{DnsError, Message, Result};

/// Enough for any response without EDNS0
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 512;

#[derive(Debug, Clone)]
pub struct UdpClient {
    bind_addr: Option<SocketAddr>,
    recv_buffer_size: usize,
}

impl Default for UdpClient {
    fn default() -> Self {
        Self {
            bind_addr: None,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }
}

impl UdpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Local address to send from. Defaults to an ephemeral port on the
    /// unspecified address of the server's family.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = Some(addr);
        self
    }

    /// Longer responses are cut off at this size
    pub fn with_recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    pub fn recv_buffer_size(&self) -> usize {
        self.recv_buffer_size
    }

    /// Sends `message` to `server` and decodes the reply.
    /// The raw reply is returned too, for decoding names inside record data.
    #[instrument(level = "debug", skip_all, fields(id = message.header.id))]
    pub async fn send<A: ToSocketAddrs>(
        &self,
        message: &Message,
        server: A,
    ) -> Result<(Message, Bytes)> {
        let server = lookup_host(server).await?.next().ok_or_else(|| {
            DnsError::Io(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "server address did not resolve",
            ))
        })?;

        let bind_addr = self.bind_addr.unwrap_or_else(|| match server {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        });

        let sock = UdpSocket::bind(bind_addr).await?;
        sock.connect(server).await?;

        let request = message.to_bytes()?;
        let sent = sock.send(&request).await?;
        if sent != request.len() {
            warn!(%server, expected = request.len(), sent, "short write");
            return Err(DnsError::IncompleteSend {
                expected: request.len(),
                sent,
            });
        }
        debug!(%server, len = sent, "sent query");

        let mut buf = vec![0; self.recv_buffer_size];
        let response_len = sock.recv(&mut buf).await?;
        buf.truncate(response_len);
        debug!(%server, len = response_len, "received response");

        let response = Message::decode(&buf)?;

        Ok((response, buf.into()))
    }
}
