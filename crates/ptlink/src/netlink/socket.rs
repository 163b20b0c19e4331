//! Low-level async netlink socket operations.

use std::future::Future;
use std::os::unix::io::{AsRawFd, RawFd};

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

use super::error::Result;

/// Default receive buffer size.
pub const DEFAULT_RECV_BUF: usize = 32768;

/// Datagram channel a [`Connection`](super::Connection) exchanges messages over.
///
/// `recv` returns one datagram, which may hold several netlink messages.
/// An empty datagram means the peer closed the channel.
pub trait Transport: Send + Sync {
    /// Transmit one complete message.
    fn send(&self, msg: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next datagram.
    fn recv(&self) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Local port ID.
    fn pid(&self) -> u32;
}

/// Async Generic Netlink socket.
pub struct NetlinkSocket {
    fd: AsyncFd<Socket>,
    pid: u32,
    recv_buf_size: usize,
}

impl NetlinkSocket {
    /// Open a `NETLINK_GENERIC` socket with the default receive buffer.
    pub fn new() -> Result<Self> {
        Self::with_recv_buf(DEFAULT_RECV_BUF)
    }

    /// Open a `NETLINK_GENERIC` socket reading into buffers of `recv_buf_size` bytes.
    pub fn with_recv_buf(recv_buf_size: usize) -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_GENERIC)?;
        socket.set_non_blocking(true)?;

        // Bind to get a port ID
        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr)?;
        socket.get_address(&mut addr)?;
        let pid = addr.port_number();

        // Older kernels lack extended ACK; errors then carry only the errno.
        if let Err(e) = socket.set_ext_ack(true) {
            tracing::debug!(error = %e, "extended ACK not supported");
        }

        let fd = AsyncFd::new(socket)?;
        tracing::debug!(pid, "opened generic netlink socket");

        Ok(Self {
            fd,
            pid,
            recv_buf_size,
        })
    }

    /// Get the local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Send a message.
    pub async fn send(&self, msg: &[u8]) -> Result<()> {
        loop {
            let mut guard = self.fd.ready(Interest::WRITABLE).await?;

            match guard.try_io(|inner| inner.get_ref().send(msg, 0)) {
                Ok(result) => {
                    result?;
                    return Ok(());
                }
                Err(_would_block) => continue,
            }
        }
    }

    /// Receive a datagram, allocating a buffer.
    pub async fn recv_msg(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(self.recv_buf_size);

        loop {
            let mut guard = self.fd.ready(Interest::READABLE).await?;

            match guard.try_io(|inner| inner.get_ref().recv(&mut buf, 0)) {
                Ok(result) => {
                    result?;
                    // recv advanced buf past the received bytes
                    return Ok(buf.to_vec());
                }
                Err(_would_block) => continue,
            }
        }
    }
}

impl Transport for NetlinkSocket {
    fn send(&self, msg: &[u8]) -> impl Future<Output = Result<()>> + Send {
        NetlinkSocket::send(self, msg)
    }

    fn recv(&self) -> impl Future<Output = Result<Vec<u8>>> + Send {
        self.recv_msg()
    }

    fn pid(&self) -> u32 {
        self.pid
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}
