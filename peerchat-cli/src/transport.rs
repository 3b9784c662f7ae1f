//! Datagram transport: one bound UDP socket with a cancellable receive.
//!
//! Sends originate only from the send loop and receives only from the receive
//! loop, so the socket needs no lock of its own. Datagrams larger than the
//! caller's buffer are truncated silently; the prefix is delivered.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::net::UdpSocket;
use tokio::sync::Notify;

/// Error binding a socket anywhere in the configured port range.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("no available port found in the {start}-{end} range")]
    Exhausted { start: u16, end: u16 },
    #[error("error binding socket on port {port}: {source}")]
    Io {
        port: u16,
        #[source]
        source: io::Error,
    },
}

/// Receive outcome other than a datagram. Cancellation is the normal shutdown
/// signal, not a failure.
#[derive(Debug, thiserror::Error)]
pub enum RecvError {
    #[error("receive cancelled")]
    Cancelled,
    #[error("error receiving message: {0}")]
    Io(#[from] io::Error),
}

/// A send that did not make it onto the wire. Best-effort: callers report it
/// and keep looping.
#[derive(Debug, thiserror::Error)]
#[error("error sending message to {peer}: {source}")]
pub struct SendError {
    pub peer: SocketAddr,
    #[source]
    pub source: io::Error,
}

/// One bound UDP socket shared by the send and receive loops.
pub struct Transport {
    socket: UdpSocket,
    cancelled: AtomicBool,
    cancel: Notify,
}

impl Transport {
    /// Bind the first free port in `start..=end`, advancing past ports that
    /// are already in use. Any other bind error fails immediately.
    pub async fn bind_in_range(start: u16, end: u16) -> Result<Self, BindError> {
        for port in start..=end {
            match UdpSocket::bind(("0.0.0.0", port)).await {
                Ok(socket) => {
                    return Ok(Self {
                        socket,
                        cancelled: AtomicBool::new(false),
                        cancel: Notify::new(),
                    })
                }
                Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                    log::warn!("port {} is already in use, trying the next port", port);
                }
                Err(source) => return Err(BindError::Io { port, source }),
            }
        }
        Err(BindError::Exhausted { start, end })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Send one datagram. UDP gives no delivery guarantee; an `Ok` only means
    /// the payload left this socket.
    pub async fn send_to(&self, payload: &[u8], peer: SocketAddr) -> Result<(), SendError> {
        self.socket
            .send_to(payload, peer)
            .await
            .map(|_| ())
            .map_err(|source| SendError { peer, source })
    }

    /// Wait for one datagram or for `cancel`. A payload longer than `buf` is
    /// truncated to `buf.len()` bytes.
    pub async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), RecvError> {
        // Register for the cancel wakeup before checking the flag, so a
        // cancel between the check and the select is not lost.
        let cancelled = self.cancel.notified();
        if self.cancelled.load(Ordering::Acquire) {
            return Err(RecvError::Cancelled);
        }
        tokio::select! {
            res = self.socket.recv_from(buf) => Ok(res?),
            _ = cancelled => Err(RecvError::Cancelled),
        }
    }

    /// Unblock any pending `recv_from` with `RecvError::Cancelled`. Idempotent
    /// and callable from any task.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.cancel.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerchat_core::MAX_DATAGRAM;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn ephemeral() -> Transport {
        // Port 0 lets the OS pick; the range loop is exercised separately.
        Transport::bind_in_range(0, 0).await.unwrap()
    }

    fn loopback(t: &Transport) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], t.local_addr().unwrap().port()))
    }

    #[tokio::test]
    async fn cancel_unblocks_pending_receive() {
        let t = Arc::new(ephemeral().await);
        let recv = {
            let t = t.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; MAX_DATAGRAM];
                t.recv_from(&mut buf).await
            })
        };
        tokio::task::yield_now().await;
        t.cancel();
        let res = timeout(Duration::from_secs(2), recv)
            .await
            .expect("receive should unblock")
            .unwrap();
        assert!(matches!(res, Err(RecvError::Cancelled)));
    }

    #[tokio::test]
    async fn cancel_before_receive_short_circuits() {
        let t = ephemeral().await;
        t.cancel();
        t.cancel();
        let mut buf = [0u8; MAX_DATAGRAM];
        assert!(matches!(
            t.recv_from(&mut buf).await,
            Err(RecvError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn oversize_datagram_is_truncated() {
        let a = ephemeral().await;
        let b = ephemeral().await;
        let big = vec![b'x'; MAX_DATAGRAM + 500];
        a.send_to(&big, loopback(&b)).await.unwrap();

        let mut buf = [0u8; MAX_DATAGRAM];
        let (n, from) = timeout(Duration::from_secs(2), b.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n, MAX_DATAGRAM);
        assert_eq!(&buf[..n], &big[..MAX_DATAGRAM]);
        assert_eq!(from, loopback(&a));
    }

    #[tokio::test]
    async fn roundtrip_between_two_sockets() {
        let a = ephemeral().await;
        let b = ephemeral().await;
        a.send_to(b"hi", loopback(&b)).await.unwrap();
        let mut buf = [0u8; MAX_DATAGRAM];
        let (n, from) = timeout(Duration::from_secs(2), b.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], b"hi");
        assert_eq!(from, loopback(&a));
    }

    #[tokio::test]
    async fn advances_past_a_held_port() {
        // A neighbouring port can be taken by another process; retry with a
        // fresh holder rather than flake.
        for _ in 0..16 {
            let held = ephemeral().await;
            let port = held.local_addr().unwrap().port();
            if port == u16::MAX {
                continue;
            }
            match Transport::bind_in_range(port, port + 1).await {
                Ok(t) => {
                    assert_eq!(t.local_addr().unwrap().port(), port + 1);
                    return;
                }
                Err(BindError::Exhausted { .. }) => continue,
                Err(e) => panic!("unexpected bind error: {}", e),
            }
        }
        panic!("no free neighbouring port found after 16 attempts");
    }

    #[tokio::test]
    async fn exhausted_range_reports_bounds() {
        let held = ephemeral().await;
        let port = held.local_addr().unwrap().port();
        match Transport::bind_in_range(port, port).await {
            Err(BindError::Exhausted { start, end }) => {
                assert_eq!(start, port);
                assert_eq!(end, port);
            }
            other => panic!("expected Exhausted, got {:?}", other.map(|_| ())),
        }
    }
}
