//! A single established TCP connection carrying protocol frames.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Notify};

use tutorlink_protocol::codec::{self, HEADER_LEN, MAX_BODY_LEN};
use tutorlink_protocol::{CloseCode, Message, ProtocolError};

use crate::TransportError;

/// One socket, one session.
///
/// `Connection` is a cheap-clone handle over shared state. The read
/// half belongs to whoever pumps [`receive`](Connection::receive)
/// (the receiver task, or the handshake before it starts); the write
/// half sits behind its own lock so the message-processing path and
/// foreground action handlers can send concurrently.
///
/// Closing is idempotent: the first [`close`](Connection::close) wins,
/// later calls are no-ops. A pending `receive` is unblocked by a local
/// close and reports end-of-stream, not an error.
pub struct Connection {
    inner: Arc<Inner>,
}

struct Inner {
    peer: SocketAddr,
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    closed: AtomicBool,
    shutdown: Notify,
    peer_version: OnceLock<u32>,
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Connection {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Connection {
    pub(crate) fn new(stream: TcpStream, peer: SocketAddr) -> Connection {
        let (reader, writer) = stream.into_split();
        Connection {
            inner: Arc::new(Inner {
                peer,
                reader: Mutex::new(reader),
                writer: Mutex::new(writer),
                closed: AtomicBool::new(false),
                shutdown: Notify::new(),
                peer_version: OnceLock::new(),
            }),
        }
    }

    /// The remote endpoint of this connection.
    pub fn peer_addr(&self) -> SocketAddr {
        self.inner.peer
    }

    /// The version the peer announced in its `Hello`, once the
    /// host-side handshake has seen it.
    pub fn peer_version(&self) -> Option<u32> {
        self.inner.peer_version.get().copied()
    }

    pub(crate) fn record_peer_version(&self, version: u32) {
        let _ = self.inner.peer_version.set(version);
    }

    /// Whether this connection has been closed locally.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Serializes and writes one message.
    ///
    /// # Errors
    /// [`TransportError::Closed`] after a local close;
    /// [`TransportError::Send`] on an I/O failure, which is fatal for
    /// the session — the duplex channel is assumed dead, no retry.
    pub async fn send(&self, msg: &Message) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let frame = codec::encode(msg)?;
        let mut writer = self.inner.writer.lock().await;
        writer.write_all(&frame).await.map_err(TransportError::Send)?;
        writer.flush().await.map_err(TransportError::Send)?;
        tracing::trace!(peer = %self.inner.peer, %msg, "sent");
        Ok(())
    }

    /// Blocks until one full message is read.
    ///
    /// Returns `Ok(None)` on clean end-of-stream, or when a local
    /// close raced (or interrupted) the read — a deliberate local
    /// close is not a transport failure. Any other read error is
    /// fatal; a frame the registry rejects surfaces as
    /// [`TransportError::Protocol`].
    pub async fn receive(&self) -> Result<Option<Message>, TransportError> {
        // Register the waiter before checking the flag, so a close
        // landing between the two still wakes the select below.
        let shutdown = self.inner.shutdown.notified();
        if self.is_closed() {
            return Ok(None);
        }
        tokio::select! {
            _ = shutdown => Ok(None),
            res = self.read_frame() => match res {
                // A local close can surface as a read error on some
                // platforms; report it as end-of-stream either way.
                Err(_) if self.is_closed() => Ok(None),
                other => other,
            },
        }
    }

    async fn read_frame(&self) -> Result<Option<Message>, TransportError> {
        let mut reader = self.inner.reader.lock().await;

        // The first byte is read alone so EOF at a frame boundary is a
        // clean close, while EOF inside a frame is an error.
        let mut header = [0u8; HEADER_LEN];
        let n = reader
            .read(&mut header[..1])
            .await
            .map_err(TransportError::Receive)?;
        if n == 0 {
            return Ok(None);
        }
        reader
            .read_exact(&mut header[1..])
            .await
            .map_err(TransportError::Receive)?;

        let code = u16::from_be_bytes([header[0], header[1]]);
        let len =
            u32::from_be_bytes([header[2], header[3], header[4], header[5]]);
        if len > MAX_BODY_LEN {
            return Err(ProtocolError::Oversized(len).into());
        }

        let mut body = vec![0u8; len as usize];
        reader
            .read_exact(&mut body)
            .await
            .map_err(TransportError::Receive)?;

        let msg = codec::decode_body(code, &body)?;
        tracing::trace!(peer = %self.inner.peer, %msg, "received");
        Ok(Some(msg))
    }

    /// Sends `Close{code}` best-effort, then closes the socket.
    pub async fn close(&self, code: CloseCode) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut writer = self.inner.writer.lock().await;
        if let Ok(frame) = codec::encode(&Message::close(code)) {
            let _ = writer.write_all(&frame).await;
            let _ = writer.flush().await;
        }
        let _ = writer.shutdown().await;
        drop(writer);
        self.inner.shutdown.notify_waiters();
        tracing::debug!(peer = %self.inner.peer, %code, "connection closed");
    }

    /// Closes the socket without announcing it — used after the peer
    /// already sent its `Close`.
    pub async fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut writer = self.inner.writer.lock().await;
        let _ = writer.shutdown().await;
        drop(writer);
        self.inner.shutdown.notify_waiters();
        tracing::debug!(peer = %self.inner.peer, "connection shut down");
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.inner.peer)
            .field("closed", &self.is_closed())
            .finish()
    }
}
