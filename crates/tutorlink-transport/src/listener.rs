//! Host-side listener: accepts sockets and runs the host handshake.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Notify;

use tutorlink_protocol::{
    CloseCode, HelloReply, Message, RegistrationAccept,
};

use crate::connector::violation;
use crate::{Connection, TransportError};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 23432;

/// Connection-lifecycle phases reported to the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Not listening.
    Offline,
    /// Listening, no client yet.
    Online,
    /// A socket arrived, handshake in progress.
    Connecting,
    /// A session is established.
    Connected,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Offline => "offline",
            Status::Online => "online",
            Status::Connecting => "connecting",
            Status::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// Receives status changes from the listener. Implemented by the
/// host-side presentation layer.
pub trait StatusListener: Send + Sync + 'static {
    fn status_changed(&self, status: Status, message: &str);
}

/// No-op status sink for tests and headless hosts.
impl StatusListener for () {
    fn status_changed(&self, _status: Status, _message: &str) {}
}

/// Accepts incoming connections and performs the per-attempt handshake.
///
/// A failed attempt (wrong password, violation, peer gave up) returns
/// an error with [`TransportError::is_attempt_failure`] set so the
/// host can keep listening; [`Listener::listen`] does that loop.
///
/// `Listener` is a cheap-clone handle, so one clone can block in
/// [`accept`](Listener::accept) while another calls
/// [`stop`](Listener::stop).
pub struct Listener {
    inner: Arc<ListenerInner>,
}

struct ListenerInner {
    listener: TcpListener,
    password: Option<String>,
    status: Arc<dyn StatusListener>,
    stopped: AtomicBool,
    stop: Notify,
}

impl Clone for Listener {
    fn clone(&self) -> Self {
        Listener {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Listener {
    /// Binds the listening socket and reports [`Status::Online`].
    pub async fn bind(
        port: u16,
        password: Option<String>,
        status: Arc<dyn StatusListener>,
    ) -> Result<Listener, TransportError> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(TransportError::Bind)?;
        let addr = listener.local_addr().map_err(TransportError::Bind)?;
        tracing::info!(%addr, "listening");
        status.status_changed(Status::Online, &addr.to_string());
        Ok(Listener {
            inner: Arc::new(ListenerInner {
                listener,
                password,
                status,
                stopped: AtomicBool::new(false),
                stop: Notify::new(),
            }),
        })
    }

    /// The bound local address.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.inner.listener.local_addr().map_err(TransportError::Bind)
    }

    /// Stops listening: a pending [`accept`](Listener::accept) returns
    /// [`TransportError::Closed`] and [`Status::Offline`] is reported.
    pub fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.stop.notify_waiters();
        tracing::info!("listener stopped");
        self.inner.status.status_changed(Status::Offline, "");
    }

    /// Accepts one socket and runs one handshake attempt. Blocking.
    pub async fn accept(&self) -> Result<Connection, TransportError> {
        if self.inner.stopped.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let (stream, peer) = tokio::select! {
            _ = self.inner.stop.notified() => {
                return Err(TransportError::Closed);
            }
            res = self.inner.listener.accept() => {
                res.map_err(TransportError::Accept)?
            }
        };
        tracing::debug!(%peer, "socket accepted");
        self.inner
            .status
            .status_changed(Status::Connecting, &peer.to_string());

        let conn = Connection::new(stream, peer);
        match self.handshake(&conn).await {
            Ok(()) => {
                tracing::info!(%peer, "session established");
                self.inner
                    .status
                    .status_changed(Status::Connected, &peer.to_string());
                Ok(conn)
            }
            Err(e) => {
                tracing::warn!(%peer, error = %e, "handshake failed");
                Err(e)
            }
        }
    }

    /// Accepts until a session establishes, skipping failed attempts.
    pub async fn listen(&self) -> Result<Connection, TransportError> {
        loop {
            match self.accept().await {
                Ok(conn) => return Ok(conn),
                Err(e) if e.is_attempt_failure() => continue,
                Err(e) => return Err(e),
            }
        }
    }

    async fn handshake(&self, conn: &Connection) -> Result<(), TransportError> {
        // Wait for Hello and record the peer version.
        match conn.receive().await? {
            Some(Message::Hello(hello)) => {
                conn.record_peer_version(hello.version);
            }
            Some(other) => return Err(violation(conn, &other).await),
            None => return Err(TransportError::ConnectionClosed),
        }

        let password_required = self.inner.password.is_some();
        conn.send(&Message::HelloReply(HelloReply { password_required }))
            .await?;

        let Some(expected) = self.inner.password.as_deref() else {
            return Ok(());
        };

        match conn.receive().await? {
            Some(Message::Registration(reg)) => {
                if reg.password == expected {
                    conn.send(&Message::RegistrationAccept(
                        RegistrationAccept {},
                    ))
                    .await?;
                    Ok(())
                } else {
                    conn.close(CloseCode::PasswordWrong).await;
                    Err(TransportError::PasswordWrong)
                }
            }
            Some(Message::Close(close)) => {
                conn.shutdown().await;
                Err(TransportError::ClosedByPeer(close.code))
            }
            Some(other) => Err(violation(conn, &other).await),
            None => Err(TransportError::ConnectionClosed),
        }
    }
}
