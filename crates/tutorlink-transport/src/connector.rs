//! Client-side connector: opens the socket and runs the handshake.

use tokio::net::TcpStream;

use tutorlink_protocol::{
    CloseCode, Hello, Message, Registration, PROTOCOL_VERSION,
};

use crate::{Address, Connection, TransportError};

/// Connects to a host and establishes a session.
///
/// The client half of the handshake:
///
/// ```text
/// SendHello ── HelloReply{pw:false} ──────────────→ Established
///     │
///     └─ HelloReply{pw:true} → SendRegistration
///            ── RegistrationAccept ──────────────→ Established
///            ── Close{3} ─────────────────────────→ PasswordWrong
///            ── Close{c} ─────────────────────────→ ClosedByPeer(c)
///            ── anything else ────────────────────→ Violation
/// ```
///
/// There is no timeout: a host that never answers blocks the caller
/// until the socket dies or is closed.
pub struct Connector {
    address: Address,
    password: Option<String>,
    version: u32,
}

impl Connector {
    pub fn new(address: Address, password: Option<String>) -> Connector {
        Connector {
            address,
            password,
            version: PROTOCOL_VERSION,
        }
    }

    /// Overrides the version announced in `Hello` (tests, tooling).
    pub fn with_version(mut self, version: u32) -> Connector {
        self.version = version;
        self
    }

    /// Connects and performs the handshake. Blocking.
    pub async fn connect(&self) -> Result<Connection, TransportError> {
        let stream = TcpStream::connect((
            self.address.host(),
            self.address.port(),
        ))
        .await
        .map_err(TransportError::Connect)?;
        let peer = stream.peer_addr().map_err(TransportError::Connect)?;
        let conn = Connection::new(stream, peer);

        tracing::debug!(addr = %self.address, "connected, starting handshake");
        self.handshake(&conn).await?;
        tracing::info!(addr = %self.address, "session established");
        Ok(conn)
    }

    async fn handshake(&self, conn: &Connection) -> Result<(), TransportError> {
        conn.send(&Message::Hello(Hello {
            version: self.version,
        }))
        .await?;

        let password_required = match conn.receive().await? {
            Some(Message::HelloReply(reply)) => reply.password_required,
            Some(Message::Close(close)) => {
                conn.shutdown().await;
                return Err(TransportError::ClosedByPeer(close.code));
            }
            Some(other) => return Err(violation(conn, &other).await),
            None => return Err(TransportError::ConnectionClosed),
        };

        if !password_required {
            return Ok(());
        }

        conn.send(&Message::Registration(Registration {
            password: self.password.clone().unwrap_or_default(),
        }))
        .await?;

        match conn.receive().await? {
            Some(Message::RegistrationAccept(_)) => Ok(()),
            Some(Message::Close(close)) => {
                conn.shutdown().await;
                if close.code == CloseCode::PasswordWrong {
                    Err(TransportError::PasswordWrong)
                } else {
                    Err(TransportError::ClosedByPeer(close.code))
                }
            }
            Some(other) => Err(violation(conn, &other).await),
            None => Err(TransportError::ConnectionClosed),
        }
    }
}

/// Answers an out-of-sequence handshake message with `Close{2}` and
/// terminates the socket.
pub(crate) async fn violation(
    conn: &Connection,
    msg: &Message,
) -> TransportError {
    tracing::warn!(%msg, "handshake protocol violation");
    conn.close(CloseCode::Violation).await;
    TransportError::Violation(format!("unexpected {msg} during handshake"))
}
