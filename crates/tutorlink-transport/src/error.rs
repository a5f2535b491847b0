//! Error types for the transport layer.

use tutorlink_protocol::{CloseCode, ProtocolError};

/// Errors that can occur on a connection or during the handshake.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Establishing the TCP connection failed.
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    /// Binding the listening socket failed.
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    /// Accepting an incoming socket failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// Writing a frame failed. The duplex channel is assumed dead;
    /// the caller must tear the session down.
    #[error("send failed: {0}")]
    Send(#[source] std::io::Error),

    /// Reading a frame failed, and the socket was not locally closed.
    #[error("receive failed: {0}")]
    Receive(#[source] std::io::Error),

    /// The peer sent an explicit `Close` with the given code.
    #[error("connection closed by peer (code {0})")]
    ClosedByPeer(CloseCode),

    /// The peer closed the stream without a `Close` message.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The connection was already closed locally.
    #[error("connection closed locally")]
    Closed,

    /// The host rejected the registration password. Distinct from the
    /// generic failures so a client UI can prompt for a retry.
    #[error("password wrong")]
    PasswordWrong,

    /// The peer sent a message the handshake does not allow here.
    #[error("protocol violation: {0}")]
    Violation(String),

    /// A frame failed to encode or decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TransportError {
    /// True for failures confined to one connection attempt. A host
    /// listener keeps accepting after these; anything else means the
    /// listening socket itself is unusable.
    pub fn is_attempt_failure(&self) -> bool {
        matches!(
            self,
            TransportError::PasswordWrong
                | TransportError::Violation(_)
                | TransportError::ClosedByPeer(_)
                | TransportError::ConnectionClosed
                | TransportError::Protocol(_)
                | TransportError::Send(_)
                | TransportError::Receive(_)
        )
    }
}
