//! The receiver pump: the only inbound path after the handshake.

use tokio::task::JoinHandle;

use tutorlink_protocol::Message;
use tutorlink_transport::{Connection, TransportError};

use crate::SessionController;

/// Spawns the per-connection receive loop.
///
/// The loop ends on clean end-of-stream, after dispatching a `Close`,
/// on a frame the registry rejects (a protocol violation, answered
/// with `Close{2}`), or on an I/O error (reported to the controller
/// as connection loss). The task never outlives the connection.
pub fn spawn_receiver(
    conn: Connection,
    controller: SessionController,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match conn.receive().await {
                Ok(Some(msg)) => {
                    let was_close = matches!(msg, Message::Close(_));
                    controller.message_received(&msg).await;
                    if was_close {
                        break;
                    }
                }
                Ok(None) => break,
                // An unknown type code or an unreadable body is the
                // peer breaking protocol, not the link dying.
                Err(TransportError::Protocol(e)) => {
                    tracing::warn!(peer = %conn.peer_addr(), error = %e, "unreadable frame");
                    controller.protocol_violation(&e.to_string()).await;
                    break;
                }
                Err(e) => {
                    tracing::warn!(peer = %conn.peer_addr(), error = %e, "receive failed");
                    controller.connection_lost().await;
                    break;
                }
            }
        }
        tracing::debug!(peer = %conn.peer_addr(), "receiver stopped");
    })
}
