//! FastRead, the stock game: the host flashes a reading token at the
//! client for a fixed duration, the client reports when the display
//! is over.

use std::sync::Arc;

use tutorlink_protocol::{GameId, GamePayload, GameReply, Message, ReplyPayload};
use tutorlink_transport::Connection;

use crate::{FastReadEvents, GameController, GameError, TokenDisplay};

/// Client side: receives `GameTransmit{FastRead}`, drives the
/// [`TokenDisplay`] collaborator, and answers with
/// `GameReply{FastRead}` once the display finishes.
pub struct FastReadClient {
    conn: Connection,
    display: Arc<dyn TokenDisplay>,
}

impl FastReadClient {
    pub fn new(conn: Connection, display: Arc<dyn TokenDisplay>) -> FastReadClient {
        FastReadClient { conn, display }
    }
}

impl GameController for FastReadClient {
    fn id(&self) -> GameId {
        GameId::FAST_READ
    }

    fn message_received(&mut self, msg: &Message) -> Result<(), GameError> {
        let transmit = match msg {
            Message::GameTransmit(t) => t,
            other => {
                return Err(GameError::Violation(format!(
                    "unexpected {other} in fast-read"
                )));
            }
        };
        if transmit.game_id != GameId::FAST_READ
            || transmit.payload.game_id() != GameId::FAST_READ
        {
            return Err(GameError::Violation(format!(
                "transmit for {} while fast-read is active",
                transmit.game_id
            )));
        }
        let GamePayload::FastRead { token, millis } = &transmit.payload;

        tracing::debug!(%token, millis = *millis, "fast-read display");

        // The reply is sent from a runtime task so the display
        // collaborator may complete from any thread.
        let conn = self.conn.clone();
        let handle = tokio::runtime::Handle::current();
        let done: Box<dyn FnOnce() + Send> = Box::new(move || {
            handle.spawn(async move {
                let reply = Message::GameReply(GameReply {
                    game_id: GameId::FAST_READ,
                    payload: ReplyPayload::FastRead,
                });
                if let Err(e) = conn.send(&reply).await {
                    tracing::warn!(error = %e, "fast-read reply not sent");
                }
            });
        });
        self.display.display(token, *millis, done);
        Ok(())
    }
}

/// Host side: receives `GameReply{FastRead}` and notifies the
/// [`FastReadEvents`] collaborator.
pub struct FastReadHost {
    events: Arc<dyn FastReadEvents>,
}

impl FastReadHost {
    pub fn new(events: Arc<dyn FastReadEvents>) -> FastReadHost {
        FastReadHost { events }
    }
}

impl GameController for FastReadHost {
    fn id(&self) -> GameId {
        GameId::FAST_READ
    }

    fn message_received(&mut self, msg: &Message) -> Result<(), GameError> {
        let reply = match msg {
            Message::GameReply(r) => r,
            other => {
                return Err(GameError::Violation(format!(
                    "unexpected {other} in fast-read"
                )));
            }
        };
        if reply.game_id != GameId::FAST_READ
            || reply.payload.game_id() != GameId::FAST_READ
        {
            return Err(GameError::Violation(format!(
                "reply for {} while fast-read is active",
                reply.game_id
            )));
        }
        tracing::debug!("fast-read display finished");
        self.events.display_finished();
        Ok(())
    }
}
