//! The seams between the session layer, the games, and the
//! presentation layer.

use tutorlink_protocol::{GameId, Message};
use tutorlink_transport::Connection;

use crate::GameError;

/// One running game on one side of the connection.
///
/// A controller exists only while its game is active; the session
/// layer creates it on `GameStart` and drops it on `GameEnd` or on
/// any teardown. It sees exactly the game-family messages the session
/// layer forwards while the session is in the `Game` state.
pub trait GameController: Send {
    /// The id of the game this controller runs.
    fn id(&self) -> GameId;

    /// Handles one inbound game message.
    ///
    /// # Errors
    /// [`GameError::Violation`] when the message is of the wrong
    /// subtype or carries a different game id; the session layer
    /// escalates that to a connection teardown.
    fn message_received(&mut self, msg: &Message) -> Result<(), GameError>;
}

/// Creates the controller for a game id, one side's catalogue of
/// known games.
pub trait GameFactory: Send + Sync {
    /// # Errors
    /// [`GameError::BadGameId`] when the id is not in the catalogue.
    fn create(
        &self,
        id: GameId,
        conn: Connection,
    ) -> Result<Box<dyn GameController>, GameError>;
}

/// Client-side presentation collaborator for FastRead: shows a token
/// for a given duration and invokes `done` when the display is over.
///
/// `done` may be called from any thread; the reply to the host is
/// sent from a runtime task either way. Implementations must not
/// block in `display` itself.
pub trait TokenDisplay: Send + Sync + 'static {
    fn display(&self, token: &str, millis: u64, done: Box<dyn FnOnce() + Send>);
}

/// Host-side presentation collaborator for FastRead.
pub trait FastReadEvents: Send + Sync + 'static {
    /// The client finished displaying the last token.
    fn display_finished(&self);
}
