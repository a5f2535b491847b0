use thiserror::Error;
use tutorlink_protocol::GameId;

/// Errors from game controllers and factories.
#[derive(Debug, Error)]
pub enum GameError {
    /// A message reached a controller that it must not receive: wrong
    /// subtype, or a game id that does not match the running game.
    /// The session layer treats this as a protocol violation.
    #[error("game protocol violation: {0}")]
    Violation(String),

    /// No game is registered under this id.
    #[error("unknown game id {0}")]
    BadGameId(GameId),
}
