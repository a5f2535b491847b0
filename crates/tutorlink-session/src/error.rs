use thiserror::Error;

use tutorlink_game::GameError;
use tutorlink_transport::TransportError;

use crate::SessionState;

/// Errors from session-level operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The operation is not legal in the current session state.
    #[error("cannot {op} while {state}")]
    BadState {
        op: &'static str,
        state: SessionState,
    },

    /// The operation belongs to the other role of the session.
    #[error("operation {0} is not available for this role")]
    WrongRole(&'static str),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
