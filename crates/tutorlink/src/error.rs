use thiserror::Error;

use tutorlink_game::GameError;
use tutorlink_protocol::ProtocolError;
use tutorlink_session::SessionError;
use tutorlink_transport::{AddressError, TransportError};

/// Unified error for the facade API.
#[derive(Debug, Error)]
pub enum TutorlinkError {
    /// The host rejected the password. Distinct from the other
    /// transport failures so a UI can prompt again.
    #[error("password rejected by host")]
    PasswordWrong,

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
