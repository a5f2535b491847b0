//! Stock game catalogues, one arm per known game.

use std::sync::Arc;

use tutorlink_protocol::GameId;
use tutorlink_transport::Connection;

use crate::fast_read::{FastReadClient, FastReadHost};
use crate::{FastReadEvents, GameController, GameError, GameFactory, TokenDisplay};

/// The games a client can be asked to play.
pub struct ClientGames {
    display: Arc<dyn TokenDisplay>,
}

impl ClientGames {
    pub fn new(display: Arc<dyn TokenDisplay>) -> ClientGames {
        ClientGames { display }
    }
}

impl GameFactory for ClientGames {
    fn create(
        &self,
        id: GameId,
        conn: Connection,
    ) -> Result<Box<dyn GameController>, GameError> {
        match id {
            GameId::FAST_READ => Ok(Box::new(FastReadClient::new(
                conn,
                self.display.clone(),
            ))),
            other => Err(GameError::BadGameId(other)),
        }
    }
}

/// The games a host can run.
pub struct HostGames {
    fast_read: Arc<dyn FastReadEvents>,
}

impl HostGames {
    pub fn new(fast_read: Arc<dyn FastReadEvents>) -> HostGames {
        HostGames { fast_read }
    }
}

impl GameFactory for HostGames {
    fn create(
        &self,
        id: GameId,
        _conn: Connection,
    ) -> Result<Box<dyn GameController>, GameError> {
        match id {
            GameId::FAST_READ => {
                Ok(Box::new(FastReadHost::new(self.fast_read.clone())))
            }
            other => Err(GameError::BadGameId(other)),
        }
    }
}

/// Human-readable description of a game, for menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Looks up the catalogue entry for a game id.
///
/// # Errors
/// [`GameError::BadGameId`] for ids not in the catalogue.
pub fn game_info(id: GameId) -> Result<GameInfo, GameError> {
    match id {
        GameId::FAST_READ => Ok(GameInfo {
            name: "FastRead",
            description: "flashes a reading token at the client for a \
                          fixed number of milliseconds",
        }),
        other => Err(GameError::BadGameId(other)),
    }
}
