//! Pluggable games for Tutorlink.
//!
//! A game is a sub-protocol inside the `Game` message family: the host
//! starts it with `GameStart{id}`, drives it with `GameTransmit`, the
//! client answers with `GameReply`, and `GameEnd` tears it down. Each
//! side runs a [`GameController`] for the active game, created from a
//! [`GameFactory`] catalogue.
//!
//! The stock catalogue ships one game, FastRead ([`GameId::FAST_READ`]),
//! wired to the presentation layer through the [`TokenDisplay`] and
//! [`FastReadEvents`] collaborator traits.
//!
//! [`GameId::FAST_READ`]: tutorlink_protocol::GameId::FAST_READ

mod controller;
mod error;
mod factory;
mod fast_read;

pub use controller::{FastReadEvents, GameController, GameFactory, TokenDisplay};
pub use error::GameError;
pub use factory::{game_info, ClientGames, GameInfo, HostGames};
pub use fast_read::{FastReadClient, FastReadHost};
