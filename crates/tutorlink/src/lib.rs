//! # Tutorlink
//!
//! One-to-one tutoring sessions over TCP: a host (the tutor) listens,
//! a client (the student) connects, and the host drives worksheets
//! and games across the connection.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tutorlink::prelude::*;
//!
//! # async fn run(display: Arc<dyn TokenDisplay>) -> Result<(), TutorlinkError> {
//! let address = Address::parse("tutor.example.org:23432")?;
//! let client = Client::connect(
//!     ClientConfig::new(address),
//!     Arc::new(ClientGames::new(display)),
//!     Arc::new(()),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! The layers live in their own crates — `tutorlink-protocol` (wire
//! format), `tutorlink-transport` (sockets and handshake),
//! `tutorlink-game` (pluggable games), `tutorlink-session` (state
//! machine) — and are re-exported here.

mod client;
mod config;
mod error;
mod host;

pub use client::Client;
pub use config::{ClientConfig, HostConfig};
pub use error::TutorlinkError;
pub use host::{FastReadHandle, Host, HostListener};

pub use tutorlink_game::{
    game_info, ClientGames, FastReadEvents, GameController, GameError,
    GameFactory, GameInfo, HostGames, TokenDisplay,
};
pub use tutorlink_protocol::{
    CloseCode, GameId, GamePayload, Message, ReplyPayload, PROTOCOL_VERSION,
};
pub use tutorlink_session::{SessionEvents, SessionState};
pub use tutorlink_transport::{
    Address, AddressError, Status, StatusListener, DEFAULT_PORT,
};

/// Everything most applications need.
pub mod prelude {
    pub use crate::{
        game_info, Address, Client, ClientConfig, ClientGames, CloseCode,
        FastReadEvents, FastReadHandle, GameId, GamePayload, Host,
        HostConfig, HostGames, SessionEvents, SessionState, Status,
        StatusListener, TokenDisplay, TutorlinkError, DEFAULT_PORT,
    };
}
