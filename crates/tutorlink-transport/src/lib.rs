//! TCP transport for Tutorlink.
//!
//! One host, one client, one long-lived connection:
//!
//! - [`Address`] — `host:port` endpoint parsing and formatting.
//! - [`Connection`] — a single socket carrying protocol frames, with
//!   a per-connection send lock and idempotent close.
//! - [`Connector`] — client side: connect plus handshake.
//! - [`Listener`] — host side: accept plus handshake, reporting
//!   [`Status`] changes to the presentation layer.
//!
//! The handshake itself (Hello / HelloReply / Registration /
//! RegistrationAccept) lives here because it runs before the session
//! layer takes over; everything after `Established` flows through the
//! receiver pump in `tutorlink-session`.

mod address;
mod connection;
mod connector;
mod error;
mod listener;

pub use address::{Address, AddressError};
pub use connection::Connection;
pub use connector::Connector;
pub use error::TransportError;
pub use listener::{Listener, Status, StatusListener, DEFAULT_PORT};
