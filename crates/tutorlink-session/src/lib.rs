//! Session layer for Tutorlink.
//!
//! Sits on an established [`Connection`] and owns everything after the
//! handshake: the [`SessionController`] state machine (`Offline`,
//! `Connected`, `Game`, `WorkSheet`), the receiver pump feeding it,
//! and the [`SessionEvents`] seam to the presentation layer.
//!
//! [`Connection`]: tutorlink_transport::Connection

mod controller;
mod error;
mod events;
mod receiver;

pub use controller::{Role, SessionController, SessionState};
pub use error::SessionError;
pub use events::SessionEvents;
pub use receiver::spawn_receiver;
