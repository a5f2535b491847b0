//! Wire protocol for Tutorlink.
//!
//! This crate defines the language a host and a client speak:
//!
//! - **Types** ([`Message`] and its payload structs) — the closed set of
//!   messages that travel on the wire, grouped into families
//!   (Control, WorkSheet, Game).
//! - **Codec** ([`codec`]) — the explicit frame format
//!   (`type_code | body_len | body`) and the type registry that maps
//!   each code to its one decoder.
//! - **Errors** ([`ProtocolError`]) — what can go wrong on the way
//!   to or from bytes.
//!
//! The protocol layer knows nothing about sockets or session state; it
//! only converts between [`Message`] values and frames.

pub mod codec;
mod error;
mod types;

pub use error::ProtocolError;
pub use types::{
    codes, Close, CloseCode, Family, GameEnd, GameId, GamePayload,
    GameReply, GameStart, GameTransmit, Hello, HelloReply, Message,
    Registration, RegistrationAccept, ReplyPayload, WorkSheetAnswer,
    WorkSheetEnd, WorkSheetStart, PROTOCOL_VERSION,
};
