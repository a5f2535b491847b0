//! Message types for the Tutorlink wire protocol.
//!
//! Every message on the wire is one variant of [`Message`], a closed sum
//! type. The numeric type code is split into a high-byte **family** and a
//! low-byte subtype:
//!
//! | Code   | Message            | Direction     |
//! |--------|--------------------|---------------|
//! | 0x0100 | Close              | either        |
//! | 0x0101 | Hello              | client → host |
//! | 0x0102 | HelloReply         | host → client |
//! | 0x0103 | Registration       | client → host |
//! | 0x0104 | RegistrationAccept | host → client |
//! | 0x0201 | WorkSheetStart     | host → client |
//! | 0x0202 | WorkSheetEnd       | host → client |
//! | 0x0203 | WorkSheetAnswer    | client → host |
//! | 0x0300 | GameEnd            | host → client |
//! | 0x0301 | GameStart          | host → client |
//! | 0x0302 | GameTransmit       | host → client |
//! | 0x0303 | GameReply          | client → host |
//!
//! A `Message` value always carries a payload matching its type code —
//! the variant *is* the type code. The registry in [`crate::codec`]
//! upholds the same invariant on decode.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Protocol version sent in [`Hello`]. Major in the high half,
/// minor in the low half.
pub const PROTOCOL_VERSION: u32 = 0x0001_0001;

/// Numeric type codes, one per [`Message`] variant.
pub mod codes {
    pub const CLOSE: u16 = 0x0100;
    pub const HELLO: u16 = 0x0101;
    pub const HELLO_REPLY: u16 = 0x0102;
    pub const REGISTRATION: u16 = 0x0103;
    pub const REGISTRATION_ACCEPT: u16 = 0x0104;
    pub const WORKSHEET_START: u16 = 0x0201;
    pub const WORKSHEET_END: u16 = 0x0202;
    pub const WORKSHEET_ANSWER: u16 = 0x0203;
    pub const GAME_END: u16 = 0x0300;
    pub const GAME_START: u16 = 0x0301;
    pub const GAME_TRANSMIT: u16 = 0x0302;
    pub const GAME_REPLY: u16 = 0x0303;
}

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a game sub-protocol.
///
/// Newtype over `u32` so a game id can't be confused with a close code
/// or a version number. Serializes as the plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u32);

impl GameId {
    /// The canonical timed word-flash game.
    pub const FAST_READ: GameId = GameId(0);
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Close codes
// ---------------------------------------------------------------------------

/// Reason carried by a [`Close`] message.
///
/// The wire value is a plain `u32`; codes the protocol does not define
/// round-trip through [`CloseCode::Other`] instead of failing decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum CloseCode {
    /// Normal shutdown.
    Normal,
    /// The user on the other side chose to disconnect.
    User,
    /// The peer violated the protocol.
    Violation,
    /// Registration carried the wrong password.
    PasswordWrong,
    /// A code this version of the protocol does not define.
    Other(u32),
}

impl From<u32> for CloseCode {
    fn from(code: u32) -> Self {
        match code {
            0 => CloseCode::Normal,
            1 => CloseCode::User,
            2 => CloseCode::Violation,
            3 => CloseCode::PasswordWrong,
            other => CloseCode::Other(other),
        }
    }
}

impl From<CloseCode> for u32 {
    fn from(code: CloseCode) -> u32 {
        match code {
            CloseCode::Normal => 0,
            CloseCode::User => 1,
            CloseCode::Violation => 2,
            CloseCode::PasswordWrong => 3,
            CloseCode::Other(other) => other,
        }
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u32::from(*self))
    }
}

// ---------------------------------------------------------------------------
// Family
// ---------------------------------------------------------------------------

/// High-byte grouping of message type codes.
///
/// The session controller dispatches on the family first and only then
/// on the subtype, so "which family is legal in which state" stays in
/// one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Connection lifecycle: handshake and close (0x01xx).
    Control,
    /// Worksheet presentation (0x02xx).
    WorkSheet,
    /// Game sub-protocol (0x03xx).
    Game,
}

impl Family {
    /// Extracts the family from a raw type code, if it is one the
    /// protocol defines.
    pub fn of(code: u16) -> Option<Family> {
        match code >> 8 {
            0x01 => Some(Family::Control),
            0x02 => Some(Family::WorkSheet),
            0x03 => Some(Family::Game),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Payload structs — one per wire subtype
// ---------------------------------------------------------------------------

/// 0x0100 — either side closes the session, with a reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Close {
    pub code: CloseCode,
}

/// 0x0101 — client opens the handshake and states its version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hello {
    pub version: u32,
}

/// 0x0102 — host answers a [`Hello`].
///
/// There is no accept/reject flag: the reply itself is the acceptance,
/// and `password_required` says whether a [`Registration`] must follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelloReply {
    pub password_required: bool,
}

/// 0x0103 — client authenticates with the host's password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub password: String,
}

/// 0x0104 — host accepts a [`Registration`]. Empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationAccept {}

/// 0x0201 — host starts a worksheet presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSheetStart {
    pub sheet: String,
}

/// 0x0202 — host ends the worksheet presentation. Empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSheetEnd {}

/// 0x0203 — client answers within a running worksheet.
///
/// The payload is opaque to the session layer; it is forwarded to the
/// worksheet-presentation collaborator as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSheetAnswer {
    pub data: String,
}

/// 0x0300 — host ends the active game. Empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEnd {}

/// 0x0301 — host starts the game with the given id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStart {
    pub game_id: GameId,
}

/// 0x0302 — host drives the active game.
///
/// `game_id` must equal the active game's id; the payload variant must
/// belong to that same game. Receivers validate both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameTransmit {
    pub game_id: GameId,
    pub payload: GamePayload,
}

/// 0x0303 — client replies within the active game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReply {
    pub game_id: GameId,
    pub payload: ReplyPayload,
}

/// Game-specific content of a [`GameTransmit`]. One variant per game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", content = "data")]
pub enum GamePayload {
    /// FastRead: flash `token` for `millis` milliseconds.
    FastRead { token: String, millis: u64 },
}

impl GamePayload {
    /// The game this payload belongs to.
    pub fn game_id(&self) -> GameId {
        match self {
            GamePayload::FastRead { .. } => GameId::FAST_READ,
        }
    }
}

/// Game-specific content of a [`GameReply`]. One variant per game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", content = "data")]
pub enum ReplyPayload {
    /// FastRead: the display finished. No fields.
    FastRead,
}

impl ReplyPayload {
    /// The game this payload belongs to.
    pub fn game_id(&self) -> GameId {
        match self {
            ReplyPayload::FastRead => GameId::FAST_READ,
        }
    }
}

// ---------------------------------------------------------------------------
// Message — the envelope
// ---------------------------------------------------------------------------

/// One protocol message: the closed set of everything that can travel
/// on the wire.
///
/// Constructed directly from a payload struct, or by the type registry
/// on decode. The type code is derived from the variant, so a message
/// whose content contradicts its code cannot be represented.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Close(Close),
    Hello(Hello),
    HelloReply(HelloReply),
    Registration(Registration),
    RegistrationAccept(RegistrationAccept),
    WorkSheetStart(WorkSheetStart),
    WorkSheetEnd(WorkSheetEnd),
    WorkSheetAnswer(WorkSheetAnswer),
    GameEnd(GameEnd),
    GameStart(GameStart),
    GameTransmit(GameTransmit),
    GameReply(GameReply),
}

impl Message {
    /// The numeric type code of this message.
    pub fn type_code(&self) -> u16 {
        match self {
            Message::Close(_) => codes::CLOSE,
            Message::Hello(_) => codes::HELLO,
            Message::HelloReply(_) => codes::HELLO_REPLY,
            Message::Registration(_) => codes::REGISTRATION,
            Message::RegistrationAccept(_) => codes::REGISTRATION_ACCEPT,
            Message::WorkSheetStart(_) => codes::WORKSHEET_START,
            Message::WorkSheetEnd(_) => codes::WORKSHEET_END,
            Message::WorkSheetAnswer(_) => codes::WORKSHEET_ANSWER,
            Message::GameEnd(_) => codes::GAME_END,
            Message::GameStart(_) => codes::GAME_START,
            Message::GameTransmit(_) => codes::GAME_TRANSMIT,
            Message::GameReply(_) => codes::GAME_REPLY,
        }
    }

    /// The family of this message. Total, since the variant set is closed.
    pub fn family(&self) -> Family {
        // Every defined code has a defined family.
        Family::of(self.type_code()).expect("defined code has a family")
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Message::Close(_) => "Close",
            Message::Hello(_) => "Hello",
            Message::HelloReply(_) => "HelloReply",
            Message::Registration(_) => "Registration",
            Message::RegistrationAccept(_) => "RegistrationAccept",
            Message::WorkSheetStart(_) => "WorkSheetStart",
            Message::WorkSheetEnd(_) => "WorkSheetEnd",
            Message::WorkSheetAnswer(_) => "WorkSheetAnswer",
            Message::GameEnd(_) => "GameEnd",
            Message::GameStart(_) => "GameStart",
            Message::GameTransmit(_) => "GameTransmit",
            Message::GameReply(_) => "GameReply",
        }
    }

    /// Convenience constructor for the common close message.
    pub fn close(code: CloseCode) -> Message {
        Message::Close(Close { code })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:04x}", self.name(), self.type_code())
    }
}

// =========================================================================
// Tests
// =========================================================================
