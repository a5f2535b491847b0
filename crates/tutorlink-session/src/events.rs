use tutorlink_protocol::{CloseCode, GameId};

/// Presentation-layer notifications for session-level happenings.
///
/// Every method defaults to a no-op so implementors pick only what
/// they show. Methods are called from the receiver task with the
/// session lock held, so they must return quickly and must not call
/// back into the session.
pub trait SessionEvents: Send + Sync + 'static {
    /// A session was established.
    fn connected(&self) {}

    /// The session ended, locally or by the peer, with the close code
    /// that travelled on the wire.
    fn disconnected(&self, code: CloseCode) {
        let _ = code;
    }

    /// The socket died without a `Close`.
    fn connection_lost(&self) {}

    /// A game started (inbound `GameStart` on the client).
    fn game_started(&self, id: GameId) {
        let _ = id;
    }

    /// The active game ended.
    fn game_ended(&self) {}

    /// The host opened a worksheet.
    fn worksheet_started(&self, sheet: &str) {
        let _ = sheet;
    }

    /// A client answered within the worksheet (host side).
    fn worksheet_answer(&self, data: &str) {
        let _ = data;
    }

    /// The worksheet closed.
    fn worksheet_ended(&self) {}
}

/// No-op sink for tests and headless use.
impl SessionEvents for () {}
