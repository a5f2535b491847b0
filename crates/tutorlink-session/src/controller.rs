//! The session state machine.
//!
//! One controller per established connection, shared between the
//! receiver task (inbound messages) and the foreground API (outbound
//! actions). All access goes through one async lock, so inbound
//! processing is serialized and outbound actions never interleave
//! with it.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use tutorlink_game::{GameController, GameFactory};
use tutorlink_protocol::{
    CloseCode, GameEnd, GameId, GamePayload, GameStart, GameTransmit,
    Message, WorkSheetEnd, WorkSheetStart,
};
use tutorlink_transport::Connection;

use crate::{SessionError, SessionEvents};

/// Where the session currently is.
///
/// `Game` and `WorkSheet` are both "connected, with an exclusive
/// activity running" — the two activities never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Offline,
    Connected,
    Game,
    WorkSheet,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Offline => "offline",
            SessionState::Connected => "connected",
            SessionState::Game => "in a game",
            SessionState::WorkSheet => "in a worksheet",
        };
        f.write_str(s)
    }
}

/// Which end of the session this controller runs. The dispatch rules
/// are asymmetric: the host drives, the client follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Client,
}

/// Cheap-clone handle to the per-connection session state.
#[derive(Clone)]
pub struct SessionController {
    core: Arc<Mutex<Core>>,
}

struct Core {
    role: Role,
    state: SessionState,
    conn: Connection,
    games: Arc<dyn GameFactory>,
    events: Arc<dyn SessionEvents>,
    active: Option<Box<dyn GameController>>,
}

impl SessionController {
    /// Wraps an established connection. The session starts in
    /// `Connected` and the events sink is told so.
    pub fn new(
        role: Role,
        conn: Connection,
        games: Arc<dyn GameFactory>,
        events: Arc<dyn SessionEvents>,
    ) -> SessionController {
        events.connected();
        SessionController {
            core: Arc::new(Mutex::new(Core {
                role,
                state: SessionState::Connected,
                conn,
                games,
                events,
                active: None,
            })),
        }
    }

    /// The current session state.
    pub async fn state(&self) -> SessionState {
        self.core.lock().await.state
    }

    /// Handles one inbound message. Called by the receiver task.
    pub async fn message_received(&self, msg: &Message) {
        self.core.lock().await.dispatch(msg).await;
    }

    /// An inbound frame the registry rejected. Treated like any other
    /// protocol violation: answer `Close{2}` and tear down.
    pub async fn protocol_violation(&self, why: &str) {
        let mut core = self.core.lock().await;
        tracing::warn!(why, state = %core.state, "protocol violation");
        core.violate().await;
    }

    /// The socket died without a `Close`. Tears down to `Offline`.
    pub async fn connection_lost(&self) {
        let mut core = self.core.lock().await;
        if core.state == SessionState::Offline {
            return;
        }
        tracing::warn!(peer = %core.conn.peer_addr(), "connection lost");
        core.conn.shutdown().await;
        core.teardown();
        core.events.connection_lost();
    }

    // -- outbound actions (host drives, both sides can disconnect) --

    /// Starts the game with the given id: sends `GameStart` and
    /// activates the host-side controller.
    pub async fn start_game(&self, id: GameId) -> Result<(), SessionError> {
        let mut core = self.core.lock().await;
        core.require(Role::Host, "start_game")?;
        core.require_state(SessionState::Connected, "start a game")?;
        // An unknown id fails here, before anything hits the wire.
        let game = core.games.create(id, core.conn.clone())?;
        core.conn
            .send(&Message::GameStart(GameStart { game_id: id }))
            .await?;
        core.active = Some(game);
        core.state = SessionState::Game;
        tracing::info!(%id, "game started");
        Ok(())
    }

    /// Sends one `GameTransmit` into the active game.
    pub async fn send_transmit(
        &self,
        payload: GamePayload,
    ) -> Result<(), SessionError> {
        let mut core = self.core.lock().await;
        core.require(Role::Host, "send_transmit")?;
        core.require_state(SessionState::Game, "transmit")?;
        let game_id = payload.game_id();
        let active = core.active.as_ref().map(|g| g.id());
        if active != Some(game_id) {
            return Err(SessionError::Game(
                tutorlink_game::GameError::Violation(format!(
                    "transmit for {game_id} does not match the active game"
                )),
            ));
        }
        core.conn
            .send(&Message::GameTransmit(GameTransmit { game_id, payload }))
            .await?;
        Ok(())
    }

    /// Ends the active game: sends `GameEnd`, drops the controller.
    pub async fn end_game(&self) -> Result<(), SessionError> {
        let mut core = self.core.lock().await;
        core.require(Role::Host, "end_game")?;
        core.require_state(SessionState::Game, "end a game")?;
        core.conn.send(&Message::GameEnd(GameEnd {})).await?;
        core.active = None;
        core.state = SessionState::Connected;
        tracing::info!("game ended");
        Ok(())
    }

    /// Opens a worksheet presentation on the client.
    pub async fn start_worksheet(
        &self,
        sheet: &str,
    ) -> Result<(), SessionError> {
        let mut core = self.core.lock().await;
        core.require(Role::Host, "start_worksheet")?;
        core.require_state(SessionState::Connected, "start a worksheet")?;
        core.conn
            .send(&Message::WorkSheetStart(WorkSheetStart {
                sheet: sheet.to_string(),
            }))
            .await?;
        core.state = SessionState::WorkSheet;
        Ok(())
    }

    /// Closes the worksheet presentation.
    pub async fn end_worksheet(&self) -> Result<(), SessionError> {
        let mut core = self.core.lock().await;
        core.require(Role::Host, "end_worksheet")?;
        core.require_state(SessionState::WorkSheet, "end a worksheet")?;
        core.conn.send(&Message::WorkSheetEnd(WorkSheetEnd {})).await?;
        core.state = SessionState::Connected;
        Ok(())
    }

    /// Ends the session deliberately: sends `Close{1}` and goes
    /// `Offline`. A no-op when already offline.
    pub async fn disconnect(&self) {
        let mut core = self.core.lock().await;
        if core.state == SessionState::Offline {
            return;
        }
        core.conn.close(CloseCode::User).await;
        core.teardown();
        tracing::info!("disconnected");
    }
}

impl Core {
    async fn dispatch(&mut self, msg: &Message) {
        tracing::trace!(%msg, state = %self.state, "dispatching");
        match msg {
            // Close is legal in every state. Arriving while already
            // offline it is simply ignored, so crossing closes from
            // both ends resolve without a second teardown.
            Message::Close(close) => {
                if self.state == SessionState::Offline {
                    tracing::debug!("close while offline, ignored");
                    return;
                }
                self.conn.shutdown().await;
                self.teardown();
                self.events.disconnected(close.code);
            }

            _ if self.state == SessionState::Offline => {
                self.violation(msg, "session is offline").await;
            }

            Message::WorkSheetStart(start) => {
                match (self.role, self.state) {
                    (Role::Client, SessionState::Connected) => {
                        self.state = SessionState::WorkSheet;
                        self.events.worksheet_started(&start.sheet);
                    }
                    _ => self.violation(msg, "worksheet not startable").await,
                }
            }

            Message::WorkSheetEnd(_) => match (self.role, self.state) {
                (Role::Client, SessionState::WorkSheet) => {
                    self.state = SessionState::Connected;
                    self.events.worksheet_ended();
                }
                _ => self.violation(msg, "no worksheet running").await,
            },

            Message::WorkSheetAnswer(answer) => match (self.role, self.state) {
                (Role::Host, SessionState::WorkSheet) => {
                    self.events.worksheet_answer(&answer.data);
                }
                _ => self.violation(msg, "answer outside a worksheet").await,
            },

            Message::GameStart(start) => match (self.role, self.state) {
                (Role::Client, SessionState::Connected) => {
                    match self.games.create(start.game_id, self.conn.clone()) {
                        Ok(game) => {
                            self.active = Some(game);
                            self.state = SessionState::Game;
                            self.events.game_started(start.game_id);
                        }
                        Err(e) => {
                            self.violation(msg, &e.to_string()).await;
                        }
                    }
                }
                _ => self.violation(msg, "game not startable").await,
            },

            Message::GameEnd(_) => match (self.role, self.state) {
                (Role::Client, SessionState::Game) => {
                    self.active = None;
                    self.state = SessionState::Connected;
                    self.events.game_ended();
                }
                _ => self.violation(msg, "no game running").await,
            },

            Message::GameTransmit(_) => match (self.role, self.state) {
                (Role::Client, SessionState::Game) => self.forward(msg).await,
                _ => self.violation(msg, "transmit outside a game").await,
            },

            Message::GameReply(_) => match (self.role, self.state) {
                (Role::Host, SessionState::Game) => self.forward(msg).await,
                _ => self.violation(msg, "reply outside a game").await,
            },

            // Handshake messages are finished business by the time a
            // controller exists.
            Message::Hello(_)
            | Message::HelloReply(_)
            | Message::Registration(_)
            | Message::RegistrationAccept(_) => {
                self.violation(msg, "handshake message after establishment")
                    .await;
            }
        }
    }

    /// Hands a game-family message to the active controller; a
    /// [`GameError::Violation`] escalates to a session violation.
    ///
    /// [`GameError::Violation`]: tutorlink_game::GameError::Violation
    async fn forward(&mut self, msg: &Message) {
        let result = match self.active.as_mut() {
            Some(game) => game.message_received(msg),
            None => {
                // In the `Game` state a controller is always present.
                self.violation(msg, "no active game controller").await;
                return;
            }
        };
        if let Err(e) = result {
            self.violation(msg, &e.to_string()).await;
        }
    }

    /// Protocol violation: answer `Close{2}`, drop the socket, reset
    /// to `Offline`. Never a crash, never a process exit.
    async fn violation(&mut self, msg: &Message, why: &str) {
        tracing::warn!(%msg, why, state = %self.state, "protocol violation");
        self.violate().await;
    }

    async fn violate(&mut self) {
        if self.state == SessionState::Offline {
            return;
        }
        self.conn.close(CloseCode::Violation).await;
        self.teardown();
        self.events.disconnected(CloseCode::Violation);
    }

    fn teardown(&mut self) {
        self.state = SessionState::Offline;
        self.active = None;
    }

    fn require(&self, role: Role, op: &'static str) -> Result<(), SessionError> {
        if self.role == role {
            Ok(())
        } else {
            Err(SessionError::WrongRole(op))
        }
    }

    fn require_state(
        &self,
        state: SessionState,
        op: &'static str,
    ) -> Result<(), SessionError> {
        if self.state == state {
            Ok(())
        } else {
            Err(SessionError::BadState {
                op,
                state: self.state,
            })
        }
    }
}
