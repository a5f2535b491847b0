//! Host entry point: listen, drive worksheets and games, disconnect.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use tutorlink_game::GameFactory;
use tutorlink_protocol::{GameId, GamePayload};
use tutorlink_session::{
    spawn_receiver, Role, SessionController, SessionEvents, SessionState,
};
use tutorlink_transport::{Connection, Listener, StatusListener};

use crate::{HostConfig, TutorlinkError};

/// A bound, not yet connected host. Splitting bind from establish
/// lets callers learn the listening port (ephemeral ports especially)
/// before a client can reach it.
pub struct HostListener {
    listener: Listener,
    games: Arc<dyn GameFactory>,
    events: Arc<dyn SessionEvents>,
}

impl HostListener {
    /// The bound listening address.
    pub fn local_addr(&self) -> Result<SocketAddr, TutorlinkError> {
        Ok(self.listener.local_addr()?)
    }

    /// Stops listening without ever establishing a session.
    pub fn stop(&self) {
        self.listener.stop();
    }

    /// Blocks until a client completes the handshake, then starts the
    /// session.
    pub async fn establish(self) -> Result<Host, TutorlinkError> {
        let conn = self.listener.listen().await?;
        let controller = SessionController::new(
            Role::Host,
            conn.clone(),
            self.games,
            self.events,
        );
        let receiver = spawn_receiver(conn.clone(), controller.clone());
        Ok(Host {
            controller,
            conn,
            listener: self.listener,
            receiver,
        })
    }
}

/// The host side of a running session: one connected client, driven
/// through worksheets and games from here.
pub struct Host {
    controller: SessionController,
    conn: Connection,
    listener: Listener,
    receiver: JoinHandle<()>,
}

impl Host {
    /// Binds the listening socket. The returned [`HostListener`]
    /// reports `Status::Online` immediately and waits for a client in
    /// [`establish`](HostListener::establish).
    pub async fn bind(
        config: HostConfig,
        games: Arc<dyn GameFactory>,
        events: Arc<dyn SessionEvents>,
        status: Arc<dyn StatusListener>,
    ) -> Result<HostListener, TutorlinkError> {
        let listener =
            Listener::bind(config.port, config.password, status).await?;
        Ok(HostListener {
            listener,
            games,
            events,
        })
    }

    /// Binds and waits for one client: [`bind`](Host::bind) followed
    /// by [`establish`](HostListener::establish).
    pub async fn listen(
        config: HostConfig,
        games: Arc<dyn GameFactory>,
        events: Arc<dyn SessionEvents>,
        status: Arc<dyn StatusListener>,
    ) -> Result<Host, TutorlinkError> {
        Host::bind(config, games, events, status)
            .await?
            .establish()
            .await
    }

    /// The listening address.
    pub fn local_addr(&self) -> Result<SocketAddr, TutorlinkError> {
        Ok(self.listener.local_addr()?)
    }

    /// The connected client.
    pub fn peer_addr(&self) -> SocketAddr {
        self.conn.peer_addr()
    }

    /// The protocol version the client announced.
    pub fn peer_version(&self) -> Option<u32> {
        self.conn.peer_version()
    }

    /// The current session state.
    pub async fn state(&self) -> SessionState {
        self.controller.state().await
    }

    /// Starts the game with the given id on both sides.
    pub async fn start_game(&self, id: GameId) -> Result<(), TutorlinkError> {
        Ok(self.controller.start_game(id).await?)
    }

    /// Sends game content into the active game.
    pub async fn send_transmit(
        &self,
        payload: GamePayload,
    ) -> Result<(), TutorlinkError> {
        Ok(self.controller.send_transmit(payload).await?)
    }

    /// Ends the active game.
    pub async fn end_game(&self) -> Result<(), TutorlinkError> {
        Ok(self.controller.end_game().await?)
    }

    /// Opens a worksheet on the client.
    pub async fn start_worksheet(
        &self,
        sheet: &str,
    ) -> Result<(), TutorlinkError> {
        Ok(self.controller.start_worksheet(sheet).await?)
    }

    /// Closes the worksheet.
    pub async fn end_worksheet(&self) -> Result<(), TutorlinkError> {
        Ok(self.controller.end_worksheet().await?)
    }

    /// Actions for the stock FastRead game.
    pub fn fast_read(&self) -> FastReadHandle {
        FastReadHandle {
            controller: self.controller.clone(),
        }
    }

    /// Ends the session deliberately (`Close{1}`) and stops listening.
    pub async fn disconnect(&self) {
        self.controller.disconnect().await;
        self.listener.stop();
    }

    /// Waits for the receiver task to finish, which happens once the
    /// connection is down.
    pub async fn closed(self) {
        let _ = self.receiver.await;
    }
}

/// Host-side actions for FastRead, valid while the game is active.
pub struct FastReadHandle {
    controller: SessionController,
}

impl FastReadHandle {
    /// Flashes `token` at the client for `millis` milliseconds. The
    /// client answers with a reply once its display finishes, which
    /// reaches the host's `FastReadEvents::display_finished`.
    pub async fn display(
        &self,
        token: &str,
        millis: u64,
    ) -> Result<(), TutorlinkError> {
        Ok(self
            .controller
            .send_transmit(GamePayload::FastRead {
                token: token.to_string(),
                millis,
            })
            .await?)
    }

    /// Ends the game.
    pub async fn end(&self) -> Result<(), TutorlinkError> {
        Ok(self.controller.end_game().await?)
    }
}
