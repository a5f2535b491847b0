//! Client entry point: connect and follow the host.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use tutorlink_game::GameFactory;
use tutorlink_session::{
    spawn_receiver, Role, SessionController, SessionEvents, SessionState,
};
use tutorlink_transport::{Connection, Connector, TransportError};

use crate::{ClientConfig, TutorlinkError};

/// The client side of a running session. After `connect` the session
/// is driven entirely by the host; the client observes it through its
/// `SessionEvents` and game collaborators.
pub struct Client {
    controller: SessionController,
    conn: Connection,
    receiver: JoinHandle<()>,
}

impl Client {
    /// Connects and completes the handshake.
    ///
    /// # Errors
    /// [`TutorlinkError::PasswordWrong`] when the host rejects the
    /// password, so callers can re-prompt and try again.
    pub async fn connect(
        config: ClientConfig,
        games: Arc<dyn GameFactory>,
        events: Arc<dyn SessionEvents>,
    ) -> Result<Client, TutorlinkError> {
        let connector = Connector::new(config.address, config.password);
        let conn = match connector.connect().await {
            Ok(conn) => conn,
            Err(TransportError::PasswordWrong) => {
                return Err(TutorlinkError::PasswordWrong);
            }
            Err(e) => return Err(e.into()),
        };
        let controller =
            SessionController::new(Role::Client, conn.clone(), games, events);
        let receiver = spawn_receiver(conn.clone(), controller.clone());
        Ok(Client {
            controller,
            conn,
            receiver,
        })
    }

    /// The host's address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.conn.peer_addr()
    }

    /// The current session state.
    pub async fn state(&self) -> SessionState {
        self.controller.state().await
    }

    /// Ends the session deliberately (`Close{1}`).
    pub async fn disconnect(&self) {
        self.controller.disconnect().await;
    }

    /// Waits for the receiver task to finish, which happens once the
    /// connection is down.
    pub async fn closed(self) {
        let _ = self.receiver.await;
    }
}
