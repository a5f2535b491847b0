//! Wordflash: a host and a client in one process playing a round of
//! FastRead over loopback.
//!
//! ```text
//! RUST_LOG=debug cargo run -p wordflash
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use tutorlink::prelude::*;

/// Prints each token to stdout and reports the display as finished
/// after the requested duration.
struct ConsoleDisplay;

impl TokenDisplay for ConsoleDisplay {
    fn display(&self, token: &str, millis: u64, done: Box<dyn FnOnce() + Send>) {
        println!(">>> {token}");
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            done();
        });
    }
}

/// Forwards each finished display to the main loop.
struct FinishedSignal(mpsc::UnboundedSender<()>);

impl FastReadEvents for FinishedSignal {
    fn display_finished(&self) {
        let _ = self.0.send(());
    }
}

struct LogStatus;

impl StatusListener for LogStatus {
    fn status_changed(&self, status: Status, message: &str) {
        tracing::info!(%status, message, "host status");
    }
}

#[tokio::main]
async fn main() -> Result<(), TutorlinkError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (finished_tx, mut finished_rx) = mpsc::unbounded_channel();
    let bound = Host::bind(
        HostConfig {
            port: 0,
            password: Some("demo".into()),
        },
        Arc::new(HostGames::new(Arc::new(FinishedSignal(finished_tx)))),
        Arc::new(()),
        Arc::new(LogStatus),
    )
    .await?;
    let port = bound.local_addr()?.port();
    let host_task = tokio::spawn(bound.establish());

    let client = Client::connect(
        ClientConfig::new(Address::new("127.0.0.1", port))
            .with_password("demo"),
        Arc::new(ClientGames::new(Arc::new(ConsoleDisplay))),
        Arc::new(()),
    )
    .await?;
    let host = host_task.await.expect("host task")?;

    let info = game_info(GameId::FAST_READ)?;
    tracing::info!(name = info.name, "starting game");
    host.start_game(GameId::FAST_READ).await?;

    let fast_read = host.fast_read();
    for token in ["cat", "dog", "horse"] {
        fast_read.display(token, 1500).await?;
        finished_rx.recv().await;
    }
    fast_read.end().await?;

    host.disconnect().await;
    client.closed().await;
    tracing::info!("session over");
    Ok(())
}
