//! FastRead controllers exercised over a loopback connection pair.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tutorlink_game::{
    ClientGames, FastReadEvents, GameError, GameFactory, HostGames, TokenDisplay,
};
use tutorlink_protocol::{
    GameEnd, GameId, GamePayload, GameReply, GameTransmit, Message,
    ReplyPayload,
};
use tutorlink_transport::{Address, Connection, Connector, Listener};

/// Display stub that completes immediately and remembers what it saw.
struct InstantDisplay {
    seen: std::sync::Mutex<Vec<(String, u64)>>,
}

impl InstantDisplay {
    fn new() -> Arc<InstantDisplay> {
        Arc::new(InstantDisplay {
            seen: std::sync::Mutex::new(Vec::new()),
        })
    }
}

impl TokenDisplay for InstantDisplay {
    fn display(&self, token: &str, millis: u64, done: Box<dyn FnOnce() + Send>) {
        self.seen.lock().unwrap().push((token.to_string(), millis));
        done();
    }
}

#[derive(Default)]
struct Finished(AtomicBool);

impl FastReadEvents for Finished {
    fn display_finished(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

async fn establish() -> (Connection, Connection) {
    let listener = Listener::bind(0, None, Arc::new(())).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let host_task = tokio::spawn(async move { listener.listen().await.unwrap() });
    let client = Connector::new(Address::new("127.0.0.1", port), None)
        .connect()
        .await
        .unwrap();
    let host = host_task.await.unwrap();
    (host, client)
}

fn transmit(game_id: GameId, token: &str, millis: u64) -> Message {
    Message::GameTransmit(GameTransmit {
        game_id,
        payload: GamePayload::FastRead {
            token: token.to_string(),
            millis,
        },
    })
}

#[tokio::test]
async fn test_client_replies_when_display_finishes() {
    let (host, client) = establish().await;

    let display = InstantDisplay::new();
    let games = ClientGames::new(display.clone());
    let mut controller = games
        .create(GameId::FAST_READ, client.clone())
        .expect("fast-read is known");

    controller
        .message_received(&transmit(GameId::FAST_READ, "cat", 1500))
        .expect("legal transmit");

    assert_eq!(
        display.seen.lock().unwrap().as_slice(),
        &[("cat".to_string(), 1500)]
    );

    // The reply arrives on the host side of the pair.
    match host.receive().await.unwrap() {
        Some(Message::GameReply(reply)) => {
            assert_eq!(reply.game_id, GameId::FAST_READ);
            assert_eq!(reply.payload, ReplyPayload::FastRead);
        }
        other => panic!("expected GameReply, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_rejects_mismatched_game_id() {
    let (_host, client) = establish().await;

    let games = ClientGames::new(InstantDisplay::new());
    let mut controller = games.create(GameId::FAST_READ, client).unwrap();

    match controller.message_received(&transmit(GameId(5), "cat", 100)) {
        Err(GameError::Violation(_)) => {}
        other => panic!("expected Violation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_rejects_wrong_subtype() {
    let (_host, client) = establish().await;

    let games = ClientGames::new(InstantDisplay::new());
    let mut controller = games.create(GameId::FAST_READ, client).unwrap();

    match controller.message_received(&Message::GameEnd(GameEnd {})) {
        Err(GameError::Violation(_)) => {}
        other => panic!("expected Violation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_host_forwards_display_finished() {
    let (host, _client) = establish().await;

    let finished = Arc::new(Finished::default());
    let games = HostGames::new(finished.clone());
    let mut controller = games.create(GameId::FAST_READ, host).unwrap();

    controller
        .message_received(&Message::GameReply(GameReply {
            game_id: GameId::FAST_READ,
            payload: ReplyPayload::FastRead,
        }))
        .expect("legal reply");
    assert!(finished.0.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_host_rejects_mismatched_reply() {
    let (host, _client) = establish().await;

    let finished = Arc::new(Finished::default());
    let games = HostGames::new(finished.clone());
    let mut controller = games.create(GameId::FAST_READ, host).unwrap();

    match controller.message_received(&Message::GameReply(GameReply {
        game_id: GameId(3),
        payload: ReplyPayload::FastRead,
    })) {
        Err(GameError::Violation(_)) => {}
        other => panic!("expected Violation, got {other:?}"),
    }
    assert!(!finished.0.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_factories_reject_unknown_ids() {
    let (host, client) = establish().await;

    let client_games = ClientGames::new(InstantDisplay::new());
    match client_games.create(GameId(99), client) {
        Err(GameError::BadGameId(GameId(99))) => {}
        other => panic!("expected BadGameId, got {:?}", other.err()),
    }

    let host_games = HostGames::new(Arc::new(Finished::default()));
    match host_games.create(GameId(99), host) {
        Err(GameError::BadGameId(GameId(99))) => {}
        other => panic!("expected BadGameId, got {:?}", other.err()),
    }
}
