//! Session state machine driven over a loopback pair: a real
//! controller with its receiver pump on one end, a raw peer injecting
//! frames on the other.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use tutorlink_game::{ClientGames, HostGames, TokenDisplay};
use tutorlink_protocol::codec;
use tutorlink_protocol::{
    Close, CloseCode, GameEnd, GameId, GamePayload, GameStart, GameTransmit,
    Hello, Message, ReplyPayload, WorkSheetAnswer, WorkSheetEnd,
    WorkSheetStart, PROTOCOL_VERSION,
};
use tutorlink_session::{
    spawn_receiver, Role, SessionController, SessionError, SessionEvents,
    SessionState,
};
use tutorlink_transport::{Address, Connection, Connector, Listener};

// =========================================================================
// Fixtures
// =========================================================================

#[derive(Default)]
struct Recorded(Mutex<Vec<String>>);

impl Recorded {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl SessionEvents for Recorded {
    fn connected(&self) {
        self.push("connected");
    }
    fn disconnected(&self, code: CloseCode) {
        self.push(format!("disconnected:{code}"));
    }
    fn connection_lost(&self) {
        self.push("lost");
    }
    fn game_started(&self, id: GameId) {
        self.push(format!("game_started:{id}"));
    }
    fn game_ended(&self) {
        self.push("game_ended");
    }
    fn worksheet_started(&self, sheet: &str) {
        self.push(format!("worksheet_started:{sheet}"));
    }
    fn worksheet_answer(&self, data: &str) {
        self.push(format!("worksheet_answer:{data}"));
    }
    fn worksheet_ended(&self) {
        self.push("worksheet_ended");
    }
}

struct InstantDisplay;

impl TokenDisplay for InstantDisplay {
    fn display(&self, _token: &str, _millis: u64, done: Box<dyn FnOnce() + Send>) {
        done();
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

/// A client-role controller with its pump, and the raw host-side
/// connection to drive it with.
async fn client_session() -> (Connection, SessionController, Arc<Recorded>) {
    let (host, client) = establish().await;
    let events = Arc::new(Recorded::default());
    let controller = SessionController::new(
        Role::Client,
        client.clone(),
        Arc::new(ClientGames::new(Arc::new(InstantDisplay))),
        events.clone(),
    );
    spawn_receiver(client, controller.clone());
    (host, controller, events)
}

async fn read_frame_raw(stream: &mut TcpStream) -> Option<Message> {
    let mut header = [0u8; codec::HEADER_LEN];
    stream.read_exact(&mut header).await.ok()?;
    let code = u16::from_be_bytes([header[0], header[1]]);
    let len = u32::from_be_bytes([header[2], header[3], header[4], header[5]]);
    let mut body = vec![0u8; len as usize];
    stream.read_exact(&mut body).await.ok()?;
    codec::decode_body(code, &body).ok()
}

async fn wait_for_state(controller: &SessionController, want: SessionState) {
    for _ in 0..100 {
        if controller.state().await == want {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("state never became {want}, is {}", controller.state().await);
}

// =========================================================================
// Game family
// =========================================================================

#[tokio::test]
async fn test_game_start_activates_fast_read() {
    let (host, controller, events) = client_session().await;

    host.send(&Message::GameStart(GameStart {
        game_id: GameId::FAST_READ,
    }))
    .await
    .unwrap();
    wait_for_state(&controller, SessionState::Game).await;

    host.send(&Message::GameTransmit(GameTransmit {
        game_id: GameId::FAST_READ,
        payload: GamePayload::FastRead {
            token: "cat".into(),
            millis: 10,
        },
    }))
    .await
    .unwrap();

    // The instant display completes at once, so the reply comes back.
    match host.receive().await.unwrap() {
        Some(Message::GameReply(reply)) => {
            assert_eq!(reply.payload, ReplyPayload::FastRead);
        }
        other => panic!("expected GameReply, got {other:?}"),
    }

    host.send(&Message::GameEnd(GameEnd {})).await.unwrap();
    wait_for_state(&controller, SessionState::Connected).await;

    assert_eq!(
        events.entries(),
        vec!["connected", "game_started:G-0", "game_ended"]
    );
}

#[tokio::test]
async fn test_unknown_game_id_tears_down() {
    let (host, controller, events) = client_session().await;

    host.send(&Message::GameStart(GameStart { game_id: GameId(99) }))
        .await
        .unwrap();
    wait_for_state(&controller, SessionState::Offline).await;

    match host.receive().await.unwrap() {
        Some(Message::Close(close)) => {
            assert_eq!(close.code, CloseCode::Violation);
        }
        other => panic!("expected Close{{2}}, got {other:?}"),
    }
    assert_eq!(events.entries(), vec!["connected", "disconnected:2"]);
}

#[tokio::test]
async fn test_transmit_with_wrong_game_id_is_violation() {
    let (host, controller, _events) = client_session().await;

    host.send(&Message::GameStart(GameStart {
        game_id: GameId::FAST_READ,
    }))
    .await
    .unwrap();
    wait_for_state(&controller, SessionState::Game).await;

    host.send(&Message::GameTransmit(GameTransmit {
        game_id: GameId(5),
        payload: GamePayload::FastRead {
            token: "x".into(),
            millis: 1,
        },
    }))
    .await
    .unwrap();
    wait_for_state(&controller, SessionState::Offline).await;

    match host.receive().await.unwrap() {
        Some(Message::Close(close)) => {
            assert_eq!(close.code, CloseCode::Violation);
        }
        other => panic!("expected Close{{2}}, got {other:?}"),
    }
}

#[tokio::test]
async fn test_game_message_outside_game_is_violation() {
    let (host, controller, _events) = client_session().await;

    host.send(&Message::GameEnd(GameEnd {})).await.unwrap();
    wait_for_state(&controller, SessionState::Offline).await;
}

// =========================================================================
// Control family
// =========================================================================

#[tokio::test]
async fn test_peer_close_disconnects_once() {
    let (host, controller, events) = client_session().await;

    host.close(CloseCode::User).await;
    wait_for_state(&controller, SessionState::Offline).await;

    // A second Close while offline is ignored.
    controller
        .message_received(&Message::Close(Close {
            code: CloseCode::User,
        }))
        .await;

    assert_eq!(events.entries(), vec!["connected", "disconnected:1"]);
}

#[tokio::test]
async fn test_messages_while_offline_stay_offline() {
    let (_host, controller, events) = client_session().await;

    controller.disconnect().await;
    assert_eq!(controller.state().await, SessionState::Offline);

    controller
        .message_received(&Message::GameEnd(GameEnd {}))
        .await;
    controller
        .message_received(&Message::WorkSheetStart(WorkSheetStart {
            sheet: "s".into(),
        }))
        .await;

    assert_eq!(controller.state().await, SessionState::Offline);
    // No disconnect notification beyond the session's own lifecycle.
    assert_eq!(events.entries(), vec!["connected"]);
}

#[tokio::test]
async fn test_unrecognized_frame_is_answered_with_close_2() {
    let listener = Listener::bind(0, None, Arc::new(())).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let host_task = tokio::spawn(async move { listener.listen().await.unwrap() });

    // Raw peer completes the handshake by hand.
    let mut raw = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let hello = codec::encode(&Message::Hello(Hello {
        version: PROTOCOL_VERSION,
    }))
    .unwrap();
    raw.write_all(&hello).await.unwrap();
    assert!(matches!(
        read_frame_raw(&mut raw).await,
        Some(Message::HelloReply(_))
    ));
    let host = host_task.await.unwrap();

    struct NoGames;
    impl tutorlink_game::FastReadEvents for NoGames {
        fn display_finished(&self) {}
    }

    let events = Arc::new(Recorded::default());
    let controller = SessionController::new(
        Role::Host,
        host.clone(),
        Arc::new(HostGames::new(Arc::new(NoGames))),
        events.clone(),
    );
    spawn_receiver(host, controller.clone());

    // A frame whose type code is outside the registry.
    let mut frame = vec![0x04, 0x00];
    frame.extend_from_slice(&2u32.to_be_bytes());
    frame.extend_from_slice(b"{}");
    raw.write_all(&frame).await.unwrap();

    // The session answers Close{2} before dropping the socket.
    match read_frame_raw(&mut raw).await {
        Some(Message::Close(close)) => {
            assert_eq!(close.code, CloseCode::Violation);
        }
        other => panic!("expected Close{{2}}, got {other:?}"),
    }
    wait_for_state(&controller, SessionState::Offline).await;
    assert_eq!(events.entries(), vec!["connected", "disconnected:2"]);
}

#[tokio::test]
async fn test_connection_lost_notifies_events() {
    let (_host, controller, events) = client_session().await;

    controller.connection_lost().await;
    assert_eq!(controller.state().await, SessionState::Offline);
    assert_eq!(events.entries(), vec!["connected", "lost"]);
}

// =========================================================================
// WorkSheet family
// =========================================================================

#[tokio::test]
async fn test_worksheet_round_on_client() {
    let (host, controller, events) = client_session().await;

    host.send(&Message::WorkSheetStart(WorkSheetStart {
        sheet: "fractions".into(),
    }))
    .await
    .unwrap();
    wait_for_state(&controller, SessionState::WorkSheet).await;

    host.send(&Message::WorkSheetEnd(WorkSheetEnd {}))
        .await
        .unwrap();
    wait_for_state(&controller, SessionState::Connected).await;

    assert_eq!(
        events.entries(),
        vec!["connected", "worksheet_started:fractions", "worksheet_ended"]
    );
}

#[tokio::test]
async fn test_worksheet_answer_to_client_is_violation() {
    let (host, controller, _events) = client_session().await;

    host.send(&Message::WorkSheetStart(WorkSheetStart {
        sheet: "s".into(),
    }))
    .await
    .unwrap();
    wait_for_state(&controller, SessionState::WorkSheet).await;

    host.send(&Message::WorkSheetAnswer(WorkSheetAnswer {
        data: "42".into(),
    }))
    .await
    .unwrap();
    wait_for_state(&controller, SessionState::Offline).await;
}

#[tokio::test]
async fn test_host_receives_worksheet_answers() {
    let (host, client) = establish().await;
    let events = Arc::new(Recorded::default());

    struct NoGames;
    impl tutorlink_game::FastReadEvents for NoGames {
        fn display_finished(&self) {}
    }

    let controller = SessionController::new(
        Role::Host,
        host.clone(),
        Arc::new(HostGames::new(Arc::new(NoGames))),
        events.clone(),
    );
    spawn_receiver(host, controller.clone());

    controller.start_worksheet("fractions").await.unwrap();
    match client.receive().await.unwrap() {
        Some(Message::WorkSheetStart(start)) => {
            assert_eq!(start.sheet, "fractions");
        }
        other => panic!("expected WorkSheetStart, got {other:?}"),
    }

    client
        .send(&Message::WorkSheetAnswer(WorkSheetAnswer {
            data: "1/2".into(),
        }))
        .await
        .unwrap();

    // The answer is forwarded to the events sink.
    for _ in 0..100 {
        if events.entries().contains(&"worksheet_answer:1/2".to_string()) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(events
        .entries()
        .contains(&"worksheet_answer:1/2".to_string()));

    controller.end_worksheet().await.unwrap();
    assert_eq!(controller.state().await, SessionState::Connected);
}

// =========================================================================
// Outbound action guards
// =========================================================================

#[tokio::test]
async fn test_start_game_with_unknown_id_leaves_state_alone() {
    let (host, _client) = establish().await;

    struct NoGames;
    impl tutorlink_game::FastReadEvents for NoGames {
        fn display_finished(&self) {}
    }

    let controller = SessionController::new(
        Role::Host,
        host,
        Arc::new(HostGames::new(Arc::new(NoGames))),
        Arc::new(()),
    );

    match controller.start_game(GameId(99)).await {
        Err(SessionError::Game(tutorlink_game::GameError::BadGameId(
            GameId(99),
        ))) => {}
        other => panic!("expected BadGameId, got {other:?}"),
    }
    assert_eq!(controller.state().await, SessionState::Connected);
}

#[tokio::test]
async fn test_client_cannot_drive_host_actions() {
    let (_host, controller, _events) = client_session().await;

    match controller.start_game(GameId::FAST_READ).await {
        Err(SessionError::WrongRole(_)) => {}
        other => panic!("expected WrongRole, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transmit_requires_a_running_game() {
    let (host, _client) = establish().await;

    struct NoGames;
    impl tutorlink_game::FastReadEvents for NoGames {
        fn display_finished(&self) {}
    }

    let controller = SessionController::new(
        Role::Host,
        host,
        Arc::new(HostGames::new(Arc::new(NoGames))),
        Arc::new(()),
    );

    match controller
        .send_transmit(GamePayload::FastRead {
            token: "x".into(),
            millis: 1,
        })
        .await
    {
        Err(SessionError::BadState { .. }) => {}
        other => panic!("expected BadState, got {other:?}"),
    }
}
