//! End-to-end lifecycle tests for `ChatClient` over the recording transport.
//!
//! The tokio clock is paused, so heartbeat and reconnect timing is exact and
//! the tests never sleep for real.  `transport.latest()` plays the server side
//! of the most recent link.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use assess_client::infrastructure::transport::RecordingTransport;
use assess_client::{ChatClient, ClientConfig, ConnectionState, LifecycleEvent};
use assess_core::{AssessmentReport, ChatMessage, MessageKind};
use tokio_test::assert_ok;

const PING: &str = r#"{"type":"ping"}"#;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn config() -> ClientConfig {
    ClientConfig {
        server_url: "ws://assess.test:8765".to_string(),
        heartbeat_interval: Duration::from_secs(30),
        reconnect_delay: Duration::from_secs(5),
    }
}

fn start(transport: &RecordingTransport) -> ChatClient {
    assert_ok!(ChatClient::with_transport(
        config(),
        Arc::new(transport.clone())
    ))
}

/// Lets the driver and timer tasks run without moving the clock.
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

async fn advance(by: Duration) {
    tokio::time::advance(by).await;
    settle().await;
}

/// Connects and completes the handshake on the recording link.
async fn connected(transport: &RecordingTransport) -> ChatClient {
    let client = start(transport);
    client.connect();
    settle().await;
    transport.latest().expect("link opened").opened();
    settle().await;
    assert_eq!(client.state(), ConnectionState::Connected);
    client
}

/// The server closes the live link.
async fn server_closes(transport: &RecordingTransport) {
    transport
        .latest()
        .expect("link opened")
        .closed(1001, "server restart", true);
    settle().await;
}

struct Seen {
    messages: Arc<Mutex<Vec<ChatMessage>>>,
    reports: Arc<Mutex<Vec<AssessmentReport>>>,
    lifecycle: Arc<Mutex<Vec<LifecycleEvent>>>,
}

fn observe(client: &ChatClient) -> Seen {
    let seen = Seen {
        messages: Arc::new(Mutex::new(Vec::new())),
        reports: Arc::new(Mutex::new(Vec::new())),
        lifecycle: Arc::new(Mutex::new(Vec::new())),
    };
    let messages = Arc::clone(&seen.messages);
    client.on_message(move |m| messages.lock().unwrap().push(m.clone()));
    let reports = Arc::clone(&seen.reports);
    client.on_assessment(move |r| reports.lock().unwrap().push(r.clone()));
    let lifecycle = Arc::clone(&seen.lifecycle);
    client.on_lifecycle(move |e| lifecycle.lock().unwrap().push(e.clone()));
    seen
}

// ── Heartbeat ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_exactly_one_ping_after_one_heartbeat_interval() {
    // Arrange
    let transport = RecordingTransport::new();
    let _client = connected(&transport).await;

    // Act / Assert: nothing before the interval elapses
    advance(Duration::from_secs(29)).await;
    assert!(transport.sent_frames().is_empty());

    advance(Duration::from_secs(1)).await;
    assert_eq!(transport.sent_frames(), vec![PING.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_repeats_every_interval() {
    let transport = RecordingTransport::new();
    let _client = connected(&transport).await;

    for _ in 0..3 {
        advance(Duration::from_secs(30)).await;
    }

    assert_eq!(transport.sent_frames(), vec![PING; 3]);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_stops_after_disconnect() {
    let transport = RecordingTransport::new();
    let client = connected(&transport).await;

    client.disconnect();
    settle().await;
    advance(Duration::from_secs(120)).await;

    assert!(transport.sent_frames().is_empty());
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_stops_after_server_close() {
    // Arrange
    let transport = RecordingTransport::new();
    let client = connected(&transport).await;
    advance(Duration::from_secs(20)).await;

    // Act: the server closes before the first tick, then the clock runs well
    // past where that tick would have fallen
    server_closes(&transport).await;
    advance(Duration::from_secs(40)).await;

    // Assert: the reconnect link never completed its handshake, so no ping
    assert!(transport.sent_frames().is_empty());
    assert_eq!(transport.open_count(), 2);
    assert_eq!(client.state(), ConnectionState::Connecting);
}

// ── Reconnect ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_close_reconnects_exactly_once_after_delay() {
    // Arrange
    let transport = RecordingTransport::new();
    let client = connected(&transport).await;

    // Act
    server_closes(&transport).await;

    // Assert
    assert_eq!(client.state(), ConnectionState::Disconnected);
    advance(Duration::from_secs(4)).await;
    assert_eq!(transport.open_count(), 1);

    advance(Duration::from_secs(1)).await;
    assert_eq!(transport.open_count(), 2);
    assert_eq!(client.state(), ConnectionState::Connecting);

    advance(Duration::from_secs(60)).await;
    assert_eq!(transport.open_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_reconnect_is_not_retried() {
    let transport = RecordingTransport::new();
    let _client = connected(&transport).await;
    server_closes(&transport).await;
    advance(Duration::from_secs(5)).await;
    assert_eq!(transport.open_count(), 2);

    transport.latest().unwrap().error("connection refused");
    settle().await;
    advance(Duration::from_secs(60)).await;

    assert_eq!(transport.open_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_before_delay_prevents_reconnect() {
    let transport = RecordingTransport::new();
    let client = connected(&transport).await;
    server_closes(&transport).await;

    client.disconnect();
    settle().await;
    advance(Duration::from_secs(60)).await;

    assert_eq!(transport.open_count(), 1);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_before_delay_prevents_reconnect() {
    let transport = RecordingTransport::new();
    let client = connected(&transport).await;
    server_closes(&transport).await;

    client.shutdown().await;
    advance(Duration::from_secs(60)).await;

    assert_eq!(transport.open_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_drop_before_delay_prevents_reconnect() {
    let transport = RecordingTransport::new();
    let client = connected(&transport).await;
    server_closes(&transport).await;

    drop(client);
    settle().await;
    advance(Duration::from_secs(60)).await;

    assert_eq!(transport.open_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_close_notifications_in_order() {
    // Arrange
    let transport = RecordingTransport::new();
    let client = connected(&transport).await;
    let seen = observe(&client);

    // Act
    server_closes(&transport).await;

    // Assert
    assert_eq!(
        *seen.lifecycle.lock().unwrap(),
        vec![
            LifecycleEvent::Closed {
                code: 1001,
                reason: "server restart".to_string(),
                was_clean: true
            },
            LifecycleEvent::StateChanged(ConnectionState::Disconnected),
            LifecycleEvent::ReconnectScheduled {
                delay: Duration::from_secs(5)
            },
        ]
    );
}

// ── Sending ───────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_send_while_disconnected_writes_nothing() {
    let transport = RecordingTransport::new();
    let client = start(&transport);

    client.send("hello");
    settle().await;

    assert!(transport.sent_frames().is_empty());
    assert_eq!(transport.open_count(), 0);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_send_while_connected_writes_text_verbatim() {
    let transport = RecordingTransport::new();
    let client = connected(&transport).await;

    client.send("我想练习第三声");
    settle().await;

    assert_eq!(transport.sent_frames(), vec!["我想练习第三声".to_string()]);
}

// ── Inbound messages ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_ai_response_reaches_message_subscribers() {
    // Arrange
    let transport = RecordingTransport::new();
    let client = connected(&transport).await;
    let seen = observe(&client);

    // Act
    transport
        .latest()
        .unwrap()
        .message(r#"{"type":"ai_response","content":"你好"}"#);
    settle().await;

    // Assert
    let messages = seen.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Ai);
    assert_eq!(messages[0].text, "AI: 你好");
}

#[tokio::test(start_paused = true)]
async fn test_assessment_reaches_assessment_subscribers() {
    let transport = RecordingTransport::new();
    let client = connected(&transport).await;
    let seen = observe(&client);

    transport.latest().unwrap().message(
        r#"{"type":"assessment_result",
            "scores":{"total_score":88,"fluency_score":91.5,"integrity_score":100,
                      "phone_score":85.25,"tone_score":76.25},
            "feedback":"注意声调变化"}"#,
    );
    settle().await;

    assert!(seen.messages.lock().unwrap().is_empty());
    let reports = seen.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0].text,
        "总分: 88.00\n流畅度: 91.50\n完整度: 100.00\n发音分: 85.25\n声调分: 76.25\n\n改进建议:\n注意声调变化"
    );
}

#[tokio::test(start_paused = true)]
async fn test_non_json_frame_produces_zero_events() {
    let transport = RecordingTransport::new();
    let client = connected(&transport).await;
    let seen = observe(&client);

    transport.latest().unwrap().message("this is not json");
    transport.latest().unwrap().message(r#"{"content":"no type"}"#);
    settle().await;

    assert!(seen.messages.lock().unwrap().is_empty());
    assert!(seen.reports.lock().unwrap().is_empty());
    assert_eq!(client.state(), ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn test_pong_and_unknown_types_are_silent() {
    let transport = RecordingTransport::new();
    let client = connected(&transport).await;
    let seen = observe(&client);

    let server = transport.latest().unwrap();
    server.message(r#"{"type":"pong","timestamp":"2024-05-01 10:00:00"}"#);
    server.message(r#"{"type":"typing","content":"..."}"#);
    settle().await;

    assert!(seen.messages.lock().unwrap().is_empty());
    assert!(seen.reports.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_frames_from_stale_link_are_ignored() {
    // Arrange: open, drop, and reopen so link 0 is stale
    let transport = RecordingTransport::new();
    let client = connected(&transport).await;
    client.disconnect();
    client.connect();
    settle().await;
    transport.latest().unwrap().opened();
    settle().await;
    let seen = observe(&client);

    // Act
    let stale = transport.link(0).unwrap();
    stale.message(r#"{"type":"ai_response","content":"old"}"#);
    stale.closed(1000, "", true);
    settle().await;

    // Assert
    assert!(seen.messages.lock().unwrap().is_empty());
    assert!(seen.lifecycle.lock().unwrap().is_empty());
    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(transport.open_count(), 2);
}
