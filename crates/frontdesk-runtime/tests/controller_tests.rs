//! Controller integration tests
//!
//! Two drive modes: most tests construct a [`ChatController`] directly and
//! feed it commands, push events, and completions by hand, so conversation
//! log state can be asserted between steps. One end-to-end test exercises the
//! full [`ChatRuntime`] channel wiring.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use frontdesk_core::{
    create_app_event_channel, create_command_channel, create_push_event_channel, AppEvent,
    AppEventReceiver, BootstrapError, BootstrapResponse, BootstrapService, ChannelError,
    ClientConfig, Command, ErrorKind, PushConnector, PushEvent, PushEventSender, PushHandle,
    RawFrame, SendError, SendReceipt, SendTransport, SessionPhase, Timestamp, Topic,
    WidgetVisibility,
};
use frontdesk_runtime::{ChatController, ChatRuntime};

// ----------------------------------------------------------------------------
// Stub Backend (bootstrap + send)
// ----------------------------------------------------------------------------

#[derive(Default)]
struct StubBackend {
    bootstrap_calls: AtomicUsize,
    fail_bootstrap: AtomicBool,
    omit_address: AtomicBool,
    fail_send: AtomicBool,
    sent: Mutex<Vec<(String, String)>>,
}

impl StubBackend {
    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl BootstrapService for StubBackend {
    async fn start_session(
        &self,
        _display_name: Option<&str>,
    ) -> Result<BootstrapResponse, BootstrapError> {
        let n = self.bootstrap_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_bootstrap.load(Ordering::SeqCst) {
            return Err(BootstrapError::request_failed("stub refused"));
        }
        Ok(BootstrapResponse {
            contact_id: Some(format!("c{}", n)),
            participant_token: Some(format!("p{}", n)),
            connection_token: Some(format!("k{}", n)),
            push_channel_address: if self.omit_address.load(Ordering::SeqCst) {
                None
            } else {
                Some("wss://x".to_string())
            },
        })
    }
}

#[async_trait]
impl SendTransport for StubBackend {
    async fn send_message(
        &self,
        connection_token: &str,
        content: &str,
    ) -> Result<SendReceipt, SendError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(SendError::transport("wire down"));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((connection_token.to_string(), content.to_string()));
        Ok(SendReceipt {
            message_id: format!("m{}", sent.len()),
            message_timestamp: Some(Timestamp::now()),
        })
    }
}

// ----------------------------------------------------------------------------
// Stub Push Connector
// ----------------------------------------------------------------------------

#[derive(Default)]
struct ConnectorState {
    events: Mutex<Option<PushEventSender>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
    subscriptions: Mutex<Vec<Vec<Topic>>>,
    refuse: AtomicBool,
}

impl ConnectorState {
    fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Deliver one raw frame as if the server pushed it
    async fn push_frame(&self, json: &str) {
        let sender = self
            .events
            .lock()
            .unwrap()
            .clone()
            .expect("push channel not connected");
        sender
            .send(PushEvent::Frame(RawFrame::from_text(json).unwrap()))
            .await
            .unwrap();
    }
}

struct StubConnector {
    state: Arc<ConnectorState>,
}

#[async_trait]
impl PushConnector for StubConnector {
    async fn connect(
        &self,
        address: &str,
        events: PushEventSender,
    ) -> Result<Box<dyn PushHandle>, ChannelError> {
        if self.state.refuse.load(Ordering::SeqCst) {
            return Err(ChannelError::connect_failed(address, "refused"));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        *self.state.events.lock().unwrap() = Some(events);
        Ok(Box::new(StubHandle {
            state: Arc::clone(&self.state),
        }))
    }
}

struct StubHandle {
    state: Arc<ConnectorState>,
}

#[async_trait]
impl PushHandle for StubHandle {
    async fn subscribe(&mut self, topics: &[Topic]) -> Result<(), ChannelError> {
        self.state.subscriptions.lock().unwrap().push(topics.to_vec());
        Ok(())
    }

    async fn close(&mut self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ----------------------------------------------------------------------------
// Harness
// ----------------------------------------------------------------------------

/// Direct-drive harness: feed the controller by hand, assert on its state
struct Harness {
    controller: ChatController,
    app_events: AppEventReceiver,
    backend: Arc<StubBackend>,
    connector: Arc<ConnectorState>,
}

impl Harness {
    fn new() -> Self {
        let config = ClientConfig::default();
        let backend = Arc::new(StubBackend::default());
        let connector = Arc::new(ConnectorState::default());

        let (_commands, command_receiver) = create_command_channel(&config.channels);
        let (push_sender, push_receiver) = create_push_event_channel(&config.channels);
        let (app_sender, app_events) = create_app_event_channel(&config.channels);

        let controller = ChatController::new(
            config,
            backend.clone(),
            backend.clone(),
            Arc::new(StubConnector {
                state: Arc::clone(&connector),
            }),
            command_receiver,
            push_sender,
            push_receiver,
            app_sender,
        )
        .unwrap();

        Self {
            controller,
            app_events,
            backend,
            connector,
        }
    }

    /// Open and complete the bootstrap, landing in Active
    async fn open(&mut self) {
        self.controller
            .process_command(Command::Open { display_name: None })
            .await
            .unwrap();
        self.controller.process_next_completion().await.unwrap();
        assert_eq!(self.controller.phase(), SessionPhase::Active);
    }

    /// Send a message and apply the transport completion
    async fn send(&mut self, content: &str) {
        self.controller
            .process_command(Command::Send {
                content: content.to_string(),
            })
            .await
            .unwrap();
        self.controller.process_next_completion().await.unwrap();
    }

    /// Deliver a chat frame from the given role
    async fn chat_frame(&mut self, role: &str, text: &str) {
        let json = format!(
            r#"{{"topic":"chat","content":{{"type":"message","role":"{}","text":"{}"}}}}"#,
            role, text
        );
        self.controller
            .process_push_event(PushEvent::Frame(RawFrame::from_text(&json).unwrap()))
            .await
            .unwrap();
    }

    /// Deliver a typing frame from the given role
    async fn typing_frame(&mut self, role: &str, state: &str) {
        let json = format!(
            r#"{{"topic":"typing","content":{{"type":"typing","role":"{}","state":"{}"}}}}"#,
            role, state
        );
        self.controller
            .process_push_event(PushEvent::Frame(RawFrame::from_text(&json).unwrap()))
            .await
            .unwrap();
    }

    /// Drain all app events emitted so far
    fn drain_events(&mut self) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.app_events.try_recv() {
            events.push(event);
        }
        events
    }

    fn log_contents(&self) -> Vec<String> {
        self.controller
            .conversation()
            .messages()
            .iter()
            .map(|m| m.content.clone())
            .collect()
    }
}

// ----------------------------------------------------------------------------
// Bootstrap and Lifecycle
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_bootstrap_populates_session_all_or_nothing() {
    let mut h = Harness::new();
    h.open().await;

    let session = h.controller.session().unwrap();
    assert_eq!(session.contact_id, "c1");
    assert_eq!(session.participant_token, "p1");
    assert_eq!(session.connection_token, "k1");
    assert_eq!(session.push_channel_address, "wss://x");

    assert_eq!(h.connector.connects(), 1);
    // Subscribed to both topics in one frame
    let subscriptions = h.connector.subscriptions.lock().unwrap().clone();
    assert_eq!(subscriptions, vec![vec![Topic::Chat, Topic::Typing]]);

    // The UI saw the open widget through both phases
    let events = h.drain_events();
    assert!(matches!(
        events[0],
        AppEvent::SessionStateChanged {
            phase: SessionPhase::Bootstrapping,
            visibility: WidgetVisibility::Open,
        }
    ));
    assert!(matches!(
        events[1],
        AppEvent::SessionStateChanged {
            phase: SessionPhase::Active,
            ..
        }
    ));
}

#[tokio::test]
async fn test_bootstrap_missing_address_fails_session() {
    let mut h = Harness::new();
    h.backend.omit_address.store(true, Ordering::SeqCst);

    h.controller
        .process_command(Command::Open { display_name: None })
        .await
        .unwrap();
    h.controller.process_next_completion().await.unwrap();

    assert_eq!(h.controller.phase(), SessionPhase::Ended);
    assert!(h.controller.session().is_none());
    assert!(h.controller.conversation().is_empty());
    // No connection was ever attempted
    assert_eq!(h.connector.connects(), 0);

    let events = h.drain_events();
    let error = events
        .iter()
        .find_map(|e| match e {
            AppEvent::Error { kind, message } => Some((*kind, message.clone())),
            _ => None,
        })
        .expect("a bootstrap error should surface");
    assert_eq!(error.0, ErrorKind::Bootstrap);
    assert!(error.1.contains("pushChannelAddress"));
}

#[tokio::test]
async fn test_bootstrap_request_failure_lands_in_ended() {
    let mut h = Harness::new();
    h.backend.fail_bootstrap.store(true, Ordering::SeqCst);

    h.controller
        .process_command(Command::Open { display_name: None })
        .await
        .unwrap();
    h.controller.process_next_completion().await.unwrap();

    assert_eq!(h.controller.phase(), SessionPhase::Ended);

    // Ended accepts a fresh open once the backend recovers
    h.backend.fail_bootstrap.store(false, Ordering::SeqCst);
    h.open().await;
    assert_eq!(h.controller.session().unwrap().contact_id, "c2");
}

#[tokio::test]
async fn test_end_then_open_starts_fresh_cycle() {
    let mut h = Harness::new();
    h.open().await;
    h.send("hello").await;
    assert_eq!(h.controller.conversation().len(), 1);

    h.controller.process_command(Command::End).await.unwrap();
    assert_eq!(h.controller.phase(), SessionPhase::Closed);
    assert!(h.controller.session().is_none());
    assert!(h.controller.conversation().is_empty());
    assert_eq!(h.connector.closes(), 1);

    // A new open re-bootstraps from scratch
    h.open().await;
    let session = h.controller.session().unwrap();
    assert_eq!(session.contact_id, "c2");
    assert_eq!(session.connection_token, "k2");
    assert!(h.controller.conversation().is_empty());
    assert_eq!(h.backend.bootstrap_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_end_during_bootstrap_discards_stale_result() {
    let mut h = Harness::new();
    h.controller
        .process_command(Command::Open { display_name: None })
        .await
        .unwrap();

    // User gives up before the bootstrap lands
    h.controller.process_command(Command::End).await.unwrap();
    assert_eq!(h.controller.phase(), SessionPhase::Closed);

    // The stale completion arrives and is discarded; its channel is released
    h.controller.process_next_completion().await.unwrap();
    assert_eq!(h.controller.phase(), SessionPhase::Closed);
    assert!(h.controller.session().is_none());
    assert_eq!(h.connector.connects(), 1);
    assert_eq!(h.connector.closes(), 1);
}

#[tokio::test]
async fn test_disconnect_ends_session() {
    let mut h = Harness::new();
    h.open().await;
    h.send("hello").await;
    h.drain_events();

    h.controller
        .process_push_event(PushEvent::Disconnected {
            reason: "gateway timeout".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(h.controller.phase(), SessionPhase::Ended);
    assert!(h.controller.session().is_none());
    assert!(h.controller.conversation().is_empty());

    let events = h.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        AppEvent::Error {
            kind: ErrorKind::Channel,
            ..
        }
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        AppEvent::SessionStateChanged {
            phase: SessionPhase::Ended,
            visibility: WidgetVisibility::Closed,
        }
    )));
}

#[tokio::test]
async fn test_disconnect_during_bootstrap_ends_session() {
    let mut h = Harness::new();
    h.controller
        .process_command(Command::Open { display_name: None })
        .await
        .unwrap();

    // The server drops the connection after connect/subscribe succeed but
    // before the bootstrap result is processed; the adapter's single
    // terminal disconnect is the only signal that will ever arrive.
    h.controller
        .process_push_event(PushEvent::Disconnected {
            reason: "gateway timeout".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(h.controller.phase(), SessionPhase::Ended);
    let events = h.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        AppEvent::Error {
            kind: ErrorKind::Channel,
            ..
        }
    )));

    // The in-flight bootstrap result is stale: discarded, its channel closed
    h.controller.process_next_completion().await.unwrap();
    assert_eq!(h.controller.phase(), SessionPhase::Ended);
    assert!(h.controller.session().is_none());
    assert_eq!(h.connector.connects(), 1);
    assert_eq!(h.connector.closes(), 1);

    // A fresh open still bootstraps from scratch
    h.open().await;
    assert_eq!(h.backend.bootstrap_calls.load(Ordering::SeqCst), 2);
}

// ----------------------------------------------------------------------------
// Minimize / Reopen / Clear
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_minimize_reopen_preserves_session_and_log() {
    let mut h = Harness::new();
    h.open().await;
    h.send("hello").await;
    h.drain_events();

    h.controller.process_command(Command::Minimize).await.unwrap();
    assert_eq!(h.controller.phase(), SessionPhase::Minimized);
    // Channel stays connected, log stays intact
    assert_eq!(h.connector.closes(), 0);
    assert_eq!(h.controller.conversation().len(), 1);

    // Sends are rejected while minimized, silently
    h.controller
        .process_command(Command::Send {
            content: "ignored".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(h.controller.conversation().len(), 1);

    // Frames still arrive while minimized
    h.chat_frame("AGENT", "still here").await;
    assert_eq!(h.controller.conversation().len(), 2);

    h.controller.process_command(Command::Reopen).await.unwrap();
    assert_eq!(h.controller.phase(), SessionPhase::Active);
    // No re-bootstrap, no reconnect
    assert_eq!(h.backend.bootstrap_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.connector.connects(), 1);
    assert_eq!(h.log_contents(), vec!["hello", "still here"]);
}

#[tokio::test]
async fn test_clear_empties_log_but_keeps_session() {
    let mut h = Harness::new();
    h.open().await;
    h.send("hello").await;
    h.chat_frame("AGENT", "hi").await;
    assert_eq!(h.controller.conversation().len(), 2);

    h.controller.process_command(Command::Clear).await.unwrap();
    assert!(h.controller.conversation().is_empty());
    assert_eq!(h.controller.phase(), SessionPhase::Active);
    assert!(h.controller.session().is_some());
    assert_eq!(h.connector.closes(), 0);

    // The session still works after a clear
    h.send("again").await;
    assert_eq!(h.backend.sent().last().unwrap().1, "again");
    assert_eq!(h.backend.sent().last().unwrap().0, "k1");
}

// ----------------------------------------------------------------------------
// Sending and the Conservative Ack
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_send_appends_optimistic_and_remote_reply_acks() {
    let mut h = Harness::new();
    h.open().await;
    h.drain_events();

    h.send("hello").await;
    assert_eq!(h.log_contents(), vec!["hello"]);
    // Transport accepted it, but the ack waits for the push channel
    assert_eq!(h.controller.conversation().pending_count(), 1);
    assert_eq!(h.backend.sent(), vec![("k1".to_string(), "hello".to_string())]);

    let events = h.drain_events();
    assert!(matches!(events[0], AppEvent::MessageSent { ref content, .. } if content == "hello"));

    h.chat_frame("AGENT", "hi").await;
    assert_eq!(h.log_contents(), vec!["hello", "hi"]);
    assert_eq!(h.controller.conversation().pending_count(), 0);

    let events = h.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, AppEvent::MessageReceived { content, .. } if content == "hi")));
}

#[tokio::test]
async fn test_remote_message_acks_all_pending() {
    let mut h = Harness::new();
    h.open().await;

    h.send("one").await;
    h.send("two").await;
    assert_eq!(h.controller.conversation().pending_count(), 2);

    // One remote arrival confirms every outstanding send
    h.chat_frame("AGENT", "got them").await;
    assert_eq!(h.controller.conversation().pending_count(), 0);

    // New sends after the ack start pending again
    h.send("three").await;
    assert_eq!(h.controller.conversation().pending_count(), 1);
}

#[tokio::test]
async fn test_send_failure_marks_single_message() {
    let mut h = Harness::new();
    h.open().await;
    h.send("fine").await;
    h.drain_events();

    h.backend.fail_send.store(true, Ordering::SeqCst);
    h.send("lost").await;

    let messages = h.controller.conversation().messages();
    assert_eq!(messages.len(), 2);
    // The failed message stays visible, annotated, still unconfirmed
    assert!(messages[1].send_failed);
    assert!(messages[1].pending_ack);
    assert!(!messages[0].send_failed);

    // Recoverable: the session survives and later sends work
    assert_eq!(h.controller.phase(), SessionPhase::Active);
    let events = h.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        AppEvent::Error {
            kind: ErrorKind::Send,
            ..
        }
    )));

    h.backend.fail_send.store(false, Ordering::SeqCst);
    h.send("recovered").await;
    assert_eq!(h.backend.sent().last().unwrap().1, "recovered");
}

#[tokio::test]
async fn test_local_echo_frame_is_not_duplicated() {
    let mut h = Harness::new();
    h.open().await;
    h.send("hello").await;

    // The backend may echo our own message back on the push channel
    h.chat_frame("CUSTOMER", "hello").await;
    assert_eq!(h.log_contents(), vec!["hello"]);
    // An echo is not a remote arrival: it confirms nothing
    assert_eq!(h.controller.conversation().pending_count(), 1);
}

#[tokio::test]
async fn test_malformed_frames_are_dropped() {
    let mut h = Harness::new();
    h.open().await;
    h.drain_events();

    // Unknown topic, unknown envelope kind, and a chat frame without text
    for json in [
        r#"{"topic":"presence","content":{"type":"message","text":"x"}}"#,
        r#"{"topic":"chat","content":{"type":"reaction","role":"AGENT"}}"#,
        r#"{"topic":"chat","content":{"type":"message","role":"AGENT"}}"#,
    ] {
        h.controller
            .process_push_event(PushEvent::Frame(RawFrame::from_text(json).unwrap()))
            .await
            .unwrap();
    }

    assert!(h.controller.conversation().is_empty());
    assert!(h.drain_events().is_empty());
    assert_eq!(h.controller.phase(), SessionPhase::Active);
}

// ----------------------------------------------------------------------------
// Typing Indicator
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_typing_edges_and_local_suppression() {
    let mut h = Harness::new();
    h.open().await;
    h.drain_events();

    h.typing_frame("AGENT", "started").await;
    assert!(h.controller.peer_typing());
    assert_eq!(h.drain_events(), vec![AppEvent::TypingChanged(true)]);

    // Repeated start is not an edge: no event
    h.typing_frame("AGENT", "started").await;
    assert!(h.drain_events().is_empty());

    // Our own typing echo suppresses the indicator
    h.typing_frame("CUSTOMER", "started").await;
    assert!(!h.controller.peer_typing());
    assert_eq!(h.drain_events(), vec![AppEvent::TypingChanged(false)]);

    // A local stop echo is meaningless for the remote indicator
    h.typing_frame("AGENT", "started").await;
    h.drain_events();
    h.typing_frame("CUSTOMER", "stopped").await;
    assert!(h.controller.peer_typing());
    assert!(h.drain_events().is_empty());
}

#[tokio::test]
async fn test_message_delivery_clears_typing() {
    let mut h = Harness::new();
    h.open().await;
    h.typing_frame("AGENT", "started").await;
    h.drain_events();

    h.chat_frame("AGENT", "here it is").await;
    assert!(!h.controller.peer_typing());

    let events = h.drain_events();
    // The indicator drops before the message is announced
    assert!(matches!(events[0], AppEvent::TypingChanged(false)));
    assert!(matches!(events[1], AppEvent::MessageReceived { .. }));
}

// ----------------------------------------------------------------------------
// Full Runtime Wiring
// ----------------------------------------------------------------------------

async fn next_event(events: &mut AppEventReceiver) -> AppEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for app event")
        .expect("app event channel closed")
}

#[tokio::test]
async fn test_runtime_end_to_end_conversation() {
    let backend = Arc::new(StubBackend::default());
    let connector = Arc::new(ConnectorState::default());

    let mut runtime = ChatRuntime::new(
        ClientConfig::default(),
        backend.clone(),
        backend.clone(),
        Arc::new(StubConnector {
            state: Arc::clone(&connector),
        }),
    )
    .unwrap();
    runtime.start().unwrap();

    let commands = runtime.command_sender().unwrap();
    let mut events = runtime.take_app_event_receiver().unwrap();

    commands
        .send(Command::Open { display_name: None })
        .await
        .unwrap();

    assert!(matches!(
        next_event(&mut events).await,
        AppEvent::SessionStateChanged {
            phase: SessionPhase::Bootstrapping,
            ..
        }
    ));
    assert!(matches!(
        next_event(&mut events).await,
        AppEvent::SessionStateChanged {
            phase: SessionPhase::Active,
            ..
        }
    ));

    commands
        .send(Command::Send {
            content: "hello".to_string(),
        })
        .await
        .unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        AppEvent::MessageSent { ref content, .. } if content == "hello"
    ));

    connector
        .push_frame(r#"{"topic":"chat","content":{"type":"message","role":"AGENT","text":"hi"}}"#)
        .await;
    assert!(matches!(
        next_event(&mut events).await,
        AppEvent::MessageReceived { ref content, .. } if content == "hi"
    ));

    assert!(runtime.is_running());
    runtime.stop().await;
    assert!(!runtime.is_running());
}
