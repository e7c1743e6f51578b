//! Frontdesk Push Channel Adapter
//!
//! WebSocket implementation of the push channel: the asynchronous,
//! server-initiated delivery path for agent messages and typing signals.
//!
//! The adapter owns a single-attempt lifecycle. A rejected handshake is a
//! [`ChannelError::ConnectFailed`]; a later connection error or
//! server-initiated close emits one terminal [`PushEvent::Disconnected`] and
//! is never retried here; the controller decides what the UI sees. After a
//! local `close()` the read loop discards anything still in flight, so no
//! frame reaches the controller post-close.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use frontdesk_core::{ChannelError, PushConnector, PushEvent, PushEventSender, PushHandle, RawFrame, Topic};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

// ----------------------------------------------------------------------------
// Connector
// ----------------------------------------------------------------------------

/// WebSocket-backed [`PushConnector`]
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PushConnector for WebSocketConnector {
    async fn connect(
        &self,
        address: &str,
        events: PushEventSender,
    ) -> Result<Box<dyn PushHandle>, ChannelError> {
        let (stream, _response) = connect_async(address)
            .await
            .map_err(|e| ChannelError::connect_failed(address, e.to_string()))?;
        debug!(address, "push channel connected");

        let (sink, source) = stream.split();
        let closed = Arc::new(AtomicBool::new(false));

        let reader = tokio::spawn(read_loop(source, events, Arc::clone(&closed)));

        Ok(Box::new(WebSocketHandle {
            sink,
            closed,
            reader,
        }))
    }
}

// ----------------------------------------------------------------------------
// Handle
// ----------------------------------------------------------------------------

/// Open WebSocket push channel
pub struct WebSocketHandle {
    sink: WsSink,
    closed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

#[async_trait]
impl PushHandle for WebSocketHandle {
    async fn subscribe(&mut self, topics: &[Topic]) -> Result<(), ChannelError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChannelError::Closed);
        }

        let text = RawFrame::subscription(topics)
            .to_text()
            .map_err(|e| ChannelError::SubscribeFailed {
                reason: e.to_string(),
            })?;

        // Fire-and-forget: no acknowledgment is awaited
        self.sink
            .send(WsMessage::Text(text))
            .await
            .map_err(|e| ChannelError::SubscribeFailed {
                reason: e.to_string(),
            })
    }

    async fn close(&mut self) {
        // Idempotent: only the first close tears anything down
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let _ = self.sink.send(WsMessage::Close(None)).await;
        let _ = self.sink.close().await;
        self.reader.abort();
        debug!("push channel closed");
    }
}

impl Drop for WebSocketHandle {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.reader.abort();
    }
}

// ----------------------------------------------------------------------------
// Read Loop
// ----------------------------------------------------------------------------

async fn read_loop(mut source: WsSource, events: PushEventSender, closed: Arc<AtomicBool>) {
    while let Some(item) = source.next().await {
        // Late events after a local close never reach the controller
        if closed.load(Ordering::SeqCst) {
            return;
        }

        match item {
            Ok(WsMessage::Text(text)) => match RawFrame::from_text(&text) {
                Ok(frame) => {
                    if events.send(PushEvent::Frame(frame)).await.is_err() {
                        // Controller is gone; nothing left to deliver to
                        return;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "dropping unparseable push frame");
                }
            },
            Ok(WsMessage::Close(frame)) => {
                let reason = frame
                    .map(|f| f.reason.to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "server closed the connection".to_string());
                emit_disconnected(&events, &closed, reason).await;
                return;
            }
            // Binary and control frames are outside the protocol
            Ok(_) => {}
            Err(e) => {
                emit_disconnected(&events, &closed, e.to_string()).await;
                return;
            }
        }
    }

    // Stream ended without a close frame
    emit_disconnected(&events, &closed, "connection ended".to_string()).await;
}

async fn emit_disconnected(events: &PushEventSender, closed: &AtomicBool, reason: String) {
    // A disconnect observed after a local close is not an error
    if closed.swap(true, Ordering::SeqCst) {
        return;
    }
    warn!(%reason, "push channel disconnected");
    let _ = events.send(PushEvent::Disconnected { reason }).await;
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::time::timeout;
    use tokio_tungstenite::accept_async;

    use frontdesk_core::{create_push_event_channel, ChannelConfig};

    /// One-shot loopback server: accepts a single WebSocket connection,
    /// reads the subscription frame, then plays back the given messages.
    async fn spawn_server(playback: Vec<WsMessage>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("ws://{}", listener.local_addr().unwrap());

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();

            // Subscription frame arrives first
            let subscription = ws.next().await.unwrap().unwrap();
            assert!(subscription.to_text().unwrap().contains("subscribe"));

            for message in playback {
                ws.send(message).await.unwrap();
            }
            // Keep the connection open until the client drops it
            while ws.next().await.is_some() {}
        });

        address
    }

    #[tokio::test]
    async fn test_connect_failure_is_a_channel_error() {
        let (events, _rx) = create_push_event_channel(&ChannelConfig::default());
        let result = WebSocketConnector::new()
            .connect("ws://127.0.0.1:1", events)
            .await;

        assert!(matches!(
            result.map(|_| ()),
            Err(ChannelError::ConnectFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_frames_are_forwarded_and_garbage_dropped() {
        let address = spawn_server(vec![
            WsMessage::Text("this is not json".to_string()),
            WsMessage::Text(
                r#"{"topic":"chat","content":{"type":"message","role":"AGENT","text":"hi"}}"#
                    .to_string(),
            ),
        ])
        .await;

        let (events, mut rx) = create_push_event_channel(&ChannelConfig::default());
        let mut handle = WebSocketConnector::new()
            .connect(&address, events)
            .await
            .unwrap();
        handle.subscribe(&Topic::ALL).await.unwrap();

        // The garbage frame is dropped; the first delivered event is the
        // well-formed chat frame.
        let event = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("frame should arrive")
            .expect("channel should be open");

        match event {
            PushEvent::Frame(frame) => assert_eq!(frame.topic, "chat"),
            other => panic!("unexpected push event: {:?}", other),
        }

        handle.close().await;
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_silences_events() {
        let address = spawn_server(Vec::new()).await;

        let (events, mut rx) = create_push_event_channel(&ChannelConfig::default());
        let mut handle = WebSocketConnector::new()
            .connect(&address, events)
            .await
            .unwrap();
        handle.subscribe(&Topic::ALL).await.unwrap();

        handle.close().await;
        handle.close().await;

        // No disconnect event surfaces after a local close
        let outcome = timeout(Duration::from_millis(200), rx.recv()).await;
        match outcome {
            Err(_elapsed) => {}
            Ok(None) => {}
            Ok(Some(event)) => panic!("unexpected event after close: {:?}", event),
        }

        // Subscribing on a closed handle fails fast
        assert!(matches!(
            handle.subscribe(&Topic::ALL).await,
            Err(ChannelError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_server_close_emits_single_disconnect() {
        let address = spawn_server(vec![WsMessage::Close(None)]).await;

        let (events, mut rx) = create_push_event_channel(&ChannelConfig::default());
        let mut handle = WebSocketConnector::new()
            .connect(&address, events)
            .await
            .unwrap();
        handle.subscribe(&Topic::ALL).await.unwrap();

        let event = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("disconnect should arrive")
            .expect("channel should be open");
        assert!(matches!(event, PushEvent::Disconnected { .. }));

        // Terminal: nothing further is emitted
        let outcome = timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(matches!(outcome, Err(_) | Ok(None)));

        handle.close().await;
    }
}
