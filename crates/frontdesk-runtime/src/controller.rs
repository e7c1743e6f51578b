//! Chat Session Controller
//!
//! The single-writer reducer task. Every state transition is a synchronous
//! reaction to one of three serialized sources: UI commands, push channel
//! events, and completions of spawned bootstrap/send calls. Nothing else
//! touches the session record, the conversation log, or the typing signal.
//!
//! Outward calls (bootstrap, send) are spawned so a call in flight never
//! blocks frame reception; their results come back as [`Completion`]s tagged
//! with a session epoch, and completions from a cycle the user has already
//! ended are discarded.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use frontdesk_core::{
    AppEvent, AppEventSender, BootstrapService, ChannelError, Command, CommandReceiver,
    ClientConfig, ConversationLog, ErrorKind, FrontdeskError, InboundEvent, LifecycleEvent,
    Message, MessageCorrelator, PushConnector, PushEvent, PushEventReceiver, PushEventSender,
    PushHandle, RawFrame, Result, SendError, SendReceipt, SendTransport, Sender, Session,
    SessionPhase, Topic, TypingTracker,
};
use uuid::Uuid;

// ----------------------------------------------------------------------------
// Completions of Spawned Outward Calls
// ----------------------------------------------------------------------------

/// Result of a spawned bootstrap or send future, fed back into the reducer
enum Completion {
    Bootstrap {
        epoch: u64,
        result: std::result::Result<(Session, Box<dyn PushHandle>), FrontdeskError>,
    },
    Send {
        epoch: u64,
        message_id: Uuid,
        result: std::result::Result<SendReceipt, SendError>,
    },
}

type CompletionSender = mpsc::Sender<Completion>;
type CompletionReceiver = mpsc::Receiver<Completion>;

// ----------------------------------------------------------------------------
// Chat Controller
// ----------------------------------------------------------------------------

/// Owns session lifecycle, the conversation log, and the typing signal
pub struct ChatController {
    config: ClientConfig,
    phase: SessionPhase,
    session: Option<Session>,
    conversation: ConversationLog,
    correlator: MessageCorrelator,
    typing: TypingTracker,
    push_handle: Option<Box<dyn PushHandle>>,
    /// Bumped on every teardown; stale completions carry an older value
    epoch: u64,

    bootstrap: Arc<dyn BootstrapService>,
    transport: Arc<dyn SendTransport>,
    connector: Arc<dyn PushConnector>,

    command_receiver: CommandReceiver,
    push_event_receiver: PushEventReceiver,
    /// Handed to the connector on every new connection
    push_event_sender: PushEventSender,
    app_event_sender: AppEventSender,
    completion_sender: CompletionSender,
    completion_receiver: CompletionReceiver,

    running: bool,
}

impl ChatController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ClientConfig,
        bootstrap: Arc<dyn BootstrapService>,
        transport: Arc<dyn SendTransport>,
        connector: Arc<dyn PushConnector>,
        command_receiver: CommandReceiver,
        push_event_sender: PushEventSender,
        push_event_receiver: PushEventReceiver,
        app_event_sender: AppEventSender,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(FrontdeskError::config_error)?;

        let correlator = MessageCorrelator::new(config.local_role.clone());
        let (completion_sender, completion_receiver) = mpsc::channel(16);

        Ok(Self {
            config,
            phase: SessionPhase::Closed,
            session: None,
            conversation: ConversationLog::new(),
            correlator,
            typing: TypingTracker::new(),
            push_handle: None,
            epoch: 0,
            bootstrap,
            transport,
            connector,
            command_receiver,
            push_event_receiver,
            push_event_sender,
            app_event_sender,
            completion_sender,
            completion_receiver,
            running: true,
        })
    }

    /// Run the controller loop until the UI drops its command sender
    pub async fn run(mut self) -> Result<()> {
        info!("chat controller starting");

        while self.running {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => self.process_command(command).await?,
                        None => {
                            info!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
                event = self.push_event_receiver.recv() => {
                    if let Some(event) = event {
                        self.process_push_event(event).await?;
                    }
                }
                completion = self.completion_receiver.recv() => {
                    if let Some(completion) = completion {
                        self.process_completion(completion).await?;
                    }
                }
            }
        }

        // Leaving the loop releases the channel if one is still open
        if let Some(mut handle) = self.push_handle.take() {
            handle.close().await;
        }

        info!("chat controller stopped");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // State Accessors (for the runtime handle and tests)
    // ------------------------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn conversation(&self) -> &ConversationLog {
        &self.conversation
    }

    pub fn peer_typing(&self) -> bool {
        self.typing.is_typing()
    }

    // ------------------------------------------------------------------------
    // Command Processing
    // ------------------------------------------------------------------------

    /// Apply one UI intent
    pub async fn process_command(&mut self, command: Command) -> Result<()> {
        debug!(?command, phase = self.phase.name(), "processing command");

        match command {
            Command::Open { display_name } => self.handle_open(display_name).await,
            Command::Send { content } => self.handle_send(content).await,
            Command::Minimize => {
                if self.transition(LifecycleEvent::Minimize) {
                    self.emit_state().await?;
                }
                Ok(())
            }
            Command::Reopen => {
                if self.transition(LifecycleEvent::Reopen) {
                    self.emit_state().await?;
                }
                Ok(())
            }
            Command::Clear => {
                if self.phase.can_clear() {
                    self.conversation.reset();
                } else {
                    warn!(phase = self.phase.name(), "ignoring clear in closed phase");
                }
                Ok(())
            }
            Command::End => self.handle_end().await,
        }
    }

    async fn handle_open(&mut self, display_name: Option<String>) -> Result<()> {
        if !self.transition(LifecycleEvent::Open) {
            return Ok(());
        }

        // A fresh cycle: results of anything older are now stale
        self.epoch += 1;
        self.emit_state().await?;

        let bootstrap = Arc::clone(&self.bootstrap);
        let connector = Arc::clone(&self.connector);
        let push_events = self.push_event_sender.clone();
        let completions = self.completion_sender.clone();
        let epoch = self.epoch;
        let display_name = display_name.or_else(|| self.config.display_name.clone());

        tokio::spawn(async move {
            let result = run_bootstrap(bootstrap, connector, push_events, display_name).await;
            let _ = completions.send(Completion::Bootstrap { epoch, result }).await;
        });

        Ok(())
    }

    async fn handle_send(&mut self, content: String) -> Result<()> {
        if !self.phase.can_send() {
            warn!(phase = self.phase.name(), "ignoring send outside active phase");
            return Ok(());
        }

        let connection_token = match &self.session {
            Some(session) => session.connection_token.clone(),
            // Unreachable while the phase machine holds, but never panic here
            None => {
                warn!("active phase without a session record, dropping send");
                return Ok(());
            }
        };

        // Optimistic append: displayed immediately, confirmed later
        let message = Message::local(content.clone());
        let id = message.id;
        let timestamp = message.timestamp;
        self.conversation.append(message);
        self.send_app(AppEvent::MessageSent {
            id,
            content: content.clone(),
            timestamp,
        })
        .await?;

        if connection_token.is_empty() {
            return self
                .apply_send_failure(id, SendError::MissingConnectionToken)
                .await;
        }

        let transport = Arc::clone(&self.transport);
        let completions = self.completion_sender.clone();
        let epoch = self.epoch;

        tokio::spawn(async move {
            let result = transport.send_message(&connection_token, &content).await;
            let _ = completions
                .send(Completion::Send {
                    epoch,
                    message_id: id,
                    result,
                })
                .await;
        });

        Ok(())
    }

    async fn handle_end(&mut self) -> Result<()> {
        if !self.transition(LifecycleEvent::End) {
            return Ok(());
        }

        self.teardown().await?;
        self.emit_state().await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Push Event Processing
    // ------------------------------------------------------------------------

    /// Apply one push channel event
    pub async fn process_push_event(&mut self, event: PushEvent) -> Result<()> {
        match event {
            PushEvent::Frame(frame) => self.handle_frame(frame).await,
            PushEvent::Disconnected { reason } => self.handle_disconnect(reason).await,
        }
    }

    async fn handle_frame(&mut self, frame: RawFrame) -> Result<()> {
        // Frames can race the bootstrap completion (the adapter connects
        // before the completion lands), so Bootstrapping accepts them too.
        if !matches!(
            self.phase,
            SessionPhase::Bootstrapping | SessionPhase::Active | SessionPhase::Minimized
        ) {
            debug!(phase = self.phase.name(), "discarding frame outside session");
            return Ok(());
        }

        let event = match self.correlator.correlate(&frame) {
            Some(event) => event,
            None => return Ok(()),
        };

        match event {
            InboundEvent::Message {
                content,
                sender: Sender::Remote,
                absolute_time: _,
            } => {
                // Conservative ack: any remote arrival confirms every
                // still-pending local send, exactly once each.
                let flipped = self
                    .conversation
                    .mark_delivered(|m| m.sender == Sender::Local);
                if flipped > 0 {
                    debug!(flipped, "remote message acknowledged pending sends");
                }

                let message = Message::remote(content.clone());
                let timestamp = message.timestamp;
                self.conversation.append(message);

                // A delivered message implies the peer stopped typing
                if let Some(edge) = self.typing.clear() {
                    self.send_app(AppEvent::TypingChanged(edge)).await?;
                }

                self.send_app(AppEvent::MessageReceived { content, timestamp })
                    .await
            }
            InboundEvent::Message {
                sender: Sender::Local,
                ..
            } => {
                // Echo of our own optimistic send; appending again would
                // duplicate the line.
                debug!("dropping local echo frame");
                Ok(())
            }
            InboundEvent::Typing { sender, state } => {
                if let Some(edge) = self.typing.apply(sender, state) {
                    self.send_app(AppEvent::TypingChanged(edge)).await?;
                }
                Ok(())
            }
        }
    }

    async fn handle_disconnect(&mut self, reason: String) -> Result<()> {
        // Valid from Bootstrapping too: the connection can die after
        // connect/subscribe but before the bootstrap completion lands, and
        // the adapter only ever emits one terminal disconnect. Teardown bumps
        // the epoch, so that completion is discarded as stale.
        if !self.transition(LifecycleEvent::ChannelLost) {
            // A late event after teardown
            debug!(%reason, "disconnect outside active session");
            return Ok(());
        }

        warn!(%reason, "push channel lost, ending session");
        self.teardown().await?;
        self.send_app(AppEvent::Error {
            kind: ErrorKind::Channel,
            message: ChannelError::closed_unexpectedly(reason).to_string(),
        })
        .await?;
        self.emit_state().await
    }

    // ------------------------------------------------------------------------
    // Completion Processing
    // ------------------------------------------------------------------------

    /// Await and apply the next completion (run() multiplexes this; tests may
    /// call it directly to drive the reducer deterministically)
    pub async fn process_next_completion(&mut self) -> Result<()> {
        match self.completion_receiver.recv().await {
            Some(completion) => self.process_completion(completion).await,
            None => Err(FrontdeskError::internal("completion channel closed")),
        }
    }

    async fn process_completion(&mut self, completion: Completion) -> Result<()> {
        match completion {
            Completion::Bootstrap { epoch, result } => {
                self.apply_bootstrap_completion(epoch, result).await
            }
            Completion::Send {
                epoch,
                message_id,
                result,
            } => self.apply_send_completion(epoch, message_id, result).await,
        }
    }

    async fn apply_bootstrap_completion(
        &mut self,
        epoch: u64,
        result: std::result::Result<(Session, Box<dyn PushHandle>), FrontdeskError>,
    ) -> Result<()> {
        if epoch != self.epoch || self.phase != SessionPhase::Bootstrapping {
            // The user ended or restarted the cycle while bootstrap ran;
            // release the connection if one was established.
            debug!("discarding stale bootstrap completion");
            if let Ok((_, mut handle)) = result {
                handle.close().await;
            }
            return Ok(());
        }

        match result {
            Ok((session, handle)) => {
                info!(contact_id = %session.contact_id, "session active");
                self.session = Some(session);
                self.push_handle = Some(handle);
                self.transition(LifecycleEvent::BootstrapSucceeded);
                self.emit_state().await
            }
            Err(error) => {
                warn!(%error, "bootstrap failed");
                self.transition(LifecycleEvent::BootstrapFailed);
                let kind = error.kind().unwrap_or(ErrorKind::Bootstrap);
                self.send_app(AppEvent::Error {
                    kind,
                    message: error.to_string(),
                })
                .await?;
                self.emit_state().await
            }
        }
    }

    async fn apply_send_completion(
        &mut self,
        epoch: u64,
        message_id: Uuid,
        result: std::result::Result<SendReceipt, SendError>,
    ) -> Result<()> {
        if epoch != self.epoch {
            // Session moved past this send; the result is simply dropped
            debug!("discarding stale send completion");
            return Ok(());
        }

        match result {
            Ok(receipt) => {
                // The backend acknowledged receipt on the control channel;
                // pending_ack still waits for the push channel (conservative
                // ack), so there is nothing to flip here.
                debug!(message_id = %receipt.message_id, "send accepted");
                Ok(())
            }
            Err(error) => self.apply_send_failure(message_id, error).await,
        }
    }

    /// Recoverable: annotate the one affected message, keep the session
    async fn apply_send_failure(&mut self, message_id: Uuid, error: SendError) -> Result<()> {
        warn!(%message_id, %error, "send failed");
        self.conversation.mark_send_failed(message_id);
        self.send_app(AppEvent::Error {
            kind: ErrorKind::Send,
            message: error.to_string(),
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Attempt a lifecycle transition; invalid edges are logged and dropped
    fn transition(&mut self, event: LifecycleEvent) -> bool {
        match self.phase.transition(event) {
            Ok(next) => {
                debug!(from = self.phase.name(), to = next.name(), "phase transition");
                self.phase = next;
                true
            }
            Err(error) => {
                warn!(%error, "transition rejected");
                false
            }
        }
    }

    /// Drop session identity, close the channel, reset the conversation
    async fn teardown(&mut self) -> Result<()> {
        if let Some(mut handle) = self.push_handle.take() {
            handle.close().await;
        }
        self.session = None;
        self.conversation.reset();
        self.epoch += 1;
        if let Some(edge) = self.typing.clear() {
            self.send_app(AppEvent::TypingChanged(edge)).await?;
        }
        Ok(())
    }

    async fn emit_state(&mut self) -> Result<()> {
        let phase = self.phase;
        self.send_app(AppEvent::SessionStateChanged {
            phase,
            visibility: phase.visibility(),
        })
        .await
    }

    async fn send_app(&mut self, event: AppEvent) -> Result<()> {
        self.app_event_sender
            .send(event)
            .await
            .map_err(|_| FrontdeskError::internal("app event channel closed"))
    }
}

// ----------------------------------------------------------------------------
// Bootstrap Sequence
// ----------------------------------------------------------------------------

/// The full bootstrap step: credentials, connect, subscribe
async fn run_bootstrap(
    bootstrap: Arc<dyn BootstrapService>,
    connector: Arc<dyn PushConnector>,
    push_events: PushEventSender,
    display_name: Option<String>,
) -> std::result::Result<(Session, Box<dyn PushHandle>), FrontdeskError> {
    let response = bootstrap.start_session(display_name.as_deref()).await?;
    let session = response.into_session()?;

    let mut handle = connector
        .connect(&session.push_channel_address, push_events)
        .await?;

    if let Err(error) = handle.subscribe(&Topic::ALL).await {
        handle.close().await;
        return Err(error.into());
    }

    Ok((session, handle))
}
