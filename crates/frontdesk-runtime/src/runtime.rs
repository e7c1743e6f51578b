//! Chat runtime: wiring and task lifecycle
//!
//! [`ChatRuntime`] owns the channel plumbing and the controller task. The
//! embedding UI keeps the [`CommandSender`] and the [`AppEventReceiver`]; the
//! runtime keeps the join handle so shutdown is explicit.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use frontdesk_core::{
    create_app_event_channel, create_command_channel, create_push_event_channel, AppEventReceiver,
    BootstrapService, ClientConfig, Command, CommandSender, FrontdeskError, PushConnector, Result,
    SendTransport,
};

use crate::controller::ChatController;

// ----------------------------------------------------------------------------
// Chat Runtime
// ----------------------------------------------------------------------------

/// Owns the controller task and the channels connecting it to the UI
pub struct ChatRuntime {
    config: ClientConfig,
    bootstrap: Arc<dyn BootstrapService>,
    transport: Arc<dyn SendTransport>,
    connector: Arc<dyn PushConnector>,

    command_sender: Option<CommandSender>,
    app_event_receiver: Option<AppEventReceiver>,
    controller_handle: Option<JoinHandle<Result<()>>>,
}

impl ChatRuntime {
    /// Create a runtime; validates the configuration up front
    pub fn new(
        config: ClientConfig,
        bootstrap: Arc<dyn BootstrapService>,
        transport: Arc<dyn SendTransport>,
        connector: Arc<dyn PushConnector>,
    ) -> Result<Self> {
        config.validate().map_err(FrontdeskError::config_error)?;

        Ok(Self {
            config,
            bootstrap,
            transport,
            connector,
            command_sender: None,
            app_event_receiver: None,
            controller_handle: None,
        })
    }

    /// Wire the channels and spawn the controller task
    pub fn start(&mut self) -> Result<()> {
        if self.controller_handle.is_some() {
            return Err(FrontdeskError::config_error("runtime already started"));
        }

        let (command_sender, command_receiver) = create_command_channel(&self.config.channels);
        let (push_event_sender, push_event_receiver) =
            create_push_event_channel(&self.config.channels);
        let (app_event_sender, app_event_receiver) =
            create_app_event_channel(&self.config.channels);

        let controller = ChatController::new(
            self.config.clone(),
            Arc::clone(&self.bootstrap),
            Arc::clone(&self.transport),
            Arc::clone(&self.connector),
            command_receiver,
            push_event_sender,
            push_event_receiver,
            app_event_sender,
        )?;

        self.command_sender = Some(command_sender);
        self.app_event_receiver = Some(app_event_receiver);
        self.controller_handle = Some(tokio::spawn(controller.run()));

        info!("chat runtime started");
        Ok(())
    }

    /// Sender for UI commands; available after `start`
    pub fn command_sender(&self) -> Option<CommandSender> {
        self.command_sender.clone()
    }

    /// Take the app event receiver (single consumer); available after `start`
    pub fn take_app_event_receiver(&mut self) -> Option<AppEventReceiver> {
        self.app_event_receiver.take()
    }

    pub fn is_running(&self) -> bool {
        self.controller_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// End any active session and stop the controller task
    pub async fn stop(&mut self) {
        if let Some(sender) = self.command_sender.take() {
            // Best effort: let the controller release the push channel
            let _ = sender.send(Command::End).await;
            // Yield so the End is processed before the task is torn down
            tokio::task::yield_now().await;
        }

        if let Some(handle) = self.controller_handle.take() {
            handle.abort();
            match handle.await {
                Ok(Ok(())) => info!("chat runtime stopped"),
                Ok(Err(error)) => warn!(%error, "controller exited with error"),
                Err(error) if error.is_cancelled() => info!("chat runtime stopped"),
                Err(error) => warn!(%error, "controller task join failed"),
            }
        }

        self.app_event_receiver = None;
    }
}

impl Drop for ChatRuntime {
    fn drop(&mut self) {
        if let Some(ref handle) = self.controller_handle {
            handle.abort();
        }
    }
}
