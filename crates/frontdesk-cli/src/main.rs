//! Frontdesk CLI - terminal chat client entry point

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use frontdesk_cli::{cli::Cli, http::HttpChatBackend, repl};
use frontdesk_core::{ClientConfig, Command, ParticipantRole};
use frontdesk_push::WebSocketConnector;
use frontdesk_runtime::ChatRuntime;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    setup_logging(cli.verbose);

    let config = ClientConfig {
        local_role: ParticipantRole::new(&cli.role),
        display_name: Some(cli.name.clone()),
        ..ClientConfig::default()
    };

    let backend = Arc::new(HttpChatBackend::new(&cli.url));

    let mut runtime = ChatRuntime::new(
        config,
        backend.clone(),
        backend,
        Arc::new(WebSocketConnector::new()),
    )
    .context("building chat runtime")?;
    runtime.start().context("starting chat runtime")?;

    let commands = runtime
        .command_sender()
        .context("runtime did not expose a command sender")?;
    let events = runtime
        .take_app_event_receiver()
        .context("runtime did not expose an event receiver")?;

    // Open the widget immediately; the REPL takes over from there
    commands
        .send(Command::Open { display_name: None })
        .await
        .context("opening chat session")?;

    repl::run(commands, events).await?;

    runtime.stop().await;
    info!("frontdesk CLI exited");
    Ok(())
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
