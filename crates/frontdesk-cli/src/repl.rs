//! Interactive terminal loop
//!
//! Lines from stdin become commands or message sends; app events from the
//! controller print as they arrive. Slash commands mirror the widget
//! controls: /min, /reopen, /clear, /end, /open, /quit.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use frontdesk_core::{AppEvent, AppEventReceiver, Command, CommandSender, ErrorKind};

/// Run the interactive loop until /quit or end of stdin
pub async fn run(commands: CommandSender, mut events: AppEventReceiver) -> Result<()> {
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
        }
    });

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    println!("Connected. Type a message, or /min /reopen /clear /end /open /quit.");

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match line {
            "/quit" => break,
            "/min" => Command::Minimize,
            "/reopen" => Command::Reopen,
            "/clear" => Command::Clear,
            "/end" => Command::End,
            "/open" => Command::Open { display_name: None },
            text if text.starts_with('/') => {
                println!("Unknown command: {}", text);
                continue;
            }
            text => Command::Send {
                content: text.to_string(),
            },
        };

        if commands.send(command).await.is_err() {
            warn!("controller stopped, exiting");
            break;
        }
    }

    printer.abort();
    Ok(())
}

fn print_event(event: &AppEvent) {
    match event {
        AppEvent::MessageReceived { content, .. } => println!("<< {}", content),
        AppEvent::MessageSent { content, .. } => println!(">> {}", content),
        AppEvent::TypingChanged(true) => println!("-- agent is typing --"),
        AppEvent::TypingChanged(false) => println!("-- agent stopped typing --"),
        AppEvent::SessionStateChanged { phase, visibility } => {
            println!("[session {} / widget {}]", phase.name(), visibility)
        }
        AppEvent::Error { kind, message } => match kind {
            ErrorKind::Send => println!("!! message not delivered: {}", message),
            _ => println!("!! session error: {}", message),
        },
    }
}
