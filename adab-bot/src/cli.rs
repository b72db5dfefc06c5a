//! CLI channel adapter for interactive terminal sessions.
//!
//! Provides a simple stdin/stdout based channel for local testing and development.
//! Keyboards are printed as bracketed button rows; type a label to press it.

use crate::message::{
    ChannelMessage, ChannelType, OutgoingContent, OutgoingMessage, ReplyKeyboard, ReplyMarkup,
};
use crate::traits::{Channel, ChannelResult};
use async_trait::async_trait;
use tokio::io::{self, AsyncBufReadExt, BufReader};

/// Chat and user ID used for every local message.
pub const CLI_SESSION_ID: &str = "cli";

/// CLI channel - stdin/stdout, always available.
pub struct CliChannel;

impl CliChannel {
    /// Create a new CLI channel.
    pub const fn new() -> Self {
        Self
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Render an outgoing message for the terminal.
fn render(message: &OutgoingMessage) -> String {
    let OutgoingContent::Text { text } = &message.content;
    let mut out = text.trim_end().to_string();

    match &message.markup {
        Some(ReplyMarkup::Keyboard(kb)) => {
            out.push('\n');
            out.push_str(&render_keyboard(kb));
        }
        Some(ReplyMarkup::Remove) | None => {}
    }

    out
}

fn render_keyboard(kb: &ReplyKeyboard) -> String {
    kb.rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|label| format!("[{label}]"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &'static str {
        "cli"
    }

    async fn init(&mut self) -> ChannelResult<()> {
        Ok(())
    }

    async fn send(&self, message: OutgoingMessage) -> ChannelResult<String> {
        println!("{}", render(&message));
        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn listen<F>(&self, callback: F) -> ChannelResult<()>
    where
        F: Fn(ChannelMessage) + Send + Sync + 'static,
    {
        let stdin = io::stdin();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();

        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if line == "/quit" || line == "/exit" {
                break;
            }

            let msg = ChannelMessage::text(ChannelType::Cli, CLI_SESSION_ID, CLI_SESSION_ID, line)
                .with_display_name("you");
            callback(msg);
        }
        Ok(())
    }

    async fn health_check(&self) -> ChannelResult<()> {
        Ok(())
    }

    async fn shutdown(&self) -> ChannelResult<()> {
        Ok(())
    }
}
