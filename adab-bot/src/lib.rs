//! Adab Bot - a Telegram menu bot for Adab al-Mufrad class notes and audios.
//!
//! The bot walks each user through two menus (response format, then chapter)
//! and answers with fixed text. The crate is split into:
//! - `conversation`: the finite-state menu controller and its session map
//! - `telegram` / `cli`: transports implementing [`Channel`]
//! - `processor`: the task that feeds inbound messages to the controller
//!
//! ## Architecture
//!
//! ```text
//! Telegram getUpdates → TelegramChannel::listen → mpsc → Processor
//!                                                          ↓
//! Telegram sendMessage ←── TelegramChannel::send ←── ConversationController
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod cli;
pub mod conversation;
pub mod message;
pub mod processor;
pub mod telegram;
pub mod traits;

// Re-export commonly used types
pub use cli::CliChannel;
pub use conversation::{
    ConversationController, ConversationError, Reply, Session, SessionKey, State,
};
pub use message::{
    ChannelMessage, ChannelType, MessageContent, OutgoingContent, OutgoingMessage, ReplyKeyboard,
    ReplyMarkup,
};
pub use processor::{inbound_queue, Processor};
pub use telegram::TelegramChannel;
pub use traits::{Channel, ChannelError, ChannelResult};

use std::sync::Arc;

/// Run the bot on `channel` until the transport stops or Ctrl-C is pressed.
///
/// A failed `init` (for example a rejected bot token) is returned as a fatal error.
pub async fn run_bot<C: Channel + 'static>(mut channel: C) -> anyhow::Result<()> {
    channel.init().await?;

    let channel = Arc::new(channel);
    let (callback, rx) = inbound_queue();
    let processor = Processor::new(channel.clone()).spawn(rx);

    let listened = tokio::select! {
        result = channel.listen(callback) => {
            tracing::info!(channel = channel.name(), "Channel stopped listening");
            result
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            Ok(())
        }
    };

    // The inbound sender is gone once `listen` is dropped, so the processor
    // drains what is queued and exits.
    let processor = processor.await?;
    tracing::debug!(
        active_sessions = processor.controller().active_sessions(),
        "Processor joined"
    );

    channel.shutdown().await?;

    listened?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Delivers a fixed script of messages, then fails the way a revoked token does.
    #[derive(Default)]
    struct ScriptedChannel {
        script: Vec<&'static str>,
        sent: Arc<Mutex<Vec<OutgoingMessage>>>,
        shut_down: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl Channel for ScriptedChannel {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn init(&mut self) -> ChannelResult<()> {
            Ok(())
        }

        async fn send(&self, message: OutgoingMessage) -> ChannelResult<String> {
            // Slow sends keep replies queued when `listen` gives up.
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            let mut sent = self.sent.lock().unwrap();
            sent.push(message);
            Ok(sent.len().to_string())
        }

        async fn listen<F>(&self, callback: F) -> ChannelResult<()>
        where
            F: Fn(ChannelMessage) + Send + Sync + 'static,
        {
            for text in &self.script {
                callback(ChannelMessage::text(ChannelType::Telegram, "1", "2", *text));
            }
            Err(ChannelError::Auth("Unauthorized".into()))
        }

        async fn health_check(&self) -> ChannelResult<()> {
            Ok(())
        }

        async fn shutdown(&self) -> ChannelResult<()> {
            self.shut_down.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_listen_error_still_drains_queue_and_shuts_down() {
        let channel = ScriptedChannel {
            script: vec!["/start", "Note", "/cancel", "/start"],
            ..Default::default()
        };
        let sent = channel.sent.clone();
        let shut_down = channel.shut_down.clone();

        let err = run_bot(channel).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ChannelError>(),
            Some(ChannelError::Auth(_))
        ));
        assert_eq!(sent.lock().unwrap().len(), 4);
        assert!(shut_down.load(Ordering::SeqCst));
    }
}
