//! Message processor.
//!
//! Drains inbound messages from the transport queue and feeds them to the
//! conversation controller one at a time, sending any reply back through the
//! same channel.
//!
//! ```text
//! User → Channel::listen → mpsc → Processor → ConversationController
//!                                     ↓
//! User ←────────── Channel::send ←── Reply
//! ```

use crate::conversation::ConversationController;
use crate::message::ChannelMessage;
use crate::traits::{Channel, ChannelResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Instrument;

/// Owns the controller and the outbound side of a channel.
pub struct Processor<C> {
    channel: Arc<C>,
    controller: ConversationController,
}

impl<C: Channel + 'static> Processor<C> {
    pub fn new(channel: Arc<C>) -> Self {
        Self {
            channel,
            controller: ConversationController::new(),
        }
    }

    pub fn controller(&self) -> &ConversationController {
        &self.controller
    }

    /// Handle one message to completion. Returns the sent message ID, if a reply was sent.
    pub async fn process(&mut self, message: ChannelMessage) -> ChannelResult<Option<String>> {
        let span = tracing::info_span!(
            "message",
            trace_id = %message.trace_id,
            channel = message.channel_type.as_str(),
            chat_id = %message.channel_id,
            user_id = %message.user_id,
        );

        self.reply_to(message).instrument(span).await
    }

    async fn reply_to(&mut self, message: ChannelMessage) -> ChannelResult<Option<String>> {
        let Some(reply) = self.controller.handle(&message) else {
            tracing::debug!("No reply for message");
            return Ok(None);
        };

        let outgoing = reply.into_outgoing(&message);
        let id = self.channel.send(outgoing).await?;
        Ok(Some(id))
    }

    /// Process messages until every sender is dropped, then hand back the processor.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ChannelMessage>) -> Self {
        tracing::info!(channel = self.channel.name(), "Message processor started");

        while let Some(message) = rx.recv().await {
            if let Err(e) = self.process(message).await {
                tracing::error!(error = %e, "Failed to send reply");
            }
        }

        tracing::info!(
            active_sessions = self.controller.active_sessions(),
            "Message processor stopped"
        );
        self
    }

    /// Spawn the processor on the runtime.
    pub fn spawn(self, rx: mpsc::UnboundedReceiver<ChannelMessage>) -> tokio::task::JoinHandle<Self> {
        tokio::spawn(self.run(rx))
    }
}

/// Create the inbound queue and a callback that feeds it, suitable for `Channel::listen`.
///
/// The queue is unbounded: a transport has already acknowledged a message by the
/// time it reaches the callback, so it must never be dropped here.
pub fn inbound_queue() -> (
    impl Fn(ChannelMessage) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<ChannelMessage>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback = move |message: ChannelMessage| {
        if tx.send(message).is_err() {
            tracing::warn!("Processor stopped; dropping inbound message");
        }
    };
    (callback, rx)
}
