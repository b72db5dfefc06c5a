//! Channel traits for implementing transports.

use crate::message::{ChannelMessage, OutgoingMessage};
use async_trait::async_trait;

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Channel error type.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Message send failed: {0}")]
    SendFailed(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Channel not ready")]
    NotReady,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Transport adapter trait.
///
/// A channel owns the connection to the messaging platform: it delivers inbound
/// messages to a callback and sends outgoing replies.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name.
    fn name(&self) -> &'static str;

    /// Initialize the channel (connect, authenticate, etc.).
    async fn init(&mut self) -> ChannelResult<()>;

    /// Send a message to the channel. Returns a channel-side message ID.
    async fn send(&self, message: OutgoingMessage) -> ChannelResult<String>;

    /// Listen for incoming messages until the source is exhausted.
    ///
    /// Messages are handed to `callback` in arrival order.
    async fn listen<F>(&self, callback: F) -> ChannelResult<()>
    where
        F: Fn(ChannelMessage) + Send + Sync + 'static;

    /// Check if the channel is healthy.
    async fn health_check(&self) -> ChannelResult<()>;

    /// Shutdown the channel gracefully.
    async fn shutdown(&self) -> ChannelResult<()>;
}
