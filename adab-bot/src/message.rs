//! Message types for channel communication.

use serde::{Deserialize, Serialize};

/// Channel type enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Telegram,
    Cli,
}

impl ChannelType {
    /// Get the channel type as a string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Telegram => "telegram",
            Self::Cli => "cli",
        }
    }
}

/// Inbound message delivered by a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Message ID (channel-specific)
    pub id: String,
    /// Channel type
    pub channel_type: ChannelType,
    /// Chat identifier; replies are addressed here
    pub channel_id: String,
    /// User identifier
    pub user_id: String,
    /// Human-readable sender name, used only for logging
    #[serde(default)]
    pub display_name: Option<String>,
    /// Message content
    pub content: MessageContent,
    /// Timestamp (Unix millis)
    pub timestamp: i64,
    /// Trace ID assigned on receipt
    #[serde(default)]
    pub trace_id: String,
}

/// Message content types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    /// Plain text message
    Text { text: String },
}

impl ChannelMessage {
    /// Build a text message with a fresh ID and the current timestamp.
    pub fn text(
        channel_type: ChannelType,
        channel_id: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            channel_type,
            channel_id: channel_id.into(),
            user_id: user_id.into(),
            display_name: None,
            content: MessageContent::Text { text: text.into() },
            timestamp: now_millis(),
            trace_id: adab_common::logging::generate_trace_id(),
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Get the text content.
    pub fn text_content(&self) -> &str {
        match &self.content {
            MessageContent::Text { text } => text,
        }
    }

    /// Command name if the text is a bot command.
    ///
    /// `/start`, `/start@AdabBot` and `/start now` all yield `start`.
    pub fn command(&self) -> Option<&str> {
        let rest = self.text_content().strip_prefix('/')?;
        let word = rest.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or(word);
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// Name to show in logs: display name if known, otherwise the user ID.
    pub fn sender_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.user_id)
    }
}

/// Reply keyboard shown in place of the user's on-screen keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyKeyboard {
    /// Button labels, row by row
    pub rows: Vec<Vec<String>>,
    /// Hide the keyboard after one button press
    #[serde(default)]
    pub one_time: bool,
    /// Ask the client to shrink the keyboard to fit its buttons
    #[serde(default)]
    pub resize: bool,
    /// Placeholder shown in the input field while the keyboard is active
    #[serde(default)]
    pub placeholder: Option<String>,
}

impl ReplyKeyboard {
    /// Create a keyboard from rows of labels.
    pub fn new<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
            one_time: false,
            resize: false,
            placeholder: None,
        }
    }

    pub fn one_time(mut self) -> Self {
        self.one_time = true;
        self
    }

    pub fn resized(mut self) -> Self {
        self.resize = true;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// All labels in row order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(String::as_str)
    }
}

/// Keyboard change attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplyMarkup {
    /// Show a reply keyboard
    Keyboard(ReplyKeyboard),
    /// Remove any reply keyboard currently shown
    Remove,
}

/// Outgoing message to send to a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Target channel type
    pub channel_type: ChannelType,
    /// Target chat ID
    pub channel_id: String,
    /// Reply to message ID (optional)
    pub reply_to: Option<String>,
    /// Message content
    pub content: OutgoingContent,
    /// Keyboard change, if any
    #[serde(default)]
    pub markup: Option<ReplyMarkup>,
}

/// Outgoing message content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutgoingContent {
    /// Plain text
    Text { text: String },
}

impl OutgoingMessage {
    /// Get the text content.
    pub fn text(&self) -> &str {
        match &self.content {
            OutgoingContent::Text { text } => text,
        }
    }
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
