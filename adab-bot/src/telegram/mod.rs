//! Telegram channel adapter.
//!
//! Provides the `TelegramChannel` implementation for receiving and sending messages
//! through the Telegram Bot API.

use crate::message::{
    ChannelMessage, ChannelType, OutgoingContent, OutgoingMessage, ReplyKeyboard, ReplyMarkup,
};
use crate::traits::{Channel, ChannelError, ChannelResult};
use adab_common::config::TelegramConfig;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

/// Telegram rejects messages longer than this.
const MAX_MESSAGE_LEN: usize = 4096;

/// Back-off after a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

// ============================================================================
// Telegram Channel
// ============================================================================

/// Telegram channel - long-polls the Bot API for updates.
pub struct TelegramChannel {
    bot_token: String,
    api_base: String,
    poll_timeout_secs: u64,
    client: reqwest::Client,
}

impl TelegramChannel {
    /// Create a new Telegram channel against the public Bot API.
    pub fn new(bot_token: String) -> Self {
        Self::from_config(&TelegramConfig {
            bot_token,
            ..TelegramConfig::default()
        })
    }

    /// Create a channel from configuration.
    pub fn from_config(config: &TelegramConfig) -> Self {
        Self {
            bot_token: config.bot_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            poll_timeout_secs: config.poll_timeout_secs,
            client: reqwest::Client::new(),
        }
    }

    /// Point the channel at a different Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    /// Call a Bot API method and return its `result` field.
    async fn call(&self, method: &str, body: &Value) -> ChannelResult<Value> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::Connection(e.to_string()))?;

        let status = resp.status();
        let data: Value = resp
            .json()
            .await
            .map_err(|e| ChannelError::InvalidMessage(format!("{method}: {e}")))?;

        if status.is_success() && data.get("ok").and_then(Value::as_bool) == Some(true) {
            return Ok(data.get("result").cloned().unwrap_or(Value::Null));
        }

        let description = data
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();

        Err(match status.as_u16() {
            401 | 404 => ChannelError::Auth(description),
            _ => ChannelError::Internal(format!("{method} failed ({status}): {description}")),
        })
    }

    /// Fetch one batch of updates starting at `offset`.
    ///
    /// Returns the text messages found and the offset to use for the next poll.
    pub async fn poll_updates(&self, offset: i64) -> ChannelResult<(Vec<ChannelMessage>, i64)> {
        let body = json!({
            "offset": offset,
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message"]
        });

        let result = self.call("getUpdates", &body).await?;
        let updates = result.as_array().map(Vec::as_slice).unwrap_or_default();

        let mut next_offset = offset;
        let mut messages = Vec::with_capacity(updates.len());

        for update in updates {
            if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
                next_offset = next_offset.max(uid + 1);
            }
            if let Some(msg) = parse_update(update) {
                messages.push(msg);
            }
        }

        Ok((messages, next_offset))
    }

    /// Send a text message, attaching `markup` to the last chunk.
    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        markup: Option<&ReplyMarkup>,
    ) -> ChannelResult<String> {
        let chunks = split_message(text, MAX_MESSAGE_LEN);
        let last = chunks.len() - 1;
        let mut message_id = String::new();

        for (i, chunk) in chunks.iter().enumerate() {
            let mut body = json!({
                "chat_id": chat_id,
                "text": chunk,
            });
            if i == last {
                if let Some(markup) = markup {
                    body["reply_markup"] = reply_markup_json(markup);
                }
            }

            let result = self
                .call("sendMessage", &body)
                .await
                .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

            message_id = result
                .get("message_id")
                .and_then(Value::as_i64)
                .map(|id| id.to_string())
                .unwrap_or_default();
        }

        tracing::debug!(chat_id = %chat_id, chunks = chunks.len(), "Telegram message sent");
        Ok(message_id)
    }
}

/// Convert one `getUpdates` entry into a message. Non-text updates yield `None`.
fn parse_update(update: &Value) -> Option<ChannelMessage> {
    let message = update.get("message")?;
    let text = message.get("text").and_then(Value::as_str)?;

    let chat_id = message.get("chat")?.get("id")?.as_i64()?.to_string();
    let from = message.get("from");
    let user_id = from
        .and_then(|f| f.get("id"))
        .and_then(Value::as_i64)
        .map_or_else(|| chat_id.clone(), |id| id.to_string());

    let mut msg = ChannelMessage::text(ChannelType::Telegram, chat_id, user_id, text);

    if let Some(id) = message.get("message_id").and_then(Value::as_i64) {
        msg.id = id.to_string();
    }
    if let Some(date) = message.get("date").and_then(Value::as_i64) {
        msg.timestamp = date * 1000;
    }
    let name = from
        .and_then(|f| f.get("first_name").or_else(|| f.get("username")))
        .and_then(Value::as_str);
    if let Some(name) = name {
        msg = msg.with_display_name(name);
    }

    Some(msg)
}

/// Bot API `reply_markup` object for a keyboard change.
fn reply_markup_json(markup: &ReplyMarkup) -> Value {
    match markup {
        ReplyMarkup::Remove => json!({ "remove_keyboard": true }),
        ReplyMarkup::Keyboard(kb) => keyboard_json(kb),
    }
}

fn keyboard_json(kb: &ReplyKeyboard) -> Value {
    let rows: Vec<Vec<Value>> = kb
        .rows
        .iter()
        .map(|row| row.iter().map(|label| json!({ "text": label })).collect())
        .collect();

    let mut value = json!({
        "keyboard": rows,
        "one_time_keyboard": kb.one_time,
        "resize_keyboard": kb.resize,
    });
    if let Some(ref placeholder) = kb.placeholder {
        value["input_field_placeholder"] = Value::String(placeholder.clone());
    }
    value
}

/// Split a message into chunks that fit within Telegram's limit.
///
/// Lengths are counted in bytes; splits always land on a char boundary.
fn split_message(message: &str, max_len: usize) -> Vec<String> {
    if message.len() <= max_len {
        return vec![message.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = message;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let mut boundary = max_len;
        while !remaining.is_char_boundary(boundary) {
            boundary -= 1;
        }

        let chunk = &remaining[..boundary];
        let split_pos = chunk
            .rfind("\n\n")
            .or_else(|| chunk.rfind('\n'))
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(boundary);

        let actual_split = if split_pos == 0 { boundary } else { split_pos };

        chunks.push(remaining[..actual_split].to_string());
        remaining = remaining[actual_split..].trim_start();
    }

    chunks
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn init(&mut self) -> ChannelResult<()> {
        // Verify bot token by calling getMe
        let me = self.call("getMe", &json!({})).await.map_err(|e| match e {
            ChannelError::Auth(reason) => ChannelError::Auth(format!("Invalid bot token: {reason}")),
            other => other,
        })?;

        let username = me.get("username").and_then(Value::as_str).unwrap_or("unknown");
        tracing::info!(bot = %username, "Telegram channel initialized");
        Ok(())
    }

    async fn send(&self, message: OutgoingMessage) -> ChannelResult<String> {
        match &message.content {
            OutgoingContent::Text { text } => {
                self.send_text(&message.channel_id, text, message.markup.as_ref())
                    .await
            }
        }
    }

    async fn listen<F>(&self, callback: F) -> ChannelResult<()>
    where
        F: Fn(ChannelMessage) + Send + Sync + 'static,
    {
        let mut offset: i64 = 0;

        tracing::info!("Telegram channel listening for messages...");

        loop {
            match self.poll_updates(offset).await {
                Ok((messages, next_offset)) => {
                    offset = next_offset;
                    for msg in messages {
                        tracing::info!(
                            channel = "telegram",
                            user_id = %msg.user_id,
                            chat_id = %msg.channel_id,
                            trace_id = %msg.trace_id,
                            text = %msg.text_content(),
                            "IM message received"
                        );
                        callback(msg);
                    }
                }
                Err(ChannelError::Auth(reason)) => {
                    return Err(ChannelError::Auth(reason));
                }
                Err(e) => {
                    tracing::warn!("Telegram poll error: {e}");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }

    async fn health_check(&self) -> ChannelResult<()> {
        self.call("getMe", &json!({}))
            .await
            .map(|_| ())
            .map_err(|_| ChannelError::NotReady)
    }

    async fn shutdown(&self) -> ChannelResult<()> {
        tracing::info!("Telegram channel shutting down");
        Ok(())
    }
}
