//! Conversation state and per-user session records.

use crate::message::ChannelMessage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversation stage.
///
/// `Idle` is both the initial and the terminal stage. An idle user has no
/// stored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    #[default]
    Idle,
    ChoosingFormat,
    ChoosingChapter,
}

impl State {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ChoosingFormat => "choosing_format",
            Self::ChoosingChapter => "choosing_chapter",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sessions are tracked per user within each chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub channel_id: String,
    pub user_id: String,
}

impl SessionKey {
    pub fn new(channel_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            user_id: user_id.into(),
        }
    }

    pub fn from_message(message: &ChannelMessage) -> Self {
        Self::new(message.channel_id.clone(), message.user_id.clone())
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.user_id)
    }
}

/// Choices collected so far in one user's conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub state: State,
    /// Selected response format, set when leaving `ChoosingFormat`
    pub format: Option<String>,
    /// Selected chapter, set while in `ChoosingChapter`
    pub category: Option<String>,
}

impl Session {
    /// A fresh session waiting for the format choice.
    pub fn started() -> Self {
        Self {
            state: State::ChoosingFormat,
            format: None,
            category: None,
        }
    }
}
