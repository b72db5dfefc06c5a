//! Conversation flow controller.
//!
//! Walks each user through a two-step menu: pick a response format, then pick
//! a chapter. The controller owns every session; callers hand it one message
//! at a time and send whatever reply it returns.

pub mod menu;
mod state;
mod transition;

pub use menu::Reply;
pub use state::{Session, SessionKey, State};
pub use transition::{transition, Action, Input, Transition};

use crate::message::ChannelMessage;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from the state-specific entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("expected session in state {expected}, found {actual}")]
    UnexpectedState { expected: State, actual: State },
}

/// Finite-state menu controller with an explicit per-user session map.
#[derive(Debug, Default)]
pub struct ConversationController {
    sessions: HashMap<SessionKey, Session>,
}

impl ConversationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for `key`, if a conversation is in progress.
    pub fn session(&self, key: &SessionKey) -> Option<&Session> {
        self.sessions.get(key)
    }

    /// Current state for `key`. Absent sessions are `Idle`.
    pub fn state(&self, key: &SessionKey) -> State {
        self.sessions.get(key).map_or(State::Idle, |s| s.state)
    }

    /// Number of conversations in progress.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Classify an inbound message and run it through the transition table.
    pub fn handle(&mut self, message: &ChannelMessage) -> Option<Reply> {
        let key = SessionKey::from_message(message);
        let input = Input::classify(message);
        self.apply(&key, input, message.sender_name())
    }

    /// `/start`: discard any prior session and show the format menu.
    pub fn on_start(&mut self, key: &SessionKey) -> Option<Reply> {
        self.apply(key, Input::Start, &key.user_id)
    }

    /// Format menu answer. Anything other than "Cancel" is stored as the format.
    pub fn on_format_choice(
        &mut self,
        key: &SessionKey,
        text: &str,
    ) -> Result<Option<Reply>, ConversationError> {
        self.expect_state(key, State::ChoosingFormat)?;
        Ok(self.apply(key, Input::from_text(text), &key.user_id))
    }

    /// Chapter menu answer. Anything other than "Cancel" is stored as the
    /// category without a reply; the session stays in `ChoosingChapter`.
    pub fn on_chapter_choice(
        &mut self,
        key: &SessionKey,
        text: &str,
    ) -> Result<Option<Reply>, ConversationError> {
        self.expect_state(key, State::ChoosingChapter)?;
        Ok(self.apply(key, Input::from_text(text), &key.user_id))
    }

    /// `/done`: send the closing message and clear the session.
    pub fn on_done(&mut self, key: &SessionKey) -> Option<Reply> {
        self.apply(key, Input::Done, &key.user_id)
    }

    /// `/cancel`: send the cancellation message and clear the session.
    pub fn on_cancel_command(&mut self, key: &SessionKey) -> Option<Reply> {
        self.apply(key, Input::CancelCommand, &key.user_id)
    }

    fn expect_state(&self, key: &SessionKey, expected: State) -> Result<(), ConversationError> {
        let actual = self.state(key);
        if actual == expected {
            Ok(())
        } else {
            Err(ConversationError::UnexpectedState { expected, actual })
        }
    }

    fn apply(&mut self, key: &SessionKey, input: Input, user: &str) -> Option<Reply> {
        let current = self.state(key);
        let Transition { action, next } = transition(current, input);

        tracing::debug!(
            session = %key,
            from = %current,
            to = %next,
            action = ?action,
            "Conversation transition"
        );

        match action {
            Action::ShowFormatMenu => {
                self.sessions.insert(key.clone(), Session::started());
                Some(menu::main_menu())
            }
            Action::StoreFormat(format) => {
                tracing::info!(user = %user, format = %format, "User selected format");
                if let Some(session) = self.sessions.get_mut(key) {
                    session.format = Some(format);
                    session.state = next;
                }
                Some(menu::chapter_menu())
            }
            Action::StoreCategory(category) => {
                tracing::info!(user = %user, chapter = %category, "User selected chapter");
                if let Some(session) = self.sessions.get_mut(key) {
                    session.category = Some(category);
                    session.state = next;
                }
                None
            }
            Action::Cancel => {
                tracing::info!(user = %user, "User cancelled the conversation");
                self.sessions.remove(key);
                Some(menu::cancelled())
            }
            Action::Finish => {
                tracing::info!(user = %user, "Conversation finished");
                self.sessions.remove(key);
                Some(menu::farewell())
            }
            Action::Ignore => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ChannelType;
    use proptest::prelude::*;

    fn key() -> SessionKey {
        SessionKey::new("100", "7")
    }

    fn started() -> ConversationController {
        let mut ctl = ConversationController::new();
        ctl.on_start(&key());
        ctl
    }

    fn choosing_chapter(format: &str) -> ConversationController {
        let mut ctl = started();
        ctl.on_format_choice(&key(), format).unwrap();
        ctl
    }

    #[test]
    fn test_start_shows_format_menu() {
        let mut ctl = ConversationController::new();
        let reply = ctl.on_start(&key()).unwrap();

        assert_eq!(ctl.state(&key()), State::ChoosingFormat);
        let labels: Vec<_> = reply.keyboard().unwrap().labels().collect();
        assert_eq!(labels, ["Note", "Audio", "Note & Audio", "Cancel"]);
    }

    #[test]
    fn test_start_resets_prior_session() {
        let mut ctl = choosing_chapter("Audio");
        ctl.on_chapter_choice(&key(), "wait").unwrap();

        ctl.on_start(&key());

        assert_eq!(ctl.session(&key()), Some(&Session::started()));
    }

    #[test]
    fn test_format_choice_moves_to_chapter_menu() {
        let mut ctl = started();
        let reply = ctl.on_format_choice(&key(), "Note").unwrap().unwrap();

        assert_eq!(reply, menu::chapter_menu());
        let session = ctl.session(&key()).unwrap();
        assert_eq!(session.state, State::ChoosingChapter);
        assert_eq!(session.format.as_deref(), Some("Note"));
        assert!(session.category.is_none());
    }

    #[test]
    fn test_format_cancel_clears_session() {
        let mut ctl = started();
        let reply = ctl.on_format_choice(&key(), "Cancel").unwrap().unwrap();

        assert!(reply.removes_keyboard());
        assert_eq!(ctl.state(&key()), State::Idle);
        assert!(ctl.session(&key()).is_none());
    }

    #[test]
    fn test_chapter_cancel_clears_session() {
        let mut ctl = choosing_chapter("Audio");
        let reply = ctl.on_chapter_choice(&key(), "Cancel").unwrap().unwrap();

        assert_eq!(reply, menu::cancelled());
        assert_eq!(ctl.state(&key()), State::Idle);
        assert!(ctl.session(&key()).is_none());
    }

    #[test]
    fn test_chapter_choice_is_silent_and_stays() {
        let mut ctl = choosing_chapter("Note & Audio");
        let reply = ctl.on_chapter_choice(&key(), "progress").unwrap();

        assert!(reply.is_none());
        let session = ctl.session(&key()).unwrap();
        assert_eq!(session.state, State::ChoosingChapter);
        assert_eq!(session.category.as_deref(), Some("progress"));
        assert_eq!(session.format.as_deref(), Some("Note & Audio"));
    }

    #[test]
    fn test_done_clears_everything() {
        let mut ctl = choosing_chapter("Note");
        ctl.on_chapter_choice(&key(), "wait").unwrap();

        let reply = ctl.on_done(&key()).unwrap();

        assert_eq!(reply, menu::farewell());
        assert_eq!(ctl.state(&key()), State::Idle);
        assert!(ctl.session(&key()).is_none());
        assert_eq!(ctl.active_sessions(), 0);
    }

    #[test]
    fn test_cancel_command_from_any_state() {
        let mut idle = ConversationController::new();
        assert_eq!(idle.on_cancel_command(&key()), Some(menu::cancelled()));
        assert_eq!(idle.state(&key()), State::Idle);

        let mut format = started();
        assert_eq!(format.on_cancel_command(&key()), Some(menu::cancelled()));
        assert!(format.session(&key()).is_none());

        let mut chapter = choosing_chapter("Audio");
        assert_eq!(chapter.on_cancel_command(&key()), Some(menu::cancelled()));
        assert!(chapter.session(&key()).is_none());
    }

    #[test]
    fn test_state_specific_entry_points_reject_wrong_state() {
        let mut ctl = ConversationController::new();
        assert_eq!(
            ctl.on_format_choice(&key(), "Note"),
            Err(ConversationError::UnexpectedState {
                expected: State::ChoosingFormat,
                actual: State::Idle,
            })
        );

        let mut ctl = started();
        assert_eq!(
            ctl.on_chapter_choice(&key(), "wait"),
            Err(ConversationError::UnexpectedState {
                expected: State::ChoosingChapter,
                actual: State::ChoosingFormat,
            })
        );
        assert_eq!(ctl.state(&key()), State::ChoosingFormat);
    }

    #[test]
    fn test_sessions_are_isolated_per_user() {
        let mut ctl = ConversationController::new();
        let alice = SessionKey::new("100", "1");
        let bob = SessionKey::new("100", "2");

        ctl.on_start(&alice);
        ctl.on_start(&bob);
        ctl.on_format_choice(&alice, "Audio").unwrap();
        ctl.on_cancel_command(&bob);

        assert_eq!(ctl.state(&alice), State::ChoosingChapter);
        assert_eq!(ctl.state(&bob), State::Idle);
        assert_eq!(ctl.active_sessions(), 1);
    }

    #[test]
    fn test_handle_scenario() {
        let mut ctl = ConversationController::new();
        let msg = |text: &str| ChannelMessage::text(ChannelType::Telegram, "100", "7", text);

        let reply = ctl.handle(&msg("/start")).unwrap();
        assert_eq!(reply, menu::main_menu());
        assert_eq!(ctl.state(&key()), State::ChoosingFormat);

        let reply = ctl.handle(&msg("Note")).unwrap();
        assert_eq!(reply, menu::chapter_menu());
        assert_eq!(ctl.state(&key()), State::ChoosingChapter);
        assert_eq!(ctl.session(&key()).unwrap().format.as_deref(), Some("Note"));

        assert!(ctl.handle(&msg("wait")).is_none());
        assert_eq!(ctl.state(&key()), State::ChoosingChapter);
        assert_eq!(ctl.session(&key()).unwrap().category.as_deref(), Some("wait"));
    }

    #[test]
    fn test_handle_ignores_text_and_unknown_commands() {
        let mut ctl = ConversationController::new();
        let msg = |text: &str| ChannelMessage::text(ChannelType::Telegram, "100", "7", text);

        assert!(ctl.handle(&msg("Note")).is_none());
        assert!(ctl.handle(&msg("Cancel")).is_none());
        assert_eq!(ctl.active_sessions(), 0);

        ctl.handle(&msg("/start"));
        assert!(ctl.handle(&msg("/help")).is_none());
        assert_eq!(ctl.state(&key()), State::ChoosingFormat);
    }

    proptest! {
        #[test]
        fn prop_any_non_cancel_format_is_stored(text in "\\PC{1,40}") {
            prop_assume!(text != menu::CANCEL);
            let mut ctl = started();
            let reply = ctl.on_format_choice(&key(), &text).unwrap();

            prop_assert_eq!(reply, Some(menu::chapter_menu()));
            let session = ctl.session(&key()).unwrap();
            prop_assert_eq!(session.state, State::ChoosingChapter);
            prop_assert_eq!(session.format.as_deref(), Some(text.as_str()));
        }

        #[test]
        fn prop_any_non_cancel_chapter_is_stored_silently(text in "\\PC{1,40}") {
            prop_assume!(text != menu::CANCEL);
            let mut ctl = choosing_chapter("Audio");
            let reply = ctl.on_chapter_choice(&key(), &text).unwrap();

            prop_assert!(reply.is_none());
            let session = ctl.session(&key()).unwrap();
            prop_assert_eq!(session.state, State::ChoosingChapter);
            prop_assert_eq!(session.category.as_deref(), Some(text.as_str()));
        }

        #[test]
        fn prop_done_always_clears(format in "\\PC{1,20}", chapter in "\\PC{1,20}") {
            prop_assume!(format != menu::CANCEL && chapter != menu::CANCEL);
            let mut ctl = choosing_chapter(&format);
            ctl.on_chapter_choice(&key(), &chapter).unwrap();

            prop_assert!(ctl.on_done(&key()).is_some());
            prop_assert!(ctl.session(&key()).is_none());
            prop_assert_eq!(ctl.state(&key()), State::Idle);
        }
    }
}
