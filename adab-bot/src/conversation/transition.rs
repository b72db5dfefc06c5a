//! Pure state transition table.
//!
//! `transition` maps `(State, Input)` to the action to perform and the next
//! state. It has no side effects; the controller applies the action.

use super::menu::CANCEL;
use super::state::State;
use crate::message::ChannelMessage;

/// Input alphabet, classified from an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// `/start`
    Start,
    /// `/cancel`
    CancelCommand,
    /// `/done`
    Done,
    /// The "Cancel" keyboard button
    Cancel,
    /// Any other text
    Choice(String),
    /// A command this bot does not know
    Ignored,
}

impl Input {
    /// Classify an inbound message.
    pub fn classify(message: &ChannelMessage) -> Self {
        match message.command() {
            Some("start") => Self::Start,
            Some("cancel") => Self::CancelCommand,
            Some("done") => Self::Done,
            Some(_) => Self::Ignored,
            None => Self::from_text(message.text_content()),
        }
    }

    /// Classify menu text. Commands are not recognised here.
    pub fn from_text(text: &str) -> Self {
        if text == CANCEL {
            Self::Cancel
        } else {
            Self::Choice(text.to_string())
        }
    }
}

/// What the controller does for a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Reset the session and show the format menu
    ShowFormatMenu,
    /// Record the format and show the chapter menu
    StoreFormat(String),
    /// Record the chapter; nothing is sent
    StoreCategory(String),
    /// Clear the session and say goodbye after a cancellation
    Cancel,
    /// Clear the session and send the closing message
    Finish,
    /// Nothing happens
    Ignore,
}

/// Result of a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub action: Action,
    pub next: State,
}

impl Transition {
    const fn new(action: Action, next: State) -> Self {
        Self { action, next }
    }
}

/// Transition table.
pub fn transition(state: State, input: Input) -> Transition {
    match (state, input) {
        // Commands work from every state
        (_, Input::Start) => Transition::new(Action::ShowFormatMenu, State::ChoosingFormat),
        (_, Input::CancelCommand) => Transition::new(Action::Cancel, State::Idle),
        (_, Input::Done) => Transition::new(Action::Finish, State::Idle),

        (State::ChoosingFormat, Input::Cancel) => Transition::new(Action::Cancel, State::Idle),
        (State::ChoosingFormat, Input::Choice(text)) => {
            Transition::new(Action::StoreFormat(text), State::ChoosingChapter)
        }

        (State::ChoosingChapter, Input::Cancel) => Transition::new(Action::Cancel, State::Idle),
        // No reply and no exit: the chapter menu has no backing content yet.
        (State::ChoosingChapter, Input::Choice(text)) => {
            Transition::new(Action::StoreCategory(text), State::ChoosingChapter)
        }

        // No conversation in progress
        (State::Idle, Input::Cancel | Input::Choice(_)) => {
            Transition::new(Action::Ignore, State::Idle)
        }

        (state, Input::Ignored) => Transition::new(Action::Ignore, state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ChannelType;

    const ALL_STATES: [State; 3] = [State::Idle, State::ChoosingFormat, State::ChoosingChapter];

    fn classify(text: &str) -> Input {
        Input::classify(&ChannelMessage::text(ChannelType::Cli, "c", "u", text))
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("/start"), Input::Start);
        assert_eq!(classify("/cancel"), Input::CancelCommand);
        assert_eq!(classify("/done@AdabBot"), Input::Done);
        assert_eq!(classify("/help"), Input::Ignored);
        assert_eq!(classify("Cancel"), Input::Cancel);
        assert_eq!(classify("cancel"), Input::Choice("cancel".into()));
        assert_eq!(classify("Note & Audio"), Input::Choice("Note & Audio".into()));
    }

    #[test]
    fn test_commands_from_every_state() {
        for state in ALL_STATES {
            assert_eq!(
                transition(state, Input::Start),
                Transition::new(Action::ShowFormatMenu, State::ChoosingFormat)
            );
            assert_eq!(
                transition(state, Input::CancelCommand),
                Transition::new(Action::Cancel, State::Idle)
            );
            assert_eq!(
                transition(state, Input::Done),
                Transition::new(Action::Finish, State::Idle)
            );
            assert_eq!(
                transition(state, Input::Ignored),
                Transition::new(Action::Ignore, state)
            );
        }
    }

    #[test]
    fn test_format_choice() {
        assert_eq!(
            transition(State::ChoosingFormat, Input::Choice("Audio".into())),
            Transition::new(Action::StoreFormat("Audio".into()), State::ChoosingChapter)
        );
        assert_eq!(
            transition(State::ChoosingFormat, Input::Cancel),
            Transition::new(Action::Cancel, State::Idle)
        );
    }

    #[test]
    fn test_chapter_choice_self_loops() {
        assert_eq!(
            transition(State::ChoosingChapter, Input::Choice("wait".into())),
            Transition::new(Action::StoreCategory("wait".into()), State::ChoosingChapter)
        );
        assert_eq!(
            transition(State::ChoosingChapter, Input::Cancel),
            Transition::new(Action::Cancel, State::Idle)
        );
    }

    #[test]
    fn test_text_while_idle_is_ignored() {
        assert_eq!(
            transition(State::Idle, Input::Choice("Note".into())),
            Transition::new(Action::Ignore, State::Idle)
        );
        assert_eq!(
            transition(State::Idle, Input::Cancel),
            Transition::new(Action::Ignore, State::Idle)
        );
    }
}
