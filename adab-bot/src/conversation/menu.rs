//! Menu keyboards and the fixed reply texts.

use crate::message::{
    ChannelMessage, OutgoingContent, OutgoingMessage, ReplyKeyboard, ReplyMarkup,
};

/// Label of the cancel button on every menu.
pub const CANCEL: &str = "Cancel";

/// Response formats offered by the main menu.
pub const FORMATS: [&str; 3] = ["Note", "Audio", "Note & Audio"];

const SALAAM: &str = "اَلسَلامُ عَلَيْكُم وَرَحْمَةُ اَللهِ وَبَرَكاتُهُ";

/// A reply produced by the conversation controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub markup: Option<ReplyMarkup>,
}

impl Reply {
    /// The keyboard shown with this reply, if any.
    pub fn keyboard(&self) -> Option<&ReplyKeyboard> {
        match &self.markup {
            Some(ReplyMarkup::Keyboard(kb)) => Some(kb),
            _ => None,
        }
    }

    pub fn removes_keyboard(&self) -> bool {
        matches!(self.markup, Some(ReplyMarkup::Remove))
    }

    /// Address this reply to the chat the message came from.
    pub fn into_outgoing(self, to: &ChannelMessage) -> OutgoingMessage {
        OutgoingMessage {
            channel_type: to.channel_type,
            channel_id: to.channel_id.clone(),
            reply_to: Some(to.id.clone()),
            content: OutgoingContent::Text { text: self.text },
            markup: self.markup,
        }
    }
}

/// Format menu: `[["Note","Audio"],["Note & Audio"],["Cancel"]]`.
pub fn format_keyboard() -> ReplyKeyboard {
    ReplyKeyboard::new([vec![FORMATS[0], FORMATS[1]], vec![FORMATS[2]], vec![CANCEL]])
        .one_time()
        .with_placeholder("Choose a format...")
}

/// Chapter menu. The labels are placeholders until chapter content exists.
pub fn chapter_keyboard() -> ReplyKeyboard {
    ReplyKeyboard::new([
        vec!["wait", "for", "now"],
        vec!["work", "in", "progress"],
        vec![CANCEL],
    ])
    .resized()
    .one_time()
    .with_placeholder("Choose an option...")
}

/// Greeting shown on `/start`.
pub fn main_menu() -> Reply {
    Reply {
        text: format!(
            "\n {SALAAM}\n\
             Hi! I am Adabul-Mufrad Bot. \n\
             I am here to provide you with notes and audios from Adabul-Mufrad class based the chapter you have selected. \n\
             Please select the format you want to receive as your response. \n\
             Click on Cancel to stop talking to me.\n\n"
        ),
        markup: Some(ReplyMarkup::Keyboard(format_keyboard())),
    }
}

pub fn chapter_menu() -> Reply {
    Reply {
        text: "Please choose from the following chapters:".to_string(),
        markup: Some(ReplyMarkup::Keyboard(chapter_keyboard())),
    }
}

pub fn cancelled() -> Reply {
    Reply {
        text: format!(
            "You cancelled the conversation \n\
             Bye! I hope I can still be of help again some day. \n\
             \x20                    {SALAAM}"
        ),
        markup: Some(ReplyMarkup::Remove),
    }
}

pub fn farewell() -> Reply {
    Reply {
        text: format!(
            "\n {SALAAM} I hope I have been of help to you \n Until next time!"
        ),
        markup: Some(ReplyMarkup::Remove),
    }
}
