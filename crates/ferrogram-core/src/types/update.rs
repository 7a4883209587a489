//! Inbound update types.
//!
//! These mirror the subset of the Bot API update object that handlers route
//! on. Unknown fields are ignored on deserialization.

use serde::{Deserialize, Serialize};

/// A Telegram user or bot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: i64,
    /// Whether this user is a bot.
    #[serde(default)]
    pub is_bot: bool,
    /// First name.
    pub first_name: String,
    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Username without the leading `@`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// IETF language tag of the user's client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

/// Kind of chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    #[default]
    Private,
    Group,
    Supergroup,
    Channel,
}

/// A chat.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Chat {
    /// Unique identifier.
    pub id: i64,
    /// Chat kind.
    #[serde(rename = "type")]
    pub kind: ChatType,
    /// Title, for groups and channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Username, for private chats and public channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// A message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// Identifier unique inside the chat.
    pub message_id: i64,
    /// Unix time the message was sent.
    pub date: i64,
    /// The chat the message belongs to.
    pub chat: Chat,
    /// Sender, empty for channel posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    /// UTF-8 text of a text message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Caption of a media message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// An incoming callback query from an inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallbackQuery {
    /// Unique query identifier, needed to answer the query.
    pub id: String,
    /// Sender.
    pub from: User,
    /// The message the button was attached to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// Global identifier of the chat the message was sent to.
    #[serde(default)]
    pub chat_instance: String,
    /// Data associated with the button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// An incoming update.
///
/// At most one of the optional payloads is present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Update {
    /// Monotonic update identifier.
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// Creates an update carrying a plain text message.
    ///
    /// Mostly useful for tests and local producers.
    pub fn text_message(update_id: i64, chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            update_id,
            message: Some(Message {
                message_id: update_id,
                chat: Chat {
                    id: chat_id,
                    ..Default::default()
                },
                text: Some(text.into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Returns the first message-like payload of this update.
    pub fn any_message(&self) -> Option<&Message> {
        self.message
            .as_ref()
            .or(self.edited_message.as_ref())
            .or(self.channel_post.as_ref())
    }

    /// Returns the text of the new message, if this update carries one.
    pub fn text(&self) -> Option<&str> {
        self.message.as_ref()?.text.as_deref()
    }

    /// Returns the bot command of the new message, without the leading `/`
    /// and without an `@botname` suffix.
    ///
    /// `"/start@my_bot payload"` yields `Some("start")`.
    pub fn command(&self) -> Option<&str> {
        let head = self.text()?.split_whitespace().next()?;
        let name = head.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        (!name.is_empty()).then_some(name)
    }

    /// Returns the whitespace separated arguments following the command.
    pub fn command_args(&self) -> Vec<&str> {
        match self.command() {
            Some(_) => self
                .text()
                .map(|t| t.split_whitespace().skip(1).collect())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Returns the chat this update belongs to.
    pub fn chat_id(&self) -> Option<i64> {
        self.any_message()
            .or_else(|| self.callback_query.as_ref()?.message.as_ref())
            .map(|m| m.chat.id)
    }

    /// Returns the data of the callback query, if any.
    pub fn callback_data(&self) -> Option<&str> {
        self.callback_query.as_ref()?.data.as_deref()
    }
}
