//! Request types for the API methods a bot uses most.

use serde::{Deserialize, Serialize};

use super::ApiRequest;
use crate::types::{Message, ReplyMarkup};

/// Target chat: numeric identifier or `@channelusername`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(username: &str) -> Self {
        Self::Username(username.to_string())
    }
}

impl From<String> for ChatId {
    fn from(username: String) -> Self {
        Self::Username(username)
    }
}

/// Text formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    MarkdownV2,
    Markdown,
    #[serde(rename = "HTML")]
    Html,
}

// ============================================================================
// sendMessage
// ============================================================================

/// Sends a text message.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessage {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendMessage {
    pub fn new(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            parse_mode: None,
            disable_notification: None,
            reply_to_message_id: None,
            reply_markup: None,
        }
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn silent(mut self) -> Self {
        self.disable_notification = Some(true);
        self
    }

    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }

    pub fn reply_markup(mut self, markup: impl Into<ReplyMarkup>) -> Self {
        self.reply_markup = Some(markup.into());
        self
    }
}

impl ApiRequest for SendMessage {
    type Response = Message;
    const METHOD: &'static str = "sendMessage";
}

// ============================================================================
// answerCallbackQuery
// ============================================================================

/// Answers a callback query sent from an inline keyboard.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_alert: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_time: Option<u32>,
}

impl AnswerCallbackQuery {
    pub fn new(callback_query_id: impl Into<String>) -> Self {
        Self {
            callback_query_id: callback_query_id.into(),
            text: None,
            show_alert: None,
            url: None,
            cache_time: None,
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Shows the text as an alert instead of a notification.
    pub fn alert(mut self) -> Self {
        self.show_alert = Some(true);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn cache_time(mut self, seconds: u32) -> Self {
        self.cache_time = Some(seconds);
        self
    }
}

impl ApiRequest for AnswerCallbackQuery {
    type Response = bool;
    const METHOD: &'static str = "answerCallbackQuery";
}

// ============================================================================
// editMessageText
// ============================================================================

/// Result of an edit: the edited message, or `true` for inline messages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EditedMessage {
    Message(Box<Message>),
    Inline(bool),
}

/// Edits the text of a message sent by the bot.
#[derive(Debug, Clone, Serialize)]
pub struct EditMessageText {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<ChatId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl EditMessageText {
    /// Edits a message in a chat.
    pub fn new(chat_id: impl Into<ChatId>, message_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id: Some(chat_id.into()),
            message_id: Some(message_id),
            inline_message_id: None,
            text: text.into(),
            parse_mode: None,
            reply_markup: None,
        }
    }

    /// Edits a message sent via inline mode.
    pub fn inline(inline_message_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: None,
            message_id: None,
            inline_message_id: Some(inline_message_id.into()),
            text: text.into(),
            parse_mode: None,
            reply_markup: None,
        }
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn reply_markup(mut self, markup: impl Into<ReplyMarkup>) -> Self {
        self.reply_markup = Some(markup.into());
        self
    }
}

impl ApiRequest for EditMessageText {
    type Response = EditedMessage;
    const METHOD: &'static str = "editMessageText";
}

// ============================================================================
// deleteMessage
// ============================================================================

/// Deletes a message.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteMessage {
    pub chat_id: ChatId,
    pub message_id: i64,
}

impl DeleteMessage {
    pub fn new(chat_id: impl Into<ChatId>, message_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id,
        }
    }
}

impl ApiRequest for DeleteMessage {
    type Response = bool;
    const METHOD: &'static str = "deleteMessage";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InlineKeyboardButton, InlineKeyboardMarkup};
    use serde_json::json;

    #[test]
    fn test_send_message_skips_unset_fields() {
        let request = SendMessage::new(42, "hello").parse_mode(ParseMode::Html);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "chat_id": 42, "text": "hello", "parse_mode": "HTML" })
        );
    }

    #[test]
    fn test_send_message_with_keyboard() {
        let keyboard =
            InlineKeyboardMarkup::single_button(InlineKeyboardButton::callback_data("Go", "go"))
                .unwrap();
        let request = SendMessage::new("@channel", "pick").silent().reply_markup(keyboard);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "chat_id": "@channel",
                "text": "pick",
                "disable_notification": true,
                "reply_markup": {
                    "inline_keyboard": [[{ "text": "Go", "callback_data": "go" }]]
                }
            })
        );
    }

    #[test]
    fn test_edited_message_response_shapes() {
        let inline: EditedMessage = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(inline, EditedMessage::Inline(true));

        let edited: EditedMessage = serde_json::from_value(json!({
            "message_id": 1,
            "date": 0,
            "chat": { "id": 5, "type": "private" },
            "text": "edited"
        }))
        .unwrap();
        assert!(matches!(edited, EditedMessage::Message(m) if m.text.as_deref() == Some("edited")));
    }

    #[test]
    fn test_method_names() {
        assert_eq!(SendMessage::METHOD, "sendMessage");
        assert_eq!(AnswerCallbackQuery::METHOD, "answerCallbackQuery");
        assert_eq!(EditMessageText::METHOD, "editMessageText");
        assert_eq!(DeleteMessage::METHOD, "deleteMessage");
    }
}
