//! Keyboard markup builders.
//!
//! Inline keyboards are validated on construction so an invalid layout never
//! reaches the API:
//!
//! ```rust,ignore
//! use ferrogram_core::{InlineKeyboardButton, InlineKeyboardMarkup};
//!
//! let markup = InlineKeyboardMarkup::single_row(vec![
//!     InlineKeyboardButton::callback_data("Yes", "vote:yes"),
//!     InlineKeyboardButton::callback_data("No", "vote:no"),
//! ])?;
//! ```

use std::fmt;

use serde::Serialize;

use crate::error::{KeyboardError, KeyboardResult};

/// Placeholder payload for a game button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CallbackGame {}

/// What pressing an inline button does.
///
/// Serialized flat into the button object, e.g. `"callback_data": "x"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonKind {
    /// Opens an HTTP or `tg://` URL.
    Url(String),
    /// Sends a callback query with this data.
    CallbackData(String),
    /// Prompts the user to pick a chat and inserts an inline query.
    SwitchInlineQuery(String),
    /// Inserts an inline query into the current chat.
    SwitchInlineQueryCurrentChat(String),
    /// Launches the game attached to the message.
    CallbackGame(CallbackGame),
    /// Pay button, only valid as the first button of an invoice keyboard.
    Pay(bool),
}

/// A single inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    /// Label text.
    pub text: String,
    #[serde(flatten)]
    pub kind: ButtonKind,
}

impl InlineKeyboardButton {
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(text, ButtonKind::Url(url.into()))
    }

    pub fn callback_data(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(text, ButtonKind::CallbackData(data.into()))
    }

    pub fn switch_inline_query(text: impl Into<String>, query: impl Into<String>) -> Self {
        Self::new(text, ButtonKind::SwitchInlineQuery(query.into()))
    }

    pub fn switch_inline_query_current_chat(
        text: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self::new(text, ButtonKind::SwitchInlineQueryCurrentChat(query.into()))
    }

    pub fn callback_game(text: impl Into<String>) -> Self {
        Self::new(text, ButtonKind::CallbackGame(CallbackGame {}))
    }

    pub fn pay(text: impl Into<String>) -> Self {
        Self::new(text, ButtonKind::Pay(true))
    }

    fn new(text: impl Into<String>, kind: ButtonKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    /// Returns `true` for pay buttons.
    pub fn is_pay(&self) -> bool {
        matches!(self.kind, ButtonKind::Pay(_))
    }
}

/// An inline keyboard shown right below the message it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// Creates a keyboard from rows of buttons.
    ///
    /// Fails if there is more than one pay button, or if a pay button is not
    /// the very first button.
    pub fn create(rows: Vec<Vec<InlineKeyboardButton>>) -> KeyboardResult<Self> {
        let mut buttons = rows.iter().flatten();
        let first_is_pay = buttons.next().is_some_and(InlineKeyboardButton::is_pay);
        let pay_count = rows.iter().flatten().filter(|b| b.is_pay()).count();

        match pay_count {
            0 => {}
            1 if first_is_pay => {}
            1 => return Err(KeyboardError::PayButtonNotFirst),
            _ => return Err(KeyboardError::MultiplePayButtons),
        }

        Ok(Self {
            inline_keyboard: rows,
        })
    }

    /// A keyboard with exactly one button.
    pub fn single_button(button: InlineKeyboardButton) -> KeyboardResult<Self> {
        Self::create(vec![vec![button]])
    }

    /// A keyboard with one row.
    pub fn single_row(buttons: Vec<InlineKeyboardButton>) -> KeyboardResult<Self> {
        Self::create(vec![buttons])
    }

    /// A keyboard with one button per row.
    pub fn single_column(buttons: Vec<InlineKeyboardButton>) -> KeyboardResult<Self> {
        Self::create(buttons.into_iter().map(|b| vec![b]).collect())
    }

    /// Returns the button rows.
    pub fn rows(&self) -> &[Vec<InlineKeyboardButton>] {
        &self.inline_keyboard
    }
}

impl fmt::Display for InlineKeyboardMarkup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Requests the client to hide the custom reply keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboardRemove {
    remove_keyboard: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selective: Option<bool>,
}

impl Default for ReplyKeyboardRemove {
    fn default() -> Self {
        Self {
            remove_keyboard: true,
            selective: None,
        }
    }
}

/// Markup that can be attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    InlineKeyboard(InlineKeyboardMarkup),
    RemoveKeyboard(ReplyKeyboardRemove),
}

impl From<InlineKeyboardMarkup> for ReplyMarkup {
    fn from(markup: InlineKeyboardMarkup) -> Self {
        Self::InlineKeyboard(markup)
    }
}

impl From<ReplyKeyboardRemove> for ReplyMarkup {
    fn from(remove: ReplyKeyboardRemove) -> Self {
        Self::RemoveKeyboard(remove)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_button_wire_shape() {
        let markup = InlineKeyboardMarkup::single_row(vec![
            InlineKeyboardButton::callback_data("Yes", "vote:yes"),
            InlineKeyboardButton::url("Docs", "https://core.telegram.org/bots/api"),
        ])
        .unwrap();

        assert_eq!(
            serde_json::to_value(&markup).unwrap(),
            json!({
                "inline_keyboard": [[
                    { "text": "Yes", "callback_data": "vote:yes" },
                    { "text": "Docs", "url": "https://core.telegram.org/bots/api" }
                ]]
            })
        );
    }

    #[test]
    fn test_pay_button_must_be_first() {
        let err = InlineKeyboardMarkup::single_row(vec![
            InlineKeyboardButton::callback_data("Info", "info"),
            InlineKeyboardButton::pay("Pay"),
        ])
        .unwrap_err();
        assert_eq!(err, KeyboardError::PayButtonNotFirst);

        let ok = InlineKeyboardMarkup::create(vec![
            vec![InlineKeyboardButton::pay("Pay 5 EUR")],
            vec![InlineKeyboardButton::callback_data("Cancel", "cancel")],
        ]);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_multiple_pay_buttons_rejected() {
        let err = InlineKeyboardMarkup::single_column(vec![
            InlineKeyboardButton::pay("Pay"),
            InlineKeyboardButton::pay("Pay again"),
        ])
        .unwrap_err();
        assert_eq!(err, KeyboardError::MultiplePayButtons);
    }

    #[test]
    fn test_single_column_layout() {
        let markup = InlineKeyboardMarkup::single_column(vec![
            InlineKeyboardButton::callback_data("A", "a"),
            InlineKeyboardButton::callback_data("B", "b"),
        ])
        .unwrap();
        assert_eq!(markup.rows().len(), 2);
        assert!(markup.rows().iter().all(|row| row.len() == 1));
    }

    #[test]
    fn test_display_and_remove_markup() {
        let markup =
            InlineKeyboardMarkup::single_button(InlineKeyboardButton::pay("Pay")).unwrap();
        assert_eq!(
            markup.to_string(),
            r#"{"inline_keyboard":[[{"text":"Pay","pay":true}]]}"#
        );

        let remove: ReplyMarkup = ReplyKeyboardRemove::default().into();
        assert_eq!(
            serde_json::to_value(remove).unwrap(),
            json!({ "remove_keyboard": true })
        );
    }
}
