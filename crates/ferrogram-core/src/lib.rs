//! # Ferrogram Core
//!
//! Core types of the Ferrogram bot client.
//!
//! This crate defines the data the dispatcher moves around and the outbound
//! surface handlers talk to:
//!
//! - **Updates**: inbound events ([`Update`], [`Message`], [`CallbackQuery`])
//! - **Errors**: platform errors pushed by the update source ([`TelegramError`])
//!   and outbound call failures ([`ApiError`])
//! - **Bot**: the injected outbound handle ([`Bot`], [`BotExt`])
//! - **API requests**: typed request builders ([`SendMessage`], ...)
//! - **Markup**: validated inline keyboards ([`InlineKeyboardMarkup`])
//!
//! Network transport is not part of this crate; a [`Bot`] implementation
//! decides how calls reach the platform.

pub mod api;
pub mod bot;
pub mod error;
pub mod types;

pub use api::{
    AnswerCallbackQuery, ApiRequest, ApiResponse, ChatId, DeleteMessage, EditMessageText,
    EditedMessage, ParseMode, SendMessage,
};
pub use bot::{Bot, BotExt, BoxedBot};
pub use error::{ApiError, ApiResult, KeyboardError, KeyboardResult, TelegramError};
pub use types::{
    ButtonKind, CallbackGame, CallbackQuery, Chat, ChatType, InlineKeyboardButton,
    InlineKeyboardMarkup, Message, ReplyKeyboardRemove, ReplyMarkup, Update, User,
};
