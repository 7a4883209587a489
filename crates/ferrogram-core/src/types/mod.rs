//! Platform data types.

pub mod keyboard;
pub mod update;

pub use keyboard::{
    ButtonKind, CallbackGame, InlineKeyboardButton, InlineKeyboardMarkup, ReplyKeyboardRemove,
    ReplyMarkup,
};
pub use update::{CallbackQuery, Chat, ChatType, Message, Update, User};
