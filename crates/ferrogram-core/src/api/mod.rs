//! Typed outbound API calls.
//!
//! Every request type implements [`ApiRequest`], which names the API method
//! and the shape of its result. Requests are executed through
//! [`BotExt::execute`](crate::bot::BotExt::execute).

pub mod methods;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

pub use methods::{
    AnswerCallbackQuery, ChatId, DeleteMessage, EditMessageText, EditedMessage, ParseMode,
    SendMessage,
};

/// An outbound API call with a typed result.
pub trait ApiRequest: Serialize + Send + Sync {
    /// The type of the `result` field of a successful response.
    type Response: DeserializeOwned + Send;

    /// The API method name, e.g. `sendMessage`.
    const METHOD: &'static str;
}

/// The response envelope returned by every API method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub ok: bool,
    /// The result on success.
    pub result: Option<T>,
    /// Human-readable description, set on failure.
    #[serde(default)]
    pub description: Option<String>,
    /// Error code, set on failure.
    #[serde(default)]
    pub error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    /// Checks if the API call was successful.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Converts the envelope into a Result.
    pub fn into_result(self) -> ApiResult<T> {
        if !self.ok {
            return Err(ApiError::Api {
                code: self.error_code.unwrap_or_default(),
                description: self
                    .description
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        self.result
            .ok_or_else(|| ApiError::Serialization("No result in response".to_string()))
    }

    /// Calls `on_ok` with the result or `on_err` with the failure.
    pub fn fold<R>(self, on_ok: impl FnOnce(T) -> R, on_err: impl FnOnce(ApiError) -> R) -> R {
        match self.into_result() {
            Ok(result) => on_ok(result),
            Err(err) => on_err(err),
        }
    }
}
