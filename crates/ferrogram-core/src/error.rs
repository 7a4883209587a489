//! Unified error types for the Ferrogram core.
//!
//! Dispatch-level errors (handler failures, timeouts) live in
//! `ferrogram-framework`.

use thiserror::Error;

// =============================================================================
// Platform Errors
// =============================================================================

/// An error reported by the update source instead of an update.
///
/// Producers push these into the event queue; the dispatcher routes them to
/// every registered error handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelegramError {
    /// The platform answered a request with `ok: false`.
    #[error("API error ({code}): {description}")]
    Api {
        /// Error code returned by the platform.
        code: i64,
        /// Human-readable description.
        description: String,
    },

    /// The HTTP exchange failed with a non-success status.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body, if any.
        body: String,
    },

    /// The connection to the platform failed.
    #[error("network error: {0}")]
    Network(String),

    /// A payload could not be decoded into an update.
    #[error("failed to decode update: {0}")]
    Decode(String),
}

impl TelegramError {
    /// Creates a network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Creates a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for outbound API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The bot has no usable connection.
    #[error("bot is not connected")]
    NotConnected,
    /// The API call timed out.
    #[error("API call timed out")]
    Timeout,
    /// The API returned an error envelope.
    #[error("API error ({code}): {description}")]
    Api { code: i64, description: String },
    /// Failed to serialize/deserialize.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The transport failed before a response was received.
    #[error("transport error: {0}")]
    Transport(String),
    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<ApiError> for TelegramError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Api { code, description } => Self::Api { code, description },
            ApiError::Serialization(reason) => Self::Decode(reason),
            other => Self::Network(other.to_string()),
        }
    }
}

// =============================================================================
// Markup Errors
// =============================================================================

/// Errors raised while building keyboard markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyboardError {
    /// More than one pay button was placed on a single keyboard.
    #[error("can't have more than one pay button per inline keyboard")]
    MultiplePayButtons,

    /// A pay button was placed anywhere but the first slot.
    #[error("pay buttons must always be the first button in the first row")]
    PayButtonNotFirst,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for markup construction.
pub type KeyboardResult<T> = Result<T, KeyboardError>;
