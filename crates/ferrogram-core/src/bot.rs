//! Bot trait and related types.
//!
//! A [`Bot`] is the outbound side of the client: handlers receive a shared
//! handle and use it to issue API calls. How a call reaches the platform
//! (HTTP client, test double, proxy) is up to the implementation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{AnswerCallbackQuery, ApiRequest, ApiResponse, ChatId, SendMessage};
use crate::error::ApiResult;
use crate::types::Message;

/// The core Bot trait.
///
/// Implementations perform one raw API call and return the response
/// envelope (`{"ok": .., "result": ..}`) as JSON.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Returns an identifier for this bot, used in logs.
    fn id(&self) -> &str;

    /// Calls an API method with JSON parameters and returns the raw envelope.
    async fn call_api(&self, method: &str, params: Value) -> ApiResult<Value>;
}

/// A shared, type-erased bot handle.
pub type BoxedBot = Arc<dyn Bot>;

/// Typed helpers on top of [`Bot::call_api`].
#[async_trait]
pub trait BotExt: Bot {
    /// Executes a typed request and decodes its result.
    async fn execute<R>(&self, request: &R) -> ApiResult<R::Response>
    where
        R: ApiRequest;

    /// Sends a plain text message.
    async fn send_message(&self, chat_id: ChatId, text: String) -> ApiResult<Message> {
        self.execute(&SendMessage::new(chat_id, text)).await
    }

    /// Acknowledges a callback query without showing anything.
    async fn answer_callback_query(&self, callback_query_id: String) -> ApiResult<bool> {
        self.execute(&AnswerCallbackQuery::new(callback_query_id))
            .await
    }
}

#[async_trait]
impl<B> BotExt for B
where
    B: Bot + ?Sized,
{
    async fn execute<R>(&self, request: &R) -> ApiResult<R::Response>
    where
        R: ApiRequest,
    {
        let params = serde_json::to_value(request)?;
        let raw = self.call_api(R::METHOD, params).await?;
        let envelope: ApiResponse<R::Response> = serde_json::from_value(raw)?;
        envelope.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use serde_json::json;
    use std::sync::Mutex;

    struct EchoBot {
        calls: Mutex<Vec<(String, Value)>>,
        reply: Value,
    }

    #[async_trait]
    impl Bot for EchoBot {
        fn id(&self) -> &str {
            "echo-bot"
        }

        async fn call_api(&self, method: &str, params: Value) -> ApiResult<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_execute_decodes_result() {
        let bot = EchoBot {
            calls: Mutex::default(),
            reply: json!({
                "ok": true,
                "result": {
                    "message_id": 7,
                    "date": 0,
                    "chat": { "id": 42, "type": "private" },
                    "text": "hi"
                }
            }),
        };

        let message = bot.send_message(ChatId::Id(42), "hi".into()).await.unwrap();
        assert_eq!(message.message_id, 7);

        let calls = bot.calls.lock().unwrap();
        assert_eq!(calls[0].0, "sendMessage");
        assert_eq!(calls[0].1, json!({ "chat_id": 42, "text": "hi" }));
    }

    #[tokio::test]
    async fn test_execute_through_boxed_bot() {
        let bot: BoxedBot = Arc::new(EchoBot {
            calls: Mutex::default(),
            reply: json!({ "ok": false, "error_code": 400, "description": "query is too old" }),
        });

        let err = bot
            .answer_callback_query("q1".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Api { code: 400, .. }));
    }
}
