//! Shared fixtures for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use ferrogram_core::{ApiResult, Bot, BoxedBot};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// A bot that records every call.
///
/// `sendMessage` is answered with the message it would have sent; every
/// other method with `true`.
#[derive(Default)]
pub(crate) struct MockBot {
    pub calls: Mutex<Vec<String>>,
}

impl MockBot {
    pub fn boxed() -> BoxedBot {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl Bot for MockBot {
    fn id(&self) -> &str {
        "mock"
    }

    async fn call_api(&self, method: &str, params: Value) -> ApiResult<Value> {
        self.calls.lock().push(method.to_string());
        let result = match method {
            "sendMessage" => json!({
                "message_id": 1,
                "date": 0,
                "chat": { "id": params["chat_id"], "type": "private" },
                "text": params["text"],
            }),
            _ => json!(true),
        };
        Ok(json!({ "ok": true, "result": result }))
    }
}
