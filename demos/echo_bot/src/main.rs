//! Echo Bot Demo
//!
//! Drives the Ferrogram dispatcher from the terminal. Every line typed on
//! stdin becomes an update; outbound Bot API calls are printed instead of
//! being sent.
//!
//! # Input
//!
//! ```text
//! /start         command, answered with a keyboard
//! /help          command
//! ?like          callback query with data "like"
//! !flood wait    platform error routed to the error handlers
//! anything else  echoed back
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot -- --sync
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use ferrogram::core::{ApiResult, CallbackQuery, Chat, Message};
use ferrogram::framework::DispatchableObject;
use ferrogram::prelude::*;
use ferrogram::runtime::config::{ConfigLoader, DispatchMode};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(about = "Console echo bot for the Ferrogram dispatcher")]
struct Args {
    /// Configuration file (defaults to ./ferrogram.toml if present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run handlers inline instead of concurrently.
    #[arg(long)]
    sync: bool,

    /// Chat id attached to console updates.
    #[arg(long, default_value_t = 1)]
    chat_id: i64,
}

// ============================================================================
// Console Bot
// ============================================================================

/// A [`Bot`] that prints calls instead of sending them.
struct ConsoleBot {
    log_level: LogLevel,
    next_message_id: AtomicI64,
}

#[async_trait]
impl Bot for ConsoleBot {
    fn id(&self) -> &str {
        "console"
    }

    async fn call_api(&self, method: &str, params: Value) -> ApiResult<Value> {
        if self.log_level.should_log_network() {
            info!(method, %params, "Outbound call");
        }

        let result = match method {
            "sendMessage" => {
                println!("bot> {}", params["text"].as_str().unwrap_or_default());
                if let Some(markup) = params.get("reply_markup") {
                    println!("     keyboard: {markup}");
                }
                json!({
                    "message_id": self.next_message_id.fetch_add(1, Ordering::Relaxed),
                    "date": 0,
                    "chat": { "id": params["chat_id"], "type": "private" },
                    "text": params["text"],
                })
            }
            "answerCallbackQuery" => {
                println!("bot> (answered callback {})", params["callback_query_id"]);
                json!(true)
            }
            _ => json!(true),
        };
        Ok(json!({ "ok": true, "result": result }))
    }
}

// ============================================================================
// Handlers
// ============================================================================

fn chat_of(ctx: &UpdateContext) -> i64 {
    ctx.update().chat_id().unwrap_or_default()
}

fn handlers() -> Result<Vec<BoxedHandler>> {
    let keyboard = InlineKeyboardMarkup::single_row(vec![
        InlineKeyboardButton::callback_data("👍", "like"),
        InlineKeyboardButton::callback_data("👎", "dislike"),
    ])?;

    let log_all = any_update(|_bot: BoxedBot, ctx: Arc<UpdateContext>| async move {
        info!(update_id = ctx.update().update_id, "Update received");
    });

    let start = command("start", move |bot: BoxedBot, ctx: Arc<UpdateContext>| {
        let keyboard = keyboard.clone();
        async move {
            if !ctx.consume() {
                return Ok(());
            }
            let request = SendMessage::new(chat_of(&ctx), "Welcome! Do you like it?")
                .reply_markup(keyboard);
            bot.execute(&request).await?;
            Ok::<_, HandlerError>(())
        }
    });

    let help = command("help", |bot: BoxedBot, ctx: Arc<UpdateContext>| async move {
        ctx.consume();
        let text = "Type anything and I will repeat it. /start shows a keyboard.";
        bot.send_message(chat_of(&ctx).into(), text.into()).await?;
        Ok::<_, HandlerError>(())
    });

    let like = callback_query(Some("like"), |bot: BoxedBot, ctx: Arc<UpdateContext>| async move {
        ctx.consume();
        if let Some(query) = &ctx.update().callback_query {
            bot.answer_callback_query(query.id.clone()).await?;
        }
        bot.send_message(chat_of(&ctx).into(), "Glad to hear!".into())
            .await?;
        Ok::<_, HandlerError>(())
    });

    let echo = text(|bot: BoxedBot, ctx: Arc<UpdateContext>| async move {
        if !ctx.consume() {
            return Ok(());
        }
        let reply = ctx.update().text().unwrap_or_default().to_string();
        bot.send_message(chat_of(&ctx).into(), reply).await?;
        Ok::<_, HandlerError>(())
    });

    Ok(vec![log_all, start, help, like, echo])
}

// ============================================================================
// Console update source
// ============================================================================

fn parse_line(update_id: i64, chat_id: i64, line: &str) -> DispatchableObject {
    if let Some(reason) = line.strip_prefix('!') {
        return DispatchableObject::Error(TelegramError::network(reason.trim()));
    }

    let chat = Chat {
        id: chat_id,
        ..Default::default()
    };
    if let Some(data) = line.strip_prefix('?') {
        return DispatchableObject::Update(Update {
            update_id,
            callback_query: Some(CallbackQuery {
                id: format!("cb-{update_id}"),
                message: Some(Message {
                    chat,
                    ..Default::default()
                }),
                data: Some(data.trim().to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
    }

    DispatchableObject::Update(Update::text_message(update_id, chat_id, line))
}

async fn feed_stdin(sender: UpdateSender, chat_id: i64, eof: oneshot::Sender<()>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut update_id = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        update_id += 1;
        sender.send(parse_line(update_id, chat_id, line))?;
    }

    let _ = eof.send(());
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let mut config = loader.load()?;
    if args.sync {
        config.dispatcher.mode = DispatchMode::Sync;
    }

    let bot = Arc::new(ConsoleBot {
        log_level: config.dispatcher.log_level,
        next_message_id: AtomicI64::new(1),
    });
    let runtime = FerrogramRuntime::from_config(&config, bot)?;

    runtime.register_handlers(handlers()?);
    runtime.register_error_handler(error_handler(|_bot, error: TelegramError| async move {
        warn!(%error, "Platform reported an error");
    }));

    let (eof_tx, eof_rx) = oneshot::channel();
    let sender = runtime.sender();
    let chat_id = args.chat_id;
    let feeder = tokio::spawn(async move {
        if let Err(e) = feed_stdin(sender, chat_id, eof_tx).await {
            warn!(error = %e, "Console input stopped");
        }
    });

    println!("Type messages, /start, /help, ?like or !error. Ctrl+D to quit.");
    runtime
        .run_until(async move {
            tokio::select! {
                _ = eof_rx => info!("End of input"),
                _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
            }
        })
        .await?;

    feeder.abort();
    Ok(())
}
