// src/services/telegram.rs

//! Telegram Bot API delivery.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{TelegramConfig, TokenRecord};
use crate::services::MessageSink;
use crate::utils::http::{create_telegram_client, excerpt};
use crate::utils::url::telegram_method;

pub const BOT_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub const CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Bot secrets. Either may be absent; sending then fails per message.
#[derive(Clone, Default)]
pub struct TelegramCredentials {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl TelegramCredentials {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: Some(bot_token.into()),
            chat_id: Some(chat_id.into()),
        }
    }

    /// Read `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID` from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`; blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            bot_token: read(BOT_TOKEN_VAR),
            chat_id: read(CHAT_ID_VAR),
        }
    }

    /// Both secrets, or the name of the first missing one.
    pub fn require(&self) -> Result<(&str, &str)> {
        let token = self
            .bot_token
            .as_deref()
            .ok_or(AppError::MissingCredential(BOT_TOKEN_VAR))?;
        let chat = self
            .chat_id
            .as_deref()
            .ok_or(AppError::MissingCredential(CHAT_ID_VAR))?;
        Ok((token, chat))
    }
}

impl fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Body of a `sendMessage` call.
#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

/// Envelope of every Bot API reply.
#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends token announcements to a Telegram chat.
pub struct TelegramNotifier {
    config: TelegramConfig,
    credentials: TelegramCredentials,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig, credentials: TelegramCredentials) -> Result<Self> {
        let client = create_telegram_client(&config)?;
        Ok(Self {
            config,
            credentials,
            client,
        })
    }
}

#[async_trait]
impl MessageSink for TelegramNotifier {
    async fn deliver(&self, token: &TokenRecord, text: &str) -> Result<()> {
        let (bot_token, chat_id) = self.credentials.require()?;
        let url = telegram_method(&self.config.api_base, bot_token, "sendMessage")?;

        let payload = SendMessage {
            chat_id,
            text,
            parse_mode: &self.config.parse_mode,
            disable_web_page_preview: self.config.disable_web_page_preview,
        };

        log::debug!("Sending Telegram message for {}", token.label());
        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            // The request URL embeds the bot token; keep it out of logs.
            .map_err(|e| AppError::delivery(token.label(), e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::delivery(token.label(), e.without_url()))?;

        check_reply(status, &body).map_err(|message| AppError::delivery(token.label(), message))
    }
}

/// Interpret a Bot API reply; `Err` carries a description of the failure.
fn check_reply(status: reqwest::StatusCode, body: &str) -> std::result::Result<(), String> {
    let reply: Option<ApiReply> = serde_json::from_str(body).ok();

    if !status.is_success() {
        let detail = reply
            .and_then(|r| r.description)
            .unwrap_or_else(|| excerpt(body));
        return Err(format!("status {status}: {detail}"));
    }

    match reply {
        Some(ApiReply { ok: true, .. }) => Ok(()),
        Some(ApiReply { description, .. }) => Err(format!(
            "Telegram rejected message: {}",
            description.as_deref().unwrap_or("no description")
        )),
        None => Err(format!("unexpected reply: {}", excerpt(body))),
    }
}
