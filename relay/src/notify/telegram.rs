//! Minimal Telegram Bot API client.
//!
//! Only the two methods the relay needs are implemented: `getMe` for the
//! startup identity check and `sendMessage` for notifications. Every call is bounded by
//! the client-wide timeout.

use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::error::NotifyError;
use crate::notify::message::OutboundMessage;
use crate::Config;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Telegram's response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// The bot account, as reported by `getMe`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// The subset of a sent message we care about.
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

/// Shared Telegram client.
///
/// Cloning is cheap: the underlying connection pool is reference counted.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    api_url: String,
    token: String,
    chat_id: i64,
}

impl TelegramClient {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: i64,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_url: api_url.into(),
            token: token.into(),
            chat_id,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        Self::new(
            config.telegram_api_url.clone(),
            config.telegram_token.clone(),
            config.telegram_chat_id,
            config.telegram_timeout,
        )
    }

    /// Whether a bot token is available at all.
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty()
    }

    /// Destination chat for notifications.
    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    /// Identify the bot behind the configured token.
    pub async fn get_me(&self) -> Result<BotUser, NotifyError> {
        self.call::<(), _>("getMe", None).await
    }

    /// Send one message. No retries.
    pub async fn send_message(&self, message: &OutboundMessage) -> Result<SentMessage, NotifyError> {
        self.call("sendMessage", Some(message)).await
    }

    async fn call<B, T>(&self, method: &'static str, body: Option<&B>) -> Result<T, NotifyError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if !self.is_configured() {
            return Err(NotifyError::NotConfigured);
        }

        let url = format!("{}/bot{}/{}", self.api_url, self.token, method);
        let request = match body {
            Some(body) => self.http.post(url).json(body),
            None => self.http.get(url),
        };

        debug!(method = method, "telegram_request");

        let response = request.send().await?;
        let status = response.status().as_u16();
        let envelope: ApiResponse<T> = response.json().await?;

        debug!(
            method = method,
            status_code = status,
            ok = envelope.ok,
            "telegram_response"
        );

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(NotifyError::Api {
                method,
                description: description.unwrap_or_else(|| format!("HTTP {status}")),
            }),
        }
    }
}
