//! Telegram Bot API notifier.
//!
//! Delivers notifications via the Telegram Bot API `sendMessage` endpoint
//! with HTML formatting and rate limit handling.

use crate::traits::{Notification, Notifier, NotifyError};

/// Sends notifications via the Telegram Bot API.
#[derive(Debug)]
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// Creates a new `TelegramNotifier` from configuration values.
    ///
    /// If `bot_token` starts with `${`, the value between `${` and `}` is
    /// resolved as an environment variable name. Returns
    /// [`NotifyError::Config`] if the token is empty or the env var is missing.
    pub fn from_config(bot_token: String, chat_id: String) -> Result<Self, NotifyError> {
        let resolved_token = if bot_token.starts_with("${") {
            let var_name = bot_token
                .strip_prefix("${")
                .and_then(|s| s.strip_suffix('}'))
                .ok_or_else(|| {
                    NotifyError::Config(format!("Malformed env var reference: {bot_token}"))
                })?;
            std::env::var(var_name).map_err(|_| {
                NotifyError::Config(format!("Environment variable '{var_name}' is not set"))
            })?
        } else {
            bot_token
        };

        if resolved_token.is_empty() {
            return Err(NotifyError::Config(
                "Telegram bot token must not be empty".to_string(),
            ));
        }
        if chat_id.is_empty() {
            return Err(NotifyError::Config(
                "Telegram chat id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            bot_token: resolved_token,
            chat_id,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    /// Sends a notification via the Telegram `sendMessage` API.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);

        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": notification.body,
            "parse_mode": "HTML",
        });

        tracing::debug!(chat_id = %self.chat_id, "Sending Telegram notification");

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        let resp_body: serde_json::Value = response.json().await?;

        if resp_body.get("ok") == Some(&serde_json::Value::Bool(true)) {
            tracing::info!(chat_id = %self.chat_id, "Telegram notification sent");
            return Ok(());
        }

        // Handle rate limiting (HTTP 429).
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp_body
                .get("parameters")
                .and_then(|p| p.get("retry_after"))
                .and_then(|v| v.as_u64())
                .unwrap_or(30);
            return Err(NotifyError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let description = resp_body
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown Telegram API error");

        Err(NotifyError::Config(format!(
            "Telegram API error: {description}"
        )))
    }

    /// Returns the channel name for this notifier.
    fn channel_name(&self) -> &str {
        "telegram"
    }
}
