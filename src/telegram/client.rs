//! HTTPS client for the Telegram Bot API.

use super::BotApi;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, instrument};

const PROVIDER: &str = "Telegram";

/// Calls `<api_base_url>/bot<token>/<method>`.
pub struct TelegramClient {
    client: Client,
    api_base_url: String,
    token: SecretString,
}

impl TelegramClient {
    /// Creates a client for the bot with `token`.
    #[must_use]
    pub fn new(client: Client, api_base_url: &str, token: SecretString) -> Self {
        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base_url,
            self.token.expose_secret()
        )
    }

    async fn call(&self, method: &str, payload: Option<Value>) -> Result<Value> {
        let request = match payload {
            Some(body) => self.client.post(self.method_url(method)).json(&body),
            None => self.client.get(self.method_url(method)),
        };
        // reqwest errors may carry the URL (and so the token); keep only the kind.
        let response = request.send().await.map_err(|e| Error::Provider {
            provider: PROVIDER,
            message: format!("{method} request failed: {}", e.without_url()),
        })?;
        let body: Value = response.json().await.map_err(|e| Error::Provider {
            provider: PROVIDER,
            message: format!("{method} returned invalid JSON: {}", e.without_url()),
        })?;
        parse_response(method, body)
    }
}

/// Unwraps the `{ok, result, description}` envelope.
pub fn parse_response(method: &str, body: Value) -> Result<Value> {
    if body["ok"].as_bool() == Some(true) {
        Ok(body["result"].clone())
    } else {
        Err(Error::Provider {
            provider: PROVIDER,
            message: format!(
                "{method}: {}",
                body["description"].as_str().unwrap_or("unknown error")
            ),
        })
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    #[instrument(skip(self, text))]
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        self.call("sendMessage", Some(payload)).await?;
        debug!("Message sent");
        Ok(())
    }

    async fn get_me(&self) -> Result<Value> {
        self.call("getMe", None).await
    }

    #[instrument(skip(self))]
    async fn set_webhook(&self, url: &str) -> Result<Value> {
        let payload = json!({
            "url": url,
            "allowed_updates": ["message", "callback_query"],
        });
        self.call("setWebhook", Some(payload)).await
    }

    async fn get_webhook_info(&self) -> Result<Value> {
        self.call("getWebhookInfo", None).await
    }
}
