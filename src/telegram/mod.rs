//! Telegram bot: Bot API client, webhook handling, and notifications.
//!
//! The bot is a second way into the same data. Users link their chat with a
//! one-time code, then log expenses ("Lunch 2500") or ask questions in plain
//! text.

/// Bot API client over HTTPS
pub mod client;
/// Expense parsing from free text
pub mod expense;
/// Notification formatting and delivery
pub mod notify;
/// Webhook update handling
pub mod webhook;

use crate::errors::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// The Bot API methods Sentinel uses.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Sends a Markdown message to a chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Returns the bot's own user object (`getMe`).
    async fn get_me(&self) -> Result<Value>;

    /// Registers the webhook URL (`setWebhook`).
    async fn set_webhook(&self, url: &str) -> Result<Value>;

    /// Returns the current webhook state (`getWebhookInfo`).
    async fn get_webhook_info(&self) -> Result<Value>;
}

/// An incoming webhook update. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Update sequence number
    pub update_id: i64,
    /// New message
    #[serde(default)]
    pub message: Option<Message>,
}

/// A chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Message id within the chat
    pub message_id: i64,
    /// Chat the message was sent in
    pub chat: Chat,
    /// Sender
    #[serde(default)]
    pub from: Option<TelegramUser>,
    /// Text, absent for photos, stickers, ...
    #[serde(default)]
    pub text: Option<String>,
}

/// A chat.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Chat id
    pub id: i64,
    /// Username for private chats
    #[serde(default)]
    pub username: Option<String>,
    /// First name for private chats
    #[serde(default)]
    pub first_name: Option<String>,
}

/// A Telegram user.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    /// User id
    pub id: i64,
    /// Username
    #[serde(default)]
    pub username: Option<String>,
    /// First name
    #[serde(default)]
    pub first_name: Option<String>,
}

impl Message {
    /// Sender's username, falling back to the chat's.
    #[must_use]
    pub fn username(&self) -> Option<String> {
        self.from
            .as_ref()
            .and_then(|u| u.username.clone())
            .or_else(|| self.chat.username.clone())
    }

    /// Sender's first name, if known.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.from
            .as_ref()
            .and_then(|u| u.first_name.as_deref())
            .or(self.chat.first_name.as_deref())
    }
}

/// Escapes characters that Telegram's legacy Markdown treats as markup.
#[must_use]
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_deserialize_update() {
        let raw = r#"{
            "update_id": 10,
            "message": {
                "message_id": 5,
                "date": 1700000000,
                "chat": {"id": 4242, "type": "private", "first_name": "Ada"},
                "from": {"id": 4242, "is_bot": false, "first_name": "Ada", "username": "ada_t"},
                "text": "Lunch 2500"
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 4242);
        assert_eq!(message.text.as_deref(), Some("Lunch 2500"));
        assert_eq!(message.username().as_deref(), Some("ada_t"));
        assert_eq!(message.first_name(), Some("Ada"));
    }

    #[test]
    fn test_update_without_message() {
        let update: Update = serde_json::from_str(r#"{"update_id": 11}"#).unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("mr_bigg's *deal*"), "mr\\_bigg's \\*deal\\*");
        assert_eq!(escape_markdown("plain"), "plain");
    }
}
