//! Secrets read from environment variables.
//!
//! Secrets never live in the TOML file. They are wrapped in [`SecretString`]
//! so they do not end up in `Debug` output or logs.

use crate::errors::{Error, Result};
use secrecy::SecretString;

/// Credentials for the token signer and the external providers.
#[derive(Debug, Clone)]
pub struct Secrets {
    /// HMAC key for access tokens (`JWT_SECRET`)
    pub jwt_secret: SecretString,
    /// HuggingFace router token (`HF_TOKEN` or `HUGGINGFACE_API_TOKEN`)
    pub huggingface_token: Option<SecretString>,
    /// Gemini API key (`GEMINI_API_KEY`)
    pub gemini_api_key: Option<SecretString>,
    /// Telegram bot token (`TELEGRAM_BOT_TOKEN`)
    pub telegram_bot_token: Option<SecretString>,
}

impl Secrets {
    /// Reads all secrets from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads all secrets through the given lookup function.
    ///
    /// Empty values count as missing. Only `JWT_SECRET` is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(|value| SecretString::new(value.into()))
        };

        let jwt_secret = read("JWT_SECRET").ok_or(Error::EnvVar {
            name: "JWT_SECRET",
            source: std::env::VarError::NotPresent,
        })?;

        Ok(Self {
            jwt_secret,
            huggingface_token: read("HF_TOKEN").or_else(|| read("HUGGINGFACE_API_TOKEN")),
            gemini_api_key: read("GEMINI_API_KEY"),
            telegram_bot_token: read("TELEGRAM_BOT_TOKEN"),
        })
    }
}
