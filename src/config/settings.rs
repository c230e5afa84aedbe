//! Application settings loaded from `sentinel.toml` plus environment overrides.
//!
//! The TOML file only holds non-secret settings. Every section has defaults so
//! a missing file (or a partial one) still yields a usable [`Settings`].

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Default location of the settings file.
pub const DEFAULT_CONFIG_PATH: &str = "sentinel.toml";

/// Complete application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// `"development"` or `"production"`
    pub environment: Environment,
    /// HTTP server settings
    pub server: ServerSettings,
    /// Token and header authentication settings
    pub auth: AuthSettings,
    /// Language model provider settings
    pub ai: AiSettings,
    /// Tesseract OCR settings
    pub ocr: OcrSettings,
    /// Telegram Bot API settings
    pub telegram: TelegramSettings,
    /// Default values applied to new data
    pub defaults: Defaults,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development: binds to loopback
    #[default]
    Development,
    /// Production: binds to all interfaces
    Production,
}

impl Environment {
    /// Lower-case name as reported by the health endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind host; derived from the environment when unset
    pub host: Option<String>,
    /// Bind port
    pub port: u16,
    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: 8000,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
            ],
        }
    }
}

/// Authentication settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Lifetime of issued access tokens
    pub token_ttl_hours: i64,
    /// Accept a bare `user-id` header instead of a bearer token
    pub allow_user_id_header: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_ttl_hours: 24,
            allow_user_id_header: false,
        }
    }
}

/// Which hosted model answers prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    /// HuggingFace router, OpenAI-compatible chat completions
    #[default]
    Huggingface,
    /// Google Gemini `generateContent`
    Gemini,
}

/// Language model settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// Selected provider
    pub provider: AiProvider,
    /// Base URL of the HuggingFace router
    pub huggingface_base_url: String,
    /// Model id sent to the HuggingFace router
    pub huggingface_model: String,
    /// Base URL of the Gemini API
    pub gemini_base_url: String,
    /// Gemini model name
    pub gemini_model: String,
    /// Request timeout for provider calls
    pub timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: AiProvider::Huggingface,
            huggingface_base_url: "https://router.huggingface.co/v1".to_string(),
            huggingface_model: "Qwen/Qwen2.5-7B-Instruct:together".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            gemini_model: "gemini-2.5-flash".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Tesseract settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Path or name of the `tesseract` binary
    pub tesseract_path: String,
    /// Extra arguments after `stdin stdout`
    pub args: Vec<String>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            tesseract_path: "tesseract".to_string(),
            args: vec![
                "--oem".to_string(),
                "3".to_string(),
                "--psm".to_string(),
                "6".to_string(),
            ],
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    /// Bot API base URL
    pub api_base_url: String,
    /// Public base URL of this backend, used to register the webhook
    pub webhook_base_url: Option<String>,
    /// Bot username shown to users
    pub bot_username: Option<String>,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.telegram.org".to_string(),
            webhook_base_url: None,
            bot_username: None,
        }
    }
}

/// Defaults for new data.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Currency code for manual and Telegram entries
    pub currency: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            currency: "NGN".to_string(),
        }
    }
}

impl Settings {
    /// Applies environment overrides using the given lookup function.
    ///
    /// Recognised variables: `ENVIRONMENT`, `PORT`, `FRONTEND_URL`,
    /// `TELEGRAM_API_BASE_URL`, `BACKEND_WEBHOOK_URL`, `TELEGRAM_BOT_USERNAME`,
    /// `ALLOW_USER_ID_HEADER`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(environment) = lookup("ENVIRONMENT") {
            self.environment = match environment.trim().to_lowercase().as_str() {
                "production" | "prod" => Environment::Production,
                _ => Environment::Development,
            };
        }

        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|e| Error::Config {
                message: format!("PORT must be a valid port number: {e}"),
            })?;
        }

        if let Some(frontend) = lookup("FRONTEND_URL") {
            let frontend = frontend.trim().trim_end_matches('/').to_string();
            if !frontend.is_empty() && !self.server.allowed_origins.contains(&frontend) {
                self.server.allowed_origins.insert(0, frontend);
            }
        }

        if let Some(url) = lookup("TELEGRAM_API_BASE_URL") {
            self.telegram.api_base_url = url;
        }
        if let Some(url) = lookup("BACKEND_WEBHOOK_URL") {
            self.telegram.webhook_base_url = Some(url);
        }
        if let Some(username) = lookup("TELEGRAM_BOT_USERNAME") {
            self.telegram.bot_username = Some(username);
        }
        if let Some(flag) = lookup("ALLOW_USER_ID_HEADER") {
            self.auth.allow_user_id_header = matches!(flag.trim(), "1" | "true" | "yes");
        }

        Ok(())
    }

    /// Host the server binds to.
    #[must_use]
    pub fn bind_host(&self) -> &str {
        self.server
            .host
            .as_deref()
            .unwrap_or(match self.environment {
                Environment::Production => "0.0.0.0",
                Environment::Development => "127.0.0.1",
            })
    }
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.as_ref().display()),
    })
}

/// Loads settings from `SENTINEL_CONFIG` (or `sentinel.toml`) and the environment.
///
/// A missing file is not an error; defaults are used instead.
pub fn load_settings() -> Result<Settings> {
    let path = std::env::var("SENTINEL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut settings = if Path::new(&path).exists() {
        let settings = load_config(&path)?;
        info!("Loaded settings from {path}");
        settings
    } else {
        warn!("Settings file {path} not found, using defaults");
        Settings::default()
    };

    settings.apply_overrides(|name| std::env::var(name).ok())?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_partial_settings() {
        let toml_str = r#"
            environment = "production"

            [server]
            port = 9000

            [ai]
            provider = "gemini"
            gemini_model = "gemini-2.0-flash"
        "#;

        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.environment, Environment::Production);
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.allowed_origins.len(), 2);
        assert_eq!(settings.ai.provider, AiProvider::Gemini);
        assert_eq!(settings.ai.gemini_model, "gemini-2.0-flash");
        assert_eq!(
            settings.ai.huggingface_model,
            "Qwen/Qwen2.5-7B-Instruct:together"
        );
        assert_eq!(settings.defaults.currency, "NGN");
        assert_eq!(settings.bind_host(), "0.0.0.0");
    }

    #[test]
    fn test_defaults_bind_loopback() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Development);
        assert_eq!(settings.bind_host(), "127.0.0.1");
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.ocr.args, vec!["--oem", "3", "--psm", "6"]);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PORT", "8080"),
            ("FRONTEND_URL", "https://sentinel.example.com/"),
            ("BACKEND_WEBHOOK_URL", "https://api.example.com"),
            ("ALLOW_USER_ID_HEADER", "true"),
        ]);
        let mut settings = Settings::default();
        settings
            .apply_overrides(|name| vars.get(name).map(ToString::to_string))
            .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(
            settings.server.allowed_origins[0],
            "https://sentinel.example.com"
        );
        assert_eq!(
            settings.telegram.webhook_base_url.as_deref(),
            Some("https://api.example.com")
        );
        assert!(settings.auth.allow_user_id_header);
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let mut settings = Settings::default();
        let result = settings.apply_overrides(|name| (name == "PORT").then(|| "abc".to_string()));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
