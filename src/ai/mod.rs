//! Hosted language models.
//!
//! Everything that needs natural-language work goes through the
//! [`LanguageModel`] trait. Two providers implement it: the HuggingFace router
//! (OpenAI-compatible chat completions, Qwen by default) and Google Gemini.

/// Advisor prompts: chat, categorization, transaction analysis
pub mod advisor;
/// Google Gemini client
pub mod gemini;
/// HuggingFace router client
pub mod huggingface;
/// Tolerant JSON extraction from model replies
pub mod json;

use crate::{
    config::{
        Secrets,
        settings::{AiProvider, AiSettings},
    },
    core::chat_history::Role,
    errors::Result,
};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

/// One turn of a conversation sent to a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    /// Author of the turn
    pub role: Role,
    /// Text
    pub content: String,
}

impl ChatTurn {
    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A provider-neutral completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instruction
    pub system: Option<String>,
    /// Conversation, oldest first; the last turn is the user's prompt
    pub messages: Vec<ChatTurn>,
    /// Sampling temperature
    pub temperature: f32,
    /// Output token cap
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// A single-prompt request with deterministic sampling.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            system: None,
            messages: vec![ChatTurn::user(text)],
            temperature: 0.0,
            max_tokens: 500,
        }
    }

    /// Sets the system instruction.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the output token cap.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A hosted model that turns a request into text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier reported to clients.
    fn name(&self) -> &str;

    /// Runs one completion. A single attempt; callers decide the fallback.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Builds the HTTP client shared by the providers.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(Into::into)
}

/// Builds the configured model, or `None` when its credentials are missing.
pub fn build_model(
    settings: &AiSettings,
    secrets: &Secrets,
) -> Result<Option<Arc<dyn LanguageModel>>> {
    let client = http_client(settings.timeout_secs)?;

    let model: Option<Arc<dyn LanguageModel>> = match settings.provider {
        AiProvider::Huggingface => secrets.huggingface_token.clone().map(|token| {
            Arc::new(huggingface::HuggingFaceChat::new(
                client,
                &settings.huggingface_base_url,
                &settings.huggingface_model,
                token,
            )) as Arc<dyn LanguageModel>
        }),
        AiProvider::Gemini => secrets.gemini_api_key.clone().map(|key| {
            Arc::new(gemini::GeminiChat::new(
                client,
                &settings.gemini_base_url,
                &settings.gemini_model,
                key,
            )) as Arc<dyn LanguageModel>
        }),
    };

    match &model {
        Some(model) => info!("Language model ready: {}", model.name()),
        None => warn!(
            "No credentials for {:?}; AI features will return fallback answers",
            settings.provider
        ),
    }

    Ok(model)
}
