//! HuggingFace router client (OpenAI-compatible `chat/completions`).

use super::{CompletionRequest, LanguageModel};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, instrument};

const PROVIDER: &str = "HuggingFace";

/// Chat completions through `router.huggingface.co`.
pub struct HuggingFaceChat {
    client: Client,
    endpoint: String,
    model: String,
    token: SecretString,
}

impl HuggingFaceChat {
    /// Creates a client for `model` behind `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: &str, model: &str, token: SecretString) -> Self {
        Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
            token,
        }
    }

    /// Request body for the chat completions endpoint.
    #[must_use]
    pub fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.extend(
            request
                .messages
                .iter()
                .map(|turn| json!({ "role": turn.role.as_str(), "content": turn.content })),
        );

        json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }
}

/// Pulls the first choice's text out of a chat completions response.
pub fn parse_response(body: &Value) -> Result<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|text| text.trim().to_string())
        .ok_or_else(|| Error::Provider {
            provider: PROVIDER,
            message: "response has no choices[0].message.content".to_string(),
        })
}

#[async_trait]
impl LanguageModel for HuggingFaceChat {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.token.expose_secret())
            .json(&self.request_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Provider {
                provider: PROVIDER,
                message: format!("{status}: {text}"),
            });
        }

        let body: Value = response.json().await?;
        let text = parse_response(&body)?;
        debug!(chars = text.len(), "Completion received");
        Ok(text)
    }
}
