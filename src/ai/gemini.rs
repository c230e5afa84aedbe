//! Google Gemini client (`models/{model}:generateContent`).

use super::{CompletionRequest, LanguageModel};
use crate::{
    core::chat_history::Role,
    errors::{Error, Result},
};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::instrument;

const PROVIDER: &str = "Gemini";

/// Text generation through the Gemini API.
pub struct GeminiChat {
    client: Client,
    endpoint: String,
    model: String,
    api_key: SecretString,
}

impl GeminiChat {
    /// Creates a client for `model` behind `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: &str, model: &str, api_key: SecretString) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/models/{model}:generateContent",
                base_url.trim_end_matches('/')
            ),
            model: model.to_string(),
            api_key,
        }
    }

    /// Request body for `generateContent`.
    #[must_use]
    pub fn request_body(request: &CompletionRequest) -> Value {
        let contents: Vec<Value> = request
            .messages
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                json!({ "role": role, "parts": [{ "text": turn.content }] })
            })
            .collect();

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_tokens,
            },
        });
        if let Some(system) = &request.system {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        body
    }
}

/// Joins the text parts of the first candidate.
pub fn parse_response(body: &Value) -> Result<String> {
    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| Error::Provider {
            provider: PROVIDER,
            message: "response has no candidates[0].content.parts".to_string(),
        })?;

    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    Ok(text.trim().to_string())
}

#[async_trait]
impl LanguageModel for GeminiChat {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&Self::request_body(request))
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
        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::ai::ChatTurn;

    #[test]
    fn test_endpoint() {
        let client = GeminiChat::new(
            Client::new(),
            "https://generativelanguage.googleapis.com/v1beta",
            "gemini-2.5-flash",
            SecretString::new("key".into()),
        );
        assert_eq!(
            client.endpoint,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_maps_roles() {
        let mut request = CompletionRequest::prompt("and now?").with_system("advisor");
        request.messages.insert(0, ChatTurn::assistant("hello"));

        let body = GeminiChat::request_body(&request);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "advisor");
        assert_eq!(body["contents"][0]["role"], "model");
        assert_eq!(body["contents"][1]["role"], "user");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 500);
    }

    #[test]
    fn test_parse_response() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Save " }, { "text": "more." }] } }]
        });
        assert_eq!(parse_response(&body).unwrap(), "Save more.");
        assert!(parse_response(&json!({})).is_err());
    }
}
