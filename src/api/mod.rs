//! HTTP API.
//!
//! Thin axum handlers over `core`: extract and authenticate the request, call
//! the business logic, and shape the JSON the dashboard expects. Errors turn
//! into `{error, status_code}` bodies in [`error`].

/// User signup, login and profile
pub mod accounts;
/// AI advice, scoring, receipts and notifications
pub mod ai;
/// `IntoResponse` for [`crate::errors::Error`]
pub mod error;
/// Request extractors
pub mod extract;
/// Root, health and status
pub mod service;
/// Telegram linking and webhook
pub mod telegram;
/// Transaction CRUD, stats and receipt upload
pub mod transactions;

use crate::{
    ai::LanguageModel,
    config::Settings,
    core::token::TokenIssuer,
    receipt::{image::MAX_IMAGE_BYTES, ocr::TextExtractor},
    telegram::{BotApi, webhook::WebhookContext},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database pool
    pub db: DatabaseConnection,
    /// Loaded settings
    pub settings: Arc<Settings>,
    /// Access token issuer and verifier
    pub tokens: Arc<TokenIssuer>,
    /// Configured language model, if any
    pub model: Option<Arc<dyn LanguageModel>>,
    /// OCR engine
    pub ocr: Arc<dyn TextExtractor>,
    /// Client for downloading receipt images
    pub http: reqwest::Client,
    /// Telegram Bot API, when a token is configured
    pub bot: Option<Arc<dyn BotApi>>,
}

impl AppState {
    /// The language model as a trait object.
    #[must_use]
    pub fn model(&self) -> Option<&dyn LanguageModel> {
        self.model.as_deref()
    }

    /// The bot as a trait object.
    #[must_use]
    pub fn bot(&self) -> Option<&dyn BotApi> {
        self.bot.as_deref()
    }

    /// Currency for users and transactions that do not name one.
    #[must_use]
    pub fn default_currency(&self) -> &str {
        &self.settings.defaults.currency
    }

    /// Borrowed view used by the webhook handler.
    #[must_use]
    pub fn webhook_context(&self) -> WebhookContext<'_> {
        WebhookContext {
            db: &self.db,
            bot: self.bot(),
            model: self.model(),
            bot_username: self.settings.telegram.bot_username.as_deref(),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| warn!("Ignoring invalid CORS origin: {origin}"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.server.allowed_origins);

    Router::new()
        .merge(service::routes())
        .nest("/api/auth", accounts::routes())
        .nest("/api/transactions", transactions::routes())
        .nest("/api/ai", ai::routes())
        .nest("/api/telegram", telegram::routes())
        // Room for a maximum-size image plus multipart framing.
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
