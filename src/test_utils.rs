//! Shared test utilities for Sentinel.
//!
//! Helpers for setting up test databases and entities with sensible defaults,
//! fakes for the external providers, and [`TestApp`] for driving the HTTP
//! router in-process.
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use crate::{
    ai::{CompletionRequest, LanguageModel},
    api::{self, AppState},
    config::Settings,
    core::{
        account,
        token::TokenIssuer,
        transaction::{NewTransaction, create_transaction},
    },
    entities::{profile, transaction},
    errors::{Error, Result},
    receipt::ocr::TextExtractor,
    telegram::BotApi,
};
use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use sea_orm::{DatabaseConnection, prelude::Uuid};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Password given to every test account.
pub const TEST_PASSWORD: &str = "password123";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test user through the regular signup path.
///
/// # Defaults
/// * password: [`TEST_PASSWORD`]
/// * name: the e-mail's local part
/// * currency: `"NGN"`
pub async fn create_test_user(db: &DatabaseConnection, email: &str) -> Result<profile::Model> {
    let (_, profile) = account::signup(db, email, TEST_PASSWORD, None, "NGN").await?;
    Ok(profile)
}

/// Sets up a database with one user.
/// Returns (db, profile) for common test scenarios.
pub async fn setup_with_user() -> Result<(DatabaseConnection, profile::Model)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "test@example.com").await?;
    Ok((db, user))
}

/// Creates a test transaction dated today.
///
/// # Arguments
/// * `db` - Database connection
/// * `user_id` - Owner, must exist
/// * `amount` - Amount spent
///
/// # Defaults
/// * merchant: `"Test merchant"`
/// * category: `Other`
/// * description: `"Test transaction"`
pub async fn create_test_transaction(
    db: &DatabaseConnection,
    user_id: Uuid,
    amount: f64,
) -> Result<transaction::Model> {
    let new = NewTransaction {
        description: Some("Test transaction".to_string()),
        ..NewTransaction::manual("Test merchant", amount)
    };
    create_transaction(db, user_id, new, "NGN").await
}

/// An unsaved transaction dated today, for pure functions.
#[must_use]
pub fn transaction_model(merchant: &str, amount: f64, category: &str) -> transaction::Model {
    let now = chrono::Utc::now();
    transaction::Model {
        id: Uuid::new_v4(),
        user_id: Uuid::nil(),
        merchant: merchant.to_string(),
        amount,
        category: category.to_string(),
        currency: "NGN".to_string(),
        description: None,
        date: now.date_naive(),
        source: "manual".to_string(),
        ai_categorized: false,
        created_at: now,
        updated_at: now,
    }
}

/// An unsaved profile without a linked chat.
#[must_use]
pub fn profile_model(name: &str) -> profile::Model {
    let now = chrono::Utc::now();
    profile::Model {
        id: Uuid::new_v4(),
        email: format!("{}@example.com", name.to_lowercase()),
        name: name.to_string(),
        monthly_income: 0.0,
        fixed_bills: 0.0,
        savings_goal: 0.0,
        preferred_currency: "NGN".to_string(),
        telegram_chat_id: None,
        telegram_connected: false,
        telegram_username: None,
        created_at: now,
        updated_at: now,
    }
}

/// Language model with a canned reply.
pub struct FakeModel {
    reply: Option<String>,
    last: Mutex<Option<CompletionRequest>>,
}

impl FakeModel {
    /// Always answers `reply`.
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            last: Mutex::new(None),
        }
    }

    /// Always fails with a provider error.
    pub fn failing() -> Self {
        Self {
            reply: None,
            last: Mutex::new(None),
        }
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    fn name(&self) -> &str {
        "fake-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        *self.last.lock().unwrap() = Some(request.clone());
        self.reply.clone().ok_or_else(|| Error::Provider {
            provider: "Fake",
            message: "model unavailable".to_string(),
        })
    }
}

/// OCR engine with canned text.
pub struct FakeOcr {
    text: Option<String>,
}

impl FakeOcr {
    /// Always reads `text`.
    pub fn reading(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    /// Always fails.
    pub const fn failing() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl TextExtractor for FakeOcr {
    async fn extract_text(&self, _image: &[u8]) -> Result<String> {
        self.text.clone().ok_or_else(|| Error::Ocr {
            message: "unreadable image".to_string(),
        })
    }

    async fn version(&self) -> Option<String> {
        Some("fake 1.0".to_string())
    }
}

/// Bot that records what it sends.
#[derive(Default)]
pub struct FakeBot {
    sent: Mutex<Vec<(i64, String)>>,
    webhook_url: Mutex<Option<String>>,
}

impl FakeBot {
    /// Messages sent so far as `(chat_id, text)`.
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl BotApi for FakeBot {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn get_me(&self) -> Result<Value> {
        Ok(json!({"id": 1, "is_bot": true, "first_name": "Sentinel", "username": "sentinel_bot"}))
    }

    async fn set_webhook(&self, url: &str) -> Result<Value> {
        *self.webhook_url.lock().unwrap() = Some(url.to_string());
        Ok(json!(true))
    }

    async fn get_webhook_info(&self) -> Result<Value> {
        let url = self.webhook_url.lock().unwrap().clone().unwrap_or_default();
        Ok(json!({"url": url, "pending_update_count": 0}))
    }
}

/// The HTTP router over an in-memory database and fake providers.
pub struct TestApp {
    /// State shared with the router
    pub state: AppState,
    /// The model behind `state.model`
    pub model: Arc<FakeModel>,
    /// The bot behind `state.bot`
    pub bot: Arc<FakeBot>,
    router: Router,
}

impl TestApp {
    /// An app whose model answers `Other` and whose OCR reads `TOTAL 100`.
    pub async fn new() -> Self {
        Self::build(FakeModel::replying("Other"), FakeOcr::reading("TOTAL 100")).await
    }

    /// An app with the given model and OCR.
    pub async fn build(model: FakeModel, ocr: FakeOcr) -> Self {
        Self::with_settings(Settings::default(), model, ocr).await
    }

    /// An app that knows its public URL, for webhook registration.
    pub async fn with_webhook_base(base_url: &str) -> Self {
        let mut settings = Settings::default();
        settings.telegram.webhook_base_url = Some(base_url.to_string());
        Self::with_settings(settings, FakeModel::replying("Other"), FakeOcr::reading("")).await
    }

    async fn with_settings(settings: Settings, model: FakeModel, ocr: FakeOcr) -> Self {
        let model = Arc::new(model);
        let bot = Arc::new(FakeBot::default());
        let state = AppState {
            db: setup_test_db().await.unwrap(),
            settings: Arc::new(settings),
            tokens: Arc::new(TokenIssuer::new(
                SecretString::new("test-secret".into()),
                24,
            )),
            model: Some(model.clone() as Arc<dyn LanguageModel>),
            ocr: Arc::new(ocr),
            http: reqwest::Client::new(),
            bot: Some(bot.clone() as Arc<dyn BotApi>),
        };
        let router = api::router(state.clone());
        Self {
            state,
            model,
            bot,
            router,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn request(method: &str, path: &str, token: Option<&str>) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match token {
            Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }

    async fn send_json(&self, method: &str, path: &str, token: Option<&str>, body: &Value) -> (StatusCode, Value) {
        let request = Self::request(method, path, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// `GET path`.
    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let request = Self::request("GET", path, token).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// `POST path` with a JSON body.
    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send_json("POST", path, token, &body).await
    }

    /// `PUT path` with a JSON body.
    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send_json("PUT", path, token, &body).await
    }

    /// `DELETE path`.
    pub async fn delete(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let request = Self::request("DELETE", path, token).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// Uploads `bytes` as the multipart field `file`.
    pub async fn upload(
        &self,
        path: &str,
        token: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> (StatusCode, Value) {
        const BOUNDARY: &str = "sentinel-test-boundary";
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"receipt\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Self::request("POST", path, Some(token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Signs up a user and returns its access token and id.
    pub async fn signup(&self, email: &str) -> (String, Uuid) {
        let (status, body) = self
            .post(
                "/api/auth/signup",
                None,
                json!({"email": email, "password": TEST_PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {body}");
        let token = body["session"]["access_token"].as_str().unwrap().to_string();
        let id = Uuid::parse_str(body["user"]["id"].as_str().unwrap()).unwrap();
        (token, id)
    }
}
