//! `/api/ai`: advisor chat, categorization, receipt analysis, health scoring
//! and Telegram notifications.
//!
//! Provider failures never become HTTP errors here. Each endpoint answers with
//! its fallback payload (`success: false`, a default category, a default
//! analysis) and logs the cause.

use super::{
    AppState,
    extract::{AuthUser, JsonBody, PathParam, QueryParams, read_image_upload},
};
use crate::{
    ai::{
        ChatTurn,
        advisor::{
            AdvisorContext, HISTORY_TURNS, TransactionFacts, TransactionInsight,
            analyze_transaction as analyze_with_model, ask_advisor, categorize as categorize_with_model,
        },
    },
    core::{
        analysis::{ANALYSIS_WINDOW_DAYS, analyze_spending, generate_advice},
        category::Category,
        chat_history::{Role, append_message, recent_history},
        health::{detailed_health, health_score as ladder_score},
        profile::{get_profile, require_profile, set_telegram_chat},
        report::{format_money, format_transaction_line, summarize},
        tips::{Budget, health_tips as compute_tips},
        transaction::{recent_transactions, transactions_since},
    },
    entities::{profile, transaction},
    errors::{Error, Result},
    receipt::{
        ReceiptExtraction,
        image::{decode_base64_image, fetch_image},
        scan_receipt,
    },
    telegram::notify::{
        Notification, budget_alert, health_update, send_to_profile, weekly_summary,
    },
};
use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::{get, post},
};
use chrono::{Duration, Utc};
use sea_orm::{DatabaseConnection, prelude::Uuid};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Transaction lines in the chat context.
const CHAT_CONTEXT_TRANSACTIONS: usize = 20;
/// Fewer posted transactions than this and the database is consulted.
const CHAT_MIN_POSTED: usize = 5;
/// Recent transactions given to the single-transaction analysis.
const ANALYSIS_CONTEXT_TRANSACTIONS: u64 = 5;
/// Days covered by the weekly summary.
const WEEK_DAYS: i64 = 7;

/// Routes nested under `/api/ai`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/categorize", post(categorize))
        .route("/analyze-transaction", post(analyze_transaction))
        .route("/analyze-receipt", post(analyze_receipt))
        .route("/analyze-receipt-upload", post(analyze_receipt_upload))
        .route("/financial-health", post(financial_health))
        .route("/health-score", get(health_score))
        .route("/spending-insights", post(spending_insights))
        .route("/health-tips", post(health_tips))
        .route("/send-budget-alert/:category", post(send_budget_alert))
        .route("/send-health-notification", post(send_health_notification))
        .route("/send-weekly-summary", post(send_weekly_summary))
        .route("/telegram/settings", get(telegram_settings).post(update_telegram_settings))
        .route("/telegram/test", post(telegram_test))
}

/// Budget figures a request may override; missing ones come from the profile.
///
/// Accepts both `monthly_income` and `monthlyIncome` spellings.
#[derive(Debug, Default, Deserialize)]
struct BudgetOverrides {
    #[serde(default, alias = "monthlyIncome")]
    monthly_income: Option<f64>,
    #[serde(default, alias = "fixedBills")]
    fixed_bills: Option<f64>,
    #[serde(default, alias = "savingsGoal")]
    savings_goal: Option<f64>,
}

/// Budget figures after applying overrides.
struct ResolvedBudget {
    monthly_income: f64,
    fixed_bills: f64,
    savings_goal: f64,
    currency: String,
}

impl BudgetOverrides {
    fn resolve(&self, profile: Option<&profile::Model>, default_currency: &str) -> ResolvedBudget {
        ResolvedBudget {
            monthly_income: self
                .monthly_income
                .or(profile.map(|p| p.monthly_income))
                .unwrap_or(0.0),
            fixed_bills: self
                .fixed_bills
                .or(profile.map(|p| p.fixed_bills))
                .unwrap_or(0.0),
            savings_goal: self
                .savings_goal
                .or(profile.map(|p| p.savings_goal))
                .unwrap_or(0.0),
            currency: profile.map_or_else(
                || default_currency.to_string(),
                |p| p.preferred_currency.clone(),
            ),
        }
    }
}

async fn window_transactions(
    db: &DatabaseConnection,
    user_id: Uuid,
    days: i64,
) -> Result<Vec<transaction::Model>> {
    let since = (Utc::now() - Duration::days(days)).date_naive();
    transactions_since(db, user_id, since).await
}

#[derive(Debug, Default, Deserialize)]
struct PostedTransaction {
    #[serde(default)]
    merchant: Option<String>,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    transactions: Vec<PostedTransaction>,
    #[serde(flatten)]
    budget: BudgetOverrides,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    success: bool,
    advice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ChatResponse {
    fn failed(error: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            advice: None,
            duration: None,
            error: Some(error.into()),
        })
    }
}

/// Answers an advisor question with the user's figures as context.
#[instrument(skip(state, request))]
async fn chat(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(request): JsonBody<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let started = Instant::now();
    if request.message.trim().is_empty() {
        return Err(Error::validation("message is required"));
    }
    let Some(model) = state.model() else {
        return Ok(ChatResponse::failed("AI advisor is not configured"));
    };

    let (profile, stored, history) = tokio::try_join!(
        get_profile(&state.db, user_id),
        recent_transactions(&state.db, user_id, CHAT_CONTEXT_TRANSACTIONS as u64),
        recent_history(&state.db, user_id, HISTORY_TURNS),
    )?;
    let budget = request
        .budget
        .resolve(profile.as_ref(), state.default_currency());

    let total_spent: f64 = request
        .transactions
        .iter()
        .filter_map(|t| t.amount)
        .filter(|a| a.is_finite())
        .map(f64::abs)
        .sum();

    let mut lines: Vec<String> = request
        .transactions
        .iter()
        .map(|t| {
            format!(
                "- {}: {} ({})",
                t.merchant.as_deref().unwrap_or("Unknown"),
                format_money(t.amount.unwrap_or(0.0), &budget.currency),
                t.category.as_deref().unwrap_or("Other"),
            )
        })
        .collect();
    if lines.len() < CHAT_MIN_POSTED {
        let room = CHAT_CONTEXT_TRANSACTIONS.saturating_sub(lines.len());
        lines.extend(stored.iter().take(room).map(format_transaction_line));
    }

    let ctx = AdvisorContext {
        name: profile.as_ref().map(|p| p.name.clone()).unwrap_or_default(),
        monthly_income: budget.monthly_income,
        fixed_bills: budget.fixed_bills,
        savings_goal: budget.savings_goal,
        total_spent,
        currency: budget.currency,
        recent_transactions: lines,
        history: history
            .into_iter()
            .map(|m| match m.role.as_str() {
                "assistant" => ChatTurn::assistant(m.content),
                _ => ChatTurn::user(m.content),
            })
            .collect(),
    };

    match ask_advisor(model, &ctx, &request.message).await {
        Ok(advice) => {
            append_message(&state.db, user_id, Role::User, request.message.trim()).await?;
            append_message(&state.db, user_id, Role::Assistant, &advice).await?;
            Ok(Json(ChatResponse {
                success: true,
                advice: Some(advice),
                duration: Some(started.elapsed().as_millis()),
                error: None,
            }))
        }
        Err(e) => {
            warn!("Advisor request failed: {e}");
            Ok(ChatResponse::failed(e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct CategorizeRequest {
    merchant: String,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    description: Option<String>,
}

async fn categorize(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    JsonBody(request): JsonBody<CategorizeRequest>,
) -> Json<Value> {
    let result = match state.model() {
        Some(model) => {
            categorize_with_model(
                model,
                &request.merchant,
                request.amount.unwrap_or(0.0),
                request.description.as_deref(),
            )
            .await
        }
        None => Err(Error::NotConfigured {
            feature: "Categorization",
        }),
    };

    match result {
        Ok(category) => Json(json!({ "success": true, "category": category })),
        Err(e) => {
            warn!("Categorization failed: {e}");
            Json(json!({ "success": false, "category": Category::Other }))
        }
    }
}

async fn analyze_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(facts): JsonBody<TransactionFacts>,
) -> Result<Json<Value>> {
    let insight = match state.model() {
        Some(model) => {
            let recent =
                recent_transactions(&state.db, user_id, ANALYSIS_CONTEXT_TRANSACTIONS).await?;
            let lines: Vec<String> = recent.iter().map(format_transaction_line).collect();
            let currency = get_profile(&state.db, user_id).await?.map_or_else(
                || state.default_currency().to_string(),
                |p| p.preferred_currency,
            );
            analyze_with_model(model, &facts, &lines, &currency).await
        }
        None => TransactionInsight::default(),
    };

    Ok(Json(json!({ "success": true, "transaction_analysis": insight })))
}

#[derive(Debug, Deserialize)]
struct AnalyzeReceiptRequest {
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    image_base64: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReceiptResponse {
    success: bool,
    #[serde(flatten)]
    extraction: ReceiptExtraction,
    model: Option<String>,
}

async fn extract_receipt(state: &AppState, image: &[u8]) -> Json<ReceiptResponse> {
    let extraction = scan_receipt(state.model(), state.ocr.as_ref(), image).await;
    Json(ReceiptResponse {
        success: true,
        extraction,
        model: state.model().map(|m| m.name().to_string()),
    })
}

/// Extracts receipt fields from a URL or base64 image. Nothing is stored.
#[instrument(skip(state, request))]
async fn analyze_receipt(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    JsonBody(request): JsonBody<AnalyzeReceiptRequest>,
) -> Result<Json<ReceiptResponse>> {
    let base64 = request.image_base64.filter(|s| !s.trim().is_empty());
    let url = request.image_url.filter(|s| !s.trim().is_empty());

    let image = match (base64, url) {
        (Some(data), _) => decode_base64_image(&data)?,
        (None, Some(url)) => fetch_image(&state.http, &url).await?,
        (None, None) => return Err(Error::validation("Image URL or base64 required")),
    };

    Ok(extract_receipt(&state, &image).await)
}

async fn analyze_receipt_upload(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    multipart: Multipart,
) -> Result<Json<ReceiptResponse>> {
    let image = read_image_upload(multipart).await?;
    Ok(extract_receipt(&state, &image).await)
}

async fn financial_health(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Option<JsonBody<BudgetOverrides>>,
) -> Result<Json<Value>> {
    let overrides = body.map(|JsonBody(b)| b).unwrap_or_default();
    let profile = get_profile(&state.db, user_id).await?;
    let budget = overrides.resolve(profile.as_ref(), state.default_currency());

    let window = window_transactions(&state.db, user_id, ANALYSIS_WINDOW_DAYS).await?;
    let analysis = analyze_spending(&window);
    let health = detailed_health(
        &analysis,
        budget.monthly_income,
        budget.fixed_bills,
        budget.savings_goal,
    );

    Ok(Json(json!({ "success": true, "health_score": health })))
}

async fn health_score(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>> {
    let profile = require_profile(&state.db, user_id).await?;
    let window = window_transactions(&state.db, user_id, ANALYSIS_WINDOW_DAYS).await?;
    let total_spent = summarize(&window).total_spent;
    let score = ladder_score(total_spent, profile.monthly_income);

    Ok(Json(json!({
        "success": true,
        "score": score.score,
        "status": score.status,
        "spend_ratio": score.spend_ratio,
        "total_spent": total_spent,
        "monthly_income": profile.monthly_income,
    })))
}

async fn spending_insights(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Option<JsonBody<BudgetOverrides>>,
) -> Result<Json<Value>> {
    let overrides = body.map(|JsonBody(b)| b).unwrap_or_default();
    let profile = get_profile(&state.db, user_id).await?;
    let budget = overrides.resolve(profile.as_ref(), state.default_currency());

    let window = window_transactions(&state.db, user_id, ANALYSIS_WINDOW_DAYS).await?;
    let analysis = analyze_spending(&window);
    let advice = generate_advice(
        &analysis,
        budget.monthly_income,
        budget.fixed_bills,
        budget.savings_goal,
        &budget.currency,
    );

    Ok(Json(json!({ "success": true, "analysis": analysis, "advice": advice })))
}

async fn health_tips(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Option<JsonBody<BudgetOverrides>>,
) -> Result<Json<Value>> {
    let overrides = body.map(|JsonBody(b)| b).unwrap_or_default();
    let profile = get_profile(&state.db, user_id).await?;
    let budget = overrides.resolve(profile.as_ref(), state.default_currency());

    let window = window_transactions(&state.db, user_id, ANALYSIS_WINDOW_DAYS).await?;
    let tips: Vec<String> = compute_tips(
        &window,
        Budget {
            monthly_income: budget.monthly_income,
            fixed_bills: budget.fixed_bills,
            savings_goal: budget.savings_goal,
            currency: &budget.currency,
        },
    )
    .into_iter()
    .map(|t| t.message)
    .collect();

    Ok(Json(json!({ "success": true, "tips": tips })))
}

/// Sends a notification to the user's chat and reports the outcome.
async fn notify_user(state: &AppState, user_id: Uuid, notification: &Notification) -> Result<bool> {
    let Some(bot) = state.bot() else {
        warn!("Notification skipped: no bot token configured");
        return Ok(false);
    };
    let profile = require_profile(&state.db, user_id).await?;
    match send_to_profile(bot, &profile, notification).await {
        Ok(sent) => Ok(sent),
        Err(e) => {
            warn!(%user_id, "Notification failed: {e}");
            Ok(false)
        }
    }
}

#[derive(Debug, Deserialize)]
struct BudgetAlertParams {
    spent_amount: f64,
    budget_amount: f64,
}

async fn send_budget_alert(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathParam(category): PathParam<String>,
    QueryParams(params): QueryParams<BudgetAlertParams>,
) -> Result<Json<Value>> {
    let currency = require_profile(&state.db, user_id).await?.preferred_currency;
    let alert = budget_alert(&category, params.spent_amount, params.budget_amount, &currency);
    let success = notify_user(&state, user_id, &alert).await?;

    Ok(Json(json!({
        "success": success,
        "message": if success { "Budget alert sent" } else { "Failed to send alert" },
    })))
}

async fn send_health_notification(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>> {
    let profile = require_profile(&state.db, user_id).await?;
    let window = window_transactions(&state.db, user_id, ANALYSIS_WINDOW_DAYS).await?;
    let score = ladder_score(summarize(&window).total_spent, profile.monthly_income);
    let tip = compute_tips(
        &window,
        Budget {
            monthly_income: profile.monthly_income,
            fixed_bills: profile.fixed_bills,
            savings_goal: profile.savings_goal,
            currency: &profile.preferred_currency,
        },
    )
    .into_iter()
    .next()
    .map(|t| t.message);

    let notification = health_update(score.score, score.status, tip.as_deref());
    let success = notify_user(&state, user_id, &notification).await?;

    Ok(Json(json!({ "success": success, "tip": tip })))
}

async fn send_weekly_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>> {
    let profile = require_profile(&state.db, user_id).await?;
    let week = window_transactions(&state.db, user_id, WEEK_DAYS).await?;
    let summary = summarize(&week);

    let notification = weekly_summary(&summary, &profile.preferred_currency);
    let success = notify_user(&state, user_id, &notification).await?;

    #[allow(clippy::cast_precision_loss)]
    let avg_daily = summary.total_spent / WEEK_DAYS as f64;
    Ok(Json(json!({
        "success": success,
        "summary": {
            "total_spent": summary.total_spent,
            "avg_daily": avg_daily,
            "categories": summary.by_category,
        },
    })))
}

async fn telegram_settings(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>> {
    let chat_id = get_profile(&state.db, user_id)
        .await?
        .and_then(|p| p.telegram_chat_id);

    Ok(Json(json!({
        "success": true,
        "telegram_chat_id": chat_id,
        "notifications_enabled": chat_id.is_some(),
    })))
}

/// Only unlinking is accepted here; a chat is linked by redeeming its code.
#[derive(Debug, Deserialize)]
struct TelegramSettingsRequest {
    #[serde(default)]
    telegram_chat_id: Option<i64>,
}

async fn update_telegram_settings(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(request): JsonBody<TelegramSettingsRequest>,
) -> Result<Json<Value>> {
    if request.telegram_chat_id.is_some() {
        return Err(Error::validation(
            "Link a Telegram chat with the code from /start instead",
        ));
    }
    let profile = set_telegram_chat(&state.db, user_id, None, None).await?;
    info!(%user_id, linked = profile.telegram_connected, "Telegram settings updated");

    Ok(Json(json!({
        "success": true,
        "message": "Telegram settings updated successfully",
        "telegram_chat_id": profile.telegram_chat_id,
        "notifications_enabled": profile.telegram_connected,
    })))
}

async fn telegram_test(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>> {
    let notification = Notification {
        title: "🧪 Test notification".to_string(),
        message: "Your Telegram integration is working!".to_string(),
    };
    let success = notify_user(&state, user_id, &notification).await?;

    Ok(Json(json!({
        "success": success,
        "message": if success { "Test notification sent" } else { "Failed to send test notification" },
    })))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::{
        core::{chat_history::recent_history, profile::set_telegram_chat},
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_chat_records_history() {
        let app = TestApp::build(FakeModel::replying("Spend less on taxis."), FakeOcr::reading("")).await;
        let (token, user_id) = app.signup("ada@example.com").await;
        create_test_transaction(&app.state.db, user_id, 4000.0).await.unwrap();

        let (status, body) = app
            .post(
                "/api/ai/chat",
                Some(&token),
                json!({
                    "message": "How do I save more?",
                    "transactions": [{"merchant": "Bolt", "amount": -2500, "category": "Transport"}],
                    "monthlyIncome": 300000
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["advice"], "Spend less on taxis.");

        let request = app.model.last_request().unwrap();
        let system = request.system.unwrap();
        assert!(system.contains("Monthly income: ₦300,000"));
        assert!(system.contains("Spent recently: ₦2,500"));
        assert!(system.contains("- Bolt: -₦2,500 (Transport)"));
        assert!(system.contains("(Other)"));

        let history = recent_history(&app.state.db, user_id, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history
            .iter()
            .any(|m| m.role == "user" && m.content == "How do I save more?"));
        assert!(history
            .iter()
            .any(|m| m.role == "assistant" && m.content == "Spend less on taxis."));
    }

    #[tokio::test]
    async fn test_chat_provider_failure() {
        let app = TestApp::build(FakeModel::failing(), FakeOcr::reading("")).await;
        let (token, _) = app.signup("ada@example.com").await;

        let (status, body) = app
            .post("/api/ai/chat", Some(&token), json!({"message": "hello"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert!(body["advice"].is_null());
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_categorize() {
        let app = TestApp::build(FakeModel::replying("Entertainment"), FakeOcr::reading("")).await;
        let (token, _) = app.signup("ada@example.com").await;
        let (_, body) = app
            .post("/api/ai/categorize", Some(&token), json!({"merchant": "Netflix"}))
            .await;
        assert_eq!(body, json!({"success": true, "category": "Entertainment"}));

        let app = TestApp::build(FakeModel::failing(), FakeOcr::reading("")).await;
        let (token, _) = app.signup("ada@example.com").await;
        let (_, body) = app
            .post("/api/ai/categorize", Some(&token), json!({"merchant": "Netflix"}))
            .await;
        assert_eq!(body, json!({"success": false, "category": "Other"}));
    }

    #[tokio::test]
    async fn test_analyze_transaction_default() {
        let app = TestApp::build(FakeModel::replying("not json"), FakeOcr::reading("")).await;
        let (token, _) = app.signup("ada@example.com").await;
        let (status, body) = app
            .post(
                "/api/ai/analyze-transaction",
                Some(&token),
                json!({"merchant": "Spar", "amount": 12000, "category": "Food"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transaction_analysis"]["risk_level"], "medium");
        assert_eq!(
            body["transaction_analysis"]["insight"],
            "Transaction recorded successfully"
        );
    }

    #[tokio::test]
    async fn test_analyze_receipt() {
        let app = TestApp::build(
            FakeModel::replying(r#"{"merchant": "Spar", "amount": 5600, "category": "Food"}"#),
            FakeOcr::reading("SPAR TOTAL 5600"),
        )
        .await;
        let (token, user_id) = app.signup("ada@example.com").await;

        let (status, _) = app.post("/api/ai/analyze-receipt", Some(&token), json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .post(
                "/api/ai/analyze-receipt",
                Some(&token),
                json!({"image_base64": "data:image/png;base64,aGVsbG8="}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["merchant"], "Spar");
        assert_eq!(body["amount"], 5600.0);
        assert_eq!(body["model"], "fake-model");

        let (status, body) = app
            .upload("/api/ai/analyze-receipt-upload", &token, "image/jpeg", b"jpeg")
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "Food");

        let stored = crate::core::transaction::all_transactions(&app.state.db, user_id)
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_health_score_ladder() {
        let app = TestApp::new().await;
        let (token, user_id) = app.signup("ada@example.com").await;

        let (_, body) = app.get("/api/ai/health-score", Some(&token)).await;
        assert_eq!(body["score"], 0);
        assert_eq!(body["status"], "No Income Set");

        app.put("/api/auth/profile", Some(&token), json!({"monthly_income": 100000.0}))
            .await;
        create_test_transaction(&app.state.db, user_id, 25000.0).await.unwrap();

        let (status, body) = app.get("/api/ai/health-score", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 80);
        assert_eq!(body["status"], "Very Good");
    }

    #[tokio::test]
    async fn test_financial_health_and_insights() {
        let app = TestApp::new().await;
        let (token, user_id) = app.signup("ada@example.com").await;
        create_test_transaction(&app.state.db, user_id, 10000.0).await.unwrap();

        let (status, body) = app
            .post(
                "/api/ai/financial-health",
                Some(&token),
                json!({"monthly_income": 200000, "fixed_bills": 50000, "savings_goal": 20000}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["health_score"]["score"].as_u64().unwrap() <= 100);
        assert!(body["health_score"]["grade"].is_string());

        let (status, body) = app
            .post("/api/ai/spending-insights", Some(&token), json!({"monthlyIncome": 200000}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["total_transactions"], 1);
        assert!(body["advice"]["budget_status"].is_string());

        let (status, body) = app.post("/api/ai/health-tips", Some(&token), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let tips = body["tips"].as_array().unwrap();
        assert!(!tips.is_empty() && tips.len() <= 6);
        assert!(tips.iter().all(|t| t.as_str().is_some_and(|s| !s.is_empty())));
    }

    #[tokio::test]
    async fn test_notifications_need_linked_chat() {
        let app = TestApp::new().await;
        let (token, user_id) = app.signup("ada@example.com").await;

        let (status, body) = app
            .post(
                "/api/ai/send-budget-alert/Food?spent_amount=95&budget_amount=100",
                Some(&token),
                json!({}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert!(app.bot.sent().is_empty());

        set_telegram_chat(&app.state.db, user_id, Some(4242), None).await.unwrap();
        let (_, body) = app
            .post(
                "/api/ai/send-budget-alert/Food?spent_amount=95&budget_amount=100",
                Some(&token),
                json!({}),
            )
            .await;
        assert_eq!(body["success"], true);

        let (_, body) = app.post("/api/ai/send-weekly-summary", Some(&token), json!({})).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["summary"]["total_spent"], 0.0);

        let (_, body) = app.post("/api/ai/telegram/test", Some(&token), json!({})).await;
        assert_eq!(body["success"], true);

        let sent = app.bot.sent();
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|(chat, _)| *chat == 4242));
        assert!(sent[0].1.contains("Budget alert: Food"));
    }

    #[tokio::test]
    async fn test_telegram_settings() {
        let app = TestApp::new().await;
        let (token, user_id) = app.signup("ada@example.com").await;

        let (_, body) = app.get("/api/ai/telegram/settings", Some(&token)).await;
        assert_eq!(body["notifications_enabled"], false);

        let (status, _) = app
            .post("/api/ai/telegram/settings", Some(&token), json!({"telegram_chat_id": 777}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (_, body) = app.get("/api/ai/telegram/settings", Some(&token)).await;
        assert_eq!(body["notifications_enabled"], false);
        assert!(body["telegram_chat_id"].is_null());

        set_telegram_chat(&app.state.db, user_id, Some(4242), None).await.unwrap();
        let (_, body) = app.get("/api/ai/telegram/settings", Some(&token)).await;
        assert_eq!(body["telegram_chat_id"], 4242);

        let (status, body) = app
            .post("/api/ai/telegram/settings", Some(&token), json!({"telegram_chat_id": null}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notifications_enabled"], false);
        let (_, body) = app.get("/api/ai/telegram/settings", Some(&token)).await;
        assert_eq!(body["notifications_enabled"], false);
    }
}
