//! `/api/telegram`: webhook, account linking and webhook management.

use super::{
    AppState,
    extract::{AuthUser, JsonBody, PathParam},
};
use crate::{
    core::{profile::find_by_telegram_chat, telegram_link::redeem_code},
    errors::{Error, Result},
    telegram::{BotApi, Update, webhook::handle_update},
};
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};

/// Path the webhook is served on, relative to the public base URL.
pub const WEBHOOK_PATH: &str = "/api/telegram/webhook";

const LINKED_MESSAGE: &str = "✅ Your Sentinel account is now linked! \
    Send me expenses like \"Lunch 2500\" or ask me anything about your budget.";

/// Routes nested under `/api/telegram`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/verify", get(verify))
        .route("/webhook", post(webhook))
        .route("/link-with-code", post(link_with_code))
        .route("/check-link/:telegram_id", get(check_link))
        .route("/setup-webhook", post(setup_webhook))
        .route("/webhook-info", get(webhook_info))
}

fn require_bot(state: &AppState) -> Result<&dyn BotApi> {
    state.bot().ok_or(Error::NotConfigured { feature: "Telegram" })
}

/// Reports whether the bot token works. Telegram is optional, so a missing
/// or broken token is not an error.
async fn verify(State(state): State<AppState>) -> Json<Value> {
    let Some(bot) = state.bot() else {
        return Json(json!({
            "verified": false,
            "optional": true,
            "message": "Telegram bot token not configured",
        }));
    };

    match bot.get_me().await {
        Ok(me) => Json(json!({
            "verified": true,
            "optional": false,
            "bot": me["first_name"],
            "username": me["username"],
        })),
        Err(e) => {
            warn!("Telegram getMe failed: {e}");
            Json(json!({
                "verified": false,
                "optional": true,
                "message": "Telegram bot token could not be verified",
            }))
        }
    }
}

/// Handles one update. Always answers 200 so Telegram does not redeliver.
#[instrument(skip(state, update), fields(update_id = update.update_id))]
async fn webhook(State(state): State<AppState>, JsonBody(update): JsonBody<Update>) -> Json<Value> {
    if let Err(e) = handle_update(state.webhook_context(), &update).await {
        error!("Webhook update failed: {e}");
    }
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct LinkRequest {
    code: String,
}

#[instrument(skip(state, request))]
async fn link_with_code(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(request): JsonBody<LinkRequest>,
) -> Result<Json<Value>> {
    let (link, profile) = match redeem_code(&state.db, user_id, &request.code).await {
        Ok(linked) => linked,
        Err(e @ (Error::Validation { .. } | Error::Conflict { .. })) => {
            return Ok(Json(json!({ "success": false, "error": e.to_string() })));
        }
        Err(e) => return Err(e),
    };

    if let Some(bot) = state.bot() {
        if let Err(e) = bot.send_message(link.telegram_id, LINKED_MESSAGE).await {
            warn!(telegram_id = link.telegram_id, "Link confirmation not delivered: {e}");
        }
    }

    Ok(Json(json!({
        "success": true,
        "message": "Telegram linked successfully ✅",
        "telegram_id": link.telegram_id,
        "telegram_username": profile.telegram_username,
    })))
}

async fn check_link(
    State(state): State<AppState>,
    PathParam(telegram_id): PathParam<i64>,
) -> Result<Json<Value>> {
    let linked = find_by_telegram_chat(&state.db, telegram_id).await?.is_some();
    Ok(Json(json!({ "linked": linked })))
}

fn describe_webhook(info: &Value) -> Value {
    json!({
        "url": info["url"],
        "pending_updates": info["pending_update_count"].as_i64().unwrap_or(0),
        "last_error": info["last_error_message"],
    })
}

/// Registers `<webhook_base_url>/api/telegram/webhook` with Telegram.
async fn setup_webhook(State(state): State<AppState>) -> Result<Json<Value>> {
    let bot = require_bot(&state)?;
    let base = state
        .settings
        .telegram
        .webhook_base_url
        .as_deref()
        .map(|url| url.trim_end_matches('/'))
        .filter(|url| !url.is_empty())
        .ok_or(Error::NotConfigured {
            feature: "Webhook base URL",
        })?;
    let webhook_url = format!("{base}{WEBHOOK_PATH}");

    bot.set_webhook(&webhook_url).await?;
    let info = bot.get_webhook_info().await?;
    info!(%webhook_url, "Telegram webhook registered");

    Ok(Json(json!({
        "success": true,
        "webhook_url": webhook_url,
        "webhook_info": describe_webhook(&info),
    })))
}

async fn webhook_info(State(state): State<AppState>) -> Result<Json<Value>> {
    let bot = require_bot(&state)?;
    let info = bot.get_webhook_info().await?;
    let configured = info["url"].as_str().is_some_and(|url| !url.is_empty());

    Ok(Json(json!({
        "configured": configured,
        "webhook": describe_webhook(&info),
    })))
}
