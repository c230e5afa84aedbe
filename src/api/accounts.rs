//! `/api/auth`: signup, login, logout and the caller's profile.

use super::{
    AppState,
    extract::{AuthUser, JsonBody},
};
use crate::{
    core::{
        account::{login as check_credentials, signup as create_account},
        profile::{ProfileUpdate, require_profile, update_profile},
        token::IssuedToken,
    },
    entities::profile,
    errors::Result,
};
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument};

/// Routes nested under `/api/auth`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/profile", get(get_profile).put(put_profile))
}

#[derive(Debug, Deserialize)]
struct SignupRequest {
    email: String,
    password: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthUserInfo {
    id: String,
    email: String,
    name: String,
    telegram_connected: bool,
}

impl From<&profile::Model> for AuthUserInfo {
    fn from(profile: &profile::Model) -> Self {
        Self {
            id: profile.id.to_string(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            telegram_connected: profile.telegram_connected,
        }
    }
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    success: bool,
    message: &'static str,
    user: AuthUserInfo,
    session: IssuedToken,
}

#[instrument(skip(state, request), fields(email = %request.email))]
async fn signup(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SignupRequest>,
) -> Result<Json<AuthResponse>> {
    let (account, profile) = create_account(
        &state.db,
        &request.email,
        &request.password,
        request.name.as_deref(),
        state.default_currency(),
    )
    .await?;
    let session = state.tokens.issue(account.id, &account.email)?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Signup successful",
        user: AuthUserInfo::from(&profile),
        session,
    }))
}

#[instrument(skip(state, request), fields(email = %request.email))]
async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let (account, profile) = check_credentials(&state.db, &request.email, &request.password).await?;
    let session = state.tokens.issue(account.id, &account.email)?;
    info!(user_id = %account.id, "Login successful");

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful",
        user: AuthUserInfo::from(&profile),
        session,
    }))
}

/// Tokens are stateless; the client drops its copy.
async fn logout() -> Json<Value> {
    Json(json!({ "success": true, "message": "Logout successful" }))
}

async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<profile::Model>> {
    require_profile(&state.db, user_id).await.map(Json)
}

async fn put_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Json<Value>> {
    let profile = update_profile(&state.db, user_id, update).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated",
        "profile": profile,
    })))
}
