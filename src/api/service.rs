//! Service endpoints: root, health and status.

use super::AppState;
use crate::config::database::ping;
use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};
use tracing::error;

const SERVICE_NAME: &str = "Sentinel Backend";

/// `/`, `/api/health` and `/api/status`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/status", get(status))
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/api/health",
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match ping(&state.db).await {
        Ok(()) => "connected",
        Err(e) => {
            error!("Database health check failed: {e}");
            "error"
        }
    };

    Json(json!({
        "status": if database == "connected" { "ok" } else { "degraded" },
        "message": "Backend is running",
        "environment": state.settings.environment.as_str(),
        "database": database,
    }))
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    let database = match ping(&state.db).await {
        Ok(()) => json!({ "status": "connected" }),
        Err(e) => json!({ "status": "error", "error": e.to_string() }),
    };

    let ocr = match state.ocr.version().await {
        Some(version) => json!({ "status": "available", "tesseract_version": version }),
        None => json!({ "status": "unavailable" }),
    };

    let ai = match state.model() {
        Some(model) => json!({ "status": "configured", "model": model.name() }),
        None => json!({ "status": "missing" }),
    };

    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.settings.environment.as_str(),
        "port": state.settings.server.port,
        "database": database,
        "ocr": ocr,
        "ai_model": ai,
        "telegram": { "configured": state.bot.is_some() },
    }))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::test_utils::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_root_and_health() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "Sentinel Backend");

        let (status, body) = app.get("/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_status_reports_components() {
        let app = TestApp::new().await;
        let (status, body) = app.get("/api/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ocr"]["tesseract_version"], "fake 1.0");
        assert_eq!(body["ai_model"]["model"], "fake-model");
        assert_eq!(body["telegram"]["configured"], true);
    }
}
