//! `/api/transactions`: CRUD, stats and receipt upload.

use super::{
    AppState,
    extract::{AuthUser, JsonBody, PathParam, QueryParams, read_image_upload},
};
use crate::{
    core::{
        profile::get_profile,
        report::{SpendingSummary, spending_summary},
        transaction::{
            NewTransaction, Source, TransactionUpdate, create_transaction, delete_transaction,
            get_transaction, list_transactions, parse_date, update_transaction,
        },
    },
    entities::transaction,
    errors::{Error, Result},
    receipt::scan_receipt,
};
use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::{get, post},
};
use sea_orm::prelude::Uuid;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument};

/// Routes nested under `/api/transactions`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/stats/summary", get(stats))
        .route("/receipt-upload", post(receipt_upload))
        .route("/:id", get(fetch).put(update).delete(remove))
}

#[derive(Debug, Deserialize)]
struct Page {
    limit: Option<u64>,
    offset: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CreateRequest {
    merchant: String,
    amount: f64,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    merchant: Option<String>,
    amount: Option<f64>,
    category: Option<String>,
    description: Option<String>,
    date: Option<String>,
    currency: Option<String>,
}

fn optional_date(date: Option<&str>) -> Result<Option<chrono::NaiveDate>> {
    date.map(str::trim)
        .filter(|d| !d.is_empty())
        .map(parse_date)
        .transpose()
}

async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    QueryParams(page): QueryParams<Page>,
) -> Result<Json<Vec<transaction::Model>>> {
    list_transactions(&state.db, user_id, page.limit, page.offset)
        .await
        .map(Json)
}

#[instrument(skip(state, request))]
async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(request): JsonBody<CreateRequest>,
) -> Result<Json<Value>> {
    let new = NewTransaction {
        category: request.category,
        currency: request.currency,
        description: request.description,
        date: optional_date(request.date.as_deref())?,
        ..NewTransaction::manual(request.merchant, request.amount)
    };
    let created = create_transaction(&state.db, user_id, new, state.default_currency()).await?;

    Ok(Json(json!({ "success": true, "transaction": created })))
}

async fn fetch(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<transaction::Model>> {
    get_transaction(&state.db, user_id, id)
        .await?
        .map(Json)
        .ok_or(Error::NotFound {
            resource: "Transaction",
        })
}

async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(request): JsonBody<UpdateRequest>,
) -> Result<Json<Value>> {
    let update = TransactionUpdate {
        merchant: request.merchant,
        amount: request.amount,
        category: request.category,
        currency: request.currency,
        description: request.description,
        date: optional_date(request.date.as_deref())?,
    };
    let updated = update_transaction(&state.db, user_id, id, update).await?;

    Ok(Json(json!({ "success": true, "transaction": updated })))
}

async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<Value>> {
    delete_transaction(&state.db, user_id, id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Transaction deleted successfully",
    })))
}

async fn stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SpendingSummary>> {
    spending_summary(&state.db, user_id).await.map(Json)
}

/// Scans an uploaded receipt and stores it as a transaction.
#[instrument(skip(state, multipart))]
async fn receipt_upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<Json<Value>> {
    let image = read_image_upload(multipart).await?;
    let extraction = scan_receipt(state.model(), state.ocr.as_ref(), &image).await;
    if extraction.amount <= 0.0 {
        return Err(Error::validation(
            "Could not read a total from the receipt. Please enter the transaction manually",
        ));
    }

    let default_currency = get_profile(&state.db, user_id)
        .await?
        .map_or_else(|| state.default_currency().to_string(), |p| p.preferred_currency);

    let new = NewTransaction {
        merchant: extraction.merchant.clone(),
        amount: extraction.amount,
        category: Some(extraction.category.to_string()),
        currency: Some(extraction.currency.clone()),
        description: Some(extraction.description.clone()),
        // Receipt dates are free text; an unreadable one means today.
        date: extraction.date.as_deref().and_then(|d| parse_date(d).ok()),
        source: Source::Receipt,
        ai_categorized: true,
    };
    let created = create_transaction(&state.db, user_id, new, &default_currency).await?;
    info!(transaction_id = %created.id, "Receipt stored");

    Ok(Json(json!({
        "success": true,
        "transaction": created,
        "extracted_data": extraction,
    })))
}
