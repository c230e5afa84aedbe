//! Transaction business logic - Handles all transaction-related operations.
//!
//! Every query is scoped to the owning user: a transaction id that belongs to
//! someone else behaves exactly like one that does not exist. Amounts must be
//! positive and finite, categories come from the fixed list, and currency
//! codes are three upper-case letters.

use crate::{
    core::{category::Category, profile::normalize_currency},
    entities::{Transaction, TransactionColumn, transaction},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, IntoActiveModel, QueryOrder, QuerySelect, Set, prelude::*};
use tracing::{debug, instrument};

/// Maximum page size for listings.
pub const MAX_PAGE_SIZE: u64 = 1000;
/// Page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 100;
/// Longest accepted merchant name.
pub const MAX_MERCHANT_LEN: usize = 200;

/// Where a transaction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Entered in the dashboard form
    Manual,
    /// Extracted from a receipt image
    Receipt,
    /// Sent as a Telegram message
    Telegram,
}

impl Source {
    /// Stored name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Receipt => "receipt",
            Self::Telegram => "telegram",
        }
    }
}

/// Data for a new transaction before validation.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Merchant name, trimmed before storing
    pub merchant: String,
    /// Amount spent
    pub amount: f64,
    /// Category name; `Other` when missing
    pub category: Option<String>,
    /// Currency code; the default currency when missing or malformed
    pub currency: Option<String>,
    /// Optional note
    pub description: Option<String>,
    /// Day of purchase; today when missing
    pub date: Option<NaiveDate>,
    /// Origin of the entry
    pub source: Source,
    /// Whether the category was picked by the language model
    pub ai_categorized: bool,
}

impl NewTransaction {
    /// A manual entry with only the required fields set.
    #[must_use]
    pub fn manual(merchant: impl Into<String>, amount: f64) -> Self {
        Self {
            merchant: merchant.into(),
            amount,
            category: None,
            currency: None,
            description: None,
            date: None,
            source: Source::Manual,
            ai_categorized: false,
        }
    }
}

/// Partial transaction update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    /// New merchant
    pub merchant: Option<String>,
    /// New amount
    pub amount: Option<f64>,
    /// New category
    pub category: Option<String>,
    /// New currency; ignored unless it is a valid code
    pub currency: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New date
    pub date: Option<NaiveDate>,
}

impl TransactionUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.merchant.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.currency.is_none()
            && self.description.is_none()
            && self.date.is_none()
    }
}

/// Rejects zero, negative, and non-finite amounts.
pub fn validate_amount(amount: f64) -> Result<f64> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount { amount })
    }
}

fn validate_merchant(merchant: &str) -> Result<String> {
    let merchant = merchant.trim();
    if merchant.is_empty() {
        return Err(Error::validation("merchant is required"));
    }
    Ok(merchant.chars().take(MAX_MERCHANT_LEN).collect())
}

fn validate_category(category: Option<&str>) -> Result<Category> {
    match category.map(str::trim) {
        None | Some("") => Ok(Category::Other),
        Some(name) => name.parse(),
    }
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Parses a date given as `YYYY-MM-DD` or a longer ISO timestamp.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let day: String = value.trim().chars().take(10).collect();
    NaiveDate::parse_from_str(&day, "%Y-%m-%d")
        .map_err(|_| Error::validation(format!("Invalid date '{value}', expected YYYY-MM-DD")))
}

/// Validates and stores a new transaction for `user_id`.
///
/// # Arguments
/// * `user_id` - Owner of the transaction
/// * `new` - Unvalidated transaction data
/// * `default_currency` - Used when `new.currency` is missing or malformed
#[instrument(skip(db, new), fields(amount = new.amount, source = new.source.as_str()))]
pub async fn create_transaction<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    new: NewTransaction,
    default_currency: &str,
) -> Result<transaction::Model> {
    let amount = validate_amount(new.amount)?;
    let merchant = validate_merchant(&new.merchant)?;
    let category = validate_category(new.category.as_deref())?;
    let currency = new
        .currency
        .as_deref()
        .and_then(normalize_currency)
        .unwrap_or_else(|| default_currency.to_string());

    let now = chrono::Utc::now();
    let model = transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        merchant: Set(merchant),
        amount: Set(amount),
        category: Set(category.to_string()),
        currency: Set(currency),
        description: Set(clean_description(new.description)),
        date: Set(new.date.unwrap_or_else(|| now.date_naive())),
        source: Set(new.source.as_str().to_string()),
        ai_categorized: Set(new.ai_categorized),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = model.insert(db).await?;
    debug!(transaction_id = %created.id, "Transaction created");
    Ok(created)
}

/// Lists a user's transactions, newest first.
///
/// `limit` defaults to [`DEFAULT_PAGE_SIZE`] and must be within 1..=[`MAX_PAGE_SIZE`].
pub async fn list_transactions(
    db: &DatabaseConnection,
    user_id: Uuid,
    limit: Option<u64>,
    offset: Option<u64>,
) -> Result<Vec<transaction::Model>> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(Error::validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    Transaction::find()
        .filter(TransactionColumn::UserId.eq(user_id))
        .order_by_desc(TransactionColumn::CreatedAt)
        .limit(limit)
        .offset(offset.unwrap_or(0))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns up to `limit` of a user's most recent transactions.
pub async fn recent_transactions<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    limit: u64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(TransactionColumn::UserId.eq(user_id))
        .order_by_desc(TransactionColumn::CreatedAt)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns all of a user's transactions dated on or after `since`.
pub async fn transactions_since(
    db: &DatabaseConnection,
    user_id: Uuid,
    since: NaiveDate,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(TransactionColumn::UserId.eq(user_id))
        .filter(TransactionColumn::Date.gte(since))
        .order_by_desc(TransactionColumn::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns every transaction of a user.
pub async fn all_transactions(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(TransactionColumn::UserId.eq(user_id))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one of a user's transactions.
///
/// Returns `None` both for unknown ids and for ids owned by another user.
pub async fn get_transaction(
    db: &DatabaseConnection,
    user_id: Uuid,
    transaction_id: Uuid,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .filter(TransactionColumn::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial update to one of a user's transactions.
#[instrument(skip(db, update))]
pub async fn update_transaction(
    db: &DatabaseConnection,
    user_id: Uuid,
    transaction_id: Uuid,
    update: TransactionUpdate,
) -> Result<transaction::Model> {
    if update.is_empty() {
        return Err(Error::validation("No fields to update"));
    }

    let existing = get_transaction(db, user_id, transaction_id)
        .await?
        .ok_or(Error::NotFound {
            resource: "Transaction",
        })?;
    let mut active = existing.into_active_model();

    if let Some(merchant) = update.merchant {
        active.merchant = Set(validate_merchant(&merchant)?);
    }
    if let Some(amount) = update.amount {
        active.amount = Set(validate_amount(amount)?);
    }
    if let Some(category) = update.category {
        active.category = Set(validate_category(Some(&category))?.to_string());
    }
    if let Some(currency) = update.currency.as_deref().and_then(normalize_currency) {
        active.currency = Set(currency);
    }
    if update.description.is_some() {
        active.description = Set(clean_description(update.description));
    }
    if let Some(date) = update.date {
        active.date = Set(date);
    }
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await.map_err(Into::into)
}

/// Deletes one of a user's transactions.
#[instrument(skip(db))]
pub async fn delete_transaction(
    db: &DatabaseConnection,
    user_id: Uuid,
    transaction_id: Uuid,
) -> Result<()> {
    let result = Transaction::delete_many()
        .filter(TransactionColumn::Id.eq(transaction_id))
        .filter(TransactionColumn::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            resource: "Transaction",
        });
    }
    Ok(())
}
