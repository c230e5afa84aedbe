//! Profile business logic.
//!
//! Budget figures (income, bills, savings goal), the preferred currency and
//! the Telegram chat a user has linked.

use crate::{
    entities::{Profile, ProfileColumn, profile},
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, IntoActiveModel, Set, prelude::*};
use serde::Deserialize;
use tracing::instrument;

/// Partial profile update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    /// New display name
    pub name: Option<String>,
    /// New monthly income
    pub monthly_income: Option<f64>,
    /// New fixed bills
    pub fixed_bills: Option<f64>,
    /// New savings goal
    pub savings_goal: Option<f64>,
    /// New preferred currency code
    pub preferred_currency: Option<String>,
}

impl ProfileUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.monthly_income.is_none()
            && self.fixed_bills.is_none()
            && self.savings_goal.is_none()
            && self.preferred_currency.is_none()
    }
}

/// Validates a budget figure: finite and not negative.
pub fn validate_budget_figure(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::validation(format!(
            "{field} must be a non-negative number"
        )))
    }
}

/// Normalizes a currency code: three ASCII letters, upper-cased.
#[must_use]
pub fn normalize_currency(code: &str) -> Option<String> {
    let code = code.trim();
    (code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()))
        .then(|| code.to_ascii_uppercase())
}

/// Looks up a user's profile.
pub async fn get_profile<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Option<profile::Model>> {
    Profile::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Looks up a user's profile, failing with `NotFound` when missing.
pub async fn require_profile<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<profile::Model> {
    get_profile(db, user_id).await?.ok_or(Error::NotFound {
        resource: "Profile",
    })
}

/// Finds the profile linked to a Telegram chat.
pub async fn find_by_telegram_chat<C: ConnectionTrait>(
    db: &C,
    chat_id: i64,
) -> Result<Option<profile::Model>> {
    Profile::find()
        .filter(ProfileColumn::TelegramChatId.eq(chat_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial update to a profile.
#[instrument(skip(db))]
pub async fn update_profile(
    db: &DatabaseConnection,
    user_id: Uuid,
    update: ProfileUpdate,
) -> Result<profile::Model> {
    if update.is_empty() {
        return Err(Error::validation("No fields to update"));
    }

    let mut active = require_profile(db, user_id).await?.into_active_model();

    if let Some(name) = update.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("name cannot be empty"));
        }
        active.name = Set(name.to_string());
    }
    if let Some(income) = update.monthly_income {
        active.monthly_income = Set(validate_budget_figure("monthly_income", income)?);
    }
    if let Some(bills) = update.fixed_bills {
        active.fixed_bills = Set(validate_budget_figure("fixed_bills", bills)?);
    }
    if let Some(goal) = update.savings_goal {
        active.savings_goal = Set(validate_budget_figure("savings_goal", goal)?);
    }
    if let Some(currency) = update.preferred_currency {
        let currency = normalize_currency(&currency)
            .ok_or_else(|| Error::validation("preferred_currency must be a 3-letter code"))?;
        active.preferred_currency = Set(currency);
    }
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await.map_err(Into::into)
}

/// Sets or clears the Telegram chat linked to a profile.
///
/// Fails with `Conflict` when the chat is already linked to another user.
#[instrument(skip(db))]
pub async fn set_telegram_chat<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    chat_id: Option<i64>,
    username: Option<String>,
) -> Result<profile::Model> {
    if let Some(chat_id) = chat_id {
        if let Some(owner) = find_by_telegram_chat(db, chat_id).await? {
            if owner.id != user_id {
                return Err(Error::Conflict {
                    message: "This Telegram chat is linked to another account".to_string(),
                });
            }
        }
    }

    let mut active = require_profile(db, user_id).await?.into_active_model();
    active.telegram_chat_id = Set(chat_id);
    active.telegram_connected = Set(chat_id.is_some());
    active.telegram_username = Set(if chat_id.is_some() { username } else { None });
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_normalize_currency() {
        assert_eq!(normalize_currency("ngn").as_deref(), Some("NGN"));
        assert_eq!(normalize_currency(" usd ").as_deref(), Some("USD"));
        assert!(normalize_currency("US").is_none());
        assert!(normalize_currency("US1").is_none());
        assert!(normalize_currency("EURO").is_none());
    }

    #[tokio::test]
    async fn test_update_profile() -> Result<()> {
        let (db, user) = setup_with_user().await?;

        let update = ProfileUpdate {
            monthly_income: Some(500_000.0),
            savings_goal: Some(50_000.0),
            preferred_currency: Some("usd".to_string()),
            ..Default::default()
        };
        let updated = update_profile(&db, user.id, update).await?;

        assert_eq!(updated.monthly_income, 500_000.0);
        assert_eq!(updated.savings_goal, 50_000.0);
        assert_eq!(updated.fixed_bills, 0.0);
        assert_eq!(updated.preferred_currency, "USD");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_profile_rejects_empty_and_negative() -> Result<()> {
        let (db, user) = setup_with_user().await?;

        let empty = update_profile(&db, user.id, ProfileUpdate::default()).await;
        assert!(matches!(empty, Err(Error::Validation { .. })));

        let negative = ProfileUpdate {
            fixed_bills: Some(-1.0),
            ..Default::default()
        };
        let result = update_profile(&db, user.id, negative).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_profile() -> Result<()> {
        let db = setup_test_db().await?;
        let update = ProfileUpdate {
            name: Some("Ghost".to_string()),
            ..Default::default()
        };
        let result = update_profile(&db, Uuid::new_v4(), update).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_telegram_chat() -> Result<()> {
        let db = setup_test_db().await?;
        let ada = create_test_user(&db, "ada@example.com").await?;
        let bob = create_test_user(&db, "bob@example.com").await?;

        let linked = set_telegram_chat(&db, ada.id, Some(4242), Some("ada".to_string())).await?;
        assert!(linked.telegram_connected);
        assert_eq!(linked.telegram_chat_id, Some(4242));

        let found = find_by_telegram_chat(&db, 4242).await?.unwrap();
        assert_eq!(found.id, ada.id);

        let taken = set_telegram_chat(&db, bob.id, Some(4242), None).await;
        assert!(matches!(taken, Err(Error::Conflict { .. })));

        let cleared = set_telegram_chat(&db, ada.id, None, Some("ignored".to_string())).await?;
        assert!(!cleared.telegram_connected);
        assert!(cleared.telegram_username.is_none());
        Ok(())
    }
}
