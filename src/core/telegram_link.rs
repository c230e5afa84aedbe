//! Telegram link codes.
//!
//! `/start` in the bot creates a pending link with a six-digit code. The user
//! types the code into the dashboard, which redeems it: the link is marked
//! verified and the chat id is written to the profile in one transaction.

use crate::{
    core::profile::set_telegram_chat,
    entities::{TelegramLink, TelegramLinkColumn, profile, telegram_link},
    errors::{Error, Result},
};
use chrono::{Duration, Utc};
use rand::Rng;
use sea_orm::{ConnectionTrait, IntoActiveModel, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// How long a link code stays valid.
pub const LINK_CODE_TTL_MINUTES: i64 = 10;

/// Codes shorter than this are rejected without a lookup.
const MIN_CODE_LEN: usize = 4;

/// Generates a zero-padded six-digit code.
#[must_use]
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:06}")
}

/// Whether a message looks like a bare link code.
#[must_use]
pub fn looks_like_code(text: &str) -> bool {
    text.len() == 6 && text.chars().all(|c| c.is_ascii_digit())
}

/// State of a code presented by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeStatus {
    /// Pending and unexpired
    Valid(telegram_link::Model),
    /// Was pending but expired; the link has been removed
    Expired,
    /// No pending link carries this code
    Unknown,
}

/// Stores a pending link for a chat and returns it with its fresh code.
///
/// Earlier pending links for the same chat are discarded.
#[instrument(skip(db))]
pub async fn create_pending_link(
    db: &DatabaseConnection,
    telegram_id: i64,
    username: Option<String>,
) -> Result<telegram_link::Model> {
    TelegramLink::delete_many()
        .filter(TelegramLinkColumn::TelegramId.eq(telegram_id))
        .filter(TelegramLinkColumn::Verified.eq(false))
        .exec(db)
        .await?;

    let now = Utc::now();
    telegram_link::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(None),
        telegram_id: Set(telegram_id),
        username: Set(username),
        verified: Set(false),
        verification_code: Set(Some(generate_code())),
        expires_at: Set(now + Duration::minutes(LINK_CODE_TTL_MINUTES)),
        created_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Looks up a pending code. Expired links are deleted as a side effect.
pub async fn check_code<C: ConnectionTrait>(db: &C, code: &str) -> Result<CodeStatus> {
    let Some(link) = TelegramLink::find()
        .filter(TelegramLinkColumn::VerificationCode.eq(code))
        .filter(TelegramLinkColumn::Verified.eq(false))
        .one(db)
        .await?
    else {
        return Ok(CodeStatus::Unknown);
    };

    if link.expires_at < Utc::now() {
        TelegramLink::delete_by_id(link.id).exec(db).await?;
        return Ok(CodeStatus::Expired);
    }

    Ok(CodeStatus::Valid(link))
}

/// Redeems a link code for `user_id`.
///
/// Returns the verified link and the updated profile. Invalid, unknown and
/// expired codes are `Validation` errors.
#[instrument(skip(db))]
pub async fn redeem_code(
    db: &DatabaseConnection,
    user_id: Uuid,
    code: &str,
) -> Result<(telegram_link::Model, profile::Model)> {
    let code = code.trim().to_uppercase();
    if code.len() < MIN_CODE_LEN {
        return Err(Error::validation("Invalid code"));
    }

    let txn = db.begin().await?;

    let link = match check_code(&txn, &code).await? {
        CodeStatus::Valid(link) => link,
        CodeStatus::Expired => {
            txn.commit().await?;
            return Err(Error::validation(
                "Code expired. Send /start to the bot for a new code",
            ));
        }
        CodeStatus::Unknown => {
            return Err(Error::validation("Invalid or already used code"));
        }
    };

    let telegram_id = link.telegram_id;
    let username = link.username.clone();

    let mut active = link.into_active_model();
    active.user_id = Set(Some(user_id));
    active.verified = Set(true);
    active.verification_code = Set(None);
    let link = active.update(&txn).await?;

    let profile = set_telegram_chat(&txn, user_id, Some(telegram_id), username).await?;

    txn.commit().await?;
    info!(%user_id, telegram_id, "Telegram chat linked");

    Ok((link, profile))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..100 {
            let code = generate_code();
            assert!(looks_like_code(&code), "bad code {code}");
        }
    }

    #[test]
    fn test_looks_like_code() {
        assert!(looks_like_code("004211"));
        assert!(!looks_like_code("12345"));
        assert!(!looks_like_code("12a456"));
        assert!(!looks_like_code("1234567"));
    }

    #[tokio::test]
    async fn test_create_pending_link_replaces_previous() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_pending_link(&db, 77, Some("ada".to_string())).await?;
        let second = create_pending_link(&db, 77, Some("ada".to_string())).await?;

        assert!(!second.verified);
        assert!(second.expires_at > Utc::now());
        let first_code = first.verification_code.unwrap();
        if first_code != second.verification_code.clone().unwrap() {
            assert_eq!(check_code(&db, &first_code).await?, CodeStatus::Unknown);
        }
        assert_eq!(
            check_code(&db, second.verification_code.as_deref().unwrap()).await?,
            CodeStatus::Valid(second)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_redeem_code_links_profile() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let link = create_pending_link(&db, 4242, Some("ada_t".to_string())).await?;
        let code = link.verification_code.unwrap();

        let (verified, profile) = redeem_code(&db, user.id, &format!(" {code} ")).await?;
        assert!(verified.verified);
        assert_eq!(verified.user_id, Some(user.id));
        assert!(verified.verification_code.is_none());
        assert_eq!(profile.telegram_chat_id, Some(4242));
        assert!(profile.telegram_connected);
        assert_eq!(profile.telegram_username.as_deref(), Some("ada_t"));

        let reused = redeem_code(&db, user.id, &code).await;
        assert!(matches!(reused, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_redeem_expired_code() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let link = create_pending_link(&db, 99, None).await?;
        let code = link.verification_code.clone().unwrap();

        let mut active = link.into_active_model();
        active.expires_at = Set(Utc::now() - Duration::minutes(1));
        active.update(&db).await?;

        let result = redeem_code(&db, user.id, &code).await;
        assert!(matches!(result, Err(Error::Validation { message }) if message.contains("expired")));
        assert_eq!(check_code(&db, &code).await?, CodeStatus::Unknown);
        Ok(())
    }

    #[tokio::test]
    async fn test_redeem_short_code() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let result = redeem_code(&db, user.id, " 12 ").await;
        assert!(matches!(result, Err(Error::Validation { message }) if message == "Invalid code"));
        Ok(())
    }
}
