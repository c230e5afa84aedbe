//! Account business logic - signup and login.
//!
//! Signup writes the account and its profile in one database transaction, so
//! either both rows exist or neither does.

use crate::{
    entities::{Account, AccountColumn, Profile, account, profile},
    errors::{Error, Result},
};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand::rngs::OsRng;
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hashes a password with Argon2 and a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
}

/// Checks a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| Error::PasswordHash {
        message: e.to_string(),
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Normalizes an e-mail address and checks its basic shape.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(Error::validation("A valid email address is required")),
    }
}

/// Display name to use when none was given: the e-mail's local part.
#[must_use]
pub fn default_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// Creates an account and its profile atomically.
///
/// # Arguments
/// * `email` - Login e-mail (case-insensitive, must be unused)
/// * `password` - Plain password, at least [`MIN_PASSWORD_LEN`] characters
/// * `name` - Display name; defaults to the e-mail's local part
/// * `currency` - Preferred currency for the new profile
#[instrument(skip(db, password))]
pub async fn signup(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    name: Option<&str>,
    currency: &str,
) -> Result<(account::Model, profile::Model)> {
    let email = normalize_email(email)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map_or_else(|| default_name(&email), ToString::to_string);
    let password_hash = hash_password(password)?;

    let txn = db.begin().await?;

    let existing = Account::find()
        .filter(AccountColumn::Email.eq(email.as_str()))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(Error::Conflict {
            message: "An account with this email already exists".to_string(),
        });
    }

    let now = chrono::Utc::now();
    let id = Uuid::new_v4();

    let account = account::ActiveModel {
        id: Set(id),
        email: Set(email.clone()),
        password_hash: Set(password_hash),
        created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let profile = profile::ActiveModel {
        id: Set(id),
        email: Set(email),
        name: Set(name),
        monthly_income: Set(0.0),
        fixed_bills: Set(0.0),
        savings_goal: Set(0.0),
        preferred_currency: Set(currency.to_string()),
        telegram_chat_id: Set(None),
        telegram_connected: Set(false),
        telegram_username: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(user_id = %id, "Account created");

    Ok((account, profile))
}

/// Checks credentials and returns the account with its profile.
#[instrument(skip(db, password))]
pub async fn login(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<(account::Model, profile::Model)> {
    let invalid = || Error::unauthorized("Invalid email or password");

    let email = email.trim().to_lowercase();
    let account = Account::find()
        .filter(AccountColumn::Email.eq(email.as_str()))
        .one(db)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(password, &account.password_hash)? {
        return Err(invalid());
    }

    let profile = Profile::find_by_id(account.id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            resource: "Profile",
        })?;

    Ok((account, profile))
}
