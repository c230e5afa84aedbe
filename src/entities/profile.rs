//! Profile entity - Budget figures and Telegram link state of a user.
//!
//! Created together with the account on signup and never deleted by the
//! application. `telegram_chat_id` is unique so a chat maps to one user.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User profile database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_profiles")]
pub struct Model {
    /// Same id as the owning account
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Contact e-mail
    pub email: String,
    /// Display name
    pub name: String,
    /// Monthly income
    pub monthly_income: f64,
    /// Fixed monthly bills (rent, subscriptions, ...)
    pub fixed_bills: f64,
    /// Monthly savings goal
    pub savings_goal: f64,
    /// ISO currency code used for new entries
    pub preferred_currency: String,
    /// Linked Telegram chat, if any
    #[sea_orm(unique)]
    pub telegram_chat_id: Option<i64>,
    /// Whether a Telegram chat is linked
    pub telegram_connected: bool,
    /// Telegram username of the linked chat
    pub telegram_username: Option<String>,
    /// When the profile was created
    pub created_at: DateTimeUtc,
    /// Last profile change
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Profile and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each profile belongs to one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::Id",
        to = "super::account::Column::Id"
    )]
    Account,
    /// One profile has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// One profile has many chat messages
    #[sea_orm(has_many = "super::chat_message::Entity")]
    ChatMessages,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::chat_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChatMessages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
