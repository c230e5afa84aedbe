//! Telegram link entity - Pending and verified chat-to-user links.
//!
//! A row is created when someone sends `/start` to the bot. It carries a
//! one-time `verification_code` until the dashboard redeems it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Telegram link database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "telegram_links")]
pub struct Model {
    /// Unique identifier for the link
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Linked user, set once the code is redeemed
    pub user_id: Option<Uuid>,
    /// Telegram chat id
    pub telegram_id: i64,
    /// Telegram username, if the chat has one
    pub username: Option<String>,
    /// Whether the code has been redeemed
    pub verified: bool,
    /// Six-digit code, cleared after use
    pub verification_code: Option<String>,
    /// When the code stops being accepted
    pub expires_at: DateTimeUtc,
    /// When the link was requested
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `TelegramLink` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A verified link belongs to one profile
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id"
    )]
    Profile,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
