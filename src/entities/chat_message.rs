//! Chat history entity - Append-only log of advisor conversations.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Chat message database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chat_history")]
pub struct Model {
    /// Unique identifier for the message
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owner of the conversation
    pub user_id: Uuid,
    /// `"user"` or `"assistant"`
    pub role: String,
    /// Message text
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// When the message was stored
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `ChatMessage` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each message belongs to one profile
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
