//! Transaction entity - A single expense recorded by a user.
//!
//! Rows come from the dashboard form (`manual`), a scanned receipt (`receipt`)
//! or a Telegram message (`telegram`). `amount` is always positive.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owner of the transaction
    pub user_id: Uuid,
    /// Where the money went
    pub merchant: String,
    /// Amount spent, always greater than zero
    pub amount: f64,
    /// One of the fixed spending categories
    pub category: String,
    /// Three-letter upper-case currency code
    pub currency: String,
    /// Optional free-text note
    pub description: Option<String>,
    /// Day of the purchase
    pub date: Date,
    /// `"manual"`, `"receipt"` or `"telegram"`
    pub source: String,
    /// Whether the category was picked by the language model
    pub ai_categorized: bool,
    /// When the row was created
    pub created_at: DateTimeUtc,
    /// Last change to the row
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one profile
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
