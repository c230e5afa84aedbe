//! Advisor chat history.
//!
//! Append-only: messages are stored as they happen and read back as the
//! conversation context for the next prompt.

use crate::{
    entities::{ChatMessage, ChatMessageColumn, chat_message},
    errors::Result,
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use serde::{Deserialize, Serialize};

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The user
    User,
    /// The advisor model
    Assistant,
}

impl Role {
    /// Stored name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Stores one chat message.
pub async fn append_message(
    db: &DatabaseConnection,
    user_id: Uuid,
    role: Role,
    content: &str,
) -> Result<chat_message::Model> {
    chat_message::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        role: Set(role.as_str().to_string()),
        content: Set(content.to_string()),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Returns the last `limit` messages of a user, oldest first.
pub async fn recent_history(
    db: &DatabaseConnection,
    user_id: Uuid,
    limit: u64,
) -> Result<Vec<chat_message::Model>> {
    let mut messages = ChatMessage::find()
        .filter(ChatMessageColumn::UserId.eq(user_id))
        .order_by_desc(ChatMessageColumn::CreatedAt)
        .limit(limit)
        .all(db)
        .await?;
    messages.reverse();
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_history_is_scoped_and_limited() -> Result<()> {
        let db = setup_test_db().await?;
        let ada = create_test_user(&db, "ada@example.com").await?;
        let bob = create_test_user(&db, "bob@example.com").await?;

        for i in 0..4 {
            append_message(&db, ada.id, Role::User, &format!("question {i}")).await?;
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        append_message(&db, bob.id, Role::User, "bob's question").await?;

        let history = recent_history(&db, ada.id, 3).await?;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "question 1");
        assert_eq!(history[2].content, "question 3");
        assert!(history.iter().all(|m| m.user_id == ada.id));
        assert!(history.iter().all(|m| m.role == "user"));
        Ok(())
    }
}
