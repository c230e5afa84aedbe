//! Notification messages pushed to a user's linked Telegram chat.

use super::{BotApi, escape_markdown};
use crate::{
    core::report::{SpendingSummary, format_money, format_progress_bar, top_category},
    entities::profile,
    errors::Result,
};
use serde::Serialize;
use tracing::{info, instrument};

/// A titled notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Bold first line
    pub title: String,
    /// Body text
    pub message: String,
}

impl Notification {
    /// Markdown text sent to Telegram.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        format!("*{}*\n\n{}", self.title, self.message)
    }
}

/// Alert for spending against a category budget.
///
/// Levels: 100% and above exceeded, 90% alert, 80% notice, otherwise status.
#[must_use]
pub fn budget_alert(category: &str, spent: f64, budget: f64, currency: &str) -> Notification {
    let percent = if budget > 0.0 { spent / budget * 100.0 } else { 100.0 };
    let money = |amount: f64| format_money(amount, currency);
    let category = escape_markdown(category);

    let (title, detail) = if percent >= 100.0 {
        (
            format!("🚨 Budget exceeded: {category}"),
            format!(
                "You've gone {} over your {category} budget.",
                money(spent - budget)
            ),
        )
    } else if percent >= 90.0 {
        (
            format!("⚠️ Budget alert: {category}"),
            format!("Only {} left in your {category} budget.", money(budget - spent)),
        )
    } else if percent >= 80.0 {
        (
            format!("🔔 Budget notice: {category}"),
            format!(
                "You've used most of your {category} budget. {} remaining.",
                money(budget - spent)
            ),
        )
    } else {
        (
            format!("📊 Budget status: {category}"),
            format!("{} remaining. You're on track.", money(budget - spent)),
        )
    };

    Notification {
        title,
        message: format!(
            "{detail}\nSpent {} of {}\n{}",
            money(spent),
            money(budget),
            format_progress_bar(percent, None)
        ),
    }
}

/// Weekly summary over the last seven days.
#[must_use]
pub fn weekly_summary(summary: &SpendingSummary, currency: &str) -> Notification {
    let money = |amount: f64| format_money(amount, currency);
    let mut message = format!(
        "Total spent: {}\nTransactions: {}\nDaily average: {}",
        money(summary.total_spent),
        summary.transaction_count,
        money(summary.total_spent / 7.0)
    );
    if let Some((category, amount)) = top_category(&summary.by_category) {
        message.push_str(&format!(
            "\nTop category: {} ({})",
            escape_markdown(category),
            money(amount)
        ));
    }

    Notification {
        title: "📅 Your weekly summary".to_string(),
        message,
    }
}

/// Health score notification with an optional tip.
#[must_use]
pub fn health_update(score: u8, status: &str, tip: Option<&str>) -> Notification {
    let mut message = format!("Your financial health score is {score}/100 ({status}).");
    if let Some(tip) = tip {
        message.push_str(&format!("\n\n💡 {tip}"));
    }
    Notification {
        title: "💚 Financial health update".to_string(),
        message,
    }
}

/// Sends a notification to the profile's linked chat.
///
/// Returns `false` without sending when no chat is linked.
#[instrument(skip(bot, profile, notification), fields(user_id = %profile.id))]
pub async fn send_to_profile(
    bot: &dyn BotApi,
    profile: &profile::Model,
    notification: &Notification,
) -> Result<bool> {
    let Some(chat_id) = profile.telegram_chat_id else {
        return Ok(false);
    };
    bot.send_message(chat_id, &notification.to_markdown()).await?;
    info!("Notification sent");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeBot, profile_model};
    use std::collections::BTreeMap;

    #[test]
    fn test_budget_alert_levels() {
        assert!(budget_alert("Food", 120.0, 100.0, "NGN").title.starts_with("🚨"));
        assert!(budget_alert("Food", 100.0, 100.0, "NGN").title.starts_with("🚨"));
        assert!(budget_alert("Food", 95.0, 100.0, "NGN").title.starts_with("⚠️"));
        assert!(budget_alert("Food", 85.0, 100.0, "NGN").title.starts_with("🔔"));
        assert!(budget_alert("Food", 10.0, 100.0, "NGN").title.starts_with("📊"));
        assert!(budget_alert("Food", 10.0, 0.0, "NGN").title.starts_with("🚨"));
    }

    #[test]
    fn test_budget_alert_message() {
        let alert = budget_alert("Food", 45_000.0, 50_000.0, "NGN");
        assert!(alert.message.contains("Only ₦5,000 left"));
        assert!(alert.message.contains("Spent ₦45,000 of ₦50,000"));
        assert!(alert.message.contains("[█████████░] 90.0%"));
    }

    #[test]
    fn test_weekly_summary() {
        let summary = SpendingSummary {
            total_spent: 14_000.0,
            transaction_count: 4,
            average_transaction: 3_500.0,
            by_category: BTreeMap::from([("Food".to_string(), 10_000.0)]),
        };
        let notification = weekly_summary(&summary, "NGN");
        assert!(notification.message.contains("Daily average: ₦2,000"));
        assert!(notification.message.contains("Top category: Food (₦10,000)"));
        assert!(notification.to_markdown().starts_with("*📅 Your weekly summary*\n\n"));
    }

    #[tokio::test]
    async fn test_send_to_profile() -> Result<()> {
        let bot = FakeBot::default();
        let notification = health_update(80, "Very Good", Some("Keep it up"));

        let mut profile = profile_model("Ada");
        assert!(!send_to_profile(&bot, &profile, &notification).await?);
        assert!(bot.sent().is_empty());

        profile.telegram_chat_id = Some(4242);
        assert!(send_to_profile(&bot, &profile, &notification).await?);
        let sent = bot.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 4242);
        assert!(sent[0].1.contains("80/100 (Very Good)"));
        Ok(())
    }
}
