//! Rule-based health tips shown on the dashboard.
//!
//! Tips are computed from the user's recent transactions and budget figures
//! without calling a language model, so they are always available.

use crate::{
    core::report::{format_money, summarize, top_category},
    entities::transaction,
};
use serde::Serialize;

/// At most this many tips are returned.
pub const MAX_TIPS: usize = 6;

/// Tone of a tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    /// Something is going well
    Success,
    /// Neutral information
    Info,
    /// Something needs attention
    Warning,
}

/// One dashboard tip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthTip {
    /// Tone
    #[serde(rename = "type")]
    pub kind: TipKind,
    /// Short heading
    pub title: String,
    /// Body text
    pub message: String,
}

impl HealthTip {
    fn new(kind: TipKind, title: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message: message.into(),
        }
    }
}

/// Budget figures the tips are measured against.
#[derive(Debug, Clone, Copy, Default)]
pub struct Budget<'a> {
    /// Monthly income
    pub monthly_income: f64,
    /// Fixed monthly bills
    pub fixed_bills: f64,
    /// Monthly savings goal
    pub savings_goal: f64,
    /// Currency for amounts in messages
    pub currency: &'a str,
}

fn starter_tips() -> Vec<HealthTip> {
    vec![
        HealthTip::new(
            TipKind::Info,
            "Start tracking",
            "Log your first expenses to unlock personalised tips",
        ),
        HealthTip::new(
            TipKind::Info,
            "Set your budget",
            "Add your monthly income, bills and savings goal to your profile",
        ),
        HealthTip::new(
            TipKind::Info,
            "Scan receipts",
            "Upload a receipt photo and let Sentinel fill in the details",
        ),
    ]
}

/// Computes up to [`MAX_TIPS`] tips for a window of transactions.
#[must_use]
pub fn health_tips(transactions: &[transaction::Model], budget: Budget<'_>) -> Vec<HealthTip> {
    if transactions.is_empty() {
        return starter_tips();
    }

    let summary = summarize(transactions);
    let spent = summary.total_spent;
    let money = |amount: f64| format_money(amount, budget.currency);
    let mut tips = Vec::new();

    if budget.monthly_income > 0.0 {
        let ratio = spent * 100.0 / budget.monthly_income;
        tips.push(if ratio > 90.0 {
            HealthTip::new(
                TipKind::Warning,
                "High spending alert",
                format!("You've spent {ratio:.0}% of your income. Pause non-essential purchases."),
            )
        } else if ratio > 70.0 {
            HealthTip::new(
                TipKind::Warning,
                "Watch your spending",
                format!("You've spent {ratio:.0}% of your income. Slow down to stay on budget."),
            )
        } else {
            HealthTip::new(
                TipKind::Success,
                "Good job",
                format!("You've spent only {ratio:.0}% of your income. Keep it up!"),
            )
        });
    }

    if let Some((category, amount)) = top_category(&summary.by_category) {
        let share = if spent > 0.0 { amount / spent * 100.0 } else { 0.0 };
        tips.push(HealthTip::new(
            TipKind::Info,
            "Top spending category",
            format!("{category} accounts for {} ({share:.0}% of spending)", money(amount)),
        ));
    }

    if budget.savings_goal > 0.0 && budget.monthly_income > 0.0 {
        let remaining = budget.monthly_income - budget.fixed_bills - spent;
        tips.push(if remaining >= budget.savings_goal {
            HealthTip::new(
                TipKind::Success,
                "On track to save",
                format!(
                    "{} left after bills and spending, enough for your {} goal",
                    money(remaining),
                    money(budget.savings_goal)
                ),
            )
        } else {
            HealthTip::new(
                TipKind::Warning,
                "Savings goal at risk",
                format!(
                    "You are {} short of your {} savings goal",
                    money(budget.savings_goal - remaining),
                    money(budget.savings_goal)
                ),
            )
        });
    }

    if summary.transaction_count < 5 {
        tips.push(HealthTip::new(
            TipKind::Info,
            "Log more transactions",
            "A few more entries will make your insights more accurate",
        ));
    } else if summary.transaction_count > 30 {
        tips.push(HealthTip::new(
            TipKind::Info,
            "Lots of small purchases",
            format!(
                "{} transactions this month. Small purchases add up quickly.",
                summary.transaction_count
            ),
        ));
    }

    if summary.by_category.len() < 3 {
        tips.push(HealthTip::new(
            TipKind::Info,
            "Spending is concentrated",
            "Most of your money goes to one or two categories. Check they match your priorities.",
        ));
    }

    if budget.monthly_income > 0.0 && budget.fixed_bills / budget.monthly_income > 0.5 {
        tips.push(HealthTip::new(
            TipKind::Warning,
            "High fixed bills",
            format!(
                "Fixed bills take {:.0}% of your income. Look for bills you can renegotiate.",
                budget.fixed_bills / budget.monthly_income * 100.0
            ),
        ));
    }

    tips.truncate(MAX_TIPS);
    tips
}
