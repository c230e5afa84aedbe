//! Report generation business logic.
//!
//! Spending summaries and the text helpers used by notifications and prompts.
//! All functions are framework-agnostic and return structured data or plain
//! strings that the API and Telegram layers pass through.

use crate::{core::transaction::all_transactions, entities::transaction, errors::Result};
use sea_orm::{DatabaseConnection, prelude::Uuid};
use serde::Serialize;
use std::collections::BTreeMap;

/// Totals over a set of transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingSummary {
    /// Sum of all amounts
    pub total_spent: f64,
    /// Number of transactions
    pub transaction_count: usize,
    /// `total_spent / transaction_count`, 0 when empty
    pub average_transaction: f64,
    /// Sum of amounts per category
    pub by_category: BTreeMap<String, f64>,
}

/// Sums amounts overall and per category.
#[must_use]
pub fn summarize(transactions: &[transaction::Model]) -> SpendingSummary {
    let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
    let mut total_spent = 0.0;

    for t in transactions {
        total_spent += t.amount;
        *by_category.entry(t.category.clone()).or_default() += t.amount;
    }

    let transaction_count = transactions.len();
    // Cast safety: transaction counts are far below 2^52.
    #[allow(clippy::cast_precision_loss)]
    let average_transaction = if transaction_count == 0 {
        0.0
    } else {
        total_spent / transaction_count as f64
    };

    SpendingSummary {
        total_spent,
        transaction_count,
        average_transaction,
        by_category,
    }
}

/// Summarizes every transaction of a user.
pub async fn spending_summary(db: &DatabaseConnection, user_id: Uuid) -> Result<SpendingSummary> {
    let transactions = all_transactions(db, user_id).await?;
    Ok(summarize(&transactions))
}

/// Returns the category with the largest total, if any.
#[must_use]
pub fn top_category(by_category: &BTreeMap<String, f64>) -> Option<(&str, f64)> {
    by_category
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(name, amount)| (name.as_str(), *amount))
}

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency {
        "NGN" => Some("₦"),
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        _ => None,
    }
}

fn group_thousands(whole: u64) -> String {
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Formats a money amount with a currency symbol and thousands separators.
///
/// Whole amounts drop the decimals: `format_money(4500.0, "NGN")` is `"₦4,500"`,
/// `format_money(12.5, "USD")` is `"$12.50"`. Unknown currencies are prefixed
/// with their code.
#[must_use]
pub fn format_money(amount: f64, currency: &str) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round();

    // Cast safety: cents is non-negative and rounded; display only.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cents = cents as u64;
    let whole = group_thousands(cents / 100);
    let fraction = cents % 100;

    let number = if fraction == 0 {
        whole
    } else {
        format!("{whole}.{fraction:02}")
    };

    match currency_symbol(currency) {
        Some(symbol) => format!("{sign}{symbol}{number}"),
        None => format!("{sign}{currency} {number}"),
    }
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based bar like `[████████░░] 80.0%`. Values above 100 fill
/// the bar completely but keep their real percentage in the label.
#[must_use]
pub fn format_progress_bar(percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped = percent.clamp(0.0, 100.0);

    // Cast safety: clamped ∈ [0, 100], length is small (10-20).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    format!("[{}{}] {percent:.1}%", "█".repeat(filled), "░".repeat(empty))
}

/// One line of the "Recent transactions" block in advisor prompts.
#[must_use]
pub fn format_transaction_line(transaction: &transaction::Model) -> String {
    format!(
        "- {}: {} ({})",
        transaction.merchant,
        format_money(transaction.amount, &transaction.currency),
        transaction.category
    )
}
