//! Advisor prompts.
//!
//! Builds the prompts for the chat advisor, transaction categorization and
//! single-transaction analysis, and interprets the replies.

use super::{ChatTurn, CompletionRequest, LanguageModel, json::extract_json_object};
use crate::{
    core::{category::Category, report::format_money},
    errors::Result,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{instrument, warn};

/// Number of earlier chat turns sent with each question.
pub const HISTORY_TURNS: u64 = 5;

/// What the advisor knows about the user.
#[derive(Debug, Clone, Default)]
pub struct AdvisorContext {
    /// Display name
    pub name: String,
    /// Monthly income
    pub monthly_income: f64,
    /// Fixed monthly bills
    pub fixed_bills: f64,
    /// Savings goal
    pub savings_goal: f64,
    /// Sum of the transactions below
    pub total_spent: f64,
    /// Currency for amounts
    pub currency: String,
    /// Pre-formatted `- merchant: amount (category)` lines
    pub recent_transactions: Vec<String>,
    /// Earlier conversation, oldest first
    pub history: Vec<ChatTurn>,
}

/// System instruction for the chat advisor.
#[must_use]
pub fn system_prompt(ctx: &AdvisorContext) -> String {
    let money = |amount: f64| format_money(amount, &ctx.currency);
    let remaining = ctx.monthly_income - ctx.fixed_bills - ctx.total_spent;

    let mut prompt = format!(
        "You are Sentinel, a friendly personal finance advisor. \
         Give short, practical, specific advice in two or three sentences. \
         Use the user's numbers when relevant.\n\n\
         User: {}\n\
         Monthly income: {}\n\
         Fixed bills: {}\n\
         Savings goal: {}\n\
         Spent recently: {}\n\
         Left after bills and spending: {}\n",
        if ctx.name.is_empty() { "there" } else { &ctx.name },
        money(ctx.monthly_income),
        money(ctx.fixed_bills),
        money(ctx.savings_goal),
        money(ctx.total_spent),
        money(remaining),
    );

    if !ctx.recent_transactions.is_empty() {
        prompt.push_str("\nRecent transactions:\n");
        for line in &ctx.recent_transactions {
            let _ = writeln!(prompt, "{line}");
        }
    }
    prompt
}

/// Request for one advisor answer.
#[must_use]
pub fn chat_request(ctx: &AdvisorContext, message: &str) -> CompletionRequest {
    let mut messages = ctx.history.clone();
    messages.push(ChatTurn::user(message.trim()));

    CompletionRequest {
        system: Some(system_prompt(ctx)),
        messages,
        temperature: 0.7,
        max_tokens: 150,
    }
}

/// Asks the advisor a question.
#[instrument(skip(model, ctx))]
pub async fn ask_advisor(
    model: &dyn LanguageModel,
    ctx: &AdvisorContext,
    message: &str,
) -> Result<String> {
    model.complete(&chat_request(ctx, message)).await
}

/// Request that classifies a transaction into one category.
#[must_use]
pub fn categorize_request(merchant: &str, amount: f64, description: Option<&str>) -> CompletionRequest {
    let mut prompt = format!(
        "Categorize this transaction into exactly one of: {}.\n\
         Merchant: {merchant}\nAmount: {amount:.2}\n",
        Category::prompt_list()
    );
    if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
        let _ = writeln!(prompt, "Description: {}", description.trim());
    }
    prompt.push_str("Answer with the category name only.");

    CompletionRequest::prompt(prompt).with_max_tokens(10)
}

/// Classifies a transaction. Replies outside the list become `Other`.
#[instrument(skip(model))]
pub async fn categorize(
    model: &dyn LanguageModel,
    merchant: &str,
    amount: f64,
    description: Option<&str>,
) -> Result<Category> {
    let reply = model
        .complete(&categorize_request(merchant, amount, description))
        .await?;
    Ok(Category::match_loose(&reply))
}

/// Facts about one transaction to analyze.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionFacts {
    /// Merchant
    pub merchant: String,
    /// Amount
    pub amount: f64,
    /// Category name
    #[serde(default)]
    pub category: Option<String>,
    /// Optional note
    #[serde(default)]
    pub description: Option<String>,
}

/// The model's view of a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInsight {
    /// One-sentence observation
    pub insight: String,
    /// `low`, `medium` or `high`
    pub risk_level: String,
    /// What to do about it
    pub recommendation: String,
    /// Whether the transaction stands out from the usual
    pub is_unusual: bool,
}

impl Default for TransactionInsight {
    fn default() -> Self {
        Self {
            insight: "Transaction recorded successfully".to_string(),
            risk_level: "medium".to_string(),
            recommendation: "Monitor your spending in this category".to_string(),
            is_unusual: false,
        }
    }
}

impl TransactionInsight {
    /// Reads an insight out of a model reply, filling gaps with defaults.
    #[must_use]
    pub fn from_reply(reply: &str) -> Option<Self> {
        let value = extract_json_object(reply)?;
        let defaults = Self::default();
        let text = |key: &str, fallback: String| {
            value[key]
                .as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map_or(fallback, ToString::to_string)
        };

        let risk_level = text("risk_level", defaults.risk_level.clone()).to_lowercase();
        let risk_level = if matches!(risk_level.as_str(), "low" | "medium" | "high") {
            risk_level
        } else {
            defaults.risk_level.clone()
        };

        Some(Self {
            insight: text("insight", defaults.insight),
            risk_level,
            recommendation: text("recommendation", defaults.recommendation),
            is_unusual: value["is_unusual"].as_bool().unwrap_or(false),
        })
    }
}

/// Asks the model for an opinion on one transaction.
///
/// Falls back to [`TransactionInsight::default`] when the model fails or the
/// reply is not usable JSON.
#[instrument(skip(model, recent))]
pub async fn analyze_transaction(
    model: &dyn LanguageModel,
    facts: &TransactionFacts,
    recent: &[String],
    currency: &str,
) -> TransactionInsight {
    let mut prompt = format!(
        "Analyze this transaction for a personal budget.\n\
         Merchant: {}\nAmount: {}\nCategory: {}\n",
        facts.merchant,
        format_money(facts.amount, currency),
        facts.category.as_deref().unwrap_or("Other"),
    );
    if let Some(description) = &facts.description {
        let _ = writeln!(prompt, "Description: {description}");
    }
    if !recent.is_empty() {
        prompt.push_str("Recent transactions:\n");
        for line in recent {
            let _ = writeln!(prompt, "{line}");
        }
    }
    prompt.push_str(
        "Respond with JSON only: {\"insight\": string, \"risk_level\": \"low\"|\"medium\"|\"high\", \
         \"recommendation\": string, \"is_unusual\": boolean}",
    );

    let request = CompletionRequest::prompt(prompt).with_temperature(0.3).with_max_tokens(200);
    match model.complete(&request).await {
        Ok(reply) => TransactionInsight::from_reply(&reply).unwrap_or_else(|| {
            warn!("Unusable transaction analysis reply");
            TransactionInsight::default()
        }),
        Err(e) => {
            warn!("Transaction analysis failed: {e}");
            TransactionInsight::default()
        }
    }
}
