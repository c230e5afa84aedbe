//! Spending analysis and rule-based financial advice.
//!
//! [`analyze_spending`] condenses a window of transactions into totals and
//! risk flags; [`generate_advice`] compares that against the user's budget.

use crate::{
    core::report::{format_money, top_category},
    entities::transaction,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Days covered by an analysis window.
pub const ANALYSIS_WINDOW_DAYS: i64 = 30;

/// A category flagged for spending well above the others.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskCategory {
    /// Category name
    pub category: String,
    /// Amount spent in the category
    pub amount: f64,
    /// Share of total spending, in percent
    pub percentage: f64,
}

/// The single largest transaction in the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LargestTransaction {
    /// Merchant
    pub merchant: String,
    /// Amount
    pub amount: f64,
    /// Category
    pub category: String,
}

/// Condensed view of a spending window.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct SpendingAnalysis {
    /// Number of transactions
    pub total_transactions: usize,
    /// Sum of amounts
    pub total_spent: f64,
    /// Sum per category
    pub category_breakdown: BTreeMap<String, f64>,
    /// Average spend per day of the window
    pub daily_average: f64,
    /// Average transaction size per category
    pub category_averages: BTreeMap<String, f64>,
    /// Largest single transaction
    pub largest_transaction: Option<LargestTransaction>,
    /// Categories above 1.5x the average category total
    pub high_risk_categories: Vec<RiskCategory>,
}

/// Analyzes a window of transactions.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn analyze_spending(transactions: &[transaction::Model]) -> SpendingAnalysis {
    if transactions.is_empty() {
        return SpendingAnalysis::default();
    }

    let mut category_breakdown: BTreeMap<String, f64> = BTreeMap::new();
    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_spent = 0.0;

    for t in transactions {
        total_spent += t.amount;
        *category_breakdown.entry(t.category.clone()).or_default() += t.amount;
        *category_counts.entry(t.category.clone()).or_default() += 1;
    }

    let category_averages = category_breakdown
        .iter()
        .map(|(category, total)| {
            let count = category_counts.get(category).copied().unwrap_or(1).max(1);
            (category.clone(), total / count as f64)
        })
        .collect();

    let largest_transaction = transactions
        .iter()
        .max_by(|a, b| a.amount.total_cmp(&b.amount))
        .map(|t| LargestTransaction {
            merchant: t.merchant.clone(),
            amount: t.amount,
            category: t.category.clone(),
        });

    let average_category_total = total_spent / category_breakdown.len() as f64;
    let mut high_risk_categories: Vec<RiskCategory> = category_breakdown
        .iter()
        .filter(|(_, amount)| **amount > average_category_total * 1.5)
        .map(|(category, amount)| RiskCategory {
            category: category.clone(),
            amount: *amount,
            percentage: amount / total_spent * 100.0,
        })
        .collect();
    high_risk_categories.sort_by(|a, b| b.amount.total_cmp(&a.amount));

    SpendingAnalysis {
        total_transactions: transactions.len(),
        total_spent,
        category_breakdown,
        daily_average: total_spent / ANALYSIS_WINDOW_DAYS as f64,
        category_averages,
        largest_transaction,
        high_risk_categories,
    }
}

/// Rule-based advice for a spending window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialAdvice {
    /// One-sentence overview
    pub summary: String,
    /// `CRITICAL`/`WARNING`/`GOOD`/`EXCELLENT` label with a short reason
    pub budget_status: String,
    /// Spend as a percentage of income after bills
    pub budget_percentage: f64,
    /// Discretionary money left after the savings goal (negative when over)
    pub savings_opportunity: f64,
    /// Things to do
    pub recommendations: Vec<String>,
    /// Things that need attention
    pub warnings: Vec<String>,
    /// Things going well
    pub positive_notes: Vec<String>,
}

/// Compares a spending window against the user's budget.
#[must_use]
pub fn generate_advice(
    analysis: &SpendingAnalysis,
    monthly_income: f64,
    fixed_bills: f64,
    savings_goal: f64,
    currency: &str,
) -> FinancialAdvice {
    let spent = analysis.total_spent;
    let available = monthly_income - fixed_bills;
    let discretionary = available - savings_goal;

    let mut recommendations = Vec::new();
    let mut warnings = Vec::new();
    let mut positive_notes = Vec::new();

    let budget_percentage = if available > 0.0 {
        spent / available * 100.0
    } else {
        if monthly_income > 0.0 {
            warnings.push("Your fixed bills take up your entire income".to_string());
        } else {
            recommendations
                .push("Add your monthly income to your profile for budget tracking".to_string());
        }
        0.0
    };

    let budget_status = match budget_percentage {
        p if p > 100.0 => "CRITICAL: Over budget",
        p if p > 80.0 => "WARNING: Approaching budget limit",
        p if p > 50.0 => "GOOD: Within budget",
        _ => "EXCELLENT: Well within budget",
    }
    .to_string();

    let savings_opportunity = discretionary - spent;
    if monthly_income > 0.0 {
        if savings_opportunity > 0.0 {
            recommendations.push(format!(
                "You could put an extra {} towards savings this month",
                format_money(savings_opportunity, currency)
            ));
        } else if savings_opportunity < 0.0 {
            warnings.push(format!(
                "You are {} over your discretionary budget",
                format_money(-savings_opportunity, currency)
            ));
        }
    }

    for risk in &analysis.high_risk_categories {
        recommendations.push(format!(
            "Consider reducing {} spending ({:.0}% of your total)",
            risk.category, risk.percentage
        ));
    }

    if let Some(largest) = &analysis.largest_transaction {
        if spent > 0.0 && largest.amount / spent > 0.3 && analysis.total_transactions > 1 {
            warnings.push(format!(
                "Your largest purchase ({}, {}) was {:.0}% of your spending",
                largest.merchant,
                format_money(largest.amount, currency),
                largest.amount / spent * 100.0
            ));
        }
    }

    if available > 0.0 && budget_percentage <= 50.0 {
        positive_notes.push("Great job keeping spending well under your budget".to_string());
    }
    if analysis.category_breakdown.len() >= 4 {
        positive_notes.push("Your spending is spread across several categories".to_string());
    }

    let summary = match top_category(&analysis.category_breakdown) {
        Some((category, amount)) => format!(
            "You spent {} across {} transactions in the last {ANALYSIS_WINDOW_DAYS} days. Most went to {category} ({}).",
            format_money(spent, currency),
            analysis.total_transactions,
            format_money(amount, currency)
        ),
        None => format!("No transactions in the last {ANALYSIS_WINDOW_DAYS} days."),
    };

    FinancialAdvice {
        summary,
        budget_status,
        budget_percentage,
        savings_opportunity,
        recommendations,
        warnings,
        positive_notes,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::transaction_model;

    #[test]
    fn test_analyze_empty() {
        let analysis = analyze_spending(&[]);
        assert_eq!(analysis.total_transactions, 0);
        assert!(analysis.largest_transaction.is_none());
        assert!(analysis.high_risk_categories.is_empty());
    }

    #[test]
    fn test_analyze_spending() {
        let transactions = vec![
            transaction_model("Shoprite", 20_000.0, "Food"),
            transaction_model("KFC", 10_000.0, "Food"),
            transaction_model("Bolt", 3_000.0, "Transport"),
            transaction_model("Netflix", 3_000.0, "Entertainment"),
        ];
        let analysis = analyze_spending(&transactions);

        assert_eq!(analysis.total_transactions, 4);
        assert_eq!(analysis.total_spent, 36_000.0);
        assert_eq!(analysis.daily_average, 1_200.0);
        assert_eq!(analysis.category_breakdown["Food"], 30_000.0);
        assert_eq!(analysis.category_averages["Food"], 15_000.0);
        assert_eq!(analysis.largest_transaction.as_ref().unwrap().merchant, "Shoprite");

        // average category total = 12k, Food at 30k > 18k
        assert_eq!(analysis.high_risk_categories.len(), 1);
        let risk = &analysis.high_risk_categories[0];
        assert_eq!(risk.category, "Food");
        assert!((risk.percentage - 83.333).abs() < 0.01);
    }

    #[test]
    fn test_advice_over_budget() {
        let transactions = vec![
            transaction_model("Mall", 60_000.0, "Shopping"),
            transaction_model("Bolt", 5_000.0, "Transport"),
        ];
        let analysis = analyze_spending(&transactions);
        let advice = generate_advice(&analysis, 100_000.0, 50_000.0, 10_000.0, "NGN");

        assert_eq!(advice.budget_status, "CRITICAL: Over budget");
        assert_eq!(advice.budget_percentage, 130.0);
        assert_eq!(advice.savings_opportunity, -25_000.0);
        assert!(advice.warnings.iter().any(|w| w.contains("₦25,000 over")));
        assert!(advice.warnings.iter().any(|w| w.contains("Mall")));
        assert!(advice.positive_notes.is_empty());
    }

    #[test]
    fn test_advice_well_within_budget() {
        let transactions = vec![transaction_model("Shoprite", 10_000.0, "Food")];
        let analysis = analyze_spending(&transactions);
        let advice = generate_advice(&analysis, 200_000.0, 50_000.0, 20_000.0, "NGN");

        assert_eq!(advice.budget_status, "EXCELLENT: Well within budget");
        assert_eq!(advice.savings_opportunity, 120_000.0);
        assert!(advice.summary.contains("Food"));
        assert!(!advice.positive_notes.is_empty());
    }

    #[test]
    fn test_advice_without_income() {
        let advice = generate_advice(&SpendingAnalysis::default(), 0.0, 0.0, 0.0, "NGN");
        assert_eq!(advice.budget_percentage, 0.0);
        assert!(advice.recommendations[0].contains("monthly income"));
        assert!(advice.summary.starts_with("No transactions"));
    }
}
