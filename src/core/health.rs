//! Financial health scoring.
//!
//! Two views of the same question. [`health_score`] is the dashboard's quick
//! score: the spend/income ratio mapped through eleven fixed 10% bands.
//! [`detailed_health`] is a 100-point breakdown (budget adherence, category
//! diversity, consistency, savings) with a letter grade.

use crate::core::analysis::SpendingAnalysis;
use serde::Serialize;

/// Score bands: (upper bound of the spend ratio in percent, score, status).
const BANDS: [(f64, u8, &str); 10] = [
    (10.0, 100, "Excellent"),
    (20.0, 90, "Excellent"),
    (30.0, 80, "Very Good"),
    (40.0, 70, "Good"),
    (50.0, 60, "Good"),
    (60.0, 50, "Fair"),
    (70.0, 40, "Fair"),
    (80.0, 30, "Needs Attention"),
    (90.0, 20, "Poor"),
    (100.0, 10, "Critical"),
];

/// Result of the threshold ladder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthScore {
    /// 0..=100
    pub score: u8,
    /// Label of the band
    pub status: &'static str,
    /// Spend as a percentage of income
    pub spend_ratio: f64,
}

/// Maps spend against income onto the eleven-band ladder.
///
/// Ratios above 100% score 0 (`Overspending`). Without a positive income
/// there is nothing to compare against and the score is 0 (`No Income Set`).
#[must_use]
pub fn health_score(total_spent: f64, monthly_income: f64) -> HealthScore {
    if !monthly_income.is_finite() || monthly_income <= 0.0 {
        return HealthScore {
            score: 0,
            status: "No Income Set",
            spend_ratio: 0.0,
        };
    }

    let spent = if total_spent.is_finite() {
        total_spent.max(0.0)
    } else {
        0.0
    };
    let spend_ratio = spent * 100.0 / monthly_income;

    let (score, status) = BANDS
        .iter()
        .find(|(limit, _, _)| spend_ratio <= *limit)
        .map_or((0, "Overspending"), |&(_, score, status)| (score, status));

    HealthScore {
        score,
        status,
        spend_ratio,
    }
}

/// Points per component of the detailed score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    /// Out of 40
    pub budget_adherence: u8,
    /// Out of 30
    pub category_diversity: u8,
    /// Out of 20
    pub consistency: u8,
    /// Out of 10
    pub savings: u8,
}

/// The 100-point health assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedHealth {
    /// 0..=100
    pub score: u8,
    /// A+, A, B, C, D or F
    pub grade: &'static str,
    /// Per-component points
    pub breakdown: ScoreBreakdown,
    /// Advice matching the grade
    pub recommendations: Vec<String>,
}

const fn grade_for(score: u8) -> &'static str {
    match score {
        90.. => "A+",
        80..=89 => "A",
        70..=79 => "B",
        60..=69 => "C",
        50..=59 => "D",
        _ => "F",
    }
}

fn recommendations_for(score: u8) -> Vec<String> {
    let lines: &[&str] = match score {
        80.. => &[
            "Excellent financial health! Keep up the great work",
            "Consider investing your surplus savings",
        ],
        60..=79 => &[
            "Good financial health with room for improvement",
            "Review your largest spending categories for savings",
        ],
        40..=59 => &[
            "Your finances need attention",
            "Create a strict budget and track every expense",
            "Cut back on non-essential spending",
        ],
        _ => &[
            "Your financial health needs immediate attention",
            "Stop all non-essential spending right away",
            "Build an emergency plan and consider speaking to an advisor",
        ],
    };
    lines.iter().map(ToString::to_string).collect()
}

/// Computes the 100-point assessment for a period of spending.
///
/// # Arguments
/// * `analysis` - Spending over the period (usually the last 30 days)
/// * `monthly_income` - Income for the period
/// * `fixed_bills` - Fixed costs that come out of income first
/// * `savings_goal` - Amount the user wants to put aside
#[must_use]
pub fn detailed_health(
    analysis: &SpendingAnalysis,
    monthly_income: f64,
    fixed_bills: f64,
    savings_goal: f64,
) -> DetailedHealth {
    let spent = analysis.total_spent;
    let discretionary = monthly_income - fixed_bills - savings_goal;

    let budget_adherence = if discretionary > 0.0 {
        match spent / discretionary * 100.0 {
            r if r <= 70.0 => 40,
            r if r <= 85.0 => 30,
            r if r <= 100.0 => 20,
            _ => 0,
        }
    } else {
        0
    };

    let category_diversity = match analysis.category_breakdown.len() {
        4.. => 30,
        2..=3 => 20,
        _ => 10,
    };

    let consistency = match analysis.total_transactions {
        11.. => 20,
        6..=10 => 15,
        _ => 10,
    };

    let savings = if monthly_income > 0.0 {
        let saved_ratio = (monthly_income - fixed_bills - spent) / monthly_income * 100.0;
        let goal_ratio = savings_goal / monthly_income * 100.0;
        if saved_ratio >= goal_ratio {
            10
        } else if saved_ratio >= 5.0 {
            7
        } else {
            0
        }
    } else {
        0
    };

    let score = (budget_adherence + category_diversity + consistency + savings).min(100);

    DetailedHealth {
        score,
        grade: grade_for(score),
        breakdown: ScoreBreakdown {
            budget_adherence,
            category_diversity,
            consistency,
            savings,
        },
        recommendations: recommendations_for(score),
    }
}
