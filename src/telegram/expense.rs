//! Expense parsing from chat text such as `"Lunch at Mama Put 2500"`.
//!
//! The last number in the text is the amount and what is left is the
//! merchant. A comma between digits is a decimal separator (`12,50`).

use regex::Regex;
use std::sync::LazyLock;

static AMOUNT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)").ok());

/// Upper bound (exclusive) for a believable amount.
const MAX_AMOUNT: f64 = 1e9;

/// Merchant used when the text is only a number.
pub const DEFAULT_MERCHANT: &str = "Telegram expense";

/// An expense read out of a chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExpense {
    /// Merchant or note
    pub merchant: String,
    /// Amount spent
    pub amount: f64,
}

/// Parses an expense; `None` when the text has no usable amount.
#[must_use]
pub fn parse_expense(text: &str) -> Option<ParsedExpense> {
    let text = text.trim();
    if text.chars().count() < 3 {
        return None;
    }

    let found = AMOUNT.as_ref()?.find_iter(text).last()?;
    let amount: f64 = found.as_str().replace(',', ".").parse().ok()?;
    if !(amount > 0.0 && amount < MAX_AMOUNT) {
        return None;
    }

    let rest = format!("{} {}", &text[..found.start()], &text[found.end()..]);
    let merchant = rest.split_whitespace().collect::<Vec<_>>().join(" ");

    Some(ParsedExpense {
        merchant: if merchant.is_empty() {
            DEFAULT_MERCHANT.to_string()
        } else {
            merchant
        },
        amount,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_merchant_then_amount() {
        let parsed = parse_expense("Lunch at Mama Put 2500").unwrap();
        assert_eq!(parsed.merchant, "Lunch at Mama Put");
        assert_eq!(parsed.amount, 2500.0);
    }

    #[test]
    fn test_amount_first_and_decimal_comma() {
        let parsed = parse_expense("  12,50   coffee  ").unwrap();
        assert_eq!(parsed.amount, 12.5);
        assert_eq!(parsed.merchant, "coffee");
    }

    #[test]
    fn test_last_number_wins() {
        let parsed = parse_expense("2 bottles of water 400").unwrap();
        assert_eq!(parsed.amount, 400.0);
        assert_eq!(parsed.merchant, "2 bottles of water");
    }

    #[test]
    fn test_bare_number_uses_default_merchant() {
        let parsed = parse_expense("1500").unwrap();
        assert_eq!(parsed.merchant, DEFAULT_MERCHANT);
    }

    #[test]
    fn test_rejections() {
        assert!(parse_expense("hi").is_none());
        assert!(parse_expense("5").is_none());
        assert!(parse_expense("How much did I spend on food?").is_none());
        assert!(parse_expense("free lunch 0").is_none());
        assert!(parse_expense("house 2000000000").is_none());
    }
}
