//! Spending categories.
//!
//! The category list is fixed. Stored rows and API payloads use the
//! capitalised names (`"Food"`, `"Transport"`, ...).

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A spending category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Groceries, restaurants, snacks
    Food,
    /// Fuel, rides, fares
    Transport,
    /// Movies, games, outings
    Entertainment,
    /// Clothes, electronics, general purchases
    Shopping,
    /// Rent and recurring bills
    Bills,
    /// Power, water, internet, airtime
    Utilities,
    /// Pharmacy, clinic
    Health,
    /// Fees, books, courses
    Education,
    /// Everything else
    Other,
}

impl Category {
    /// Every category in display order.
    pub const ALL: [Self; 9] = [
        Self::Food,
        Self::Transport,
        Self::Entertainment,
        Self::Shopping,
        Self::Bills,
        Self::Utilities,
        Self::Health,
        Self::Education,
        Self::Other,
    ];

    /// Canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Entertainment => "Entertainment",
            Self::Shopping => "Shopping",
            Self::Bills => "Bills",
            Self::Utilities => "Utilities",
            Self::Health => "Health",
            Self::Education => "Education",
            Self::Other => "Other",
        }
    }

    /// Comma separated list used in prompts.
    #[must_use]
    pub fn prompt_list() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Best-effort match of free text (usually a model reply) to a category.
    ///
    /// Exact names win, then the first category whose name appears in the
    /// text. Anything else is [`Category::Other`].
    #[must_use]
    pub fn match_loose(text: &str) -> Self {
        if let Ok(category) = text.parse() {
            return category;
        }

        let lowered = text.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| lowered.contains(&c.as_str().to_lowercase()))
            .unwrap_or(Self::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                Error::validation(format!(
                    "Invalid category '{wanted}'. Expected one of: {}",
                    Self::prompt_list()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("food".parse::<Category>().unwrap(), Category::Food);
        assert_eq!(" UTILITIES ".parse::<Category>().unwrap(), Category::Utilities);
        assert!("Groceries".parse::<Category>().is_err());
    }

    #[test]
    fn test_match_loose() {
        assert_eq!(Category::match_loose("Transport"), Category::Transport);
        assert_eq!(Category::match_loose("Category: Health."), Category::Health);
        assert_eq!(Category::match_loose("groceries"), Category::Other);
        assert_eq!(Category::match_loose(""), Category::Other);
    }

    #[test]
    fn test_prompt_list_contains_all() {
        let list = Category::prompt_list();
        for category in Category::ALL {
            assert!(list.contains(category.as_str()));
        }
    }
}
