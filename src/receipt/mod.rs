//! Receipt scanning: OCR, then a language model turns the text into fields.
//!
//! The pipeline never fails outright. Any problem (no model, unreadable
//! image, provider error, unusable reply) yields
//! [`ReceiptExtraction::default`] and a log line.

/// Image decoding and download
pub mod image;
/// Tesseract OCR
pub mod ocr;

use crate::{
    ai::{CompletionRequest, LanguageModel, json::extract_json_object},
    core::category::Category,
};
use ocr::TextExtractor;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

const MAX_MERCHANT_CHARS: usize = 100;
const MAX_ITEM_CHARS: usize = 50;
const MAX_ITEMS: usize = 20;
const MAX_DESCRIPTION_CHARS: usize = 500;
const UNKNOWN_MERCHANT: &str = "Unknown Merchant";

/// Structured data read from a receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptExtraction {
    /// Store name
    pub merchant: String,
    /// Total paid, 0 when unknown
    pub amount: f64,
    /// Three-letter currency code
    pub currency: String,
    /// Purchase date as printed (first 10 characters), if any
    pub date: Option<String>,
    /// Line items
    pub items: Vec<String>,
    /// Spending category
    pub category: Category,
    /// Short description
    pub description: String,
}

impl Default for ReceiptExtraction {
    fn default() -> Self {
        Self {
            merchant: UNKNOWN_MERCHANT.to_string(),
            amount: 0.0,
            currency: "USD".to_string(),
            date: None,
            items: Vec::new(),
            category: Category::Other,
            description: String::new(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn parse_amount(value: &Value) -> f64 {
    let amount = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
                .collect();
            cleaned.parse().unwrap_or(0.0)
        }
        _ => 0.0,
    };

    if amount.is_finite() && amount > 0.0 {
        (amount * 100.0).round() / 100.0
    } else {
        0.0
    }
}

fn parse_merchant(value: &Value) -> String {
    let merchant = value.as_str().map(str::trim).unwrap_or_default();
    let placeholder = matches!(
        merchant.to_lowercase().as_str(),
        "" | "unknown" | "unknown merchant" | "merchant" | "n/a" | "none" | "null"
    );
    if placeholder {
        UNKNOWN_MERCHANT.to_string()
    } else {
        truncate(merchant, MAX_MERCHANT_CHARS)
    }
}

fn parse_currency(value: &Value) -> String {
    let code: String = value
        .as_str()
        .map(str::trim)
        .unwrap_or_default()
        .chars()
        .take(3)
        .collect::<String>()
        .to_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        code
    } else {
        "USD".to_string()
    }
}

fn parse_date(value: &Value) -> Option<String> {
    let date = value.as_str()?.trim();
    if matches!(date.to_lowercase().as_str(), "" | "null" | "none" | "n/a") {
        None
    } else {
        Some(truncate(date, 10))
    }
}

fn parse_items(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Null => None,
                    other => other["name"]
                        .as_str()
                        .map(|s| s.trim().to_string())
                        .or_else(|| Some(other.to_string())),
                })
                .filter(|s| !s.is_empty())
                .map(|s| truncate(&s, MAX_ITEM_CHARS))
                .take(MAX_ITEMS)
                .collect()
        })
        .unwrap_or_default()
}

impl ReceiptExtraction {
    /// Normalizes a model's JSON answer into a valid extraction.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let items = parse_items(&value["items"]);
        let description = if items.is_empty() {
            value["description"]
                .as_str()
                .map(|d| truncate(d.trim(), MAX_DESCRIPTION_CHARS))
                .unwrap_or_default()
        } else {
            truncate(&items.join(", "), MAX_DESCRIPTION_CHARS)
        };

        Self {
            merchant: parse_merchant(&value["merchant"]),
            amount: parse_amount(&value["amount"]),
            currency: parse_currency(&value["currency"]),
            date: parse_date(&value["date"]),
            category: value["category"]
                .as_str()
                .map_or(Category::Other, Category::match_loose),
            items,
            description,
        }
    }
}

/// Prompt asking the model to structure OCR text.
#[must_use]
pub fn extraction_request(ocr_text: &str) -> CompletionRequest {
    let prompt = format!(
        "Extract the purchase details from this receipt text.\n\n\
         Receipt text:\n{ocr_text}\n\n\
         Respond with JSON only, no explanation:\n\
         {{\"merchant\": string, \"amount\": number (the final total), \
         \"currency\": 3-letter code, \"date\": \"YYYY-MM-DD\" or null, \
         \"items\": [string], \"category\": one of {}, \"description\": string}}",
        Category::prompt_list()
    );
    CompletionRequest::prompt(prompt).with_max_tokens(500)
}

/// Runs the full pipeline on image bytes.
#[instrument(skip_all, fields(bytes = image.len()))]
pub async fn scan_receipt(
    model: Option<&dyn LanguageModel>,
    ocr: &dyn TextExtractor,
    image: &[u8],
) -> ReceiptExtraction {
    let Some(model) = model else {
        warn!("Receipt scan skipped: no language model configured");
        return ReceiptExtraction::default();
    };

    let text = match ocr.extract_text(image).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!("OCR found no text on the receipt");
            return ReceiptExtraction::default();
        }
        Err(e) => {
            warn!("OCR failed: {e}");
            return ReceiptExtraction::default();
        }
    };

    let reply = match model.complete(&extraction_request(&text)).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Receipt extraction request failed: {e}");
            return ReceiptExtraction::default();
        }
    };

    extract_json_object(&reply).map_or_else(
        || {
            warn!("Receipt extraction reply was not JSON");
            ReceiptExtraction::default()
        },
        |value| {
            let extraction = ReceiptExtraction::from_value(&value);
            info!(merchant = %extraction.merchant, amount = extraction.amount, "Receipt extracted");
            extraction
        },
    )
}
