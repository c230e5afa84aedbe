//! Tolerant JSON extraction from model replies.
//!
//! Models wrap JSON in prose, code fences, or single quotes. Strategies are
//! tried in order: the reply as-is, the outermost `{...}` slice, then the
//! slice after stripping fences and swapping quotes.

use serde_json::Value;

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

fn outer_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    let slice = text.get(start..=end)?;
    (slice.len() > 10).then_some(slice)
}

fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").replace('\'', "\"")
}

/// Extracts the first JSON object a model reply contains.
#[must_use]
pub fn extract_json_object(reply: &str) -> Option<Value> {
    let reply = reply.trim();

    parse_object(reply)
        .or_else(|| outer_braces(reply).and_then(parse_object))
        .or_else(|| {
            let cleaned = strip_fences(reply);
            parse_object(cleaned.trim())
                .or_else(|| outer_braces(&cleaned).and_then(parse_object))
        })
}
