//! Normalizer — coerces the model's untyped match JSON into a `MatchReport`.
//!
//! The model does not reliably follow the schema: list fields sometimes come
//! back as one bulleted string, percentages as `"75%"`, keys under older
//! names. Everything dynamic stays inside this module.

use serde_json::{Map, Value};

use crate::analysis::keywords::{dedup_case_insensitive, strip_list_marker};
use crate::analysis::models::{BulletSuggestion, MatchReport};
use crate::llm_client::{strip_json_fences, LlmError};

/// Parses raw model text as a JSON object. On failure, retries once on the
/// slice between the first `{` and the last `}`.
pub fn parse_model_json(raw: &str) -> Result<Value, LlmError> {
    let text = strip_json_fences(raw);

    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(first) => {
            let repaired = extract_object(text).ok_or_else(|| {
                LlmError::ResponseParseFailed(format!("no JSON object in reply ({first})"))
            })?;
            serde_json::from_str::<Value>(repaired)
                .map_err(|e| LlmError::ResponseParseFailed(e.to_string()))?
        }
    };

    if !value.is_object() {
        return Err(LlmError::ResponseParseFailed(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }
    Ok(value)
}

fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Coerces a parsed match object into the fixed schema.
pub fn normalize_match(value: &Value, max_suggestions: usize) -> Result<MatchReport, LlmError> {
    let obj = value.as_object().ok_or_else(|| {
        LlmError::ResponseParseFailed(format!("expected a JSON object, got {}", json_kind(value)))
    })?;

    let matched_keywords =
        dedup_case_insensitive(keyword_list(field(obj, &["matched_keywords", "matches"])));
    let matched_lower: Vec<String> = matched_keywords.iter().map(|k| k.to_lowercase()).collect();
    let missing_keywords: Vec<String> =
        dedup_case_insensitive(keyword_list(field(obj, &["missing_keywords", "gaps"])))
            .into_iter()
            .filter(|k| !matched_lower.contains(&k.to_lowercase()))
            .collect();

    let match_percentage = field(obj, &["match_percentage", "percentage"])
        .and_then(percentage_value)
        .map(|p| p.clamp(0.0, 100.0))
        .unwrap_or_else(|| overlap_percentage(matched_keywords.len(), missing_keywords.len()));

    let mut suggestions = suggestion_list(field(obj, &["suggestions"]));
    suggestions.truncate(max_suggestions);

    Ok(MatchReport {
        match_percentage,
        matched_keywords,
        missing_keywords,
        suggestions,
        strengths: text_list(field(obj, &["strengths"])),
        areas_for_improvement: text_list(field(
            obj,
            &["areas_for_improvement", "improvements", "recommendations"],
        )),
    })
}

/// `|matched| / max(1, |matched| + |missing|) * 100`
pub fn overlap_percentage(matched: usize, missing: usize) -> f64 {
    matched as f64 / (matched + missing).max(1) as f64 * 100.0
}

/// First non-null value among `keys`.
fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn percentage_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// List of free-text items. A string is split on lines and bullet markers.
fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(Value::String(s)) => split_lines(s),
        Some(other) => scalar_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Like `text_list`, but a string is also split on commas.
fn keyword_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => split_lines(s)
            .iter()
            .flat_map(|line| line.split(','))
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect(),
        other => text_list(other),
    }
}

fn split_lines(s: &str) -> Vec<String> {
    s.lines()
        .map(|line| strip_list_marker(line).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Keeps only suggestion objects carrying all three non-empty fields.
fn suggestion_list(value: Option<&Value>) -> Vec<BulletSuggestion> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let get = |key: &str| {
                obj.get(key)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            Some(BulletSuggestion {
                original: get("original")?,
                improved: get("improved")?,
                reason: get("reason")?,
            })
        })
        .collect()
}
