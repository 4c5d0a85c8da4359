//! Match Analyzer — one structured model call, normalized into a `MatchReport`,
//! with a rule-based keyword overlap when the call or the JSON fails.

use serde_json::Value;
use tracing::{debug, warn};

use crate::analysis::chunker::TextChunker;
use crate::analysis::keywords::{basic_keywords, has_list_marker, strip_list_marker};
use crate::analysis::models::{KeywordSets, MatchReport};
use crate::analysis::normalize::{normalize_match, parse_model_json};
use crate::analysis::prompts::{render, MATCH_ANALYSIS_PROMPT};
use crate::llm_client::{CallFailure, ChatModel, LlmError};

/// Bullets offered to the model for rewriting.
const MAX_PROMPT_BULLETS: usize = 5;
/// Bullet lines considered when scanning a resume.
const MAX_SCANNED_BULLETS: usize = 10;
/// Cleaned bullets this short carry too little to rewrite.
const MIN_BULLET_CHARS: usize = 10;

/// Result of the analysis stage. `degraded` is set when the report came from
/// the rule-based fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub report: MatchReport,
    pub degraded: bool,
}

/// Runs the match analysis. Never fails: any model or parse error switches
/// to `rule_based_match`.
pub async fn analyze_match(
    model: &dyn ChatModel,
    chunker: &TextChunker,
    resume_text: &str,
    job_description: &str,
    keywords: Option<&KeywordSets>,
    max_suggestions: usize,
) -> MatchOutcome {
    let prompt = build_match_prompt(chunker, resume_text, job_description, keywords, max_suggestions);

    match request_match(model, &prompt, max_suggestions).await {
        Ok(report) => {
            debug!(
                "Match analysis normalized: {:.1}% ({} matched, {} missing)",
                report.match_percentage,
                report.matched_keywords.len(),
                report.missing_keywords.len()
            );
            MatchOutcome {
                report,
                degraded: false,
            }
        }
        Err(e) => {
            warn!("Match analysis failed, using rule-based fallback: {e}");
            MatchOutcome {
                report: rule_based_match(resume_text, job_description, keywords),
                degraded: true,
            }
        }
    }
}

async fn request_match(
    model: &dyn ChatModel,
    prompt: &str,
    max_suggestions: usize,
) -> Result<MatchReport, LlmError> {
    let value: Value = match model.complete_json(prompt).await {
        Ok(value) => value,
        // Strict parse failed; give the normalizer its one repair attempt.
        Err(LlmError::ModelCallFailed(CallFailure::MalformedJson { raw, .. })) => {
            parse_model_json(&raw)?
        }
        Err(e) => return Err(e),
    };
    normalize_match(&value, max_suggestions)
}

fn build_match_prompt(
    chunker: &TextChunker,
    resume_text: &str,
    job_description: &str,
    keywords: Option<&KeywordSets>,
    max_suggestions: usize,
) -> String {
    let (resume_keywords, job_keywords) = match keywords {
        Some(sets) => (sets.resume.join(", "), sets.job.join(", ")),
        None => ("(not extracted)".to_string(), "(not extracted)".to_string()),
    };

    let bullets = extract_bullet_points(resume_text);
    let bullet_points = if bullets.is_empty() {
        "(none found)".to_string()
    } else {
        bullets
            .iter()
            .take(MAX_PROMPT_BULLETS)
            .map(|b| format!("- {b}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let max_suggestions = max_suggestions.to_string();

    render(
        MATCH_ANALYSIS_PROMPT,
        &[
            ("job_keywords", job_keywords.as_str()),
            ("resume_keywords", resume_keywords.as_str()),
            ("job_description", chunker.first_window(job_description)),
            ("resume_text", chunker.first_window(resume_text)),
            ("bullet_points", bullet_points.as_str()),
            ("max_suggestions", max_suggestions.as_str()),
        ],
    )
}

/// Pulls bulleted lines (`-`, `•`, `*`, `1.`, `1)`) out of a resume.
pub fn extract_bullet_points(resume_text: &str) -> Vec<String> {
    resume_text
        .lines()
        .map(str::trim)
        .filter(|line| has_list_marker(line))
        .map(|line| strip_list_marker(line).trim().to_string())
        .filter(|bullet| bullet.chars().count() > MIN_BULLET_CHARS)
        .take(MAX_SCANNED_BULLETS)
        .collect()
}

/// Keyword-overlap result that needs no model. Uses the extracted keyword
/// sets when present, otherwise tokenizes the texts.
pub fn rule_based_match(
    resume_text: &str,
    job_description: &str,
    keywords: Option<&KeywordSets>,
) -> MatchReport {
    let (resume_keywords, job_keywords) = match keywords {
        Some(sets) if !sets.job.is_empty() => (sets.resume.clone(), sets.job.clone()),
        _ => (basic_keywords(resume_text), basic_keywords(job_description)),
    };

    let resume_lower: Vec<String> = resume_keywords.iter().map(|k| k.to_lowercase()).collect();
    let (matched_keywords, missing_keywords): (Vec<String>, Vec<String>) = job_keywords
        .iter()
        .cloned()
        .partition(|k| resume_lower.contains(&k.to_lowercase()));

    let match_percentage = if job_keywords.is_empty() {
        0.0
    } else {
        matched_keywords.len() as f64 / job_keywords.len() as f64 * 100.0
    };

    MatchReport {
        match_percentage,
        matched_keywords,
        missing_keywords,
        ..MatchReport::default()
    }
}
