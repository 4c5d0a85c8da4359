use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Minimum trimmed length, in characters, of both request texts.
pub const MIN_TEXT_CHARS: usize = 50;

/// Request body for `POST /analyze`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub resume_text: String,
    pub job_description: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis data models (shared by the normalizer and the fallback)
// ────────────────────────────────────────────────────────────────────────────

/// One rewritten resume bullet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletSuggestion {
    pub original: String,
    pub improved: String,
    pub reason: String,
}

/// Keyword lists pulled from each document by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordSets {
    pub resume: Vec<String>,
    pub job: Vec<String>,
}

/// Strongly-typed match result. Produced by the normalizer or by the
/// rule-based fallback; never built directly from model JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub match_percentage: f64,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub suggestions: Vec<BulletSuggestion>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

/// Final response returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub match_percentage: f64, // 0 – 100
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub suggestions: Vec<BulletSuggestion>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub overall_feedback: String,
    /// Seconds spent in the pipeline.
    pub processing_time: Option<f64>,
    /// True when the match report came from the rule-based fallback.
    pub degraded: bool,
}
