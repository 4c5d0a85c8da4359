//! Response Assembler — turns the analysis outcome into the caller-facing
//! `AnalysisResponse`.

use std::time::Duration;

use crate::analysis::matcher::MatchOutcome;
use crate::analysis::models::{AnalysisResponse, MatchReport};

/// Feedback used whenever the report came from the rule-based fallback.
pub const DEGRADED_FEEDBACK: &str = "AI analysis is temporarily unavailable. \
    This result is based on simple keyword overlap between your resume and the job description; \
    try again later for detailed suggestions.";

/// Keywords named in generated feedback, per list.
const FEEDBACK_KEYWORDS: usize = 5;

pub fn assemble(outcome: MatchOutcome, elapsed: Duration) -> AnalysisResponse {
    let overall_feedback = if outcome.degraded {
        DEGRADED_FEEDBACK.to_string()
    } else {
        generate_feedback(&outcome.report)
    };

    let MatchReport {
        match_percentage,
        matched_keywords,
        missing_keywords,
        suggestions,
        strengths,
        areas_for_improvement,
    } = outcome.report;

    AnalysisResponse {
        match_percentage: match_percentage.clamp(0.0, 100.0),
        matched_keywords,
        missing_keywords,
        suggestions,
        strengths,
        areas_for_improvement,
        overall_feedback,
        processing_time: Some(elapsed.as_secs_f64()),
        degraded: outcome.degraded,
    }
}

/// Builds a human-readable summary from the score and keyword lists.
pub fn generate_feedback(report: &MatchReport) -> String {
    let percentage = report.match_percentage;

    let mut feedback = if percentage >= 80.0 {
        "Excellent match! Your resume aligns very well with the job requirements.".to_string()
    } else if percentage >= 60.0 {
        "Good match with room for improvement.".to_string()
    } else if percentage >= 40.0 {
        "Moderate match. Consider adding more relevant keywords.".to_string()
    } else {
        "Limited match. Significant improvements needed to align with job requirements."
            .to_string()
    };

    if !report.matched_keywords.is_empty() {
        feedback.push_str(&format!(
            " Strong areas: {}.",
            head(&report.matched_keywords).join(", ")
        ));
    }
    if !report.missing_keywords.is_empty() {
        feedback.push_str(&format!(
            " Consider adding: {}.",
            head(&report.missing_keywords).join(", ")
        ));
    }

    feedback
}

fn head(items: &[String]) -> &[String] {
    &items[..items.len().min(FEEDBACK_KEYWORDS)]
}
