//! Analysis pipeline — orchestrates one request end to end.
//!
//! Flow: validate → chunk → extract keywords (resume ∥ job) → match analysis
//!       (normalize | fallback) → assemble.
//!
//! Only keyword extraction can fail the request after validation; match
//! analysis always produces a report.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::analysis::assembler::assemble;
use crate::analysis::chunker::{ChunkerConfigError, TextChunker};
use crate::analysis::keywords::extract_keywords;
use crate::analysis::matcher::analyze_match;
use crate::analysis::models::{AnalysisRequest, AnalysisResponse, MIN_TEXT_CHARS};
use crate::config::AnalysisConfig;
use crate::errors::AppError;
use crate::llm_client::ChatModel;

pub struct Analyzer {
    model: Arc<dyn ChatModel>,
    chunker: TextChunker,
    max_suggestions: usize,
}

impl Analyzer {
    pub fn new(model: Arc<dyn ChatModel>, config: &AnalysisConfig) -> Result<Self, ChunkerConfigError> {
        Ok(Self {
            model,
            chunker: TextChunker::new(config.chunk_size, config.chunk_overlap)?,
            max_suggestions: config.max_suggestions,
        })
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Runs the full pipeline for one request.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse, AppError> {
        let request_id = Uuid::new_v4();
        self.run(request)
            .instrument(info_span!("analysis", %request_id))
            .await
    }

    async fn run(&self, request: AnalysisRequest) -> Result<AnalysisResponse, AppError> {
        let started = Instant::now();

        let resume_text = validate_text("resume_text", &request.resume_text)?;
        let job_description = validate_text("job_description", &request.job_description)?;

        info!(
            "Starting resume analysis - Resume: {} chars, Job: {} chars",
            resume_text.chars().count(),
            job_description.chars().count()
        );

        debug!("Extracting keywords");
        let keywords =
            extract_keywords(self.model.as_ref(), &self.chunker, resume_text, job_description)
                .await?;

        debug!("Analyzing match");
        let outcome = analyze_match(
            self.model.as_ref(),
            &self.chunker,
            resume_text,
            job_description,
            Some(&keywords),
            self.max_suggestions,
        )
        .await;

        let response = assemble(outcome, started.elapsed());

        info!(
            "Analysis complete: {:.1}% match, degraded={}, {:.2}s",
            response.match_percentage,
            response.degraded,
            response.processing_time.unwrap_or_default()
        );

        Ok(response)
    }
}

/// Trims `text` and enforces the minimum length.
fn validate_text<'a>(field: &str, text: &'a str) -> Result<&'a str, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }

    let len = trimmed.chars().count();
    if len < MIN_TEXT_CHARS {
        return Err(AppError::Validation(format!(
            "{field} must be at least {MIN_TEXT_CHARS} characters long (got {len})"
        )));
    }

    Ok(trimmed)
}
