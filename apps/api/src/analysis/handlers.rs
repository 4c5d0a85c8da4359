//! Axum route handlers for the Analysis API.

use axum::{extract::State, Json};

use crate::analysis::models::{AnalysisRequest, AnalysisResponse};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /analyze
///
/// Runs keyword extraction and match analysis for a resume against a job
/// description. Match-analysis failures degrade to keyword overlap; only
/// validation and keyword-extraction failures produce an error status.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let response = state.analyzer.analyze(request).await?;
    Ok(Json(response))
}
