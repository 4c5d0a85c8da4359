use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::analysis::pipeline::Analyzer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            started_at: Utc::now(),
        }
    }
}
