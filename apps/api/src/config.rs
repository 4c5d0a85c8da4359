use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub analysis: AnalysisConfig,
    /// Allowed CORS origin. `None` means permissive.
    pub frontend_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

/// Everything the analysis pipeline and the LLM client need, passed in
/// explicitly so nothing below `main` touches process-wide state.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub api_key: String,
    pub api_url: String,
    pub model_name: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub call_timeout: Duration,
    pub max_suggestions: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            max_tokens: 2000,
            temperature: 0.3,
            chunk_size: 4000,
            chunk_overlap: 200,
            call_timeout: Duration::from_secs(30),
            max_suggestions: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = AnalysisConfig::default();
        let analysis = AnalysisConfig {
            api_key: require_env("ANTHROPIC_API_KEY")?,
            api_url: env_or("LLM_API_URL", defaults.api_url),
            model_name: env_or("MODEL_NAME", defaults.model_name),
            max_tokens: parse_env("MAX_TOKENS", defaults.max_tokens)?,
            temperature: parse_env("TEMPERATURE", defaults.temperature)?,
            chunk_size: parse_env("CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: parse_env("CHUNK_OVERLAP", defaults.chunk_overlap)?,
            call_timeout: Duration::from_secs(parse_env(
                "LLM_TIMEOUT_SECS",
                defaults.call_timeout.as_secs(),
            )?),
            max_suggestions: parse_env("MAX_SUGGESTIONS", defaults.max_suggestions)?,
        };
        analysis.validate()?;

        Ok(Config {
            analysis,
            frontend_url: std::env::var("FRONTEND_URL").ok().filter(|v| !v.is_empty()),
            port: parse_env("PORT", 8000)?,
            rust_log: env_or("RUST_LOG", "info".to_string()),
        })
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size <= self.chunk_overlap {
            bail!(
                "CHUNK_SIZE ({}) must be greater than CHUNK_OVERLAP ({})",
                self.chunk_size,
                self.chunk_overlap
            );
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            bail!("TEMPERATURE must be between 0.0 and 2.0, got {}", self.temperature);
        }
        if self.call_timeout.is_zero() {
            bail!("LLM_TIMEOUT_SECS must be at least 1");
        }
        Ok(())
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}
