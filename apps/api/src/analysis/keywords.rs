//! Keyword Extractor — asks the model for the keywords of each document.
//!
//! Resume and job description are extracted concurrently. A document longer
//! than one chunk is fanned out one call per chunk and the results merged in
//! chunk order. Any failed call fails the whole extraction.

use std::collections::HashSet;

use futures::future::try_join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::analysis::chunker::TextChunker;
use crate::analysis::models::KeywordSets;
use crate::analysis::prompts::{render, JOB_CONTEXT, KEYWORD_EXTRACTION_PROMPT, RESUME_CONTEXT};
use crate::llm_client::{ChatModel, LlmError, ResponseShape};

/// Cap on keywords kept per document from the model.
pub const MAX_MODEL_KEYWORDS: usize = 30;
/// Cap on keywords kept per document by the rule-based tokenizer.
pub const MAX_BASIC_KEYWORDS: usize = 50;

static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-•*]+\s*|\d{1,2}[.)](?:\s+|$))").expect("valid list marker regex"));

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z][A-Za-z0-9+#\-.]*").expect("valid word regex"));

const STOP_WORDS: &[&str] = &[
    "the", "and", "but", "for", "with", "from", "about", "into", "through", "during", "before",
    "after", "above", "below", "between", "among", "throughout", "are", "was", "were", "our",
    "you", "your", "will", "have", "has", "that", "this", "their", "they", "who", "all", "any",
];

/// Extracts keyword lists for both documents concurrently.
pub async fn extract_keywords(
    model: &dyn ChatModel,
    chunker: &TextChunker,
    resume_text: &str,
    job_description: &str,
) -> Result<KeywordSets, LlmError> {
    let (resume, job) = tokio::try_join!(
        extract_document(model, chunker, resume_text, "resume", RESUME_CONTEXT),
        extract_document(model, chunker, job_description, "job description", JOB_CONTEXT),
    )?;

    debug!(
        "Extracted {} resume keywords and {} job keywords",
        resume.len(),
        job.len()
    );

    Ok(KeywordSets { resume, job })
}

async fn extract_document(
    model: &dyn ChatModel,
    chunker: &TextChunker,
    text: &str,
    document: &str,
    context: &str,
) -> Result<Vec<String>, LlmError> {
    let calls = chunker.chunks(text).map(|chunk| {
        let prompt = render(
            KEYWORD_EXTRACTION_PROMPT,
            &[("document", document), ("context", context), ("text", chunk)],
        );
        async move { model.complete(&prompt, ResponseShape::Text).await }
    });

    let replies = try_join_all(calls).await?;

    let merged = replies.iter().flat_map(|reply| parse_keyword_list(reply));
    let mut keywords = dedup_case_insensitive(merged);
    keywords.truncate(MAX_MODEL_KEYWORDS);
    Ok(keywords)
}

/// Parses a free-text keyword reply: comma- or newline-separated, optionally
/// bulleted or quoted.
pub fn parse_keyword_list(reply: &str) -> Vec<String> {
    let items = reply
        .lines()
        .flat_map(|line| strip_list_marker(line).split(',').map(str::to_string).collect::<Vec<_>>())
        .map(|item| {
            item.trim()
                .trim_matches(|c| c == '"' || c == '\'' || c == '`')
                .trim_end_matches('.')
                .trim()
                .to_string()
        })
        .filter(|item| !item.is_empty());

    dedup_case_insensitive(items)
}

/// True when `line` opens with a bullet or a short `1.` / `1)` number.
/// "3.5 years" and "2019. Joined" are not list items.
pub fn has_list_marker(line: &str) -> bool {
    LIST_MARKER.is_match(line)
}

/// Removes a leading `-`, `•`, `*`, `1.` or `1)` marker.
pub fn strip_list_marker(line: &str) -> &str {
    match LIST_MARKER.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Keeps the first occurrence of each item, comparing case-insensitively.
pub fn dedup_case_insensitive<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}

/// Rule-based tokenizer used when no model keywords are available: lowercase
/// words of three or more characters, stop words removed.
pub fn basic_keywords(text: &str) -> Vec<String> {
    let words = WORD
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', '-']).to_lowercase())
        .filter(|w| w.chars().count() >= 3 && !STOP_WORDS.contains(&w.as_str()));

    let mut keywords = dedup_case_insensitive(words);
    keywords.truncate(MAX_BASIC_KEYWORDS);
    keywords
}
