// Resume / job-description analysis pipeline.
// All model calls go through llm_client::ChatModel — no direct provider calls here.

pub mod assembler;
pub mod chunker;
pub mod handlers;
pub mod keywords;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
