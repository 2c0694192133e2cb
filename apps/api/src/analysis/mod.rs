// CV analysis: request validation, prompt building, model call with retry,
// and normalization of the model's answer.
// All model calls go through llm_client::ModelClient.

pub mod analyzer;
pub mod handlers;
pub mod normalizer;
pub mod prompts;
pub mod retry;
pub mod validation;
