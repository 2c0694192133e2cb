//! CV analysis pipeline: prompt → model → normalize, under the retry policy.

use tracing::{debug, info};

use crate::analysis::normalizer::{normalize_response, AnalysisResult};
use crate::analysis::prompts::build_analysis_prompt;
use crate::analysis::retry::RetryPolicy;
use crate::llm_client::{ApiKey, LlmError, ModelClient};

/// Extracted CV text shorter than this (after trimming) is rejected.
pub const MIN_CV_CHARS: usize = 100;
/// Job descriptions shorter than this (after trimming) are rejected.
pub const MIN_JOB_DESCRIPTION_CHARS: usize = 50;

/// Scores `cv_text` against `job_description`.
///
/// The model call and normalization are retried together; normalization
/// itself never fails, so only upstream errors consume attempts.
pub async fn analyze_cv(
    model: &dyn ModelClient,
    policy: &RetryPolicy,
    api_key: &ApiKey,
    cv_text: &str,
    job_description: &str,
) -> Result<AnalysisResult, LlmError> {
    let prompt = build_analysis_prompt(cv_text, job_description);
    debug!("Built analysis prompt ({} chars)", prompt.len());
    let prompt = prompt.as_str();

    let result = policy
        .run(
            move |attempt| async move {
                debug!("Calling model (attempt {attempt})");
                let raw = model.generate(api_key, prompt).await?;
                Ok::<_, LlmError>(normalize_response(&raw))
            },
            LlmError::is_transient,
        )
        .await?;

    info!(
        score = result.score,
        ats_friendly = result.ats_friendly,
        "Analysis complete"
    );
    Ok(result)
}
