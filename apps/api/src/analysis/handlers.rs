//! Axum route handler for the analysis API.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::analysis::analyzer::{analyze_cv, MIN_CV_CHARS};
use crate::analysis::normalizer::AnalysisResult;
use crate::analysis::validation::{AnalyzeForm, ValidatedRequest};
use crate::errors::AppError;
use crate::extraction::extract_text;
use crate::llm_client::ApiKey;
use crate::state::AppState;

/// POST /analyze
///
/// Multipart fields: `cv` (file), `apiKey`, `jobDescription`.
/// Validates, extracts the CV text, and returns the normalized model verdict.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let request_id = Uuid::new_v4();
    analyze(state, multipart)
        .instrument(info_span!("analyze", %request_id))
        .await
}

async fn analyze(
    state: AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    info!("Starting analysis request");

    let multipart = multipart.map_err(|_| AppError::Validation("No file uploaded".to_string()))?;
    let ValidatedRequest {
        filename,
        data,
        api_key,
        job_description,
    } = AnalyzeForm::read(multipart, state.config.max_upload_mb())
        .await?
        .validate()?;
    let api_key = ApiKey::new(&api_key)?;

    info!(file = %filename, bytes = data.len(), "Extracting text from file");
    let cv_text = tokio::task::spawn_blocking(move || extract_text(&filename, &data))
        .await
        .map_err(|e| {
            if e.is_panic() {
                AppError::Extraction("document parser panicked".to_string())
            } else {
                AppError::Internal(e.into())
            }
        })??;

    if cv_text.trim().chars().count() < MIN_CV_CHARS {
        return Err(AppError::Validation(
            "CV content appears to be too short or empty".to_string(),
        ));
    }

    info!("Analyzing CV");
    let result = analyze_cv(
        state.model.as_ref(),
        &state.retry_policy,
        &api_key,
        &cv_text,
        &job_description,
    )
    .await?;

    Ok(Json(result))
}
