//! Request validation for `POST /analyze`.
//!
//! Checks run in a fixed order and stop at the first failure, before any
//! extraction or model work happens.

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::analysis::analyzer::MIN_JOB_DESCRIPTION_CHARS;
use crate::errors::AppError;
use crate::extraction::{file_extension, ALLOWED_EXTENSIONS};

/// The uploaded résumé exactly as received.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: Option<String>,
    pub data: Bytes,
}

/// Raw multipart fields, before validation.
#[derive(Debug, Default)]
pub struct AnalyzeForm {
    pub cv: Option<UploadedDocument>,
    pub api_key: Option<String>,
    pub job_description: Option<String>,
}

/// A request that passed every check.
#[derive(Debug)]
pub struct ValidatedRequest {
    pub filename: String,
    pub data: Bytes,
    pub api_key: String,
    pub job_description: String,
}

impl AnalyzeForm {
    /// Drains the multipart stream into an `AnalyzeForm`.
    /// Exceeding the body limit surfaces as `PayloadTooLarge`.
    pub async fn read(mut multipart: Multipart, limit_mb: usize) -> Result<Self, AppError> {
        let mut form = AnalyzeForm::default();
        let map_err = |e: MultipartError| multipart_error(e, limit_mb);

        while let Some(field) = multipart.next_field().await.map_err(map_err)? {
            let name = field.name().unwrap_or("").to_string();

            match name.as_str() {
                "cv" => {
                    let filename = field.file_name().map(str::to_string);
                    let data = field.bytes().await.map_err(map_err)?;
                    debug!("Received file {:?} ({} bytes)", filename, data.len());
                    form.cv = Some(UploadedDocument { filename, data });
                }
                "apiKey" => form.api_key = Some(field.text().await.map_err(map_err)?),
                "jobDescription" => {
                    form.job_description = Some(field.text().await.map_err(map_err)?)
                }
                _ => warn!("Ignoring unknown multipart field: {}", name),
            }
        }

        Ok(form)
    }

    /// Applies the checks in order: file, API key, job description, extension.
    pub fn validate(self) -> Result<ValidatedRequest, AppError> {
        // A part without a filename is a plain text field, not a file. A
        // browser submits an empty, unnamed file part when no file was chosen.
        let (filename, data) = match self.cv {
            Some(UploadedDocument {
                filename: Some(filename),
                data,
            }) if !(filename.is_empty() && data.is_empty()) => (filename, data),
            _ => return Err(AppError::Validation("No file uploaded".to_string())),
        };

        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::Validation("API key is required".to_string()))?;

        let job_description = self
            .job_description
            .filter(|jd| !jd.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Job description is required".to_string()))?;
        if job_description.trim().chars().count() < MIN_JOB_DESCRIPTION_CHARS {
            return Err(AppError::Validation(format!(
                "Job description must be at least {MIN_JOB_DESCRIPTION_CHARS} characters"
            )));
        }

        if filename.trim().is_empty() {
            return Err(AppError::Validation("Invalid file format".to_string()));
        }
        let extension = file_extension(&filename)
            .ok_or_else(|| AppError::Validation("Invalid file format".to_string()))?
            .to_ascii_lowercase();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::Validation(format!(
                "File type .{extension} is not supported"
            )));
        }

        Ok(ValidatedRequest {
            filename,
            data,
            api_key,
            job_description,
        })
    }
}

fn multipart_error(err: MultipartError, limit_mb: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit_mb }
    } else {
        AppError::Validation(format!("Invalid multipart form data: {}", err.body_text()))
    }
}
