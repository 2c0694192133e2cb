//! Text extraction: turns an uploaded résumé into plain text.
//!
//! Strategy is picked from the filename's lowercase extension. Parsing is
//! synchronous and CPU-bound; handlers run it on the blocking pool.

pub mod docx;
pub mod pdf;

use thiserror::Error;

/// Extensions accepted by the upload form.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "txt"];

#[derive(Debug, Error)]
pub enum ExtractionError {
    /// No strategy exists for this file. The message is shown to the client.
    #[error("{0}")]
    UnsupportedFormat(String),

    /// The file could not be parsed (corrupt, wrong encoding, parser panic).
    #[error("extraction failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    LegacyDoc,
    Docx,
    PlainText,
}

impl DocumentKind {
    /// Maps an extension (without the dot, any case) to a document kind.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "doc" => Some(DocumentKind::LegacyDoc),
            "docx" => Some(DocumentKind::Docx),
            "txt" => Some(DocumentKind::PlainText),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        file_extension(filename).and_then(Self::from_extension)
    }
}

/// Returns the text after the last dot, or `None` when there is no dot.
pub fn file_extension(filename: &str) -> Option<&str> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// Extracts plain text from `data`, dispatching on `filename`'s extension.
pub fn extract_text(filename: &str, data: &[u8]) -> Result<String, ExtractionError> {
    let kind = DocumentKind::from_filename(filename).ok_or_else(|| {
        ExtractionError::UnsupportedFormat("Unsupported file format".to_string())
    })?;

    match kind {
        DocumentKind::Pdf => pdf::extract_pdf_text(data),
        DocumentKind::Docx => docx::extract_docx_text(data),
        DocumentKind::PlainText => extract_plain_text(data),
        // Word 97-2003 binaries have no parser here; a .doc that is really a
        // DOCX container (renamed file) is still readable.
        DocumentKind::LegacyDoc if docx::is_zip_container(data) => docx::extract_docx_text(data),
        DocumentKind::LegacyDoc => Err(ExtractionError::UnsupportedFormat(
            "Legacy .doc files cannot be read. Please save the CV as .docx or PDF and try again."
                .to_string(),
        )),
    }
}

fn extract_plain_text(data: &[u8]) -> Result<String, ExtractionError> {
    let text = std::str::from_utf8(data)
        .map_err(|e| ExtractionError::Failed(format!("text file is not valid UTF-8: {e}")))?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}
