use std::panic::{self, AssertUnwindSafe};

use super::ExtractionError;

/// Extracts text page by page. Each page contributes its text followed by a
/// newline; pages without a text layer contribute an empty segment.
pub fn extract_pdf_text(data: &[u8]) -> Result<String, ExtractionError> {
    // pdf-extract can panic on malformed content streams.
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(data)
    }))
    .map_err(|_| ExtractionError::Failed("PDF parser aborted on malformed input".to_string()))?
    .map_err(|e| ExtractionError::Failed(format!("PDF parse error: {e}")))?;

    let mut text = String::new();
    for page in &pages {
        text.push_str(page);
        text.push('\n');
    }
    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Writes a minimal PDF with one Helvetica text line per page.
    /// An empty string produces a page with an empty content stream.
    pub(crate) fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let font_id = 3;
        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            String::new(), // page tree, filled in once page ids are known
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];

        let mut kids = Vec::new();
        for text in pages {
            let page_id = objects.len() + 1;
            let content_id = page_id + 1;
            kids.push(format!("{page_id} 0 R"));
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 {font_id} 0 R >> >> /Contents {content_id} 0 R >>"
            ));

            let stream = if text.is_empty() {
                String::new()
            } else {
                let escaped = text
                    .replace('\\', "\\\\")
                    .replace('(', "\\(")
                    .replace(')', "\\)");
                format!("BT /F1 12 Tf 72 720 Td ({escaped}) Tj ET")
            };
            objects.push(format!(
                "<< /Length {} >>\nstream\n{stream}\nendstream",
                stream.len()
            ));
        }
        objects[1] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        );

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }

        let xref_offset = pdf.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        ));
        pdf.extend_from_slice(xref.as_bytes());
        pdf
    }

    #[test]
    fn test_every_page_contributes_a_segment() {
        let pdf = build_pdf(&["Hello Jane Doe", "", "Rust engineer"]);

        let text = extract_pdf_text(&pdf).unwrap();

        let first = text.find("Hello Jane Doe").expect("first page text");
        let last = text.find("Rust engineer").expect("last page text");
        assert!(first < last);
        // one trailing newline per page, the blank one included
        assert!(text.ends_with('\n'));
        assert!(text[first..last].matches('\n').count() >= 2);
    }

    #[test]
    fn test_blank_page_yields_empty_segment() {
        let pdf = build_pdf(&[""]);
        assert_eq!(extract_pdf_text(&pdf).unwrap(), "\n");
    }

    #[test]
    fn test_garbage_bytes_fail_extraction() {
        let err = extract_pdf_text(b"this is not a pdf document").unwrap_err();
        assert!(matches!(err, ExtractionError::Failed(_)));
    }

    #[test]
    fn test_empty_input_fails_extraction() {
        assert!(extract_pdf_text(b"").is_err());
    }
}
