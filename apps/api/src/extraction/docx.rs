use std::io::{Cursor, Read};

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::ExtractionError;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// True when `data` starts with a ZIP local file header, as every DOCX does.
pub fn is_zip_container(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}

/// Extracts paragraph text from a DOCX file, one line per paragraph.
pub fn extract_docx_text(data: &[u8]) -> Result<String, ExtractionError> {
    read_document_xml(data)
        .and_then(|xml| paragraphs_from_xml(&xml))
        .map_err(|e| ExtractionError::Failed(format!("DOCX parse error: {e}")))
}

fn read_document_xml(data: &[u8]) -> anyhow::Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    let mut document_file = archive.by_name("word/document.xml")?;
    let mut xml = String::new();
    document_file.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Walks `word/document.xml`. Only `w:t` content inside a paragraph counts;
/// run-level `w:tab`/`w:br` become `\t`/`\n`. Paragraphs nested in text
/// boxes are emitted as their own lines.
fn paragraphs_from_xml(xml: &str) -> anyhow::Result<String> {
    let mut reader = Reader::from_str(xml);

    let mut buf = Vec::new();
    let mut open_paragraphs: Vec<String> = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;
    let mut out = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => open_paragraphs.push(String::new()),
                b"r" => run_depth += 1,
                b"t" => in_text = run_depth > 0,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(paragraph) = open_paragraphs.pop() {
                        out.push_str(&paragraph);
                        out.push('\n');
                    }
                }
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" => out.push('\n'),
                b"tab" if run_depth > 0 => push_to_current(&mut open_paragraphs, "\t"),
                b"br" | b"cr" if run_depth > 0 => push_to_current(&mut open_paragraphs, "\n"),
                _ => {}
            },
            Event::Text(e) if in_text => {
                push_to_current(&mut open_paragraphs, &e.xml_content()?);
            }
            Event::GeneralRef(e) if in_text => {
                if let Some(ch) = e.resolve_char_ref()? {
                    let mut encoded = [0u8; 4];
                    push_to_current(&mut open_paragraphs, ch.encode_utf8(&mut encoded));
                } else if let Some(resolved) = resolve_predefined_entity(&e.decode()?) {
                    push_to_current(&mut open_paragraphs, resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    Ok(out)
}

fn push_to_current(open_paragraphs: &mut [String], text: &str) {
    if let Some(current) = open_paragraphs.last_mut() {
        current.push_str(text);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use super::*;

    /// Builds a minimal DOCX archive whose body holds the given paragraph XML.
    pub(crate) fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            paragraphs.concat()
        );

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_paragraphs_joined_with_newlines() {
        let data = build_docx(&[
            "<w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>",
            "<w:p><w:r><w:t xml:space=\"preserve\">Senior </w:t></w:r><w:r><w:t>Engineer</w:t></w:r></w:p>",
        ]);
        assert_eq!(extract_docx_text(&data).unwrap(), "Jane Doe\nSenior Engineer\n");
    }

    #[test]
    fn test_empty_paragraphs_are_kept_as_blank_lines() {
        let data = build_docx(&[
            "<w:p><w:r><w:t>Skills</w:t></w:r></w:p>",
            "<w:p/>",
            "<w:p><w:pPr><w:jc w:val=\"left\"/></w:pPr></w:p>",
            "<w:p><w:r><w:t>Rust</w:t></w:r></w:p>",
        ]);
        assert_eq!(extract_docx_text(&data).unwrap(), "Skills\n\n\nRust\n");
    }

    #[test]
    fn test_run_tabs_and_breaks_ignore_tab_stop_definitions() {
        let data = build_docx(&[concat!(
            "<w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr>",
            "<w:r><w:t>2019</w:t><w:tab/><w:t>Acme</w:t><w:br/><w:t>Lead</w:t></w:r></w:p>"
        )]);
        assert_eq!(extract_docx_text(&data).unwrap(), "2019\tAcme\nLead\n");
    }

    #[test]
    fn test_entities_are_resolved() {
        let data = build_docx(&["<w:p><w:r><w:t>R&amp;D &#8211; QA</w:t></w:r></w:p>"]);
        assert_eq!(extract_docx_text(&data).unwrap(), "R&D \u{2013} QA\n");
    }

    #[test]
    fn test_deleted_text_is_skipped() {
        let data = build_docx(&[
            "<w:p><w:r><w:t>Kept</w:t></w:r><w:del><w:r><w:delText>Gone</w:delText></w:r></w:del></w:p>",
        ]);
        assert_eq!(extract_docx_text(&data).unwrap(), "Kept\n");
    }

    #[test]
    fn test_empty_document_yields_empty_text() {
        let data = build_docx(&[]);
        assert_eq!(extract_docx_text(&data).unwrap(), "");
    }

    #[test]
    fn test_non_zip_input_fails() {
        let err = extract_docx_text(b"definitely not a zip archive").unwrap_err();
        assert!(matches!(err, ExtractionError::Failed(_)));
        assert!(!is_zip_container(b"definitely not a zip archive"));
    }
}
