//! DOCX text extraction.
//!
//! A `.docx` file is a zip archive; the body lives in `word/document.xml`.
//! Only run text is kept: `<w:t>` content, tabs and explicit breaks.
//! Each `<w:p>` becomes one paragraph, and paragraphs are separated by a
//! blank line. Formatting, tables-as-layout, headers and images are dropped.

use crate::error::ConvertError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

/// Largest uncompressed `word/document.xml` that will be read.
const MAX_DOCUMENT_XML_BYTES: u64 = 64 * 1024 * 1024;

/// Extract the plain text of a DOCX payload.
///
/// The result is trimmed; it may be empty when the document has no text.
pub fn extract_text(bytes: &[u8]) -> Result<String, ConvertError> {
    let xml = read_document_part(bytes)?;
    let text = text_from_document_xml(&xml)?;
    debug!(
        "Extracted {} chars of text from {} bytes of document XML",
        text.chars().count(),
        xml.len()
    );
    Ok(text)
}

fn read_document_part(bytes: &[u8]) -> Result<String, ConvertError> {
    read_document_part_capped(bytes, MAX_DOCUMENT_XML_BYTES)
}

fn read_document_part_capped(bytes: &[u8], limit: u64) -> Result<String, ConvertError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ConvertError::TextExtractionFailed(format!("not a DOCX archive: {}", e)))?;
    let part = archive.by_name(DOCUMENT_PART).map_err(|e| {
        ConvertError::TextExtractionFailed(format!("missing {}: {}", DOCUMENT_PART, e))
    })?;
    let too_large = || {
        ConvertError::TextExtractionFailed(format!(
            "{} expands beyond {} bytes",
            DOCUMENT_PART, limit
        ))
    };
    if part.size() > limit {
        return Err(too_large());
    }

    // The declared size can lie; read at most one byte past the limit.
    let mut xml = String::new();
    part.take(limit + 1)
        .read_to_string(&mut xml)
        .map_err(|e| ConvertError::TextExtractionFailed(e.to_string()))?;
    if xml.len() as u64 > limit {
        return Err(too_large());
    }
    Ok(xml)
}

/// Walk WordprocessingML and collect paragraph text.
///
/// `mc:Fallback` branches repeat their `mc:Choice` content and are skipped.
/// Paragraphs nested inside a paragraph (text boxes) become lines of the
/// enclosing paragraph.
pub fn text_from_document_xml(xml: &str) -> Result<String, ConvertError> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut para_depth = 0usize;
    let mut fallback_depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            ConvertError::TextExtractionFailed(format!(
                "malformed document XML at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        if fallback_depth > 0 {
            match event {
                Event::Start(ref e) if e.local_name().as_ref() == b"Fallback" => {
                    fallback_depth += 1
                }
                Event::End(ref e) if e.local_name().as_ref() == b"Fallback" => {
                    fallback_depth -= 1
                }
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"Fallback" => fallback_depth = 1,
                b"p" => {
                    if para_depth > 0 && !current.is_empty() && !current.ends_with('\n') {
                        current.push('\n');
                    }
                    para_depth += 1;
                }
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                b"p" if para_depth == 0 => paragraphs.push(String::new()),
                _ => {}
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    para_depth = para_depth.saturating_sub(1);
                    if para_depth == 0 {
                        paragraphs.push(std::mem::take(&mut current));
                    } else if !current.is_empty() && !current.ends_with('\n') {
                        current.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(ref e) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| ConvertError::TextExtractionFailed(e.to_string()))?;
                current.push_str(&text);
            }
            Event::CData(ref e) if in_text => {
                current.push_str(&String::from_utf8_lossy(e));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    Ok(paragraphs.join("\n\n").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        )
    }

    fn docx(body: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(wrap(body).as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        let text = text_from_document_xml(&wrap(
            "<w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space=\"preserve\"> world</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Second</w:t></w:r></w:p>",
        ))
        .unwrap();
        assert_eq!(text, "Hello world\n\nSecond");
    }

    #[test]
    fn tabs_breaks_and_entities() {
        let text = text_from_document_xml(&wrap(
            "<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>Tom &amp; Jerry</w:t></w:r></w:p>",
        ))
        .unwrap();
        assert_eq!(text, "a\tb\nTom & Jerry");
    }

    #[test]
    fn ignores_text_outside_runs() {
        let text = text_from_document_xml(&wrap(
            "<w:p><w:pPr><w:pStyle w:val=\"Title\"/></w:pPr><w:r><w:t>Only me</w:t></w:r></w:p>",
        ))
        .unwrap();
        assert_eq!(text, "Only me");
    }

    #[test]
    fn whitespace_only_document_is_empty() {
        let bytes = docx("<w:p><w:r><w:t xml:space=\"preserve\">   </w:t></w:r></w:p><w:p/>");
        assert_eq!(extract_text(&bytes).unwrap(), "");
    }

    #[test]
    fn reads_from_archive() {
        let bytes = docx("<w:p><w:r><w:t>From the zip</w:t></w:r></w:p>");
        assert_eq!(extract_text(&bytes).unwrap(), "From the zip");
    }

    #[test]
    fn non_zip_payload_fails() {
        let err = extract_text(b"plain text, not a zip").unwrap_err();
        assert!(matches!(err, ConvertError::TextExtractionFailed(_)));
    }

    #[test]
    fn archive_without_document_part_fails() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("other.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<x/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        let err = extract_text(&bytes).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"));
    }

    #[test]
    fn alternate_content_fallback_is_skipped() {
        let text = text_from_document_xml(&wrap(
            "<w:p><w:r><w:t>Before</w:t></w:r><w:r><mc:AlternateContent xmlns:mc=\"m\">\
             <mc:Choice Requires=\"wps\"><w:drawing><w:txbxContent>\
             <w:p><w:r><w:t>Boxed</w:t></w:r></w:p>\
             </w:txbxContent></w:drawing></mc:Choice>\
             <mc:Fallback><w:pict><w:txbxContent>\
             <w:p><w:r><w:t>Boxed</w:t></w:r></w:p>\
             </w:txbxContent></w:pict></mc:Fallback>\
             </mc:AlternateContent></w:r><w:r><w:t>After</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Next</w:t></w:r></w:p>",
        ))
        .unwrap();
        assert_eq!(text, "Before\nBoxed\nAfter\n\nNext");
        assert_eq!(text.matches("Boxed").count(), 1);
    }

    #[test]
    fn nested_paragraph_keeps_outer_paragraph_whole() {
        let text = text_from_document_xml(&wrap(
            "<w:p><w:r><w:t>Outer start</w:t></w:r><w:r><w:txbxContent>\
             <w:p><w:r><w:t>inner</w:t></w:r></w:p><w:p/>\
             </w:txbxContent></w:r><w:r><w:t>outer end</w:t></w:r></w:p>",
        ))
        .unwrap();
        assert_eq!(text, "Outer start\ninner\nouter end");
    }

    #[test]
    fn oversized_document_part_is_rejected() {
        let body = "<w:p><w:r><w:t>padding padding padding</w:t></w:r></w:p>".repeat(50);
        let bytes = docx(&body);
        let err = read_document_part_capped(&bytes, 256).unwrap_err();
        assert!(matches!(err, ConvertError::TextExtractionFailed(_)));
        assert!(err.to_string().contains("expands beyond 256 bytes"));

        assert!(read_document_part_capped(&bytes, 1 << 20).is_ok());
    }
}
