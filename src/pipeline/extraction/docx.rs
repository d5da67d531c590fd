//! Word (.docx) paragraph text.
//!
//! A .docx file is a ZIP archive; the body lives in `word/document.xml` as
//! `w:p` paragraphs made of `w:r` runs. Each paragraph becomes one line,
//! table cells included, in document order.

use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Paragraph text of a .docx file, one paragraph per line.
pub fn read_docx_paragraphs(path: &Path) -> Result<String, ExtractionError> {
    let file = std::fs::File::open(path)?;
    docx_paragraphs_from_reader(file)
}

pub fn docx_paragraphs_from_reader<R: Read + Seek>(reader: R) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(reader)
        .map_err(|e| ExtractionError::DocxParsing(format!("not a DOCX archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::DocxParsing(format!("{DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)?;

    let paragraphs = paragraphs_from_xml(&xml)?;
    tracing::debug!(paragraphs = paragraphs.len(), "Read DOCX body");
    Ok(paragraphs.join("\n"))
}

/// Collects the text of every non-blank `w:p`.
///
/// `w:tab` and `w:br` only count inside a run (`w:r`); the same element
/// names also appear in paragraph properties as tab-stop definitions.
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    // Text boxes nest paragraphs inside paragraphs.
    let mut open: Vec<String> = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:r" => run_depth += 1,
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if run_depth > 0 => {
                if let Some(current) = open.last_mut() {
                    match e.name().as_ref() {
                        b"w:tab" => current.push('\t'),
                        b"w:br" | b"w:cr" => current.push(' '),
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|err| ExtractionError::DocxParsing(err.to_string()))?;
                if let Some(current) = open.last_mut() {
                    current.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(done) = open.pop() {
                        if !done.trim().is_empty() {
                            paragraphs.push(done);
                        }
                    }
                }
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::DocxParsing(format!(
                    "XML error at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}
