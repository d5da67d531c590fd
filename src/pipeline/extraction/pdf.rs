use super::types::{PageText, PdfExtractor};
use super::ExtractionError;

/// PDF text-layer extractor using the pdf-extract crate.
/// Handles digital PDFs; scanned pages come back empty or near-empty.
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
        // pdf-extract can panic on malformed PDFs
        let page_texts = std::panic::catch_unwind(|| {
            pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        })
        .map_err(|_| ExtractionError::PdfParsing("text extraction panicked (malformed PDF)".into()))?
        .map_err(|e| map_pdf_error(e.to_string()))?;

        Ok(page_texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| PageText {
                page_number: i + 1,
                text,
            })
            .collect())
    }
}

fn map_pdf_error(msg: String) -> ExtractionError {
    let lower = msg.to_lowercase();
    if lower.contains("encrypt") || lower.contains("password") {
        ExtractionError::PdfEncrypted
    } else {
        ExtractionError::PdfParsing(msg)
    }
}
