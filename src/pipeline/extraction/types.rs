use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// Full text of one document, produced by text acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawText {
    pub method: ExtractionMethod,
    pub text: String,
    /// `None` for formats without pages (Word).
    pub page_count: Option<usize>,
    pub warnings: Vec<ExtractionWarning>,
}

impl RawText {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// How text was obtained
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Text layer of a digital PDF.
    PdfDirect,
    /// Page rasters of a scanned PDF run through OCR.
    PdfOcr,
    /// Paragraphs of a Word document.
    DocxParagraphs,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PdfDirect => "pdf_direct",
            Self::PdfOcr => "pdf_ocr",
            Self::DocxParagraphs => "docx_paragraphs",
        }
    }
}

/// Text layer of a single PDF page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: usize,
    pub text: String,
}

/// Non-fatal problems encountered while acquiring text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ExtractionWarning {
    /// Render or OCR failed for one page; its text is missing.
    PageFailed { page: usize, reason: String },
    /// Scanned PDF rendered without PDFium, from embedded page images.
    EmbeddedImageFallback,
}

impl std::fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PageFailed { page, reason } => write!(f, "page {page} unreadable: {reason}"),
            Self::EmbeddedImageFallback => {
                write!(f, "pages recovered from embedded images (PDFium unavailable)")
            }
        }
    }
}

/// Raw OCR result from the engine
#[derive(Debug)]
pub struct OcrPageResult {
    pub text: String,
    /// Mean recognition confidence, 0.0-1.0.
    pub confidence: f32,
}

/// OCR engine abstraction (allows mocking for tests)
pub trait OcrEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError>;
}

/// PDF text-layer extraction abstraction
pub trait PdfExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError>;
}

/// Renders PDF pages to PNG bytes for OCR.
pub trait PdfPageRenderer {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ExtractionError>;

    /// `page_index` is 0-based.
    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_index: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError>;
}

impl<T: OcrEngine + ?Sized> OcrEngine for std::sync::Arc<T> {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        (**self).ocr_image(image_bytes)
    }
}
