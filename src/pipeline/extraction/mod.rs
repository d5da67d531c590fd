pub mod types;
pub mod sanitize;
pub mod docx;
pub mod pdf;
pub mod pdfium;
pub mod pdf_renderer;
pub mod ocr;
pub mod orchestrator;

pub use types::*;
pub use sanitize::*;
pub use docx::*;
pub use pdf::*;
pub use pdfium::*;
pub use pdf_renderer::*;
pub use ocr::*;
pub use orchestrator::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tesseract OCR initialization failed: {0}")]
    OcrInit(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF rendering failed on page {page}: {reason}")]
    PdfRendering { page: usize, reason: String },

    #[error("PDF is password-protected")]
    PdfEncrypted,

    #[error("DOCX parsing failed: {0}")]
    DocxParsing(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Tessdata not found at: {0}")]
    TessdataNotFound(PathBuf),

    #[error("Unsupported format for extraction: {0}")]
    UnsupportedFormat(String),
}
