use std::path::Path;

use super::docx::read_docx_paragraphs;
use super::ocr::build_ocr_engine;
use super::pdf::PdfTextExtractor;
use super::pdf_renderer::EmbeddedImageRenderer;
use super::pdfium::PdfiumRenderer;
use super::sanitize::sanitize_extracted_text;
use super::types::{
    ExtractionMethod, ExtractionWarning, OcrEngine, PageText, PdfExtractor, PdfPageRenderer,
    RawText,
};
use super::ExtractionError;
use crate::config::{IngestConfig, DEFAULT_RENDER_DPI, DEFAULT_SCAN_THRESHOLD_CHARS, MIN_RENDER_DPI};
use crate::pipeline::format::{DocumentKind, SourceDocument};

/// When a PDF counts as scanned, and how its pages are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPolicy {
    pub threshold_chars: usize,
    pub probe_pages: Option<usize>,
    pub render_dpi: u32,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            threshold_chars: DEFAULT_SCAN_THRESHOLD_CHARS,
            probe_pages: None,
            render_dpi: DEFAULT_RENDER_DPI,
        }
    }
}

impl ScanPolicy {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            threshold_chars: config.scan_threshold_chars,
            probe_pages: config.scan_probe_pages,
            render_dpi: config.effective_render_dpi(),
        }
    }

    /// Document-level classification: fewer than `threshold_chars`
    /// non-whitespace characters in the probed pages means scanned.
    pub fn is_scanned(&self, pages: &[PageText]) -> bool {
        let probe = self.probe_pages.unwrap_or(pages.len());
        let chars: usize = pages
            .iter()
            .take(probe)
            .map(|p| p.text.chars().filter(|c| !c.is_whitespace()).count())
            .sum();
        chars < self.threshold_chars
    }
}

/// Turns a [`SourceDocument`] into sanitized [`RawText`].
/// Uses trait objects for OCR, text-layer extraction and page rendering,
/// enabling dependency injection.
pub struct TextAcquirer {
    ocr_engine: Box<dyn OcrEngine + Send + Sync>,
    pdf_extractor: Box<dyn PdfExtractor + Send + Sync>,
    pdf_renderer: Option<Box<dyn PdfPageRenderer + Send + Sync>>,
    renderer_is_fallback: bool,
    policy: ScanPolicy,
}

impl TextAcquirer {
    pub fn new(
        ocr_engine: Box<dyn OcrEngine + Send + Sync>,
        pdf_extractor: Box<dyn PdfExtractor + Send + Sync>,
    ) -> Self {
        Self {
            ocr_engine,
            pdf_extractor,
            pdf_renderer: None,
            renderer_is_fallback: false,
            policy: ScanPolicy::default(),
        }
    }

    /// Add a PDF page renderer for per-page OCR of scanned PDFs.
    pub fn with_pdf_renderer(mut self, renderer: Box<dyn PdfPageRenderer + Send + Sync>) -> Self {
        self.pdf_renderer = Some(renderer);
        self.renderer_is_fallback = false;
        self
    }

    /// Like [`Self::with_pdf_renderer`], but every OCR'd document is tagged
    /// with [`ExtractionWarning::EmbeddedImageFallback`].
    pub fn with_fallback_renderer(
        mut self,
        renderer: Box<dyn PdfPageRenderer + Send + Sync>,
    ) -> Self {
        self.pdf_renderer = Some(renderer);
        self.renderer_is_fallback = true;
        self
    }

    pub fn with_scan_policy(mut self, policy: ScanPolicy) -> Self {
        self.policy = ScanPolicy {
            render_dpi: policy.render_dpi.max(MIN_RENDER_DPI),
            ..policy
        };
        self
    }

    /// Real engines: pdf-extract for text layers, PDFium (or embedded page
    /// images when PDFium cannot be loaded) for rendering, Tesseract for OCR.
    pub fn from_config(config: &IngestConfig) -> Self {
        let acquirer = Self::new(build_ocr_engine(config), Box::new(PdfTextExtractor))
            .with_scan_policy(ScanPolicy::from_config(config));

        match PdfiumRenderer::new(config.pdfium_library.as_deref()) {
            Ok(renderer) => acquirer.with_pdf_renderer(Box::new(renderer)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "PDFium unavailable, scanned pages will use embedded images"
                );
                acquirer.with_fallback_renderer(Box::new(EmbeddedImageRenderer))
            }
        }
    }

    pub fn acquire(&self, document: &SourceDocument) -> Result<RawText, ExtractionError> {
        tracing::info!(
            file = %document.file_name,
            kind = document.kind.as_str(),
            "Starting text acquisition"
        );

        let raw = match document.kind {
            DocumentKind::Pdf => self.acquire_pdf(&document.path)?,
            DocumentKind::Word => RawText {
                method: ExtractionMethod::DocxParagraphs,
                text: read_docx_paragraphs(&document.path)?,
                page_count: None,
                warnings: vec![],
            },
            DocumentKind::Unsupported => {
                return Err(ExtractionError::UnsupportedFormat(document.file_name.clone()));
            }
        };

        let raw = RawText {
            text: sanitize_extracted_text(&raw.text),
            ..raw
        };

        tracing::info!(
            file = %document.file_name,
            method = raw.method.as_str(),
            pages = ?raw.page_count,
            warnings = raw.warnings.len(),
            text_length = raw.text.len(),
            "Text acquisition complete"
        );

        Ok(raw)
    }

    fn acquire_pdf(&self, path: &Path) -> Result<RawText, ExtractionError> {
        // The whole file is held in memory; no handle outlives this read.
        let pdf_bytes = std::fs::read(path)?;

        // An unreadable text layer still leaves the page images to OCR.
        let direct_pages = match self.pdf_extractor.extract_text(&pdf_bytes) {
            Ok(pages) => pages,
            Err(ExtractionError::PdfParsing(reason)) if self.pdf_renderer.is_some() => {
                tracing::warn!(error = %reason, "Text layer unreadable, falling back to OCR");
                vec![]
            }
            Err(e) => return Err(e),
        };

        if !self.policy.is_scanned(&direct_pages) {
            return Ok(RawText {
                method: ExtractionMethod::PdfDirect,
                text: join_pages(&direct_pages),
                page_count: Some(direct_pages.len()),
                warnings: vec![],
            });
        }

        tracing::debug!(
            pages = direct_pages.len(),
            threshold = self.policy.threshold_chars,
            "Text layer below threshold, treating PDF as scanned"
        );
        self.ocr_scanned_pdf(&pdf_bytes, direct_pages.len())
    }

    /// OCR every page of a scanned PDF. A page that fails to render or
    /// recognize is skipped with a warning; the document fails only when no
    /// page succeeds.
    fn ocr_scanned_pdf(
        &self,
        pdf_bytes: &[u8],
        text_layer_pages: usize,
    ) -> Result<RawText, ExtractionError> {
        let renderer = self.pdf_renderer.as_deref().ok_or_else(|| {
            ExtractionError::PdfRendering {
                page: 0,
                reason: "no PDF page renderer configured".into(),
            }
        })?;

        let page_count = renderer.page_count(pdf_bytes)?.max(text_layer_pages);
        let mut pages = Vec::with_capacity(page_count);
        let mut warnings = Vec::new();
        if self.renderer_is_fallback {
            warnings.push(ExtractionWarning::EmbeddedImageFallback);
        }

        for page_idx in 0..page_count {
            let page_number = page_idx + 1;
            let result = renderer
                .render_page(pdf_bytes, page_idx, self.policy.render_dpi)
                .and_then(|png| self.ocr_engine.ocr_image(&png));

            match result {
                Ok(ocr) => {
                    tracing::debug!(
                        page = page_number,
                        confidence = ocr.confidence,
                        chars = ocr.text.chars().count(),
                        "OCR page complete"
                    );
                    pages.push(PageText {
                        page_number,
                        text: ocr.text,
                    });
                }
                Err(e) => {
                    tracing::warn!(page = page_number, error = %e, "OCR failed for page, continuing");
                    warnings.push(ExtractionWarning::PageFailed {
                        page: page_number,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if pages.is_empty() && page_count > 0 {
            let first = warnings
                .iter()
                .find_map(|w| match w {
                    ExtractionWarning::PageFailed { reason, .. } => Some(reason.as_str()),
                    _ => None,
                })
                .unwrap_or("unknown error");
            return Err(ExtractionError::OcrProcessing(format!(
                "all {page_count} pages failed: {first}"
            )));
        }

        Ok(RawText {
            method: ExtractionMethod::PdfOcr,
            text: join_pages(&pages),
            page_count: Some(page_count),
            warnings,
        })
    }
}

fn join_pages(pages: &[PageText]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
