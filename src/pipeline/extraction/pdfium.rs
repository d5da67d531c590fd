//! Page rasterization through Google PDFium.
//!
//! PDFium copes with CIDFonts, transparency and layered scans, so it is the
//! first choice for turning a scanned page into something Tesseract can read.
//! [`super::EmbeddedImageRenderer`] takes over on machines without the
//! shared library.
//!
//! `Pdfium` is `!Send`, so [`PdfiumRenderer`] only remembers where the
//! library lives and binds it per call. The loader caches `dlopen`, which
//! keeps repeat binds cheap.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageOutputFormat;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use super::types::PdfPageRenderer;
use super::ExtractionError;

/// Longest edge of a rendered page, in pixels.
const MAX_EDGE_PX: u32 = 4096;

const POINTS_PER_INCH: f32 = 72.0;

pub struct PdfiumRenderer {
    library_path: Option<PathBuf>,
}

impl PdfiumRenderer {
    /// Binds PDFium once to prove it is loadable.
    ///
    /// With `library_path` set only that file is tried. Otherwise the
    /// directories around the running executable are searched, then the
    /// system library path.
    pub fn new(library_path: Option<&Path>) -> Result<Self, ExtractionError> {
        let renderer = Self {
            library_path: library_path.map(Path::to_path_buf),
        };
        renderer.bind()?;
        Ok(renderer)
    }

    fn bind(&self) -> Result<Pdfium, ExtractionError> {
        if let Some(path) = &self.library_path {
            return Pdfium::bind_to_library(path)
                .map(Pdfium::new)
                .map_err(|e| ExtractionError::PdfRendering {
                    page: 0,
                    reason: format!("cannot load PDFium from {}: {e}", path.display()),
                });
        }

        for candidate in bundled_library_candidates() {
            if let Ok(bindings) = Pdfium::bind_to_library(&candidate) {
                debug!(path = %candidate.display(), "PDFium bound from bundle directory");
                return Ok(Pdfium::new(bindings));
            }
        }

        Pdfium::bind_to_system_library()
            .map(Pdfium::new)
            .map_err(|e| ExtractionError::PdfRendering {
                page: 0,
                reason: format!("PDFium not found (set PDFIUM_DYNAMIC_LIB_PATH): {e}"),
            })
    }
}

/// Platform library file names next to the executable, in `lib/` below it
/// and in `../lib`.
fn bundled_library_candidates() -> Vec<PathBuf> {
    let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    else {
        return vec![];
    };

    [exe_dir.clone(), exe_dir.join("lib"), exe_dir.join("..").join("lib")]
        .iter()
        .map(|dir| {
            PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(
                dir.to_string_lossy().as_ref(),
            ))
        })
        .collect()
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_bytes: &'a [u8],
) -> Result<PdfDocument<'a>, ExtractionError> {
    pdfium
        .load_pdf_from_byte_slice(pdf_bytes, None)
        .map_err(classify_load_error)
}

fn classify_load_error(e: PdfiumError) -> ExtractionError {
    if matches!(
        e,
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError)
    ) {
        return ExtractionError::PdfEncrypted;
    }
    ExtractionError::PdfRendering {
        page: 0,
        reason: format!("cannot open document: {e}"),
    }
}

/// Pixel size of a page rendered at some DPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RenderSize {
    width: u32,
    height: u32,
    /// The longer edge hit [`MAX_EDGE_PX`] and both edges were scaled down.
    capped: bool,
}

impl RenderSize {
    fn for_page(width_pt: f32, height_pt: f32, dpi: u32) -> Self {
        let scale = dpi as f32 / POINTS_PER_INCH;
        let w = (width_pt * scale).max(1.0);
        let h = (height_pt * scale).max(1.0);
        let longest = w.max(h);

        if longest <= MAX_EDGE_PX as f32 {
            return Self {
                width: w as u32,
                height: h as u32,
                capped: false,
            };
        }

        let shrink = MAX_EDGE_PX as f32 / longest;
        Self {
            width: ((w * shrink) as u32).clamp(1, MAX_EDGE_PX),
            height: ((h * shrink) as u32).clamp(1, MAX_EDGE_PX),
            capped: true,
        }
    }
}

impl PdfPageRenderer for PdfiumRenderer {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ExtractionError> {
        let pdfium = self.bind()?;
        let document = open_document(&pdfium, pdf_bytes)?;
        Ok(document.pages().len() as usize)
    }

    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_index: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError> {
        let render_err = |reason: String| ExtractionError::PdfRendering {
            page: page_index,
            reason,
        };

        let pdfium = self.bind()?;
        let document = open_document(&pdfium, pdf_bytes)?;
        let pages = document.pages();

        let page = u16::try_from(page_index)
            .ok()
            .and_then(|i| pages.get(i).ok())
            .ok_or_else(|| render_err(format!("no such page (document has {})", pages.len())))?;

        let size = RenderSize::for_page(page.width().value, page.height().value, dpi);
        if size.capped {
            warn!(
                page = page_index,
                width = size.width,
                height = size.height,
                dpi,
                "Page too large at requested DPI, scaled down"
            );
        }

        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .set_target_width(size.width as i32)
                    .set_maximum_height(size.height as i32),
            )
            .map_err(|e| render_err(e.to_string()))?;

        let mut png = Cursor::new(Vec::new());
        bitmap
            .as_image()
            .write_to(&mut png, ImageOutputFormat::Png)
            .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encode: {e}")))?;

        debug!(
            page = page_index,
            width = size.width,
            height = size.height,
            "Page rasterized"
        );
        Ok(png.into_inner())
    }
}

/// Renderer with a fixed page count that returns a blank PNG for every page.
///
/// Drives the scanned-document path in tests without the PDFium binary.
pub struct MockPdfPageRenderer {
    pages: usize,
}

impl MockPdfPageRenderer {
    pub fn new(pages: usize) -> Self {
        Self { pages }
    }
}

impl PdfPageRenderer for MockPdfPageRenderer {
    fn page_count(&self, _pdf_bytes: &[u8]) -> Result<usize, ExtractionError> {
        Ok(self.pages)
    }

    fn render_page(
        &self,
        _pdf_bytes: &[u8],
        page_index: usize,
        _dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError> {
        if page_index >= self.pages {
            return Err(ExtractionError::PdfRendering {
                page: page_index,
                reason: format!("no such page (mock has {})", self.pages),
            });
        }
        let blank = image::DynamicImage::ImageLuma8(image::GrayImage::from_pixel(
            8,
            8,
            image::Luma([255u8]),
        ));
        let mut png = Cursor::new(Vec::new());
        blank
            .write_to(&mut png, ImageOutputFormat::Png)
            .map_err(|e| ExtractionError::ImageProcessing(e.to_string()))?;
        Ok(png.into_inner())
    }
}
