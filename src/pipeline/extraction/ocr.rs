use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::{OcrEngine, OcrPageResult};
use super::ExtractionError;
use crate::config::IngestConfig;

/// Tesseract OCR engine.
/// Only available when compiled with the `ocr` feature flag.
///
/// A fresh Tesseract handle is created per page, so one engine can be
/// shared across worker threads.
#[cfg(feature = "ocr")]
pub struct TesseractEngine {
    tessdata_dir: std::path::PathBuf,
    languages: String,
}

#[cfg(feature = "ocr")]
impl TesseractEngine {
    /// `languages` is a Tesseract language list such as "chi_sim+eng".
    /// Languages whose traineddata is missing are dropped with a warning;
    /// English is always required.
    pub fn new(tessdata_dir: &std::path::Path, languages: &str) -> Result<Self, ExtractionError> {
        if !tessdata_dir.join("eng.traineddata").exists() {
            return Err(ExtractionError::TessdataNotFound(tessdata_dir.to_path_buf()));
        }

        let languages = available_languages(tessdata_dir, languages);
        tracing::info!(
            tessdata = %tessdata_dir.display(),
            languages = %languages,
            "Tesseract engine ready"
        );

        Ok(Self {
            tessdata_dir: tessdata_dir.to_path_buf(),
            languages,
        })
    }

    pub fn languages(&self) -> &str {
        &self.languages
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        let tessdata_str = self
            .tessdata_dir
            .to_str()
            .ok_or_else(|| ExtractionError::OcrInit("Invalid tessdata path".into()))?;

        let tess = tesseract::Tesseract::new(Some(tessdata_str), Some(self.languages.as_str()))
            .map_err(|e| ExtractionError::OcrInit(format!("{e:?}")))?;

        let mut tess = tess
            .set_image_from_mem(image_bytes)
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        let text = tess
            .get_text()
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        let confidence = tess.mean_text_conf().max(0) as f32 / 100.0;

        Ok(OcrPageResult { text, confidence })
    }
}

/// Keeps the languages of `requested` that have traineddata in `tessdata_dir`.
/// Falls back to "eng" when nothing else is installed.
#[cfg_attr(not(feature = "ocr"), allow(dead_code))]
fn available_languages(tessdata_dir: &std::path::Path, requested: &str) -> String {
    let (present, missing): (Vec<&str>, Vec<&str>) = requested
        .split('+')
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .partition(|lang| tessdata_dir.join(format!("{lang}.traineddata")).exists());

    if !missing.is_empty() {
        tracing::warn!(
            tessdata = %tessdata_dir.display(),
            missing = ?missing,
            "Traineddata not installed, OCR continues without these languages"
        );
    }

    if present.is_empty() {
        "eng".to_string()
    } else {
        present.join("+")
    }
}

/// Stands in when no OCR backend could be initialized. Every call fails, so
/// scanned PDFs surface as failed ingestions instead of silently empty ones.
pub struct UnavailableOcrEngine {
    reason: String,
}

impl UnavailableOcrEngine {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl OcrEngine for UnavailableOcrEngine {
    fn ocr_image(&self, _image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        Err(ExtractionError::OcrInit(self.reason.clone()))
    }
}

/// Best available OCR engine for `config`. Never fails: a missing backend
/// becomes an [`UnavailableOcrEngine`] and is reported when a scan needs it.
pub fn build_ocr_engine(config: &IngestConfig) -> Box<dyn OcrEngine + Send + Sync> {
    #[cfg(feature = "ocr")]
    {
        let Some(dir) = config.resolved_tessdata_dir() else {
            tracing::warn!("No tessdata directory found, scanned PDFs cannot be read");
            return Box::new(UnavailableOcrEngine::new("no tessdata directory found"));
        };
        match TesseractEngine::new(&dir, &config.ocr_languages) {
            Ok(engine) => Box::new(engine),
            Err(e) => {
                tracing::warn!(error = %e, "Tesseract unavailable, scanned PDFs cannot be read");
                Box::new(UnavailableOcrEngine::new(e.to_string()))
            }
        }
    }

    #[cfg(not(feature = "ocr"))]
    {
        let _ = config;
        tracing::debug!("Built without the `ocr` feature");
        Box::new(UnavailableOcrEngine::new(
            "built without the `ocr` feature",
        ))
    }
}

/// Mock OCR engine for unit testing without Tesseract.
pub struct MockOcrEngine {
    pub text: String,
    pub confidence: f32,
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl MockOcrEngine {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Engine whose every call returns `OcrProcessing(reason)`.
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            ..Self::new("", 0.0)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for MockOcrEngine {
    fn ocr_image(&self, _image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.fail_with {
            return Err(ExtractionError::OcrProcessing(reason.clone()));
        }
        Ok(OcrPageResult {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}
