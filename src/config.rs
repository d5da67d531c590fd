use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::ingest::FailureMode;
use crate::pipeline::segmenter::SegmenterConfig;

/// Application-level constants
pub const APP_NAME: &str = "stdclause";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// OCR languages for mixed simplified-Chinese / Latin standards.
pub const DEFAULT_OCR_LANGUAGES: &str = "chi_sim+eng";

/// Rendering DPI for scanned pages handed to OCR.
pub const DEFAULT_RENDER_DPI: u32 = 200;

/// Twice the native 72 DPI of PDF user space. Small glyphs such as "±" are
/// lost to OCR below this.
pub const MIN_RENDER_DPI: u32 = 144;

/// A PDF whose text layer has fewer non-whitespace characters than this is
/// treated as a scan.
pub const DEFAULT_SCAN_THRESHOLD_CHARS: usize = 50;

/// Standard designations always appear near the head of the document.
pub const DEFAULT_IDENTIFIER_PREFIX_CHARS: usize = 2000;

/// Tessdata locations probed, in order, when no directory is configured.
const TESSDATA_CANDIDATES: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

const ENV_TESSDATA_DIR: &str = "STDCLAUSE_TESSDATA_DIR";
const ENV_OCR_LANGS: &str = "STDCLAUSE_OCR_LANGS";
const ENV_RENDER_DPI: &str = "STDCLAUSE_RENDER_DPI";
const ENV_SCAN_THRESHOLD: &str = "STDCLAUSE_SCAN_THRESHOLD";
const ENV_PDFIUM_PATH: &str = "PDFIUM_DYNAMIC_LIB_PATH";

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    format!("{}=info,warn", APP_NAME)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Everything the ingestion core needs, fixed at construction.
///
/// Engines are built from this value once; nothing downstream reads the
/// process environment, so concurrent callers never race on configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory holding `*.traineddata`. `None` means probe the usual
    /// system locations (see [`IngestConfig::resolved_tessdata_dir`]).
    pub tessdata_dir: Option<PathBuf>,
    pub ocr_languages: String,
    /// Explicit PDFium shared library. `None` searches next to the
    /// executable, then the system library path.
    pub pdfium_library: Option<PathBuf>,
    pub render_dpi: u32,
    pub scan_threshold_chars: usize,
    /// Only the first N pages count toward scan classification.
    /// `None` measures the whole document.
    pub scan_probe_pages: Option<usize>,
    pub identifier_prefix_chars: usize,
    pub segmenter: SegmenterConfig,
    pub failure_mode: FailureMode,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            tessdata_dir: None,
            ocr_languages: DEFAULT_OCR_LANGUAGES.to_string(),
            pdfium_library: None,
            render_dpi: DEFAULT_RENDER_DPI,
            scan_threshold_chars: DEFAULT_SCAN_THRESHOLD_CHARS,
            scan_probe_pages: None,
            identifier_prefix_chars: DEFAULT_IDENTIFIER_PREFIX_CHARS,
            segmenter: SegmenterConfig::default(),
            failure_mode: FailureMode::default(),
        }
    }
}

impl IngestConfig {
    /// Defaults overlaid with `STDCLAUSE_*` / `PDFIUM_DYNAMIC_LIB_PATH`
    /// environment values. Call once at startup, before spawning workers.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_TESSDATA_DIR).filter(|v| !v.trim().is_empty()) {
            config.tessdata_dir = Some(PathBuf::from(dir));
        }
        if let Some(langs) = lookup(ENV_OCR_LANGS).filter(|v| !v.trim().is_empty()) {
            config.ocr_languages = langs.trim().to_string();
        }
        if let Some(path) = lookup(ENV_PDFIUM_PATH).filter(|v| !v.trim().is_empty()) {
            config.pdfium_library = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup(ENV_RENDER_DPI) {
            config.render_dpi = parse_number(ENV_RENDER_DPI, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SCAN_THRESHOLD) {
            config.scan_threshold_chars = parse_number(ENV_SCAN_THRESHOLD, &raw)?;
        }

        Ok(config)
    }

    /// JSON settings file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Render DPI with the 2x-native floor applied.
    pub fn effective_render_dpi(&self) -> u32 {
        self.render_dpi.max(MIN_RENDER_DPI)
    }

    /// The configured tessdata directory, or the first candidate containing
    /// `eng.traineddata`: `<user data dir>/stdclause/tessdata`, then the
    /// usual system locations.
    pub fn resolved_tessdata_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.tessdata_dir {
            return Some(dir.clone());
        }
        let user_dir = dirs::data_dir().map(|d| d.join(APP_NAME).join("tessdata"));
        user_dir
            .into_iter()
            .chain(TESSDATA_CANDIDATES.iter().map(PathBuf::from))
            .find(|dir| dir.join("eng.traineddata").exists())
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}
