use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Document kinds the ingestion core accepts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Word,
    Unsupported,
}

impl DocumentKind {
    /// Kind from a file extension, case-insensitively. Only `.pdf` and
    /// `.docx` are accepted; legacy `.doc` is not.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Word,
            _ => Self::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Word => "word",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// One input file, as seen by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    /// Final path component, carried into every record as `source_file`.
    pub file_name: String,
    pub kind: DocumentKind,
}

impl SourceDocument {
    /// Classifies `path` by extension. The file is not opened.
    pub fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = path
            .extension()
            .and_then(|e| e.to_str())
            .map(DocumentKind::from_extension)
            .unwrap_or(DocumentKind::Unsupported);

        Self {
            path: path.to_path_buf(),
            file_name,
            kind,
        }
    }

    /// File name without its extension, as used for identifier fallback.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_and_docx_are_recognized() {
        assert_eq!(DocumentKind::from_extension("pdf"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_extension("docx"), DocumentKind::Word);
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert_eq!(DocumentKind::from_extension("PDF"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_extension("DocX"), DocumentKind::Word);
    }

    #[test]
    fn other_extensions_are_unsupported() {
        for ext in ["txt", "doc", "xlsx", "png", ""] {
            assert_eq!(DocumentKind::from_extension(ext), DocumentKind::Unsupported, "{ext}");
        }
    }

    #[test]
    fn source_document_from_path() {
        let doc = SourceDocument::from_path(Path::new("/data/standards/GB-T 4857.5-92.PDF"));
        assert_eq!(doc.file_name, "GB-T 4857.5-92.PDF");
        assert_eq!(doc.kind, DocumentKind::Pdf);
        assert_eq!(doc.stem(), "GB-T 4857.5-92");
    }

    #[test]
    fn missing_extension_is_unsupported() {
        let doc = SourceDocument::from_path(Path::new("README"));
        assert_eq!(doc.kind, DocumentKind::Unsupported);
        assert_eq!(doc.stem(), "README");
    }

    #[test]
    fn kind_labels() {
        assert_eq!(DocumentKind::Pdf.as_str(), "pdf");
        assert_eq!(DocumentKind::Word.as_str(), "word");
        assert!(!DocumentKind::Unsupported.is_supported());
        assert!(DocumentKind::Word.is_supported());
    }
}
