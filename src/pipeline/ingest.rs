//! Document ingestion: one file in, ordered clause records out.
//!
//! Drives acquisition → identifier → segmentation → parameters for a single
//! document. Every failure is absorbed here and reported through
//! [`IngestStatus`]; nothing panics or returns `Err` past this boundary, so
//! a batch caller can keep going after a bad file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::IngestConfig;
use crate::pipeline::extraction::{ExtractionMethod, TextAcquirer};
use crate::pipeline::format::{DocumentKind, SourceDocument};
use crate::pipeline::identifier::{resolve_standard_id, IdentifierSource};
use crate::pipeline::parameters::{extract_parameters, NO_PARAMETERS_SENTINEL};
use crate::pipeline::segmenter::{segment, Clause, SegmentStrategy};

/// `clause_id` of the record emitted for a failed document in
/// [`FailureMode::Diagnostic`].
pub const DIAGNOSTIC_CLAUSE_ID: &str = "error";

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Flat output row, one per clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseRecord {
    pub standard_id: String,
    pub clause_id: String,
    pub body: String,
    /// ", "-joined sorted tokens, or "见详情" when none were found.
    pub parameters: String,
    pub source_file: String,
}

impl From<Clause> for ClauseRecord {
    fn from(clause: Clause) -> Self {
        Self {
            parameters: clause.parameters.render(),
            standard_id: clause.standard_id,
            clause_id: clause.clause_id,
            body: clause.body,
            source_file: clause.source_file,
        }
    }
}

/// What a failed document contributes to the output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// No records.
    #[default]
    Silent,
    /// One record whose body is the error message.
    Diagnostic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestStatus {
    /// Clean acquisition and numbered segmentation.
    Complete,
    /// Records were produced, but something along the way was lossy.
    Degraded { reason: String },
    /// Text could not be acquired.
    Failed { reason: String },
    /// Not a `.pdf` or `.docx` file.
    Skipped,
}

impl IngestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Degraded { .. } => "degraded",
            Self::Failed { .. } => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Per-stage details, for debugging and tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub kind: DocumentKind,
    /// `None` when acquisition did not run or failed.
    pub method: Option<ExtractionMethod>,
    pub page_count: Option<usize>,
    pub identifier_source: Option<IdentifierSource>,
    pub strategy: Option<SegmentStrategy>,
    pub heading_matches: usize,
    pub warnings: Vec<String>,
}

impl IngestReport {
    fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            method: None,
            page_count: None,
            identifier_source: None,
            strategy: None,
            heading_matches: 0,
            warnings: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    pub source_file: String,
    pub status: IngestStatus,
    pub records: Vec<ClauseRecord>,
    pub report: IngestReport,
}

// ---------------------------------------------------------------------------
// Ingestor
// ---------------------------------------------------------------------------

/// Per-document ingestion with an injected [`TextAcquirer`].
///
/// Holds no mutable state: one instance can serve any number of threads.
pub struct ClauseIngestor {
    acquirer: TextAcquirer,
    config: IngestConfig,
}

impl ClauseIngestor {
    pub fn new(acquirer: TextAcquirer, config: IngestConfig) -> Self {
        Self { acquirer, config }
    }

    /// Wires the real engines described by `config`.
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(TextAcquirer::from_config(config), config.clone())
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn ingest(&self, path: &Path) -> IngestOutcome {
        let document = SourceDocument::from_path(path);
        let mut report = IngestReport::new(document.kind);

        if !document.kind.is_supported() {
            tracing::info!(file = %document.file_name, "Skipping unsupported file type");
            return IngestOutcome {
                source_file: document.file_name,
                status: IngestStatus::Skipped,
                records: vec![],
                report,
            };
        }

        // Step 1: Acquire text
        let raw = match self.acquirer.acquire(&document) {
            Ok(raw) => raw,
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(file = %document.file_name, error = %reason, "Text acquisition failed");
                let records = match self.config.failure_mode {
                    FailureMode::Silent => vec![],
                    FailureMode::Diagnostic => vec![diagnostic_record(&document, &reason)],
                };
                return IngestOutcome {
                    source_file: document.file_name,
                    status: IngestStatus::Failed { reason },
                    records,
                    report,
                };
            }
        };
        report.method = Some(raw.method);
        report.page_count = raw.page_count;
        report.warnings = raw.warnings.iter().map(ToString::to_string).collect();

        // Step 2: Resolve the standard identifier
        let identifier = resolve_standard_id(
            &raw.text,
            &document.file_name,
            self.config.identifier_prefix_chars,
        );
        report.identifier_source = Some(identifier.source);

        // Step 3: Segment into clauses
        let segmentation = segment(
            &raw.text,
            &identifier.value,
            &document.file_name,
            &self.config.segmenter,
        );
        report.strategy = Some(segmentation.strategy);
        report.heading_matches = segmentation.heading_matches;

        // Step 4: Attach parameters
        let records: Vec<ClauseRecord> = segmentation
            .clauses
            .into_iter()
            .map(|mut clause| {
                clause.parameters = extract_parameters(&clause.body);
                ClauseRecord::from(clause)
            })
            .collect();

        let status = degradation_reasons(raw.is_empty(), &report)
            .map(|reason| IngestStatus::Degraded { reason })
            .unwrap_or(IngestStatus::Complete);

        tracing::info!(
            file = %document.file_name,
            standard_id = %identifier,
            method = raw.method.as_str(),
            strategy = segmentation.strategy.as_str(),
            clauses = records.len(),
            status = status.as_str(),
            "Document ingested"
        );

        IngestOutcome {
            source_file: document.file_name,
            status,
            records,
            report,
        }
    }
}

/// Record standing in for a document whose text could not be read.
fn diagnostic_record(document: &SourceDocument, message: &str) -> ClauseRecord {
    let identifier = resolve_standard_id("", &document.file_name, 0);
    ClauseRecord {
        standard_id: identifier.value,
        clause_id: DIAGNOSTIC_CLAUSE_ID.to_string(),
        body: message.to_string(),
        parameters: NO_PARAMETERS_SENTINEL.to_string(),
        source_file: document.file_name.clone(),
    }
}

fn degradation_reasons(text_empty: bool, report: &IngestReport) -> Option<String> {
    let mut reasons = Vec::new();
    if text_empty {
        reasons.push("no text extracted".to_string());
    }
    reasons.extend(report.warnings.iter().cloned());
    if report.strategy == Some(SegmentStrategy::Paragraph) && !text_empty {
        reasons.push("no reliable section numbering, paragraph split used".to_string());
    }

    if reasons.is_empty() {
        None
    } else {
        Some(reasons.join("; "))
    }
}

/// Ingest `path` with default configuration and engines, returning only
/// the records.
pub fn ingest_file(path: &Path) -> Vec<ClauseRecord> {
    ClauseIngestor::from_config(&IngestConfig::default())
        .ingest(path)
        .records
}
