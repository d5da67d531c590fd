pub mod config;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

pub use config::{ConfigError, IngestConfig};
pub use pipeline::extraction::ExtractionError;
pub use pipeline::ingest::{
    ingest_file, ClauseIngestor, ClauseRecord, FailureMode, IngestOutcome, IngestReport,
    IngestStatus,
};
pub use pipeline::parameters::{extract_parameters, ParameterSet, NO_PARAMETERS_SENTINEL};
pub use pipeline::segmenter::{segment, SegmentStrategy, SegmenterConfig};

/// Install the fmt subscriber, filtered by `RUST_LOG` or the crate default.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::debug!("{} v{} tracing ready", config::APP_NAME, config::APP_VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }

    #[test]
    fn unsupported_path_yields_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readme.txt");
        std::fs::write(&path, "4.1 这是一个不会被处理的文本文件内容").unwrap();
        assert!(ingest_file(&path).is_empty());
    }
}
