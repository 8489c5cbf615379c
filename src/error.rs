//! Error types for robustness-forge operations.
//!
//! Defines error types for the major subsystems:
//! - Dataset composition and the named dataset registry
//! - Ensemble diversity metric accumulation

use thiserror::Error;

/// Errors that can occur while building or composing datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Schema mismatch: in-distribution fields {in_fields:?} and out-of-distribution fields {out_fields:?} share nothing besides 'label'")]
    SchemaMismatch {
        in_fields: Vec<String>,
        out_fields: Vec<String>,
    },

    #[error("Dataset '{0}' not found in registry")]
    UnknownDataset(String),

    #[error("Record {index} does not match the source schema: {reason}")]
    InconsistentRecord { index: usize, reason: String },

    #[error("Corpus '{0}' is not available from this provider")]
    CorpusUnavailable(String),
}

/// Errors that can occur while accumulating diversity metrics.
#[derive(Debug, Error)]
pub enum MetricError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
