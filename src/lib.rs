//! robustness-forge: OOD detection datasets and ensemble diversity metrics.
//!
//! This library provides tools for composing out-of-distribution detection
//! datasets from pairs of corpora and for measuring how differently the
//! members of a model ensemble predict.

// Core modules
pub mod cli;
pub mod config;
pub mod datasets;
pub mod error;
pub mod metrics;

// Re-export commonly used types
pub use config::{ConfigError, EvalConfig};
pub use datasets::{compose, DataSource, OodDetectionDataset, OodPair};
pub use error::{DatasetError, MetricError};
pub use metrics::{AveragePairwiseDiversity, DiversityResult, DiversityState};
