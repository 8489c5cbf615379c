//! Datasets for OOD detection evaluation.
//!
//! This module provides the record model, structural schemas, the
//! [`DataSource`] capability, and the composition of an in-distribution and
//! an out-of-distribution source into one binary-labelled stream.
//!
//! # Overview
//!
//! 1. **Records** - Nested mappings of tensors and text
//! 2. **Schemas** - Field trees with depth-first intersection
//! 3. **Sources** - Restartable lazy record streams
//! 4. **OOD composition** - Relabel, intersect, and concatenate two sources
//! 5. **Registry** - Named dataset pairs such as `cifar10_vs_cifar100`

pub mod memory;
pub mod ood;
pub mod record;
pub mod registry;
pub mod schema;
pub mod source;

pub use crate::error::DatasetError;
pub use memory::InMemorySource;
pub use ood::{
    compose, CombinedRecords, OodDetectionDataset, IN_DISTRIBUTION_LABEL,
    OUT_OF_DISTRIBUTION_LABEL,
};
pub use record::{label_of, set_label, Record, Value, LABEL_FIELD};
pub use registry::{BoxedOodDataset, BoxedSource, Corpus, CorpusProvider, OodPair};
pub use schema::{FieldKind, Schema, SchemaNode};
pub use source::{DataSource, DatasetInfo, Identity, Preprocess, RecordIter};
