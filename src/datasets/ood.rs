//! Out-of-distribution detection datasets.
//!
//! An OOD detection dataset pairs an in-distribution source with an
//! out-of-distribution source and turns them into a binary task: every
//! in-distribution record is labelled 1, every out-of-distribution record
//! is labelled 0. Both sides are cut down to the fields they share, so the
//! combined stream has a single schema.
//!
//! # Usage
//!
//! ```rust,ignore
//! use robustness_forge::datasets::{compose, DataSource};
//!
//! let dataset = compose(cifar10, cifar100)?;
//! for record in dataset.produce() {
//!     // label == 1 for CIFAR-10 records, then label == 0 for CIFAR-100
//! }
//! ```

use tracing::{debug, warn};

use crate::error::DatasetError;

use super::record::{set_label, Record, LABEL_FIELD};
use super::schema::Schema;
use super::source::{DataSource, DatasetInfo, Identity, Preprocess, RecordIter};

/// Label forced on in-distribution records.
pub const IN_DISTRIBUTION_LABEL: i64 = 1;

/// Label forced on out-of-distribution records.
pub const OUT_OF_DISTRIBUTION_LABEL: i64 = 0;

/// Composes two sources into an OOD detection dataset.
///
/// Equivalent to [`OodDetectionDataset::new`].
pub fn compose<I, O>(in_source: I, out_source: O) -> Result<OodDetectionDataset<I, O>, DatasetError>
where
    I: DataSource,
    O: DataSource,
{
    OodDetectionDataset::new(in_source, out_source)
}

/// A binary dataset made of one in- and one out-of-distribution source.
#[derive(Debug, Clone)]
pub struct OodDetectionDataset<I, O> {
    in_dataset: I,
    out_dataset: O,
    schema: Schema,
}

impl<I, O> OodDetectionDataset<I, O>
where
    I: DataSource,
    O: DataSource,
{
    /// Pairs the two sources and fixes the combined schema.
    ///
    /// Fails with [`DatasetError::SchemaMismatch`] if the sources share no
    /// field other than the synthesized `label`.
    pub fn new(in_dataset: I, out_dataset: O) -> Result<Self, DatasetError> {
        let schema = common_schema(in_dataset.schema(), out_dataset.schema())?;
        debug!(schema = %schema, "composed OOD detection dataset");
        Ok(Self {
            in_dataset,
            out_dataset,
            schema,
        })
    }

    /// The in-distribution source.
    pub fn in_dataset(&self) -> &I {
        &self.in_dataset
    }

    /// The out-of-distribution source.
    pub fn out_dataset(&self) -> &O {
        &self.out_dataset
    }

    /// Starts a pass with `preprocess` applied to both sources first.
    ///
    /// The combined schema is recomputed from the preprocessed schemas, so a
    /// preprocessing step that removes every shared field fails here.
    pub fn load_combined<'a>(
        &'a self,
        preprocess: &'a dyn Preprocess,
    ) -> Result<CombinedRecords<'a>, DatasetError> {
        let schema = common_schema(
            self.in_dataset.load_schema(preprocess),
            self.out_dataset.load_schema(preprocess),
        )?;
        Ok(self.stream(schema, preprocess))
    }

    fn stream<'a>(&'a self, schema: Schema, preprocess: &'a dyn Preprocess) -> CombinedRecords<'a> {
        CombinedRecords {
            stage: Stage::InDistribution(self.in_dataset.load(preprocess)),
            out_dataset: &self.out_dataset,
            preprocess,
            schema,
            emitted_in: 0,
            emitted_out: 0,
        }
    }
}

impl<I, O> DataSource for OodDetectionDataset<I, O>
where
    I: DataSource,
    O: DataSource,
{
    fn info(&self) -> DatasetInfo {
        DatasetInfo { num_classes: 2 }
    }

    /// Field names and nesting shared by every record the dataset yields.
    ///
    /// A leaf whose kind differs between the sources (int on one side, float
    /// on the other) is reported with the in-distribution kind, while
    /// out-of-distribution records keep their own values. Compare records
    /// against [`Schema::leaf_paths`] rather than the full schema when the
    /// sources disagree on kinds.
    fn schema(&self) -> Schema {
        self.schema.clone()
    }

    fn produce(&self) -> RecordIter<'_> {
        Box::new(self.stream(self.schema.clone(), &Identity))
    }
}

/// Intersection of the two relabelled schemas.
///
/// `label` is added to both sides before intersecting, so it always survives.
fn common_schema(in_schema: Schema, out_schema: Schema) -> Result<Schema, DatasetError> {
    let in_schema = in_schema.with_label();
    let out_schema = out_schema.with_label();

    let conflicts = in_schema.kind_conflicts(&out_schema);
    if !conflicts.is_empty() {
        warn!(
            fields = ?conflicts,
            "in- and out-of-distribution leaf kinds differ; values are kept verbatim"
        );
    }

    let common = in_schema.intersect(&out_schema);
    if common.field_names().iter().all(|name| *name == LABEL_FIELD) {
        return Err(DatasetError::SchemaMismatch {
            in_fields: in_schema.leaf_paths(),
            out_fields: out_schema.leaf_paths(),
        });
    }
    Ok(common)
}

enum Stage<'a> {
    InDistribution(RecordIter<'a>),
    OutOfDistribution(RecordIter<'a>),
    Done,
}

/// Lazy concatenation of the relabelled, filtered in- and out-of-distribution
/// streams.
///
/// The out-of-distribution source is not asked for records until the
/// in-distribution stream is exhausted.
pub struct CombinedRecords<'a> {
    stage: Stage<'a>,
    out_dataset: &'a dyn DataSource,
    preprocess: &'a dyn Preprocess,
    schema: Schema,
    emitted_in: usize,
    emitted_out: usize,
}

impl CombinedRecords<'_> {
    /// Schema of every record this stream yields.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl Iterator for CombinedRecords<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            match &mut self.stage {
                Stage::InDistribution(records) => {
                    if let Some(record) = records.next() {
                        self.emitted_in += 1;
                        let record = set_label(record, IN_DISTRIBUTION_LABEL);
                        return Some(self.schema.filter_record(record));
                    }
                    debug!(
                        records = self.emitted_in,
                        "in-distribution source exhausted"
                    );
                    self.stage = Stage::OutOfDistribution(self.out_dataset.load(self.preprocess));
                }
                Stage::OutOfDistribution(records) => {
                    if let Some(record) = records.next() {
                        self.emitted_out += 1;
                        let record = set_label(record, OUT_OF_DISTRIBUTION_LABEL);
                        return Some(self.schema.filter_record(record));
                    }
                    debug!(
                        records = self.emitted_out,
                        "out-of-distribution source exhausted"
                    );
                    self.stage = Stage::Done;
                }
                Stage::Done => return None,
            }
        }
    }
}
