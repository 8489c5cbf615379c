//! A data source backed by already-decoded records.

use crate::error::DatasetError;

use super::record::Record;
use super::schema::Schema;
use super::source::{DataSource, DatasetInfo, RecordIter};

/// Records held in memory, replayed in order on every pass.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    records: Vec<Record>,
    schema: Schema,
    info: DatasetInfo,
}

impl InMemorySource {
    /// Creates a source whose schema is taken from the first record.
    ///
    /// An empty record list yields an empty schema. Fails if any later record
    /// has a different structure.
    pub fn new(records: Vec<Record>, num_classes: usize) -> Result<Self, DatasetError> {
        let schema = records.first().map(Schema::of_record).unwrap_or_default();
        Self::with_schema(records, schema, num_classes)
    }

    /// Creates a source with an explicit schema.
    pub fn with_schema(
        records: Vec<Record>,
        schema: Schema,
        num_classes: usize,
    ) -> Result<Self, DatasetError> {
        for (index, record) in records.iter().enumerate() {
            let actual = Schema::of_record(record);
            if actual != schema {
                return Err(DatasetError::InconsistentRecord {
                    index,
                    reason: format!("expected fields {}, found {}", schema, actual),
                });
            }
        }

        Ok(Self {
            records,
            schema,
            info: DatasetInfo { num_classes },
        })
    }

    /// Number of records per pass.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the source produces nothing.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DataSource for InMemorySource {
    fn info(&self) -> DatasetInfo {
        self.info
    }

    fn schema(&self) -> Schema {
        self.schema.clone()
    }

    fn produce(&self) -> RecordIter<'_> {
        Box::new(self.records.iter().cloned())
    }
}
