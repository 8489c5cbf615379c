//! The data source capability and per-record preprocessing.

use serde::{Deserialize, Serialize};

use super::record::Record;
use super::schema::Schema;

/// Lazily produced sequence of records.
pub type RecordIter<'a> = Box<dyn Iterator<Item = Record> + 'a>;

/// Lightweight description of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    /// Number of label classes.
    pub num_classes: usize,
}

/// A restartable, lazily produced sequence of records sharing one schema.
///
/// Every call to [`DataSource::produce`] starts a fresh pass. Implementors
/// must be able to report their schema without producing records.
pub trait DataSource {
    /// Dataset description.
    fn info(&self) -> DatasetInfo;

    /// Field structure of every produced record.
    fn schema(&self) -> Schema;

    /// Starts a new pass over the records.
    fn produce(&self) -> RecordIter<'_>;

    /// Starts a new pass with `preprocess` applied to every record.
    fn load<'a>(&'a self, preprocess: &'a dyn Preprocess) -> RecordIter<'a> {
        Box::new(self.produce().map(move |record| preprocess.apply(record)))
    }

    /// Schema of the records produced by [`DataSource::load`].
    fn load_schema(&self, preprocess: &dyn Preprocess) -> Schema {
        preprocess.output_schema(&self.schema())
    }
}

impl<T: DataSource + ?Sized> DataSource for Box<T> {
    fn info(&self) -> DatasetInfo {
        (**self).info()
    }

    fn schema(&self) -> Schema {
        (**self).schema()
    }

    fn produce(&self) -> RecordIter<'_> {
        (**self).produce()
    }

    fn load<'a>(&'a self, preprocess: &'a dyn Preprocess) -> RecordIter<'a> {
        (**self).load(preprocess)
    }

    fn load_schema(&self, preprocess: &dyn Preprocess) -> Schema {
        (**self).load_schema(preprocess)
    }
}

/// Per-record transformation applied while loading a source.
///
/// `output_schema` must describe what `apply` produces so that schemas stay
/// computable without touching records.
pub trait Preprocess {
    fn apply(&self, record: Record) -> Record;

    fn output_schema(&self, input: &Schema) -> Schema {
        input.clone()
    }
}

/// Leaves records unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Preprocess for Identity {
    fn apply(&self, record: Record) -> Record {
        record
    }
}

/// Schema-preserving closures can be used directly.
impl<F> Preprocess for F
where
    F: Fn(Record) -> Record,
{
    fn apply(&self, record: Record) -> Record {
        self(record)
    }
}
