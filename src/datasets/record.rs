//! Record values flowing through data sources.
//!
//! A record is an ordered mapping from field name to [`Value`]; values are
//! tensors, text, or nested records.

use std::collections::BTreeMap;

use ndarray::{ArrayD, IxDyn};

use super::schema::FieldKind;

/// Name of the synthesized binary label field.
pub const LABEL_FIELD: &str = "label";

/// A single example: field name to value, nested to any depth.
pub type Record = BTreeMap<String, Value>;

/// A field value inside a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer tensor of fixed rank (rank 0 for scalars).
    Int(ArrayD<i64>),
    /// Floating-point tensor of fixed rank.
    Float(ArrayD<f64>),
    /// Opaque text leaf such as an example identifier.
    Text(String),
    /// Nested mapping.
    Nested(Record),
}

impl Value {
    /// Creates a rank-0 integer tensor.
    pub fn scalar_int(value: i64) -> Self {
        Value::Int(ArrayD::from_elem(IxDyn(&[]), value))
    }

    /// Creates a rank-0 float tensor.
    pub fn scalar_float(value: f64) -> Self {
        Value::Float(ArrayD::from_elem(IxDyn(&[]), value))
    }

    /// Creates a text leaf.
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    /// Returns the leaf kind, or `None` for nested mappings.
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            Value::Int(_) => Some(FieldKind::Int),
            Value::Float(_) => Some(FieldKind::Float),
            Value::Text(_) => Some(FieldKind::Text),
            Value::Nested(_) => None,
        }
    }

    /// Returns the nested record if this value is a mapping.
    pub fn as_nested(&self) -> Option<&Record> {
        match self {
            Value::Nested(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the integer tensor if this value is one.
    pub fn as_int(&self) -> Option<&ArrayD<i64>> {
        match self {
            Value::Int(array) => Some(array),
            _ => None,
        }
    }
}

/// Overwrites the `label` field with `label` everywhere.
///
/// An existing tensor label keeps its shape (the new label is an integer
/// tensor filled with `label`); a missing or non-tensor label becomes a scalar.
pub fn set_label(mut record: Record, label: i64) -> Record {
    let shape = match record.get(LABEL_FIELD) {
        Some(Value::Int(existing)) => existing.raw_dim(),
        Some(Value::Float(existing)) => existing.raw_dim(),
        _ => IxDyn(&[]),
    };
    record.insert(
        LABEL_FIELD.to_string(),
        Value::Int(ArrayD::from_elem(shape, label)),
    );
    record
}

/// Returns the label tensor of a record, if present and integer-typed.
pub fn label_of(record: &Record) -> Option<&ArrayD<i64>> {
    record.get(LABEL_FIELD).and_then(Value::as_int)
}
