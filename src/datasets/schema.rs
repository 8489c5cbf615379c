//! Structural schemas for records.
//!
//! A [`Schema`] is a tree of field names: each node is either a leaf with a
//! coarse [`FieldKind`] or a nested schema. Two schemas are intersected
//! depth-first; a key survives only where both trees agree on whether it is
//! a leaf or a mapping.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::record::{Record, Value, LABEL_FIELD};

/// Coarse type of a leaf field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Int,
    Float,
    Text,
}

/// A node of the schema tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    Leaf(FieldKind),
    Nested(Schema),
}

/// Field structure shared by all records of a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: BTreeMap<String, SchemaNode>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a leaf field.
    pub fn with_leaf(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), SchemaNode::Leaf(kind));
        self
    }

    /// Adds a nested field.
    pub fn with_nested(mut self, name: impl Into<String>, nested: Schema) -> Self {
        self.fields.insert(name.into(), SchemaNode::Nested(nested));
        self
    }

    /// Returns a copy of this schema with an integer `label` leaf.
    pub fn with_label(self) -> Self {
        self.with_leaf(LABEL_FIELD, FieldKind::Int)
    }

    /// Derives the schema of a single record.
    pub fn of_record(record: &Record) -> Self {
        let fields = record
            .iter()
            .map(|(name, value)| {
                let node = match value {
                    Value::Nested(inner) => SchemaNode::Nested(Self::of_record(inner)),
                    leaf => SchemaNode::Leaf(leaf.kind().unwrap_or(FieldKind::Text)),
                };
                (name.clone(), node)
            })
            .collect();
        Self { fields }
    }

    /// Returns the node for a top-level field.
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.fields.get(name)
    }

    /// Returns true if a top-level field with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Top-level field names in sorted order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// All leaf paths, `/`-separated, in sorted order.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_leaf_paths("", &mut paths);
        paths
    }

    fn collect_leaf_paths(&self, prefix: &str, paths: &mut Vec<String>) {
        for (name, node) in &self.fields {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };
            match node {
                SchemaNode::Leaf(_) => paths.push(path),
                SchemaNode::Nested(inner) => inner.collect_leaf_paths(&path, paths),
            }
        }
    }

    /// Depth-first structural intersection.
    ///
    /// A key is kept when it is a leaf on both sides (this side's kind wins)
    /// or a mapping on both sides whose own intersection is non-empty.
    pub fn intersect(&self, other: &Schema) -> Schema {
        let fields = self
            .fields
            .iter()
            .filter_map(|(name, node)| {
                let kept = match (node, other.fields.get(name)?) {
                    (SchemaNode::Leaf(kind), SchemaNode::Leaf(_)) => SchemaNode::Leaf(*kind),
                    (SchemaNode::Nested(mine), SchemaNode::Nested(theirs)) => {
                        let common = mine.intersect(theirs);
                        if common.is_empty() {
                            return None;
                        }
                        SchemaNode::Nested(common)
                    }
                    _ => return None,
                };
                Some((name.clone(), kept))
            })
            .collect();
        Schema { fields }
    }

    /// Leaf paths present on both sides whose kinds disagree.
    pub fn kind_conflicts(&self, other: &Schema) -> Vec<String> {
        let theirs: BTreeMap<String, FieldKind> = other.leaf_kinds().into_iter().collect();
        self.leaf_kinds()
            .into_iter()
            .filter(|(path, kind)| theirs.get(path).is_some_and(|k| k != kind))
            .map(|(path, _)| path)
            .collect()
    }

    fn leaf_kinds(&self) -> Vec<(String, FieldKind)> {
        let mut out = Vec::new();
        for (name, node) in &self.fields {
            match node {
                SchemaNode::Leaf(kind) => out.push((name.clone(), *kind)),
                SchemaNode::Nested(inner) => out.extend(
                    inner
                        .leaf_kinds()
                        .into_iter()
                        .map(|(path, kind)| (format!("{}/{}", name, path), kind)),
                ),
            }
        }
        out
    }

    /// Keeps only the parts of `record` that this schema describes.
    ///
    /// Leaves are kept verbatim when the schema has a leaf under the same
    /// key; mappings are filtered recursively and dropped if nothing survives.
    pub fn filter_record(&self, record: Record) -> Record {
        record
            .into_iter()
            .filter_map(|(name, value)| {
                let kept = match (self.fields.get(&name)?, value) {
                    (SchemaNode::Nested(inner), Value::Nested(nested)) => {
                        let filtered = inner.filter_record(nested);
                        if filtered.is_empty() {
                            return None;
                        }
                        Value::Nested(filtered)
                    }
                    (SchemaNode::Leaf(_), Value::Nested(_)) => return None,
                    (SchemaNode::Nested(_), _) => return None,
                    (SchemaNode::Leaf(_), leaf) => leaf,
                };
                Some((name, kept))
            })
            .collect()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.leaf_paths().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_schema() -> Schema {
        Schema::new()
            .with_leaf("image", FieldKind::Float)
            .with_leaf("id", FieldKind::Text)
            .with_nested(
                "meta",
                Schema::new()
                    .with_leaf("source", FieldKind::Text)
                    .with_leaf("width", FieldKind::Int),
            )
    }

    #[test]
    fn test_leaf_paths_are_sorted_and_nested() {
        let paths = image_schema().leaf_paths();
        assert_eq!(paths, vec!["id", "image", "meta/source", "meta/width"]);
    }

    #[test]
    fn test_intersect_recurses_into_mappings() {
        let other = Schema::new()
            .with_leaf("image", FieldKind::Float)
            .with_nested("meta", Schema::new().with_leaf("width", FieldKind::Int));

        let common = image_schema().intersect(&other);
        assert_eq!(common.leaf_paths(), vec!["image", "meta/width"]);
        assert_eq!(common, other.intersect(&image_schema()));
    }

    #[test]
    fn test_intersect_drops_leaf_versus_mapping() {
        let other = Schema::new()
            .with_leaf("meta", FieldKind::Text)
            .with_leaf("id", FieldKind::Text);

        let common = image_schema().intersect(&other);
        assert_eq!(common.leaf_paths(), vec!["id"]);
    }

    #[test]
    fn test_intersect_drops_empty_mappings() {
        let other = Schema::new()
            .with_leaf("id", FieldKind::Text)
            .with_nested("meta", Schema::new().with_leaf("height", FieldKind::Int));

        let common = image_schema().intersect(&other);
        assert!(!common.contains("meta"));
    }

    #[test]
    fn test_kind_conflicts() {
        let other = Schema::new()
            .with_leaf("image", FieldKind::Int)
            .with_leaf("id", FieldKind::Text);
        assert_eq!(image_schema().kind_conflicts(&other), vec!["image"]);
    }

    #[test]
    fn test_filter_record_matches_schema() {
        let mut meta = Record::new();
        meta.insert("source".to_string(), Value::text("web"));
        meta.insert("width".to_string(), Value::scalar_int(32));
        let mut record = Record::new();
        record.insert("id".to_string(), Value::text("ex-1"));
        record.insert("image".to_string(), Value::scalar_float(0.1));
        record.insert("meta".to_string(), Value::Nested(meta));

        let filter = Schema::new()
            .with_leaf("id", FieldKind::Text)
            .with_nested("meta", Schema::new().with_leaf("width", FieldKind::Int));

        let filtered = filter.filter_record(record);
        assert_eq!(Schema::of_record(&filtered), filter);
        assert_eq!(filtered["id"], Value::text("ex-1"));
    }

    #[test]
    fn test_display() {
        let schema = Schema::new()
            .with_leaf("x", FieldKind::Float)
            .with_label();
        assert_eq!(schema.to_string(), "{label, x}");
    }
}
