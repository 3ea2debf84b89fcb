// Document to tree mapping for jsonlayout
//
// Builds a `DocumentTree` from a value document, a value document merged with
// its description, or a description alone. All three walks recurse the same
// way over objects and arrays and skip excluded object keys with their
// subtrees.

use serde_json::Value;
use tracing::debug;

use crate::internal::error::{Error, Result};
use crate::schema::defaults;
use crate::schema::parser::{kind_name, DescriptionParser};
use crate::schema::types::ExceptionSet;
use crate::tree::{DocumentTree, LeafValue, NodeId, ValueType};

/// Maps documents onto document trees
#[derive(Debug, Clone, Default)]
pub struct SchemaMapper {
    exceptions: ExceptionSet,
    parser: DescriptionParser,
}

impl SchemaMapper {
    /// Creates a schema mapper skipping keys matched by `exceptions`.
    pub fn new(exceptions: ExceptionSet) -> Self {
        Self {
            exceptions,
            parser: DescriptionParser::new(),
        }
    }

    /// Mirrors a value document with no layout metadata.
    pub fn build_from_values(&self, values: &Value) -> Result<DocumentTree> {
        let mut tree = DocumentTree::new(root_type(values, "value")?);
        let root = tree.root();
        self.mirror(&mut tree, root, values);
        debug!(nodes = tree.len(), "built tree from values");
        Ok(tree)
    }

    /// Walks a value document, attaching layout from the parallel description.
    pub fn build_with_description(&self, values: &Value, description: &Value) -> Result<DocumentTree> {
        let mut tree = DocumentTree::new(root_type(values, "value")?);
        let root = tree.root();
        self.merge(&mut tree, root, values, description, "")?;
        debug!(
            nodes = tree.len(),
            leaves = tree.leaves().len(),
            "built tree from values and description"
        );
        Ok(tree)
    }

    /// Builds a tree from a description alone, filling leaves with defaults.
    pub fn build_from_description(&self, description: &Value) -> Result<DocumentTree> {
        let mut tree = DocumentTree::new(root_type(description, "description")?);
        let root = tree.root();
        self.expand(&mut tree, root, description, "")?;
        debug!(
            nodes = tree.len(),
            leaves = tree.leaves().len(),
            "built tree from description"
        );
        Ok(tree)
    }

    /// Object members not excluded by the exception set, or array elements
    /// keyed by index. Array indices are never filtered.
    fn members<'v>(&self, value: &'v Value) -> Vec<(String, &'v Value)> {
        match value {
            Value::Object(map) => map
                .iter()
                .filter(|(key, _)| !self.exceptions.matches(key))
                .map(|(key, v)| (key.clone(), v))
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn mirror(&self, tree: &mut DocumentTree, parent: NodeId, value: &Value) {
        for (key, child) in self.members(value) {
            let id = tree.add_child(parent, key, ValueType::of(child));
            match LeafValue::from_json(child) {
                Some(leaf) => tree.set_value(id, leaf),
                None => self.mirror(tree, id, child),
            }
        }
    }

    fn merge(
        &self,
        tree: &mut DocumentTree,
        parent: NodeId,
        value: &Value,
        description: &Value,
        path: &str,
    ) -> Result<()> {
        match (value, description) {
            (Value::Object(_), Value::Object(desc_map)) => {
                for (key, child) in self.members(value) {
                    let child_path = join_path(path, &key);
                    let child_desc = desc_map.get(&key).ok_or_else(|| Error::SchemaMismatch {
                        path: child_path.clone(),
                        reason: "key is missing from the description".to_string(),
                    })?;
                    self.merge_child(tree, parent, key, child, child_desc, &child_path)?;
                }
                Ok(())
            }
            (Value::Array(items), Value::Array(desc_items)) => {
                if items.len() != desc_items.len() {
                    return Err(Error::SchemaMismatch {
                        path: path.to_string(),
                        reason: format!(
                            "array has {} element(s) but its description has {}",
                            items.len(),
                            desc_items.len()
                        ),
                    });
                }
                for (i, (child, child_desc)) in items.iter().zip(desc_items).enumerate() {
                    let key = i.to_string();
                    let child_path = join_path(path, &key);
                    self.merge_child(tree, parent, key, child, child_desc, &child_path)?;
                }
                Ok(())
            }
            _ => Err(Error::SchemaMismatch {
                path: path.to_string(),
                reason: format!(
                    "value is {} but its description is {}",
                    kind_name(value),
                    kind_name(description)
                ),
            }),
        }
    }

    fn merge_child(
        &self,
        tree: &mut DocumentTree,
        parent: NodeId,
        key: String,
        value: &Value,
        description: &Value,
        path: &str,
    ) -> Result<()> {
        let id = tree.add_child(parent, key, ValueType::of(value));
        match LeafValue::from_json(value) {
            Some(leaf) => {
                let field = self.parser.parse_field(description, path)?;
                tree.set_value(id, defaults::coerce_value(field.field_type, leaf));
                tree.set_layout(id, field.layout());
                Ok(())
            }
            None => self.merge(tree, id, value, description, path),
        }
    }

    fn expand(&self, tree: &mut DocumentTree, parent: NodeId, description: &Value, path: &str) -> Result<()> {
        for (key, child) in self.members(description) {
            let child_path = join_path(path, &key);
            if is_field_description(child) {
                let field = self.parser.parse_field(child, &child_path)?;
                let value = defaults::default_value(&field);
                let id = tree.add_child(parent, key, value.value_type());
                tree.set_value(id, value);
                tree.set_layout(id, field.layout());
            } else if child.is_object() || child.is_array() {
                let id = tree.add_child(parent, key, ValueType::of(child));
                self.expand(tree, id, child, &child_path)?;
            } else {
                return Err(Error::SchemaMismatch {
                    path: child_path,
                    reason: format!("expected a field description or container, found {}", kind_name(child)),
                });
            }
        }
        Ok(())
    }
}

/// An object holding at least one scalar member describes a leaf; objects
/// made only of containers group further descriptions.
fn is_field_description(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.values().any(|v| !v.is_object() && !v.is_array()),
        _ => false,
    }
}

fn root_type(document: &Value, what: &str) -> Result<ValueType> {
    match document {
        Value::Object(_) => Ok(ValueType::Object),
        Value::Array(_) => Ok(ValueType::Array),
        other => Err(Error::MalformedDocument(format!(
            "{} document root must be an object or an array, found {}",
            what,
            kind_name(other)
        ))),
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", path, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{EditMode, FieldType, PackedDate};
    use serde_json::json;

    fn leaf(tree: &DocumentTree, path: &str) -> (LeafValue, Option<crate::tree::LeafLayout>) {
        let node = tree.node(tree.find(path).unwrap()).unwrap();
        (node.value().cloned().unwrap(), node.layout().cloned())
    }

    #[test]
    fn test_build_from_values_keeps_document_order() {
        let mapper = SchemaMapper::default();
        let tree = mapper
            .build_from_values(&json!({"b": 1, "a": {"x": [true, null]}, "c": "s"}))
            .unwrap();
        let root = tree.root();
        let keys: Vec<&str> = tree
            .children(root)
            .iter()
            .map(|id| tree.node(*id).unwrap().key())
            .collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        let x = tree.find("a/x").unwrap();
        assert_eq!(tree.node(x).unwrap().value_type(), ValueType::Array);
        assert_eq!(leaf(&tree, "a/x/0").0, LeafValue::Bool(true));
        assert_eq!(leaf(&tree, "a/x/1").0, LeafValue::Null);
        assert!(leaf(&tree, "b").1.is_none());
    }

    #[test]
    fn test_exceptions_drop_whole_subtrees() {
        let mapper = SchemaMapper::new(ExceptionSet::new(["secret"]));
        let tree = mapper
            .build_from_values(&json!({"secretToken": {"inner": 1}, "name": "x"}))
            .unwrap();
        assert!(tree.find("secretToken").is_none());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_build_with_description() {
        let values = json!({"port": 8080, "flags": [1, 2]});
        let description = json!({
            "port": {"type": "uint16", "addr": "0", "size": 2, "mode2": "rw", "desc": "Port"},
            "flags": [
                {"type": "uint8", "addr": "2", "size": 1, "mode2": "r"},
                {"type": "uint8", "addr": "3", "size": 1, "mode2": "r"}
            ]
        });
        let tree = SchemaMapper::default()
            .build_with_description(&values, &description)
            .unwrap();
        let (value, layout) = leaf(&tree, "port");
        assert_eq!(value, LeafValue::UInt(8080));
        assert_eq!(leaf(&tree, "flags/0").0, LeafValue::UInt(1));
        let layout = layout.unwrap();
        assert_eq!(layout.field_type, FieldType::UInt);
        assert_eq!(layout.edit_mode, EditMode::ReadWrite);
        assert_eq!(layout.description, "Port");
        assert_eq!(leaf(&tree, "flags/1").1.unwrap().address, 3);
        assert_eq!(tree.leaves().len(), 3);
    }

    #[test]
    fn test_build_with_description_coerces_to_field_type() {
        let values = json!({"n": 5, "d": "2021-03-04", "f": 2, "s": 12});
        let description = json!({
            "n": {"type": "int16", "addr": "0", "size": 2},
            "d": {"type": "date", "addr": "2", "size": 4},
            "f": {"type": "double", "addr": "6", "size": 8},
            "s": {"type": "string", "addr": "e", "size": 2}
        });
        let tree = SchemaMapper::default()
            .build_with_description(&values, &description)
            .unwrap();
        assert_eq!(leaf(&tree, "n").0, LeafValue::Int(5));
        assert_eq!(leaf(&tree, "d").0, LeafValue::Date(PackedDate::new(4, 3, 2021)));
        assert_eq!(leaf(&tree, "f").0, LeafValue::Float(2.0));
        assert_eq!(leaf(&tree, "s").0, LeafValue::from("12"));
    }

    #[test]
    fn test_build_with_description_mismatches() {
        let mapper = SchemaMapper::default();
        let err = mapper
            .build_with_description(&json!({"a": 1}), &json!({}))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Schema Mismatch at 'a': key is missing from the description"
        );

        let err = mapper
            .build_with_description(&json!({"a": [1, 2]}), &json!({"a": [{"type": "int"}]}))
            .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { ref path, .. } if path == "a"));

        let err = mapper
            .build_with_description(&json!({"a": {"b": 1}}), &json!({"a": [1]}))
            .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn test_build_from_description_synthesizes_defaults() {
        let description = json!({
            "device": {
                "id": {"type": "uint", "addr": "0", "size": 2},
                "name": {"type": "string", "addr": "2", "size": 3},
                "made": {"type": "date", "addr": "5", "size": 4, "default": "2021-03-04"}
            },
            "channels": [
                {"gain": {"type": "float", "addr": "9", "size": 4, "default": 1.5}}
            ]
        });
        let tree = SchemaMapper::default().build_from_description(&description).unwrap();
        assert_eq!(leaf(&tree, "device/id").0, LeafValue::UInt(0));
        assert_eq!(leaf(&tree, "device/name").0, LeafValue::String("\0\0\0".to_string()));
        assert_eq!(leaf(&tree, "device/made").0, LeafValue::Date(PackedDate::new(4, 3, 2021)));
        assert_eq!(leaf(&tree, "channels/0/gain").0, LeafValue::Float(1.5));
        let channels = tree.find("channels").unwrap();
        assert_eq!(tree.node(channels).unwrap().value_type(), ValueType::Array);
        assert_eq!(tree.node(tree.find("device/id").unwrap()).unwrap().value_type(), ValueType::Number);
    }

    #[test]
    fn test_scalar_roots_are_rejected() {
        let err = SchemaMapper::default().build_from_values(&json!(3)).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }
}
