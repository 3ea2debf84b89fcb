// Re-materialization of a document tree as JSON
//
// Unlike serialization this walk follows tree order, so the emitted document
// keeps the keys in the order they were loaded.

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::ser::{CompactFormatter, PrettyFormatter};
use serde_json::{Map, Serializer, Value};

use crate::internal::error::{Error, Result};
use crate::tree::{DocumentTree, LeafValue, NodeId, ValueType};

/// Converts the tree into a generic JSON value. Booleans stay booleans, every
/// other scalar is emitted as its text form.
pub fn to_json_value(tree: &DocumentTree) -> Value {
    node_to_json(tree, tree.root())
}

fn node_to_json(tree: &DocumentTree, id: NodeId) -> Value {
    let Some(node) = tree.node(id) else {
        return Value::Null;
    };
    match node.value_type() {
        ValueType::Object => {
            let mut map = Map::new();
            for &child in tree.children(id) {
                if let Some(child_node) = tree.node(child) {
                    map.insert(child_node.key().to_string(), node_to_json(tree, child));
                }
            }
            Value::Object(map)
        }
        ValueType::Array => Value::Array(
            tree.children(id)
                .iter()
                .map(|child| node_to_json(tree, *child))
                .collect(),
        ),
        _ => match node.value() {
            Some(LeafValue::Bool(b)) => Value::Bool(*b),
            Some(value) => Value::String(value.to_text()),
            None => Value::String(String::new()),
        },
    }
}

/// Emits the tree as JSON text, pretty-printed with four-space indentation
/// or compact. ISO `yyyy-MM-dd` strings are rewritten with `date_format`.
pub fn to_json_text(tree: &DocumentTree, pretty: bool, date_format: &str) -> Result<String> {
    let mut value = to_json_value(tree);
    reformat_dates(&mut value, date_format);

    let mut out = Vec::new();
    let written = if pretty {
        let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        value.serialize(&mut ser)
    } else {
        let mut ser = Serializer::with_formatter(&mut out, CompactFormatter);
        value.serialize(&mut ser)
    };
    written.map_err(|e| Error::Io(e.to_string()))?;
    String::from_utf8(out).map_err(|e| Error::Io(e.to_string()))
}

fn reformat_dates(value: &mut Value, date_format: &str) {
    match value {
        Value::String(text) => {
            if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                let mut formatted = String::new();
                // An unusable format string leaves the ISO text in place
                if write!(formatted, "{}", date.format(date_format)).is_ok() {
                    *text = formatted;
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| reformat_dates(v, date_format)),
        Value::Object(map) => map.values_mut().for_each(|v| reformat_dates(v, date_format)),
        _ => {}
    }
}
