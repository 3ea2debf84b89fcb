// JSON model: the owned document tree and everything callers do with it
//
// A model holds exactly one tree. Every load builds a complete new tree and
// swaps it in only on success, so a failed load leaves the previous tree
// untouched. Leaf edits go through `set_value`, which enforces edit modes and
// field ranges.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::{self, LayoutCodec};
use crate::config::ModelConfig;
use crate::internal::error::{Error, Result};
use crate::schema::{coerce_value, ExceptionSet, SchemaMapper};
use crate::tree::{DocumentTree, EditMode, FieldType, LeafLayout, LeafValue, NodeId, PackedDate};

/// A document tree together with the configuration used to build and encode it.
#[derive(Debug, Clone, Default)]
pub struct JsonModel {
    tree: DocumentTree,
    config: ModelConfig,
}

impl JsonModel {
    /// Creates an empty model with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty model using `config` for every load and encode.
    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            tree: DocumentTree::default(),
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Replaces the exception set used by subsequent loads.
    pub fn set_exceptions(&mut self, exceptions: ExceptionSet) {
        self.config.exceptions = exceptions;
    }

    /// The currently installed tree.
    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    fn mapper(&self) -> SchemaMapper {
        SchemaMapper::new(self.config.exceptions.clone())
    }

    fn codec(&self) -> LayoutCodec {
        LayoutCodec::from_config(&self.config)
    }

    /// Loads a value document with no layout metadata.
    pub fn load_json(&mut self, json: &[u8]) -> Result<()> {
        let built = parse_document(json).and_then(|values| self.mapper().build_from_values(&values));
        self.install(built)
    }

    /// Loads a value document and attaches layout from its description.
    pub fn load_json_with_description(&mut self, json: &[u8], description: &[u8]) -> Result<()> {
        let built = parse_document(json).and_then(|values| {
            let description = parse_document(description)?;
            self.mapper().build_with_description(&values, &description)
        });
        self.install(built)
    }

    /// Loads a description alone; leaves start at their defaults.
    pub fn load_json_by_description(&mut self, description: &[u8]) -> Result<()> {
        let built = parse_document(description)
            .and_then(|description| self.mapper().build_from_description(&description));
        self.install(built)
    }

    /// Reads a whole value document from `reader` and loads it.
    pub fn load_reader<R: Read>(&mut self, mut reader: R) -> Result<()> {
        let mut json = Vec::new();
        reader.read_to_end(&mut json)?;
        self.load_json(&json)
    }

    /// Reads a value document from disk and loads it.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let json = fs::read(path)?;
        self.load_json(&json)
    }

    /// Reads a value document and its description from disk and loads both.
    pub fn load_files(&mut self, path: impl AsRef<Path>, description_path: impl AsRef<Path>) -> Result<()> {
        let json = fs::read(path)?;
        let description = fs::read(description_path)?;
        self.load_json_with_description(&json, &description)
    }

    /// Reads a description from disk and loads its defaults.
    pub fn load_description_file(&mut self, description_path: impl AsRef<Path>) -> Result<()> {
        let description = fs::read(description_path)?;
        self.load_json_by_description(&description)
    }

    fn install(&mut self, built: Result<DocumentTree>) -> Result<()> {
        match built {
            Ok(tree) => {
                debug!(nodes = tree.len(), "installed new document tree");
                self.tree = tree;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "cannot load json, keeping the previous tree");
                Err(err)
            }
        }
    }

    /// Current value of a leaf.
    pub fn value(&self, id: NodeId) -> Option<&LeafValue> {
        self.tree.node(id)?.value()
    }

    /// Writes a leaf value after checking the leaf's edit mode and range.
    /// On error the tree is unchanged.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<LeafValue>) -> Result<()> {
        let value = value.into();
        let node = self
            .tree
            .node(id)
            .ok_or_else(|| Error::InvalidNode(format!("no node with index {}", id.index())))?;
        let path = self.tree.path_of(id);
        if node.is_container() {
            return Err(Error::InvalidNode(format!("'{}' is a container", path)));
        }
        let checked = match node.layout() {
            Some(layout) => check_edit(&path, layout, value)?,
            None => value,
        };
        self.tree.set_value(id, checked);
        Ok(())
    }

    /// `set_value` addressed by key path.
    pub fn set_value_at(&mut self, path: &str, value: impl Into<LeafValue>) -> Result<()> {
        let id = self
            .tree
            .find(path)
            .ok_or_else(|| Error::InvalidNode(format!("no node at '{}'", path)))?;
        self.set_value(id, value)
    }

    /// Serializes every leaf into an address-ordered buffer.
    pub fn serialize(&self) -> Result<Bytes> {
        self.serialize_with(false)
    }

    /// Serializes, leaving out read-only leaves when `rw_only` is set.
    pub fn serialize_with(&self, rw_only: bool) -> Result<Bytes> {
        self.codec().serialize(&self.tree, rw_only)
    }

    /// Encoded leaves keyed by address.
    pub fn serialize_to_map(&self, rw_only: bool) -> Result<BTreeMap<u32, Bytes>> {
        self.codec().serialize_to_map(&self.tree, rw_only)
    }

    /// Reads every leaf value back from `buffer`, in place.
    pub fn deserialize(&mut self, buffer: &[u8]) -> Result<()> {
        self.codec().deserialize(&mut self.tree, buffer)
    }

    /// The tree as a JSON value, in document order.
    pub fn to_json(&self) -> Value {
        codec::to_json_value(&self.tree)
    }

    /// JSON text of the tree, with ISO dates rewritten per the configured format.
    pub fn json_text(&self, pretty: bool) -> Result<String> {
        codec::to_json_text(&self.tree, pretty, &self.config.date_format)
    }

    /// Writes the pretty JSON text of the tree to `path`.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.json_text(true)?)?;
        Ok(())
    }
}

fn parse_document(text: &[u8]) -> Result<Value> {
    Ok(serde_json::from_slice(text)?)
}

/// Validates an edit against a leaf's layout and returns the value to store,
/// converted to the field's natural representation.
fn check_edit(path: &str, layout: &LeafLayout, value: LeafValue) -> Result<LeafValue> {
    if layout.edit_mode == EditMode::ReadOnly {
        return Err(Error::ReadOnly(path.to_string()));
    }
    let size = layout.byte_size;
    match layout.field_type {
        FieldType::String => {
            let text = value.to_text();
            if !text.is_ascii() {
                return Err(Error::RangeViolation(format!(
                    "'{}' only accepts ASCII text",
                    path
                )));
            }
            if text.len() > size as usize {
                return Err(Error::RangeViolation(format!(
                    "'{}' holds at most {} byte(s), got {}",
                    path,
                    size,
                    text.len()
                )));
            }
            Ok(LeafValue::String(text))
        }
        FieldType::Int | FieldType::UInt => {
            let signed = layout.field_type == FieldType::Int;
            let (min, max) = integer_bounds(size, signed).ok_or_else(|| Error::UnsupportedWidth {
                key: path.to_string(),
                field_type: layout.field_type.to_string(),
                size,
            })?;
            let n = integral(&value)
                .filter(|n| (min..=max).contains(n))
                .ok_or_else(|| {
                    Error::RangeViolation(format!(
                        "'{}' accepts integers in {}..={}, got '{}'",
                        path, min, max, value
                    ))
                })?;
            Ok(if signed {
                LeafValue::Int(n as i64)
            } else {
                LeafValue::UInt(n as u64)
            })
        }
        FieldType::Float | FieldType::Double => match value {
            LeafValue::Int(_) | LeafValue::UInt(_) | LeafValue::Float(_) => Ok(coerce_value(layout.field_type, value)),
            LeafValue::String(ref s) => s
                .trim()
                .parse::<f64>()
                .map(|f| coerce_value(layout.field_type, LeafValue::Float(f)))
                .map_err(|_| Error::RangeViolation(format!("'{}' expects a number, got '{}'", path, s))),
            _ => Err(Error::RangeViolation(format!("'{}' expects a number, got '{}'", path, value))),
        },
        FieldType::Date => match value {
            LeafValue::Date(_) => Ok(value),
            LeafValue::String(ref s) => PackedDate::parse(s)
                .map(LeafValue::Date)
                .ok_or_else(|| Error::RangeViolation(format!("'{}' expects a date, got '{}'", path, s))),
            _ => Err(Error::RangeViolation(format!("'{}' expects a date, got '{}'", path, value))),
        },
    }
}

/// Inclusive bounds of an integer field of `size` bytes.
fn integer_bounds(size: u32, signed: bool) -> Option<(i128, i128)> {
    let bits = match size {
        1 | 2 | 4 | 8 => size * 8,
        _ => return None,
    };
    Some(if signed {
        (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
    } else {
        (0, (1i128 << bits) - 1)
    })
}

/// The integer a value spells, if it spells one exactly.
fn integral(value: &LeafValue) -> Option<i128> {
    match value {
        LeafValue::Int(i) => Some(i128::from(*i)),
        LeafValue::UInt(u) => Some(i128::from(*u)),
        LeafValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i128),
        LeafValue::String(s) => s.trim().parse::<i128>().ok(),
        _ => None,
    }
}
