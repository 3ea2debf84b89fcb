// Per-leaf layout metadata attached when a tree is built from a description

use std::fmt;

use serde_json::{Map, Value};

/// Binary representation of a leaf value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Int,
    UInt,
    Float,
    Double,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "STRING",
            FieldType::Int => "INT",
            FieldType::UInt => "UINT",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Date => "DATE",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Access policy for a leaf's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl EditMode {
    pub fn is_writable(&self) -> bool {
        !matches!(self, EditMode::ReadOnly)
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            EditMode::ReadOnly => "r",
            EditMode::WriteOnly => "w",
            EditMode::ReadWrite => "rw",
        })
    }
}

/// Where and how a leaf lives in the serialized buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafLayout {
    /// Byte offset of the leaf's region
    pub address: u32,
    /// Number of bytes the region spans
    pub byte_size: u32,
    pub field_type: FieldType,
    pub edit_mode: EditMode,
    pub description: String,
}

impl LeafLayout {
    /// First byte past the leaf's region.
    pub fn end(&self) -> usize {
        self.address as usize + self.byte_size as usize
    }

    /// Layout attributes keyed by their description-document names.
    pub fn attributes(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert("type".to_string(), Value::from(self.field_type.as_str()));
        attrs.insert("addr".to_string(), Value::from(self.address));
        attrs.insert("size".to_string(), Value::from(self.byte_size));
        attrs.insert("desc".to_string(), Value::from(self.description.as_str()));
        attrs
    }
}
