use thiserror::Error;
use std::io;

/// Unified error type for the jsonlayout library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Input text is not valid JSON, or its root is not a container.
    #[error("Malformed Document: {0}")]
    MalformedDocument(String),

    /// The description document does not structurally parallel the value document.
    #[error("Schema Mismatch at '{path}': {reason}")]
    SchemaMismatch { path: String, reason: String },

    /// A leaf description entry could not be parsed into a field descriptor.
    #[error("Invalid Field at '{path}': {reason}")]
    InvalidField { path: String, reason: String },

    /// Edit attempted on a read-only leaf.
    #[error("Read Only: field '{0}' cannot be edited")]
    ReadOnly(String),

    /// Edit value does not fit the leaf's declared width, length or type.
    #[error("Range Violation: {0}")]
    RangeViolation(String),

    /// Edit or query addressed a node that is not an editable leaf.
    #[error("Invalid Node: {0}")]
    InvalidNode(String),

    /// A leaf region reaches past the end of the buffer being deserialized.
    #[error("Buffer Too Short: field '{key}' needs bytes {start}..{end}, buffer has {len}")]
    BufferTooShort {
        key: String,
        start: usize,
        end: usize,
        len: usize,
    },

    /// Two leaves were collected at the same byte address.
    #[error("Duplicate Address: 0x{address:x} is claimed by both '{first}' and '{second}'")]
    DuplicateAddress {
        address: u32,
        first: String,
        second: String,
    },

    /// The field type cannot be encoded in the declared byte size.
    #[error("Unsupported Width: field '{key}' of type {field_type} cannot use {size} byte(s)")]
    UnsupportedWidth {
        key: String,
        field_type: String,
        size: u32,
    },

    /// Error raised while reading or writing documents and buffers.
    #[error("IO Error: {0}")]
    Io(String),
}

/// A specialized `Result` type for jsonlayout operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        // Only text parsing goes through serde_json, so every failure is a load failure
        Error::MalformedDocument(err.to_string())
    }
}
