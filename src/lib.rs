// jsonlayout library entry point
// JSON documents mapped onto fixed-layout binary buffers

pub mod codec;
pub mod config;
pub mod internal;
pub mod model;
pub mod schema;
pub mod tree;

pub use crate::codec::LayoutCodec;
pub use crate::config::{DuplicateAddressPolicy, FloatByteOrder, ModelConfig};
pub use crate::internal::error::{Error, Result};
pub use crate::model::JsonModel;
pub use crate::schema::{ExceptionSet, FieldDescriptor, SchemaMapper};
pub use crate::tree::{DocumentTree, EditMode, FieldType, LeafLayout, LeafValue, NodeId, PackedDate, ValueType};
