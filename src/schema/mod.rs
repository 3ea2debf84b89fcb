// Schema module for jsonlayout
//
// This module turns value and description documents into document trees:
//
// 1. Typed field descriptors parsed from description entries
// 2. Exception sets that keep keys out of a build
// 3. Default values and field-type coercion of leaf values
// 4. The three build modes (values, values + description, description)

// Re-export public types and functions
pub use self::types::{ExceptionSet, FieldDescriptor};
pub use self::parser::{parse_edit_mode, parse_field_type, DescriptionParser};
pub use self::defaults::{coerce_value, default_value, zero_value};
pub use self::mapper::SchemaMapper;

// Sub-modules
pub mod types;
pub mod parser;
pub mod defaults;
pub mod mapper;
