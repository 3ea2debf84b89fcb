// Default value synthesis and field-type coercion for schema builds
//
// A leaf built from a description alone takes the entry's `default` when one
// is given, otherwise a zero value shaped by its field type. Either way, and
// for values merged from a value document, the stored value takes the
// representation the leaf decoder produces for its field type.

use serde_json::Value;

use crate::schema::types::FieldDescriptor;
use crate::tree::{FieldType, LeafValue, PackedDate};

/// Zero value for a field type: 0 for integers, 0.0 for floats, `size` NUL
/// characters for strings and the all-zero date for dates.
pub fn zero_value(field_type: FieldType, size: u32) -> LeafValue {
    match field_type {
        FieldType::UInt => LeafValue::UInt(0),
        FieldType::Int => LeafValue::Int(0),
        FieldType::Float | FieldType::Double => LeafValue::Float(0.0),
        FieldType::String => LeafValue::String("\0".repeat(size as usize)),
        FieldType::Date => LeafValue::Date(PackedDate::zero()),
    }
}

/// The initial value of a leaf described by `field`.
pub fn default_value(field: &FieldDescriptor) -> LeafValue {
    match &field.default {
        Some(default) => from_default(field.field_type, default),
        None => zero_value(field.field_type, field.byte_size),
    }
}

fn from_default(field_type: FieldType, default: &Value) -> LeafValue {
    coerce_value(field_type, LeafValue::from_json(default).unwrap_or(LeafValue::Null))
}

/// Converts a value to the representation its field type decodes to: `Int`
/// for INT, `UInt` for UINT, `Float` for FLOAT and DOUBLE (FLOAT rounded to
/// single precision), `Date` for DATE and `String` for STRING.
///
/// Nothing is range-checked; out-of-width integers are narrowed on encode.
pub fn coerce_value(field_type: FieldType, value: LeafValue) -> LeafValue {
    match field_type {
        FieldType::Int => match value {
            LeafValue::Int(_) => value,
            other => LeafValue::Int(other.to_i64_lossy()),
        },
        FieldType::UInt => match value {
            LeafValue::UInt(_) => value,
            other => LeafValue::UInt(other.to_i64_lossy() as u64),
        },
        FieldType::Float => LeafValue::Float(f64::from(value.to_f64_lossy() as f32)),
        FieldType::Double => LeafValue::Float(value.to_f64_lossy()),
        FieldType::Date => LeafValue::Date(value.to_date_lossy()),
        FieldType::String => match value {
            LeafValue::String(_) => value,
            other => LeafValue::String(other.to_text()),
        },
    }
}
