// Description entry parser for jsonlayout
//
// Turns the stringly-typed fields of a leaf description (`type`, `addr`,
// `size`, `desc`, `mode2`, `default`) into a typed `FieldDescriptor`.

use serde_json::{Map, Value};

use crate::internal::error::{Error, Result};
use crate::schema::types::FieldDescriptor;
use crate::tree::{EditMode, FieldType};

/// Field type patterns in match priority. The first pattern contained in the
/// type string wins, so "uint16" resolves to UINT even though it contains "int".
const FIELD_TYPE_PATTERNS: [(&str, FieldType); 6] = [
    ("uint", FieldType::UInt),
    ("int", FieldType::Int),
    ("float", FieldType::Float),
    ("double", FieldType::Double),
    ("str", FieldType::String),
    ("date", FieldType::Date),
];

/// Resolves a `type` string by case-insensitive substring match.
pub fn parse_field_type(text: &str) -> Option<FieldType> {
    let text = text.to_lowercase();
    FIELD_TYPE_PATTERNS
        .iter()
        .find(|(pattern, _)| text.contains(pattern))
        .map(|(_, field_type)| *field_type)
}

/// Resolves a `mode2` string.
///
/// No "r" means WriteOnly, checked first; otherwise a "w" means ReadWrite and
/// anything else is ReadOnly. An empty or missing mode is therefore WriteOnly.
pub fn parse_edit_mode(text: &str) -> EditMode {
    let text = text.to_lowercase();
    if !text.contains('r') {
        EditMode::WriteOnly
    } else if text.contains('w') {
        EditMode::ReadWrite
    } else {
        EditMode::ReadOnly
    }
}

/// Parser for leaf entries of a description document
#[derive(Debug, Default, Clone, Copy)]
pub struct DescriptionParser;

impl DescriptionParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses one leaf description entry. `path` names the entry in errors.
    pub fn parse_field(&self, entry: &Value, path: &str) -> Result<FieldDescriptor> {
        let obj = match entry {
            Value::Object(obj) => obj,
            other => {
                return Err(Error::SchemaMismatch {
                    path: path.to_string(),
                    reason: format!("expected a field description object, found {}", kind_name(other)),
                })
            }
        };

        let type_text = self.get_text_field(obj, "type");
        let field_type = parse_field_type(&type_text).ok_or_else(|| Error::InvalidField {
            path: path.to_string(),
            reason: format!("unknown field type '{}'", type_text),
        })?;

        Ok(FieldDescriptor {
            field_type,
            address: self.parse_address(obj, path)?,
            byte_size: self.parse_size(obj, path)?,
            edit_mode: parse_edit_mode(&self.get_text_field(obj, "mode2")),
            description: self.get_text_field(obj, "desc"),
            default: self.parse_default(obj),
        })
    }

    /// Text rendering of a scalar field; absent, null and container fields read as "".
    fn get_text_field(&self, obj: &Map<String, Value>, name: &str) -> String {
        match obj.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// `addr` is hexadecimal text with an optional "0x" prefix. Numbers are read
    /// through their decimal text, so `"addr": 10` means 0x10.
    fn parse_address(&self, obj: &Map<String, Value>, path: &str) -> Result<u32> {
        let text = self.get_text_field(obj, "addr");
        let digits = text.trim();
        if digits.is_empty() {
            return Ok(0);
        }
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);
        u32::from_str_radix(digits, 16).map_err(|_| Error::InvalidField {
            path: path.to_string(),
            reason: format!("address '{}' is not a hexadecimal offset", text),
        })
    }

    fn parse_size(&self, obj: &Map<String, Value>, path: &str) -> Result<u32> {
        let invalid = |shown: String| Error::InvalidField {
            path: path.to_string(),
            reason: format!("size '{}' is not a byte count", shown),
        };
        match obj.get("size") {
            None | Some(Value::Null) => Ok(0),
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| invalid(n.to_string())),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(0),
            Some(Value::String(s)) => s.trim().parse::<u32>().map_err(|_| invalid(s.clone())),
            Some(other) => Err(invalid(other.to_string())),
        }
    }

    /// A default counts only if it renders to non-empty text.
    fn parse_default(&self, obj: &Map<String, Value>) -> Option<Value> {
        match obj.get("default") {
            Some(v @ (Value::Bool(_) | Value::Number(_))) => Some(v.clone()),
            Some(Value::String(s)) if !s.is_empty() => Some(Value::String(s.clone())),
            _ => None,
        }
    }
}

/// Short name of a JSON value kind, for error messages.
pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_priority() {
        assert_eq!(parse_field_type("uint16"), Some(FieldType::UInt));
        assert_eq!(parse_field_type("UINT"), Some(FieldType::UInt));
        assert_eq!(parse_field_type("int32"), Some(FieldType::Int));
        assert_eq!(parse_field_type("Float"), Some(FieldType::Float));
        assert_eq!(parse_field_type("double"), Some(FieldType::Double));
        assert_eq!(parse_field_type("string"), Some(FieldType::String));
        assert_eq!(parse_field_type("Date"), Some(FieldType::Date));
        // "int" is checked before "str"
        assert_eq!(parse_field_type("int_string"), Some(FieldType::Int));
        assert_eq!(parse_field_type("bool"), None);
    }

    #[test]
    fn test_edit_mode_priority() {
        assert_eq!(parse_edit_mode("r"), EditMode::ReadOnly);
        assert_eq!(parse_edit_mode("R"), EditMode::ReadOnly);
        assert_eq!(parse_edit_mode("rw"), EditMode::ReadWrite);
        assert_eq!(parse_edit_mode("Wr"), EditMode::ReadWrite);
        assert_eq!(parse_edit_mode("w"), EditMode::WriteOnly);
        assert_eq!(parse_edit_mode(""), EditMode::WriteOnly);
        assert_eq!(parse_edit_mode("x"), EditMode::WriteOnly);
    }

    #[test]
    fn test_parse_field() {
        let parser = DescriptionParser::new();
        let entry = json!({
            "type": "uint16", "addr": "1A", "size": "2",
            "desc": "Port number", "mode2": "rw", "default": 8080
        });
        let field = parser.parse_field(&entry, "port").unwrap();
        assert_eq!(field.field_type, FieldType::UInt);
        assert_eq!(field.address, 0x1a);
        assert_eq!(field.byte_size, 2);
        assert_eq!(field.edit_mode, EditMode::ReadWrite);
        assert_eq!(field.description, "Port number");
        assert_eq!(field.default, Some(json!(8080)));
    }

    #[test]
    fn test_parse_field_lenient_inputs() {
        let parser = DescriptionParser::new();
        let entry = json!({"type": "int", "addr": 10, "size": 4, "default": ""});
        let field = parser.parse_field(&entry, "x").unwrap();
        assert_eq!(field.address, 0x10);
        assert_eq!(field.byte_size, 4);
        assert_eq!(field.edit_mode, EditMode::WriteOnly);
        assert_eq!(field.default, None);

        let field = parser.parse_field(&json!({"type": "str", "addr": "0x20"}), "y").unwrap();
        assert_eq!(field.address, 0x20);
        assert_eq!(field.byte_size, 0);
    }

    #[test]
    fn test_parse_field_errors() {
        let parser = DescriptionParser::new();
        let err = parser.parse_field(&json!({"type": "blob"}), "a/b").unwrap_err();
        assert_eq!(err.to_string(), "Invalid Field at 'a/b': unknown field type 'blob'");

        let err = parser.parse_field(&json!({"type": "int", "addr": "zz"}), "a").unwrap_err();
        assert!(matches!(err, Error::InvalidField { .. }));

        let err = parser.parse_field(&json!(5), "a").unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }
}
