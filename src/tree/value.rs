// Typed values held by document tree nodes

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

/// Mirrors the JSON value kind at a tree position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueType {
    /// Returns the kind of a JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    /// True for arrays and objects.
    pub fn is_container(self) -> bool {
        matches!(self, ValueType::Array | ValueType::Object)
    }
}

/// A calendar date as stored in a DATE field.
///
/// Components are kept raw rather than as a `NaiveDate` because the zero date
/// (and anything else a buffer decodes to) must survive a round trip even when
/// it is not a valid calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedDate {
    pub day: u16,
    pub month: u16,
    pub year: u16,
}

impl PackedDate {
    /// Creates a date from raw components, unchecked.
    pub fn new(day: u16, month: u16, year: u16) -> Self {
        Self { day, month, year }
    }

    /// The all-zero date synthesized for DATE fields without a default.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Converts to a calendar date, if the components name a real day.
    pub fn to_naive(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
    }

    /// Converts from a calendar date; years past `u16` are rejected.
    pub fn from_naive(date: NaiveDate) -> Option<Self> {
        let year = u16::try_from(date.year()).ok()?;
        Some(Self::new(date.day() as u16, date.month() as u16, year))
    }

    /// Parses `yyyy-MM-dd` or `dd.MM.yyyy`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(text, "%d.%m.%Y"))
            .ok()
            .and_then(Self::from_naive)
    }

    /// ISO 8601 form, or an empty string when the date is not a real day.
    pub fn to_iso_string(&self) -> String {
        self.to_naive()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

/// Scalar payload of a tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Date(PackedDate),
}

impl LeafValue {
    /// Converts a scalar JSON value. Containers yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(LeafValue::Null),
            Value::Bool(b) => Some(LeafValue::Bool(*b)),
            Value::Number(n) => Some(if let Some(u) = n.as_u64() {
                LeafValue::UInt(u)
            } else if let Some(i) = n.as_i64() {
                LeafValue::Int(i)
            } else {
                LeafValue::Float(n.as_f64().unwrap_or_default())
            }),
            Value::String(s) => Some(LeafValue::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// The JSON kind this value is emitted as.
    pub fn value_type(&self) -> ValueType {
        match self {
            LeafValue::Null => ValueType::Null,
            LeafValue::Bool(_) => ValueType::Bool,
            LeafValue::Int(_) | LeafValue::UInt(_) | LeafValue::Float(_) => ValueType::Number,
            LeafValue::String(_) | LeafValue::Date(_) => ValueType::String,
        }
    }

    /// Integer view used by the codec. Floats truncate toward zero, text is
    /// parsed, anything else is zero.
    pub fn to_i64_lossy(&self) -> i64 {
        match self {
            LeafValue::Null | LeafValue::Date(_) => 0,
            LeafValue::Bool(b) => i64::from(*b),
            LeafValue::Int(i) => *i,
            LeafValue::UInt(u) => *u as i64,
            LeafValue::Float(f) => *f as i64,
            LeafValue::String(s) => parse_integer(s)
                .or_else(|| s.trim().parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0),
        }
    }

    /// Floating view used by the codec.
    pub fn to_f64_lossy(&self) -> f64 {
        match self {
            LeafValue::Null | LeafValue::Date(_) => 0.0,
            LeafValue::Bool(b) => f64::from(u8::from(*b)),
            LeafValue::Int(i) => *i as f64,
            LeafValue::UInt(u) => *u as f64,
            LeafValue::Float(f) => *f,
            LeafValue::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        }
    }

    /// Date view used by the codec. Unparseable values become the zero date.
    pub fn to_date_lossy(&self) -> PackedDate {
        match self {
            LeafValue::Date(d) => *d,
            LeafValue::String(s) => PackedDate::parse(s).unwrap_or_default(),
            _ => PackedDate::zero(),
        }
    }

    /// Text form used for export: the value's string rendering.
    pub fn to_text(&self) -> String {
        match self {
            LeafValue::Null => String::new(),
            LeafValue::Bool(b) => b.to_string(),
            LeafValue::Int(i) => i.to_string(),
            LeafValue::UInt(u) => u.to_string(),
            LeafValue::Float(f) => f.to_string(),
            LeafValue::String(s) => s.clone(),
            LeafValue::Date(d) => d.to_iso_string(),
        }
    }
}

impl fmt::Display for LeafValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<bool> for LeafValue {
    fn from(v: bool) -> Self {
        LeafValue::Bool(v)
    }
}

impl From<i64> for LeafValue {
    fn from(v: i64) -> Self {
        LeafValue::Int(v)
    }
}

impl From<u64> for LeafValue {
    fn from(v: u64) -> Self {
        LeafValue::UInt(v)
    }
}

impl From<f64> for LeafValue {
    fn from(v: f64) -> Self {
        LeafValue::Float(v)
    }
}

impl From<&str> for LeafValue {
    fn from(v: &str) -> Self {
        LeafValue::String(v.to_string())
    }
}

impl From<String> for LeafValue {
    fn from(v: String) -> Self {
        LeafValue::String(v)
    }
}

impl From<PackedDate> for LeafValue {
    fn from(v: PackedDate) -> Self {
        LeafValue::Date(v)
    }
}

/// Parses a decimal integer, accepting a leading sign and surrounding spaces.
pub(crate) fn parse_integer(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}
