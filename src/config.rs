// Model configuration for jsonlayout

use serde::Deserialize;

use crate::internal::error::Result;
use crate::schema::ExceptionSet;

/// Byte order used for FLOAT and DOUBLE fields. Integer and date fields are
/// always big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloatByteOrder {
    /// Host memory layout, matching consumers that copy raw float bits
    #[default]
    Native,
    Big,
    Little,
}

/// What serialization does when two leaves share an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateAddressPolicy {
    /// Fail with `Error::DuplicateAddress`
    #[default]
    Reject,
    /// Keep the leaf visited last in tree order
    LastWins,
}

/// Configuration for a `JsonModel`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Keys containing any of these substrings are left out of every build
    pub exceptions: ExceptionSet,

    pub float_byte_order: FloatByteOrder,

    pub duplicate_addresses: DuplicateAddressPolicy,

    /// chrono format that ISO dates are rewritten to on text emission
    pub date_format: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            exceptions: ExceptionSet::default(),
            float_byte_order: FloatByteOrder::Native,
            duplicate_addresses: DuplicateAddressPolicy::Reject,
            date_format: "%d.%m.%Y".to_string(),
        }
    }
}

impl ModelConfig {
    /// Reads a configuration from JSON text. Missing keys keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Sets the key substrings skipped on load.
    pub fn with_exceptions(mut self, exceptions: ExceptionSet) -> Self {
        self.exceptions = exceptions;
        self
    }

    /// Sets the byte order of FLOAT and DOUBLE fields.
    pub fn with_float_byte_order(mut self, order: FloatByteOrder) -> Self {
        self.float_byte_order = order;
        self
    }

    /// Sets what serialization does with shared addresses.
    pub fn with_duplicate_addresses(mut self, policy: DuplicateAddressPolicy) -> Self {
        self.duplicate_addresses = policy;
        self
    }

    /// Sets the chrono format used for dates in JSON text.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }
}
