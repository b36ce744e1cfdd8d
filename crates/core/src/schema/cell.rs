//! Cell and value schema definitions.

use crate::types::ValueType;
use crate::value::Value;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Schema entry for a single cell or top-level value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellSchema {
    /// Declared type.
    #[serde(rename = "type")]
    value_type: ValueType,
    /// Default applied when the cell or value is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
}

/// Values share the cell schema shape.
pub type ValueSchema = CellSchema;

impl CellSchema {
    /// Creates a schema entry with no default.
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            default: None,
        }
    }

    /// Sets the default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Returns the declared type.
    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Returns the default value, if any.
    #[inline]
    pub fn get_default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns true if `value` may be written under this entry.
    #[inline]
    pub fn accepts(&self, value: &Value) -> bool {
        value.value_type() == self.value_type && value.is_valid()
    }

    /// Drops a default that does not satisfy the declared type.
    pub(crate) fn sanitized(mut self) -> Self {
        if let Some(default) = &self.default {
            if !self.accepts(default) {
                log::warn!(
                    "dropping schema default {:?} that is not a valid {}",
                    default,
                    self.value_type
                );
                self.default = None;
            }
        }
        self
    }

    /// Reads an entry from its JSON form `{"type": .., "default": ..}`.
    ///
    /// Entries with unknown keys or types yield `None`; a default of the wrong
    /// type is dropped while the entry itself is kept.
    pub fn from_json(json: &JsonValue) -> Option<Self> {
        let obj = json.as_object()?;
        if obj.keys().any(|k| k != "type" && k != "default") {
            return None;
        }
        let value_type = obj.get("type").and_then(|t| t.as_str()).and_then(ValueType::parse)?;
        let default = obj.get("default").and_then(Value::from_json);
        Some(
            Self {
                value_type,
                default,
            }
            .sanitized(),
        )
    }
}
