//! Value type definitions for the tabula store.
//!
//! Cells and values share the same three primitive types.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Supported primitive types of a cell or value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Boolean type (true/false)
    Boolean,
    /// Finite 64-bit floating point number
    Number,
    /// UTF-8 string
    String,
}

impl ValueType {
    /// Returns the name used for this type in schema definitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Number => "number",
            ValueType::String => "string",
        }
    }

    /// Parses a schema type name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "boolean" => Some(ValueType::Boolean),
            "number" => Some(ValueType::Number),
            "string" => Some(ValueType::String),
            _ => None,
        }
    }

    /// Position of this type in the cross-type sort order.
    #[inline]
    pub(crate) fn sort_rank(&self) -> u8 {
        match self {
            ValueType::Boolean => 0,
            ValueType::Number => 1,
            ValueType::String => 2,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_parse() {
        assert_eq!(ValueType::parse("number"), Some(ValueType::Number));
        assert_eq!(ValueType::parse("string"), Some(ValueType::String));
        assert_eq!(ValueType::parse("boolean"), Some(ValueType::Boolean));
        assert_eq!(ValueType::parse("any"), None);
        assert_eq!(ValueType::parse("Number"), None);
    }

    #[test]
    fn test_value_type_round_trip_name() {
        for ty in [ValueType::Boolean, ValueType::Number, ValueType::String] {
            assert_eq!(ValueType::parse(ty.as_str()), Some(ty));
        }
    }

    #[test]
    fn test_sort_rank_order() {
        assert!(ValueType::Boolean.sort_rank() < ValueType::Number.sort_rank());
        assert!(ValueType::Number.sort_rank() < ValueType::String.sort_rank());
    }
}
