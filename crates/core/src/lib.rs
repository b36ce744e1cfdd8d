//! Tabula Core - Core types and schema definitions for the tabula store.
//!
//! This crate provides the foundational types shared by the other tabula crates:
//!
//! - `ValueType`: The three cell types (Boolean, Number, String)
//! - `Value`: A scalar held by a cell or a top-level value
//! - `Row`, `Table`, `Tables`, `Values`: Insertion-ordered content containers
//! - `RowIdPool`: Allocator of numeric row ids
//! - `schema`: Tables and values schemas with defaults
//! - `Error`: Error types for store operations
//!
//! # Example
//!
//! ```rust
//! use tabula_core::{row, Value, ValueType};
//! use tabula_core::schema::{CellSchema, SchemaRegistry, TablesSchema};
//!
//! let mut schema = TablesSchema::default();
//! schema.insert(
//!     "pets".into(),
//!     [(String::from("sold"), CellSchema::new(ValueType::Boolean).default_value(false))]
//!         .into_iter()
//!         .collect(),
//! );
//!
//! let mut registry = SchemaRegistry::new();
//! registry.set_tables_schema(schema);
//! assert!(registry.validate_cell("pets", "sold", &Value::from(true)));
//! assert!(!registry.validate_cell("pets", "sold", &Value::from("yes")));
//!
//! let fido = row! { "species" => "dog", "age" => 4 };
//! assert_eq!(fido.get("age"), Some(&Value::from(4)));
//! ```

#![no_std]

extern crate alloc;

mod error;
#[macro_use]
mod macros;
mod row;
pub mod schema;
mod types;
mod value;

pub use error::{Error, Result};
pub use row::{Id, IdMap, Row, RowIdPool, Table, Tables, Values};
pub use types::ValueType;
pub use value::Value;

#[doc(hidden)]
pub mod __private {
    pub use alloc::string::String;
}
