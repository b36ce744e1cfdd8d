//! Schema definitions for the tabula store.
//!
//! A store may carry a tables schema, a values schema, both, or neither. Each
//! one constrains the ids that may be written and the type of each cell or
//! value, and may supply defaults.

mod cell;
mod registry;

pub use cell::{CellSchema, ValueSchema};
pub use registry::{
    parse_schema_json, parse_tables_schema_json, parse_values_schema_json,
    SchemaRegistry, TablesSchema, ValuesSchema,
};
