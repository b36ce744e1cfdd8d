//! Store builder.
//!
//! Declares schemas and initial content up front. The schemas are installed
//! before the content is written, so the content is validated against them.

use crate::store::Store;
use alloc::format;
use tabula_core::schema::{parse_schema_json, CellSchema, TablesSchema, ValueSchema, ValuesSchema};
use tabula_core::{Error, Result, Tables, Values};

/// Builder for a `Store`.
///
/// # Example
///
/// ```
/// use tabula_store::{row, CellSchema, StoreBuilder, Value, ValueType};
///
/// let mut store = StoreBuilder::new()
///     .add_cell("pets", "species", CellSchema::new(ValueType::String))
///     .unwrap()
///     .add_cell("pets", "sold", CellSchema::new(ValueType::Boolean).default_value(false))
///     .unwrap()
///     .build();
///
/// store.set_row("pets", "fido", row! { "species" => "dog" });
/// assert_eq!(store.get_cell("pets", "fido", "sold"), Some(Value::from(false)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct StoreBuilder {
    tables_schema: TablesSchema,
    values_schema: ValuesSchema,
    tables: Tables,
    values: Values,
}

impl StoreBuilder {
    /// Creates a builder for an empty store without schemas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that an id is usable.
    fn check_id(kind: &str, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(Error::invalid_schema(format!("{} id cannot be empty", kind)));
        }
        Ok(())
    }

    /// Declares a cell of a table.
    pub fn add_cell(mut self, table_id: &str, cell_id: &str, schema: CellSchema) -> Result<Self> {
        Self::check_id("Table", table_id)?;
        Self::check_id("Cell", cell_id)?;
        self.tables_schema
            .entry(table_id.into())
            .or_default()
            .insert(cell_id.into(), schema);
        Ok(self)
    }

    /// Declares a value.
    pub fn add_value(mut self, value_id: &str, schema: ValueSchema) -> Result<Self> {
        Self::check_id("Value", value_id)?;
        self.values_schema.insert(value_id.into(), schema);
        Ok(self)
    }

    /// Replaces the tables schema declared so far.
    pub fn tables_schema(mut self, schema: TablesSchema) -> Self {
        self.tables_schema = schema;
        self
    }

    /// Replaces the values schema declared so far.
    pub fn values_schema(mut self, schema: ValuesSchema) -> Self {
        self.values_schema = schema;
        self
    }

    /// Replaces both schemas with a `[tablesSchema, valuesSchema]` JSON array.
    pub fn schema_json(mut self, json: &str) -> Result<Self> {
        let (tables_schema, values_schema) = parse_schema_json(json).map_err(|e| match e {
            Error::InvalidContent { message } => Error::invalid_schema(message),
            other => other,
        })?;
        self.tables_schema = tables_schema;
        self.values_schema = values_schema;
        Ok(self)
    }

    /// Sets the initial tables.
    pub fn tables(mut self, tables: Tables) -> Self {
        self.tables = tables;
        self
    }

    /// Sets the initial values.
    pub fn values(mut self, values: Values) -> Self {
        self.values = values;
        self
    }

    /// Builds the store. Initial content is written in one transaction.
    pub fn build(self) -> Store {
        let mut store = Store::new();
        store.set_schema(self.tables_schema, self.values_schema);
        if !self.tables.is_empty() || !self.values.is_empty() {
            store.set_content(self.tables, self.values);
        }
        store
    }
}
