//! The schema registry: optional tables and values schemas for a store.

use super::cell::{CellSchema, ValueSchema};
use crate::error::Result;
use crate::row::{Id, IdMap};
use crate::value::Value;
use alloc::string::String;
use serde_json::Value as JsonValue;

/// Table id to cell id to cell schema.
pub type TablesSchema = IdMap<IdMap<CellSchema>>;

/// Value id to value schema.
pub type ValuesSchema = IdMap<ValueSchema>;

/// Holds the schemas installed on a store.
///
/// Without a tables schema any table and cell id is accepted; with one, only
/// the declared tables and cells are. The same holds for values.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    tables: TablesSchema,
    values: ValuesSchema,
    has_tables_schema: bool,
    has_values_schema: bool,
}

impl SchemaRegistry {
    /// Creates a registry in no-schema mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a tables schema, replacing any previous one.
    ///
    /// Defaults that do not match their declared type are dropped, and so are
    /// tables that declare no cells. A schema left with no tables is ignored
    /// and false is returned.
    pub fn set_tables_schema(&mut self, schema: TablesSchema) -> bool {
        let tables: TablesSchema = schema
            .into_iter()
            .filter_map(|(table_id, cells)| {
                let cells: IdMap<CellSchema> = cells
                    .into_iter()
                    .map(|(cell_id, cell)| (cell_id, cell.sanitized()))
                    .collect();
                if cells.is_empty() {
                    log::warn!("dropping schema for table {} with no cells", table_id);
                    None
                } else {
                    Some((table_id, cells))
                }
            })
            .collect();
        if tables.is_empty() {
            log::warn!("ignoring empty tables schema");
            return false;
        }
        self.tables = tables;
        self.has_tables_schema = true;
        true
    }

    /// Installs a values schema, replacing any previous one.
    ///
    /// An empty schema is ignored and false is returned.
    pub fn set_values_schema(&mut self, schema: ValuesSchema) -> bool {
        if schema.is_empty() {
            log::warn!("ignoring empty values schema");
            return false;
        }
        self.values = schema
            .into_iter()
            .map(|(value_id, value)| (value_id, value.sanitized()))
            .collect();
        self.has_values_schema = true;
        true
    }

    /// Reverts tables to no-schema mode.
    pub fn del_tables_schema(&mut self) {
        self.tables.clear();
        self.has_tables_schema = false;
    }

    /// Reverts values to no-schema mode.
    pub fn del_values_schema(&mut self) {
        self.values.clear();
        self.has_values_schema = false;
    }

    /// Returns true if a tables schema is installed.
    #[inline]
    pub fn has_tables_schema(&self) -> bool {
        self.has_tables_schema
    }

    /// Returns true if a values schema is installed.
    #[inline]
    pub fn has_values_schema(&self) -> bool {
        self.has_values_schema
    }

    /// Returns the installed tables schema (empty in no-schema mode).
    #[inline]
    pub fn tables_schema(&self) -> &TablesSchema {
        &self.tables
    }

    /// Returns the installed values schema (empty in no-schema mode).
    #[inline]
    pub fn values_schema(&self) -> &ValuesSchema {
        &self.values
    }

    /// Returns true if `table_id` may hold rows.
    pub fn allows_table(&self, table_id: &str) -> bool {
        !self.has_tables_schema || self.tables.contains_key(table_id)
    }

    /// Returns true if `value_id` may be set.
    pub fn allows_value(&self, value_id: &str) -> bool {
        !self.has_values_schema || self.values.contains_key(value_id)
    }

    /// Returns the schema of a cell, if one is declared.
    pub fn cell_schema(&self, table_id: &str, cell_id: &str) -> Option<&CellSchema> {
        self.tables.get(table_id).and_then(|cells| cells.get(cell_id))
    }

    /// Returns the schema of a value, if one is declared.
    pub fn value_schema(&self, value_id: &str) -> Option<&ValueSchema> {
        self.values.get(value_id)
    }

    /// Checks a cell write.
    pub fn validate_cell(&self, table_id: &str, cell_id: &str, value: &Value) -> bool {
        if !value.is_valid() {
            return false;
        }
        if !self.has_tables_schema {
            return true;
        }
        self.cell_schema(table_id, cell_id)
            .is_some_and(|schema| schema.accepts(value))
    }

    /// Checks a value write.
    pub fn validate_value(&self, value_id: &str, value: &Value) -> bool {
        if !value.is_valid() {
            return false;
        }
        if !self.has_values_schema {
            return true;
        }
        self.value_schema(value_id).is_some_and(|schema| schema.accepts(value))
    }

    /// Returns the default of a cell, if one is declared.
    pub fn cell_default(&self, table_id: &str, cell_id: &str) -> Option<&Value> {
        self.cell_schema(table_id, cell_id).and_then(CellSchema::get_default)
    }

    /// Returns the default of a value, if one is declared.
    pub fn value_default(&self, value_id: &str) -> Option<&Value> {
        self.value_schema(value_id).and_then(CellSchema::get_default)
    }

    /// Iterates over the cells of a table that declare a default.
    pub fn cell_defaults<'a>(&'a self, table_id: &str) -> impl Iterator<Item = (&'a Id, &'a Value)> + 'a {
        self.tables
            .get(table_id)
            .into_iter()
            .flat_map(|cells| cells.iter())
            .filter_map(|(cell_id, schema)| schema.get_default().map(|d| (cell_id, d)))
    }

    /// Iterates over the values that declare a default.
    pub fn value_defaults(&self) -> impl Iterator<Item = (&Id, &Value)> + '_ {
        self.values
            .iter()
            .filter_map(|(value_id, schema)| schema.get_default().map(|d| (value_id, d)))
    }

    /// Serializes the tables schema.
    pub fn tables_schema_json(&self) -> String {
        to_json_string(&self.tables)
    }

    /// Serializes the values schema.
    pub fn values_schema_json(&self) -> String {
        to_json_string(&self.values)
    }

    /// Serializes both schemas as a two-element array.
    pub fn schema_json(&self) -> String {
        to_json_string(&(&self.tables, &self.values))
    }
}

fn to_json_string<T: serde::Serialize>(value: &T) -> String {
    // Schemas hold only string keys and finite scalars.
    serde_json::to_string(value).unwrap_or_default()
}

/// Parses a tables schema from JSON. Unusable entries are skipped.
pub fn parse_tables_schema_json(json: &str) -> Result<TablesSchema> {
    let raw: IdMap<IdMap<JsonValue>> = serde_json::from_str(json)?;
    Ok(tables_schema_from_raw(raw))
}

/// Parses a values schema from JSON. Unusable entries are skipped.
pub fn parse_values_schema_json(json: &str) -> Result<ValuesSchema> {
    let raw: IdMap<JsonValue> = serde_json::from_str(json)?;
    Ok(values_schema_from_raw(raw))
}

/// Parses a `[tablesSchema, valuesSchema]` pair from JSON.
pub fn parse_schema_json(json: &str) -> Result<(TablesSchema, ValuesSchema)> {
    let (tables, values): (IdMap<IdMap<JsonValue>>, IdMap<JsonValue>) =
        serde_json::from_str(json)?;
    Ok((tables_schema_from_raw(tables), values_schema_from_raw(values)))
}

fn tables_schema_from_raw(raw: IdMap<IdMap<JsonValue>>) -> TablesSchema {
    raw.into_iter()
        .map(|(table_id, cells)| (table_id, values_schema_from_raw(cells)))
        .collect()
}

fn values_schema_from_raw(raw: IdMap<JsonValue>) -> ValuesSchema {
    raw.into_iter()
        .filter_map(|(id, json)| match CellSchema::from_json(&json) {
            Some(schema) => Some((id, schema)),
            None => {
                log::warn!("ignoring unusable schema entry {}: {}", id, json);
                None
            }
        })
        .collect()
}
