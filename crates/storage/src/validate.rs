//! Schema-validated writes.
//!
//! `ContentWriter` is the only way the store mutates content. It checks each
//! incoming cell and value against the schema registry, applies defaults,
//! records rejected writes in the change log and hands the surviving data to
//! `Content`.
//!
//! A rejected write never fails the call: the offending cell, row or value is
//! skipped and noted under `invalid_cells`/`invalid_values`. When a declared
//! type does not match and the schema supplies a default, the default is
//! written instead.

use crate::change_log::{ChangeLog, TransactionChanges};
use crate::content::Content;
use alloc::vec::Vec;
use serde_json::Value as JsonValue;
use tabula_core::schema::SchemaRegistry;
use tabula_core::{Id, IdMap, Row, Table, Tables, Value, Values};

/// Raw JSON shape of tables before validation.
pub type JsonTables = IdMap<IdMap<IdMap<JsonValue>>>;

/// Raw JSON shape of values before validation.
pub type JsonValues = IdMap<JsonValue>;

/// Applies validated writes to content, recording them in a change log.
pub struct ContentWriter<'a> {
    content: &'a mut Content,
    schema: &'a SchemaRegistry,
    log: &'a mut ChangeLog,
}

impl<'a> ContentWriter<'a> {
    /// Creates a writer over one transaction's log.
    pub fn new(content: &'a mut Content, schema: &'a SchemaRegistry, log: &'a mut ChangeLog) -> Self {
        Self { content, schema, log }
    }

    // ---- Tables ----

    /// Replaces all tables. An empty map deletes every table.
    pub fn set_tables(&mut self, tables: Tables) {
        let tables = self.validate_tables(tables);
        self.set_valid_tables(tables);
    }

    /// Replaces one table. Rows that fail validation are skipped.
    pub fn set_table(&mut self, table_id: &str, table: Table) {
        if let Some(table) = self.validate_table(table_id, table) {
            self.set_valid_table(table_id, table);
        }
    }

    /// Replaces one row, filling in defaults for missing cells.
    pub fn set_row(&mut self, table_id: &str, row_id: &str, row: Row) {
        if let Some(row) = self.validate_row(table_id, Some(row_id), row, false) {
            self.set_valid_row(table_id, row_id, row);
        }
    }

    /// Adds a row under a fresh numeric id. Returns `None` if the row was
    /// rejected.
    pub fn add_row(&mut self, table_id: &str, row: Row, reuse_row_ids: bool) -> Option<Id> {
        let row = self.validate_row(table_id, None, row, false)?;
        let row_id = self.content.next_row_id(table_id, reuse_row_ids);
        self.set_valid_row(table_id, &row_id, row);
        Some(row_id)
    }

    /// Merges cells into a row. Defaults are only applied if the row is new.
    pub fn set_partial_row(&mut self, table_id: &str, row_id: &str, row: Row) {
        if let Some(row) = self.validate_row(table_id, Some(row_id), row, true) {
            for (cell_id, cell) in row {
                self.set_cell_into_default_row(table_id, row_id, &cell_id, cell);
            }
        }
    }

    /// Writes one cell. A new row also receives its defaults.
    pub fn set_cell(&mut self, table_id: &str, row_id: &str, cell_id: &str, cell: Value) {
        if let Some(cell) = self.validated_cell(table_id, Some(row_id), cell_id, cell) {
            self.set_cell_into_default_row(table_id, row_id, cell_id, cell);
        }
    }

    /// Deletes every table.
    pub fn del_tables(&mut self) {
        self.set_valid_tables(Tables::default());
    }

    /// Deletes a table.
    pub fn del_table(&mut self, table_id: &str) {
        self.content.del_table(self.log, table_id);
    }

    /// Deletes a row.
    pub fn del_row(&mut self, table_id: &str, row_id: &str) {
        self.content.del_row(self.log, table_id, row_id);
    }

    /// Deletes a cell.
    ///
    /// A cell with a schema default is reset to it instead, unless
    /// `force_del` is set, in which case the whole row goes: a row may not
    /// lack a defaulted cell.
    pub fn del_cell(&mut self, table_id: &str, row_id: &str, cell_id: &str, force_del: bool) {
        if self.content.cell(table_id, row_id, cell_id).is_none() {
            return;
        }
        match self.schema.cell_default(table_id, cell_id) {
            Some(default) if !force_del => {
                self.content
                    .set_cell(self.log, table_id, row_id, cell_id, default.clone());
            }
            Some(_) => self.content.del_row(self.log, table_id, row_id),
            None => {
                self.content.del_cell(self.log, table_id, row_id, cell_id);
            }
        }
    }

    // ---- Values ----

    /// Replaces all values. Defaults are filled in for missing values.
    pub fn set_values(&mut self, values: Values) {
        let values = self.validate_values(values, false);
        self.set_valid_values(values);
    }

    /// Merges values into the existing ones.
    pub fn set_partial_values(&mut self, values: Values) {
        for (value_id, value) in self.validate_values(values, true) {
            self.content.set_value(self.log, &value_id, value);
        }
    }

    /// Writes one value.
    pub fn set_value(&mut self, value_id: &str, value: Value) {
        if let Some(value) = self.validated_value(value_id, value) {
            self.content.set_value(self.log, value_id, value);
        }
    }

    /// Deletes every value. Values with a default are reset to it.
    pub fn del_values(&mut self) {
        self.set_valid_values(Values::default());
    }

    /// Deletes a value, or resets it to its default.
    pub fn del_value(&mut self, value_id: &str) {
        if self.content.value(value_id).is_none() {
            return;
        }
        match self.schema.value_default(value_id) {
            Some(default) => self.content.set_value(self.log, value_id, default.clone()),
            None => {
                self.content.del_value(self.log, value_id);
            }
        }
    }

    // ---- Whole-store operations ----

    /// Reads every table back, deletes it and writes it again, so that a
    /// newly installed tables schema applies to existing content.
    pub fn revalidate_tables(&mut self) {
        if self.content.tables().is_empty() {
            return;
        }
        let tables = self.content.tables().clone();
        self.del_tables();
        self.set_tables(tables);
    }

    /// Same as `revalidate_tables` for values. Always runs, so that value
    /// defaults appear even in an empty store.
    pub fn revalidate_values(&mut self) {
        let values = self.content.values().clone();
        let value_ids: Vec<Id> = values.keys().cloned().collect();
        for value_id in &value_ids {
            self.content.del_value(self.log, value_id);
        }
        self.set_values(values);
    }

    /// Applies a net diff through the validated writers.
    pub fn apply_changes(&mut self, changes: TransactionChanges) {
        for (table_id, table) in changes.tables {
            let Some(table) = table else {
                self.del_table(&table_id);
                continue;
            };
            for (row_id, row) in table {
                let Some(row) = row else {
                    self.del_row(&table_id, &row_id);
                    continue;
                };
                for (cell_id, cell) in row {
                    match cell {
                        Some(cell) => self.set_cell(&table_id, &row_id, &cell_id, cell),
                        None => self.del_cell(&table_id, &row_id, &cell_id, false),
                    }
                }
            }
        }
        for (value_id, value) in changes.values {
            match value {
                Some(value) => self.set_value(&value_id, value),
                None => self.del_value(&value_id),
            }
        }
    }

    /// Replaces all tables from parsed JSON. Non-scalar cells are recorded
    /// as invalid.
    pub fn set_tables_from_json(&mut self, json: JsonTables) {
        let mut tables = Tables::default();
        for (table_id, rows) in json {
            let mut table = Table::default();
            for (row_id, cells) in rows {
                if let Some(row) = self.row_from_json(Some(table_id.as_str()), Some(row_id.as_str()), cells) {
                    table.insert(row_id, row);
                }
            }
            tables.insert(table_id, table);
        }
        self.set_tables(tables);
    }

    /// Replaces all values from parsed JSON. Non-scalar values are recorded
    /// as invalid.
    pub fn set_values_from_json(&mut self, json: JsonValues) {
        let mut values = Values::default();
        for (value_id, json) in json {
            match Value::from_json(&json) {
                Some(value) => {
                    values.insert(value_id, value);
                }
                None => self.log.value_invalid(Some(value_id.as_str()), json),
            }
        }
        self.set_values(values);
    }

    // ---- Validation ----

    fn row_from_json(&mut self, table_id: Option<&str>, row_id: Option<&str>, cells: IdMap<JsonValue>) -> Option<Row> {
        let supplied = cells.len();
        let mut row = Row::default();
        for (cell_id, json) in cells {
            match Value::from_json(&json) {
                Some(cell) => {
                    row.insert(cell_id, cell);
                }
                None => self.log.cell_invalid(table_id, row_id, Some(cell_id.as_str()), json),
            }
        }
        // A row whose every cell was rejected has already been reported.
        if supplied > 0 && row.is_empty() {
            None
        } else {
            Some(row)
        }
    }

    fn validated_cell(&mut self, table_id: &str, row_id: Option<&str>, cell_id: &str, cell: Value) -> Option<Value> {
        if table_id.is_empty() || row_id == Some("") || cell_id.is_empty() {
            self.log
                .cell_invalid(Some(table_id), row_id, Some(cell_id), cell.to_json());
            return None;
        }
        if self.schema.has_tables_schema() {
            match self.schema.cell_schema(table_id, cell_id) {
                Some(schema) if schema.accepts(&cell) => Some(cell),
                Some(schema) => {
                    self.log
                        .cell_invalid(Some(table_id), row_id, Some(cell_id), cell.to_json());
                    schema.get_default().cloned()
                }
                None => {
                    self.log
                        .cell_invalid(Some(table_id), row_id, Some(cell_id), cell.to_json());
                    None
                }
            }
        } else if cell.is_valid() {
            Some(cell)
        } else {
            self.log
                .cell_invalid(Some(table_id), row_id, Some(cell_id), cell.to_json());
            None
        }
    }

    fn validated_value(&mut self, value_id: &str, value: Value) -> Option<Value> {
        if value_id.is_empty() {
            self.log.value_invalid(Some(value_id), value.to_json());
            return None;
        }
        if self.schema.has_values_schema() {
            match self.schema.value_schema(value_id) {
                Some(schema) if schema.accepts(&value) => Some(value),
                Some(schema) => {
                    self.log.value_invalid(Some(value_id), value.to_json());
                    schema.get_default().cloned()
                }
                None => {
                    self.log.value_invalid(Some(value_id), value.to_json());
                    None
                }
            }
        } else if value.is_valid() {
            Some(value)
        } else {
            self.log.value_invalid(Some(value_id), value.to_json());
            None
        }
    }

    fn validate_row(&mut self, table_id: &str, row_id: Option<&str>, row: Row, skip_defaults: bool) -> Option<Row> {
        let mut row = row;
        if !skip_defaults {
            for (cell_id, default) in self.schema.cell_defaults(table_id) {
                if !row.contains_key(cell_id) {
                    row.insert(cell_id.clone(), default.clone());
                }
            }
        }
        if row.is_empty() {
            self.log.cell_invalid(Some(table_id), row_id, None, JsonValue::Null);
            return None;
        }
        let valid: Row = row
            .into_iter()
            .filter_map(|(cell_id, cell)| {
                self.validated_cell(table_id, row_id, &cell_id, cell)
                    .map(|cell| (cell_id, cell))
            })
            .collect();
        (!valid.is_empty()).then_some(valid)
    }

    fn validate_table(&mut self, table_id: &str, table: Table) -> Option<Table> {
        if table_id.is_empty() || !self.schema.allows_table(table_id) || table.is_empty() {
            self.log.cell_invalid(Some(table_id), None, None, JsonValue::Null);
            return None;
        }
        let valid: Table = table
            .into_iter()
            .filter_map(|(row_id, row)| {
                self.validate_row(table_id, Some(row_id.as_str()), row, false)
                    .map(|row| (row_id, row))
            })
            .collect();
        (!valid.is_empty()).then_some(valid)
    }

    fn validate_tables(&mut self, tables: Tables) -> Tables {
        tables
            .into_iter()
            .filter_map(|(table_id, table)| {
                self.validate_table(&table_id, table)
                    .map(|table| (table_id, table))
            })
            .collect()
    }

    fn validate_values(&mut self, values: Values, skip_defaults: bool) -> Values {
        let mut values = values;
        if !skip_defaults {
            for (value_id, default) in self.schema.value_defaults() {
                if !values.contains_key(value_id) {
                    values.insert(value_id.clone(), default.clone());
                }
            }
        }
        values
            .into_iter()
            .filter_map(|(value_id, value)| {
                self.validated_value(&value_id, value)
                    .map(|value| (value_id, value))
            })
            .collect()
    }

    // ---- Application ----

    fn set_valid_tables(&mut self, tables: Tables) {
        let stale: Vec<Id> = self
            .content
            .tables()
            .keys()
            .filter(|id| !tables.contains_key(*id))
            .cloned()
            .collect();
        for (table_id, table) in tables {
            self.set_valid_table(&table_id, table);
        }
        for table_id in &stale {
            self.content.del_table(self.log, table_id);
        }
    }

    fn set_valid_table(&mut self, table_id: &str, table: Table) {
        let stale: Vec<Id> = self
            .content
            .table(table_id)
            .map(|t| t.keys().filter(|id| !table.contains_key(*id)).cloned().collect())
            .unwrap_or_default();
        for (row_id, row) in table {
            self.set_valid_row(table_id, &row_id, row);
        }
        for row_id in &stale {
            self.content.del_row(self.log, table_id, row_id);
        }
    }

    fn set_valid_row(&mut self, table_id: &str, row_id: &str, row: Row) {
        let stale: Vec<Id> = self
            .content
            .row(table_id, row_id)
            .map(|r| r.keys().filter(|id| !row.contains_key(*id)).cloned().collect())
            .unwrap_or_default();
        for (cell_id, cell) in row {
            self.content.set_cell(self.log, table_id, row_id, &cell_id, cell);
        }
        for cell_id in &stale {
            self.content.del_cell(self.log, table_id, row_id, cell_id);
        }
    }

    fn set_cell_into_default_row(&mut self, table_id: &str, row_id: &str, cell_id: &str, cell: Value) {
        if self.content.row(table_id, row_id).is_some() {
            self.content.set_cell(self.log, table_id, row_id, cell_id, cell);
            return;
        }
        let mut row = Row::default();
        row.insert(cell_id.into(), cell);
        for (default_id, default) in self.schema.cell_defaults(table_id) {
            if !row.contains_key(default_id) {
                row.insert(default_id.clone(), default.clone());
            }
        }
        self.set_valid_row(table_id, row_id, row);
    }

    fn set_valid_values(&mut self, values: Values) {
        let stale: Vec<Id> = self
            .content
            .values()
            .keys()
            .filter(|id| !values.contains_key(*id))
            .cloned()
            .collect();
        for (value_id, value) in values {
            self.content.set_value(self.log, &value_id, value);
        }
        for value_id in &stale {
            self.del_value(value_id);
        }
    }
}
