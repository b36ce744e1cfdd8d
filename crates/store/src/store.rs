//! Store - Main entry point for tabula.
//!
//! This module provides the `Store` struct which owns the content, the
//! schemas, the open transaction and the listeners. Readers return owned
//! snapshots; writers validate against the schema, run inside a transaction
//! (opened implicitly when none is active) and return `&mut Self` so calls
//! can be chained.

use alloc::vec::Vec;
use tabula_core::schema::{SchemaRegistry, TablesSchema, ValuesSchema};
use tabula_core::{Id, Row, Table, Tables, Value, Values};
use tabula_reactive::ListenerRegistry;
use tabula_storage::{sorted_row_ids, Content, SortedRowIdsQuery, Transaction};

/// A reactive in-memory store of tables and values.
///
/// # Example
///
/// ```
/// use tabula_store::{row, Store};
///
/// let mut store = Store::new();
/// store.set_row("pets", "fido", row! { "species" => "dog", "age" => 3 });
///
/// assert_eq!(store.get_row("pets", "fido"), row! { "species" => "dog", "age" => 3 });
/// store.del_row("pets", "fido");
/// assert!(!store.has_table("pets"));
/// ```
pub struct Store {
    pub(crate) content: Content,
    pub(crate) schema: SchemaRegistry,
    pub(crate) transaction: Transaction,
    pub(crate) listeners: ListenerRegistry<Store>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates an empty store without schemas.
    pub fn new() -> Self {
        Self {
            content: Content::new(),
            schema: SchemaRegistry::new(),
            transaction: Transaction::new(),
            listeners: ListenerRegistry::new(),
        }
    }

    // ---- Readers ----

    /// Returns a copy of all tables and all values.
    pub fn get_content(&self) -> (Tables, Values) {
        (self.get_tables(), self.get_values())
    }

    /// Returns a copy of all tables.
    pub fn get_tables(&self) -> Tables {
        self.content.tables().clone()
    }

    /// Returns true if any table exists.
    pub fn has_tables(&self) -> bool {
        !self.content.tables().is_empty()
    }

    /// Returns the ids of all tables.
    pub fn get_table_ids(&self) -> Vec<Id> {
        self.content.tables().keys().cloned().collect()
    }

    /// Returns a copy of a table, empty if it does not exist.
    pub fn get_table(&self, table_id: &str) -> Table {
        self.content.table(table_id).cloned().unwrap_or_default()
    }

    pub fn has_table(&self, table_id: &str) -> bool {
        self.content.table(table_id).is_some()
    }

    /// Returns the union of the cell ids used across a table's rows.
    pub fn get_table_cell_ids(&self, table_id: &str) -> Vec<Id> {
        self.content.table_cell_ids(table_id)
    }

    /// Returns true if any row of the table has the cell.
    pub fn has_table_cell(&self, table_id: &str, cell_id: &str) -> bool {
        self.content.has_table_cell(table_id, cell_id)
    }

    /// Returns the ids of a table's rows, in insertion order.
    pub fn get_row_ids(&self, table_id: &str) -> Vec<Id> {
        self.content
            .table(table_id)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the ids of a table's rows ordered and windowed by `query`.
    ///
    /// Rows lacking the sort cell sort as if they held its schema default,
    /// or last when there is none.
    pub fn get_sorted_row_ids(&self, query: &SortedRowIdsQuery) -> Vec<Id> {
        let default = query
            .cell_id
            .as_deref()
            .and_then(|cell_id| self.schema.cell_default(&query.table_id, cell_id));
        sorted_row_ids(self.content.table(&query.table_id), query, default)
    }

    /// Returns a copy of a row, empty if it does not exist.
    pub fn get_row(&self, table_id: &str, row_id: &str) -> Row {
        self.content.row(table_id, row_id).cloned().unwrap_or_default()
    }

    pub fn has_row(&self, table_id: &str, row_id: &str) -> bool {
        self.content.row(table_id, row_id).is_some()
    }

    /// Returns the ids of a row's cells.
    pub fn get_cell_ids(&self, table_id: &str, row_id: &str) -> Vec<Id> {
        self.content
            .row(table_id, row_id)
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_cell(&self, table_id: &str, row_id: &str, cell_id: &str) -> Option<Value> {
        self.content.cell(table_id, row_id, cell_id).cloned()
    }

    pub fn has_cell(&self, table_id: &str, row_id: &str, cell_id: &str) -> bool {
        self.content.cell(table_id, row_id, cell_id).is_some()
    }

    /// Returns a copy of all values.
    pub fn get_values(&self) -> Values {
        self.content.values().clone()
    }

    /// Returns true if any value exists.
    pub fn has_values(&self) -> bool {
        !self.content.values().is_empty()
    }

    pub fn get_value_ids(&self) -> Vec<Id> {
        self.content.values().keys().cloned().collect()
    }

    pub fn get_value(&self, value_id: &str) -> Option<Value> {
        self.content.value(value_id).cloned()
    }

    pub fn has_value(&self, value_id: &str) -> bool {
        self.content.value(value_id).is_some()
    }

    // ---- Iteration ----

    /// Calls `f` with each table.
    pub fn for_each_table(&self, mut f: impl FnMut(&str, &Table)) {
        for (table_id, table) in self.content.tables() {
            f(table_id, table);
        }
    }

    /// Calls `f` with each cell id used in a table and the number of rows
    /// that have it.
    pub fn for_each_table_cell(&self, table_id: &str, mut f: impl FnMut(&str, usize)) {
        let Some(table) = self.content.table(table_id) else {
            return;
        };
        for cell_id in self.content.table_cell_ids(table_id) {
            let count = table.values().filter(|row| row.contains_key(&cell_id)).count();
            f(&cell_id, count);
        }
    }

    /// Calls `f` with each row of a table.
    pub fn for_each_row(&self, table_id: &str, mut f: impl FnMut(&str, &Row)) {
        for (row_id, row) in self.content.table(table_id).into_iter().flatten() {
            f(row_id, row);
        }
    }

    /// Calls `f` with each cell of a row.
    pub fn for_each_cell(&self, table_id: &str, row_id: &str, mut f: impl FnMut(&str, &Value)) {
        for (cell_id, cell) in self.content.row(table_id, row_id).into_iter().flatten() {
            f(cell_id, cell);
        }
    }

    /// Calls `f` with each value.
    pub fn for_each_value(&self, mut f: impl FnMut(&str, &Value)) {
        for (value_id, value) in self.content.values() {
            f(value_id, value);
        }
    }

    // ---- Writers ----

    /// Replaces all tables and all values in one transaction.
    pub fn set_content(&mut self, tables: Tables, values: Values) -> &mut Self {
        self.write(|w| {
            w.set_tables(tables);
            w.set_values(values);
        });
        self
    }

    /// Replaces all tables. Entries the schema rejects are skipped.
    pub fn set_tables(&mut self, tables: Tables) -> &mut Self {
        self.write(|w| w.set_tables(tables));
        self
    }

    /// Replaces one table.
    pub fn set_table(&mut self, table_id: &str, table: Table) -> &mut Self {
        self.write(|w| w.set_table(table_id, table));
        self
    }

    /// Replaces one row, filling in schema defaults.
    pub fn set_row(&mut self, table_id: &str, row_id: &str, row: Row) -> &mut Self {
        self.write(|w| w.set_row(table_id, row_id, row));
        self
    }

    /// Adds a row under a fresh numeric id and returns it, or `None` if the
    /// row was rejected.
    ///
    /// With `reuse_row_ids` the id of a previously deleted row may be handed
    /// out again; otherwise ids only ever grow.
    pub fn add_row(&mut self, table_id: &str, row: Row, reuse_row_ids: bool) -> Option<Id> {
        self.write(|w| w.add_row(table_id, row, reuse_row_ids)).flatten()
    }

    /// Merges cells into a row.
    pub fn set_partial_row(&mut self, table_id: &str, row_id: &str, row: Row) -> &mut Self {
        self.write(|w| w.set_partial_row(table_id, row_id, row));
        self
    }

    pub fn set_cell(&mut self, table_id: &str, row_id: &str, cell_id: &str, cell: impl Into<Value>) -> &mut Self {
        let cell = cell.into();
        self.write(|w| w.set_cell(table_id, row_id, cell_id, cell));
        self
    }

    /// Writes a cell computed from its current value (or its default when
    /// absent).
    pub fn set_cell_with(
        &mut self,
        table_id: &str,
        row_id: &str,
        cell_id: &str,
        map: impl FnOnce(Option<&Value>) -> Value,
    ) -> &mut Self {
        let cell = {
            let current = self
                .content
                .cell(table_id, row_id, cell_id)
                .or_else(|| self.schema.cell_default(table_id, cell_id));
            map(current)
        };
        self.set_cell(table_id, row_id, cell_id, cell)
    }

    /// Replaces all values, filling in schema defaults.
    pub fn set_values(&mut self, values: Values) -> &mut Self {
        self.write(|w| w.set_values(values));
        self
    }

    /// Merges values into the existing ones.
    pub fn set_partial_values(&mut self, values: Values) -> &mut Self {
        self.write(|w| w.set_partial_values(values));
        self
    }

    pub fn set_value(&mut self, value_id: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        self.write(|w| w.set_value(value_id, value));
        self
    }

    /// Writes a value computed from its current value (or its default when
    /// absent).
    pub fn set_value_with(&mut self, value_id: &str, map: impl FnOnce(Option<&Value>) -> Value) -> &mut Self {
        let value = {
            let current = self
                .content
                .value(value_id)
                .or_else(|| self.schema.value_default(value_id));
            map(current)
        };
        self.set_value(value_id, value)
    }

    // ---- Deleters ----

    pub fn del_tables(&mut self) -> &mut Self {
        self.write(|w| w.del_tables());
        self
    }

    pub fn del_table(&mut self, table_id: &str) -> &mut Self {
        self.write(|w| w.del_table(table_id));
        self
    }

    /// Deletes a row. The table goes with its last row.
    pub fn del_row(&mut self, table_id: &str, row_id: &str) -> &mut Self {
        self.write(|w| w.del_row(table_id, row_id));
        self
    }

    /// Deletes a cell. The row goes with its last cell.
    ///
    /// A cell with a schema default is reset to the default instead; with
    /// `force_del` the whole row is deleted.
    pub fn del_cell(&mut self, table_id: &str, row_id: &str, cell_id: &str, force_del: bool) -> &mut Self {
        self.write(|w| w.del_cell(table_id, row_id, cell_id, force_del));
        self
    }

    /// Deletes all values. Values with a schema default are reset to it.
    pub fn del_values(&mut self) -> &mut Self {
        self.write(|w| w.del_values());
        self
    }

    /// Deletes a value, or resets it to its schema default.
    pub fn del_value(&mut self, value_id: &str) -> &mut Self {
        self.write(|w| w.del_value(value_id));
        self
    }

    // ---- Schemas ----

    /// Returns the installed tables schema, empty in no-schema mode.
    pub fn get_tables_schema(&self) -> &TablesSchema {
        self.schema.tables_schema()
    }

    /// Returns the installed values schema, empty in no-schema mode.
    pub fn get_values_schema(&self) -> &ValuesSchema {
        self.schema.values_schema()
    }

    pub fn has_tables_schema(&self) -> bool {
        self.schema.has_tables_schema()
    }

    pub fn has_values_schema(&self) -> bool {
        self.schema.has_values_schema()
    }

    /// Installs a tables schema and applies it to the existing tables: cells
    /// it does not allow are dropped and defaults are filled in.
    ///
    /// An empty schema is ignored.
    pub fn set_tables_schema(&mut self, schema: TablesSchema) -> &mut Self {
        if self.is_dispatching() {
            log::warn!("ignoring tables schema change while listeners are dispatching");
            return self;
        }
        if self.schema.set_tables_schema(schema) {
            self.write(|w| w.revalidate_tables());
        }
        self
    }

    /// Installs a values schema and applies it to the existing values.
    ///
    /// An empty schema is ignored.
    pub fn set_values_schema(&mut self, schema: ValuesSchema) -> &mut Self {
        if self.is_dispatching() {
            log::warn!("ignoring values schema change while listeners are dispatching");
            return self;
        }
        if self.schema.set_values_schema(schema) {
            self.write(|w| w.revalidate_values());
        }
        self
    }

    /// Installs both schemas.
    pub fn set_schema(&mut self, tables_schema: TablesSchema, values_schema: ValuesSchema) -> &mut Self {
        self.set_tables_schema(tables_schema).set_values_schema(values_schema)
    }

    /// Reverts tables to no-schema mode. Content is left as it is.
    pub fn del_tables_schema(&mut self) -> &mut Self {
        self.schema.del_tables_schema();
        self
    }

    /// Reverts values to no-schema mode. Content is left as it is.
    pub fn del_values_schema(&mut self) -> &mut Self {
        self.schema.del_values_schema();
        self
    }

    pub fn del_schema(&mut self) -> &mut Self {
        self.del_tables_schema().del_values_schema()
    }
}
