//! Content storage for the tabula store.
//!
//! This module provides the `Content` struct which owns every table, row,
//! cell and value. Its writers apply already-validated data and record each
//! change into a `ChangeLog`, keeping these invariants:
//!
//! - a row exists only while it has at least one cell
//! - a table exists only while it has at least one row
//! - each table's union of cell ids is counted across its rows

use crate::change_log::ChangeLog;
use alloc::vec::Vec;
use hashbrown::HashMap;
use tabula_core::{Id, IdMap, Row, RowIdPool, Table, Tables, Value, Values};

/// Tables and values held by a store.
#[derive(Clone, Debug, Default)]
pub struct Content {
    /// Table id → rows.
    tables: Tables,
    /// Table id → cell id → number of rows holding that cell.
    table_cell_ids: IdMap<IdMap<usize>>,
    /// Value id → value.
    values: Values,
    /// Table id → row id pool. Kept when a table is deleted so that fresh
    /// ids keep increasing.
    row_id_pools: IdMap<RowIdPool>,
}

impl Content {
    /// Creates empty content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all tables.
    #[inline]
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Gets a table.
    pub fn table(&self, table_id: &str) -> Option<&Table> {
        self.tables.get(table_id)
    }

    /// Gets a row.
    pub fn row(&self, table_id: &str, row_id: &str) -> Option<&Row> {
        self.tables.get(table_id).and_then(|t| t.get(row_id))
    }

    /// Gets a cell.
    pub fn cell(&self, table_id: &str, row_id: &str, cell_id: &str) -> Option<&Value> {
        self.row(table_id, row_id).and_then(|r| r.get(cell_id))
    }

    /// Returns all values.
    #[inline]
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Gets a value.
    pub fn value(&self, value_id: &str) -> Option<&Value> {
        self.values.get(value_id)
    }

    /// Returns the cell ids used by any row of a table, in first-use order.
    pub fn table_cell_ids(&self, table_id: &str) -> Vec<Id> {
        self.table_cell_ids
            .get(table_id)
            .map(|ids| ids.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns true if any row of the table holds the cell.
    pub fn has_table_cell(&self, table_id: &str, cell_id: &str) -> bool {
        self.table_cell_ids
            .get(table_id)
            .is_some_and(|ids| ids.contains_key(cell_id))
    }

    /// Returns the total row count across all tables.
    pub fn total_row_count(&self) -> usize {
        self.tables.values().map(|t| t.len()).sum()
    }

    /// Returns a fresh row id for a table, one not currently in use.
    pub fn next_row_id(&mut self, table_id: &str, reuse: bool) -> Id {
        let pool = self.row_id_pools.entry(table_id.into()).or_default();
        let table = self.tables.get(table_id);
        loop {
            let row_id = pool.next_id(reuse);
            if !table.is_some_and(|t| t.contains_key(&row_id)) {
                return row_id;
            }
        }
    }

    /// Writes a cell, creating its table and row when needed.
    pub fn set_cell(&mut self, log: &mut ChangeLog, table_id: &str, row_id: &str, cell_id: &str, cell: Value) {
        let Content {
            tables,
            table_cell_ids,
            ..
        } = self;

        if !tables.contains_key(table_id) {
            log.table_ids_changed(table_id, 1);
        }
        let table = tables.entry(table_id.into()).or_default();
        if !table.contains_key(row_id) {
            log.row_ids_changed(table_id, row_id, 1);
        }
        let row = table.entry(row_id.into()).or_default();
        let old = row.insert(cell_id.into(), cell.clone());
        if old.is_none() {
            log.cell_ids_changed(table_id, row_id, cell_id, 1);
            let count = table_cell_ids
                .entry(table_id.into())
                .or_default()
                .entry(cell_id.into())
                .or_insert(0);
            *count += 1;
            if *count == 1 {
                log.table_cell_ids_changed(table_id, cell_id, 1);
            }
        }
        log.cell_changed(table_id, row_id, cell_id, old, Some(cell));
    }

    /// Deletes a cell, then its row and table if they became empty.
    ///
    /// Returns false if the cell did not exist.
    pub fn del_cell(&mut self, log: &mut ChangeLog, table_id: &str, row_id: &str, cell_id: &str) -> bool {
        let Some(table) = self.tables.get_mut(table_id) else {
            return false;
        };
        let Some(row) = table.get_mut(row_id) else {
            return false;
        };
        if !row.contains_key(cell_id) {
            return false;
        }
        log.keep_cell_order(table_id, row_id, row.keys());
        let Some(old) = row.shift_remove(cell_id) else {
            return false;
        };
        let row_empty = row.is_empty();

        log.cell_changed(table_id, row_id, cell_id, Some(old), None);
        log.cell_ids_changed(table_id, row_id, cell_id, -1);
        if let Some(counts) = self.table_cell_ids.get_mut(table_id) {
            let remaining = counts.get(cell_id).map_or(0, |c| c.saturating_sub(1));
            if remaining == 0 {
                log.keep_table_cell_order(table_id, counts.keys());
                counts.shift_remove(cell_id);
                log.table_cell_ids_changed(table_id, cell_id, -1);
            } else {
                counts.insert(cell_id.into(), remaining);
            }
        }

        if row_empty {
            log.keep_row_order(table_id, table.keys());
            table.shift_remove(row_id);
            log.row_ids_changed(table_id, row_id, -1);
            self.row_id_pools
                .entry(table_id.into())
                .or_default()
                .release(row_id);
            if table.is_empty() {
                log.keep_table_order(self.tables.keys());
                self.tables.shift_remove(table_id);
                self.table_cell_ids.shift_remove(table_id);
                log.table_ids_changed(table_id, -1);
            }
        }
        true
    }

    /// Deletes every cell of a row, and so the row itself.
    pub fn del_row(&mut self, log: &mut ChangeLog, table_id: &str, row_id: &str) {
        let cell_ids: Vec<Id> = self
            .row(table_id, row_id)
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        for cell_id in &cell_ids {
            self.del_cell(log, table_id, row_id, cell_id);
        }
    }

    /// Deletes every row of a table, and so the table itself.
    pub fn del_table(&mut self, log: &mut ChangeLog, table_id: &str) {
        let row_ids: Vec<Id> = self
            .table(table_id)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();
        for row_id in &row_ids {
            self.del_row(log, table_id, row_id);
        }
    }

    /// Writes a value.
    pub fn set_value(&mut self, log: &mut ChangeLog, value_id: &str, value: Value) {
        let old = self.values.insert(value_id.into(), value.clone());
        if old.is_none() {
            log.value_ids_changed(value_id, 1);
        }
        log.value_changed(value_id, old, Some(value));
    }

    /// Deletes a value. Returns false if it did not exist.
    pub fn del_value(&mut self, log: &mut ChangeLog, value_id: &str) -> bool {
        if self.values.contains_key(value_id) {
            log.keep_value_order(self.values.keys());
        }
        match self.values.shift_remove(value_id) {
            Some(old) => {
                log.value_ids_changed(value_id, -1);
                log.value_changed(value_id, Some(old), None);
                true
            }
            None => false,
        }
    }

    /// Puts every cell and value named in `log` back to its recorded `old`
    /// state, in its original position.
    pub fn revert(&mut self, log: &ChangeLog) {
        let mut scratch = ChangeLog::new();
        for (table_id, rows) in log.changed_cells() {
            for (row_id, cells) in rows {
                for (cell_id, (old, _)) in cells {
                    match old {
                        Some(old) => self.set_cell(&mut scratch, table_id, row_id, cell_id, old.clone()),
                        None => {
                            self.del_cell(&mut scratch, table_id, row_id, cell_id);
                        }
                    }
                }
            }
        }
        for (value_id, (old, _)) in log.changed_values() {
            match old {
                Some(old) => self.set_value(&mut scratch, value_id, old.clone()),
                None => {
                    self.del_value(&mut scratch, value_id);
                }
            }
        }

        let orders = log.key_orders();
        if let Some(order) = &orders.tables {
            reorder(&mut self.tables, order);
        }
        for (table_id, order) in &orders.rows {
            if let Some(table) = self.tables.get_mut(table_id) {
                reorder(table, order);
            }
        }
        for (table_id, rows) in &orders.cells {
            for (row_id, order) in rows {
                if let Some(row) = self.tables.get_mut(table_id).and_then(|t| t.get_mut(row_id)) {
                    reorder(row, order);
                }
            }
        }
        for (table_id, order) in &orders.table_cell_ids {
            if let Some(counts) = self.table_cell_ids.get_mut(table_id) {
                reorder(counts, order);
            }
        }
        if let Some(order) = &orders.values {
            reorder(&mut self.values, order);
        }
    }
}

/// Sorts `map` so that ids named in `order` come first, in that order.
fn reorder<V>(map: &mut IdMap<V>, order: &[Id]) {
    let position: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let rank = |id: &Id| position.get(id.as_str()).copied().unwrap_or(usize::MAX);
    map.sort_by(|a, _, b, _| rank(a).cmp(&rank(b)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::row;

    fn fido(content: &mut Content, log: &mut ChangeLog) {
        content.set_cell(log, "pets", "fido", "species", Value::from("dog"));
        content.set_cell(log, "pets", "fido", "age", Value::from(3));
    }

    #[test]
    fn test_set_cell_creates_table_and_row() {
        let mut content = Content::new();
        let mut log = ChangeLog::new();
        fido(&mut content, &mut log);

        assert_eq!(content.row("pets", "fido"), Some(&row! { "species" => "dog", "age" => 3 }));
        assert_eq!(log.changed_table_ids()["pets"], 1);
        assert_eq!(log.changed_row_ids()["pets"]["fido"], 1);
        assert_eq!(log.changed_cell_ids()["pets"]["fido"].len(), 2);
        assert_eq!(log.changed_table_cell_ids()["pets"].len(), 2);
    }

    #[test]
    fn test_del_last_cell_cascades() {
        let mut content = Content::new();
        let mut log = ChangeLog::new();
        fido(&mut content, &mut log);

        let mut log = ChangeLog::new();
        assert!(content.del_cell(&mut log, "pets", "fido", "species"));
        assert!(content.row("pets", "fido").is_some());
        assert!(content.del_cell(&mut log, "pets", "fido", "age"));
        assert!(content.row("pets", "fido").is_none());
        assert!(content.table("pets").is_none());
        assert!(content.table_cell_ids("pets").is_empty());
        assert_eq!(log.changed_table_ids()["pets"], -1);
        assert!(!content.del_cell(&mut log, "pets", "fido", "age"));
    }

    #[test]
    fn test_table_cell_ids_are_counted() {
        let mut content = Content::new();
        let mut log = ChangeLog::new();
        fido(&mut content, &mut log);
        content.set_cell(&mut log, "pets", "felix", "species", Value::from("cat"));

        content.del_row(&mut log, "pets", "felix");
        assert!(content.has_table_cell("pets", "species"));
        content.del_cell(&mut log, "pets", "fido", "species");
        assert!(!content.has_table_cell("pets", "species"));
        assert_eq!(content.table_cell_ids("pets"), ["age"]);
    }

    #[test]
    fn test_next_row_id_survives_table_deletion() {
        let mut content = Content::new();
        let mut log = ChangeLog::new();
        let first = content.next_row_id("pets", false);
        content.set_cell(&mut log, "pets", &first, "species", Value::from("dog"));
        content.del_table(&mut log, "pets");

        assert_eq!(content.next_row_id("pets", false), "1");
        assert_eq!(content.next_row_id("pets", true), "0");
    }

    #[test]
    fn test_next_row_id_skips_used_ids() {
        let mut content = Content::new();
        let mut log = ChangeLog::new();
        content.set_cell(&mut log, "pets", "0", "species", Value::from("dog"));
        assert_eq!(content.next_row_id("pets", false), "1");
    }

    #[test]
    fn test_values() {
        let mut content = Content::new();
        let mut log = ChangeLog::new();
        content.set_value(&mut log, "open", Value::from(true));
        content.set_value(&mut log, "open", Value::from(false));
        assert_eq!(log.changed_value_ids()["open"], 1);
        assert_eq!(log.value_change("open"), Some(&(None, Some(Value::from(false)))));

        assert!(content.del_value(&mut log, "open"));
        assert!(log.changed_value_ids().is_empty());
        assert!(content.value("open").is_none());
        assert!(!content.del_value(&mut log, "open"));
    }

    #[test]
    fn test_revert() {
        let mut content = Content::new();
        let mut log = ChangeLog::new();
        fido(&mut content, &mut log);
        content.set_value(&mut log, "open", Value::from(true));
        let before = content.clone();

        let mut log = ChangeLog::new();
        content.set_cell(&mut log, "pets", "fido", "age", Value::from(4));
        content.set_cell(&mut log, "pets", "felix", "species", Value::from("cat"));
        content.del_value(&mut log, "open");
        content.set_value(&mut log, "employees", Value::from(3));
        content.revert(&log);

        assert_eq!(content.tables(), before.tables());
        assert_eq!(content.values(), before.values());
        assert!(content.table_cell_ids("pets").len() == 2);
    }

    #[test]
    fn test_revert_restores_order() {
        let mut content = Content::new();
        let mut log = ChangeLog::new();
        content.set_cell(&mut log, "pets", "fido", "species", Value::from("dog"));
        content.set_cell(&mut log, "pets", "fido", "age", Value::from(3));
        content.set_cell(&mut log, "pets", "felix", "species", Value::from("cat"));
        content.set_cell(&mut log, "stores", "downtown", "open", Value::from(true));
        content.set_value(&mut log, "open", Value::from(true));
        content.set_value(&mut log, "employees", Value::from(3));
        let before = content.clone();

        let mut log = ChangeLog::new();
        content.del_cell(&mut log, "pets", "fido", "species");
        content.del_row(&mut log, "pets", "fido");
        content.set_cell(&mut log, "pets", "fido", "species", Value::from("wolf"));
        content.del_table(&mut log, "pets");
        content.del_value(&mut log, "open");
        content.set_value(&mut log, "open", Value::from(false));
        content.revert(&log);

        let ids = |map: &Tables| map.keys().cloned().collect::<Vec<_>>();
        assert_eq!(ids(content.tables()), ids(before.tables()));
        assert_eq!(
            content.table("pets").map(|t| t.keys().cloned().collect::<Vec<_>>()),
            Some(alloc::vec!["fido".into(), "felix".into()])
        );
        assert_eq!(
            content.row("pets", "fido").map(|r| r.keys().cloned().collect::<Vec<_>>()),
            Some(alloc::vec!["species".into(), "age".into()])
        );
        assert_eq!(content.table_cell_ids("pets"), before.table_cell_ids("pets"));
        assert_eq!(
            content.values().keys().collect::<Vec<_>>(),
            before.values().keys().collect::<Vec<_>>()
        );
        assert_eq!(content.row("pets", "fido"), before.row("pets", "fido"));
    }
}
