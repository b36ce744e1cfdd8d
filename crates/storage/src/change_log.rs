//! Change log for tracking the net effect of a transaction.
//!
//! Every mutation applied while a transaction is open is recorded here. Id
//! additions and removals are counted as +1/-1 so that an id added and then
//! removed again within the same transaction cancels out. Cell and value
//! changes keep the value seen at transaction start as `old` and the latest
//! write as `new`.

use alloc::vec::Vec;
use indexmap::IndexMap;
use log::warn;
use serde_json::Value as JsonValue;
use tabula_core::{Id, IdMap, Value};

/// Net id additions (+1) and removals (-1) in one scope.
pub type IdChanges = IdMap<i32>;

/// Insertion-ordered map whose keys may be missing, used for invalid writes
/// that could not be attributed to a full path.
pub type OptIdMap<V> = IndexMap<Option<Id>, V, hashbrown::hash_map::DefaultHashBuilder>;

/// Old and new state of one cell or value. `None` means absent.
pub type ValuePair = (Option<Value>, Option<Value>);

/// Changed cells: table id to row id to cell id to pair.
pub type ChangedCells = IdMap<IdMap<IdMap<ValuePair>>>;

/// Rejected cell writes keyed by table, row and cell id.
pub type InvalidCells = OptIdMap<OptIdMap<OptIdMap<Vec<JsonValue>>>>;

/// Rejected value writes keyed by value id.
pub type InvalidValues = OptIdMap<Vec<JsonValue>>;

/// Changes to one row: cell id to new cell, `None` for deleted cells.
pub type RowChanges = IdMap<Option<Value>>;

/// Changes to one table: row id to row changes, `None` for deleted rows.
pub type TableChanges = IdMap<Option<RowChanges>>;

/// Net content changes of a transaction, with `None` marking deletion.
///
/// This is the form accepted by `set_transaction_changes` for replaying a diff.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactionChanges {
    /// Table id to table changes, `None` for deleted tables.
    pub tables: IdMap<Option<TableChanges>>,
    /// Value id to new value, `None` for deleted values.
    pub values: IdMap<Option<Value>>,
}

impl TransactionChanges {
    /// Returns true if no table or value changed.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.values.is_empty()
    }
}

/// Key order of each container as it stood before its first removal in a
/// transaction. Insertions only ever append, so these are enough to put
/// reinstated ids back where they were.
#[derive(Clone, Debug, Default)]
pub(crate) struct KeyOrders {
    pub(crate) tables: Option<Vec<Id>>,
    pub(crate) rows: IdMap<Vec<Id>>,
    pub(crate) cells: IdMap<IdMap<Vec<Id>>>,
    pub(crate) table_cell_ids: IdMap<Vec<Id>>,
    pub(crate) values: Option<Vec<Id>>,
}

/// Record of everything a transaction did.
#[derive(Clone, Debug, Default)]
pub struct ChangeLog {
    cells_touched: bool,
    values_touched: bool,
    changed_table_ids: IdChanges,
    changed_table_cell_ids: IdMap<IdChanges>,
    changed_row_ids: IdMap<IdChanges>,
    changed_cell_ids: IdMap<IdMap<IdChanges>>,
    changed_cells: ChangedCells,
    invalid_cells: InvalidCells,
    changed_value_ids: IdChanges,
    changed_values: IdMap<ValuePair>,
    invalid_values: InvalidValues,
    key_orders: KeyOrders,
}

impl ChangeLog {
    /// Creates an empty change log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a table id appearing (+1) or disappearing (-1).
    pub fn table_ids_changed(&mut self, table_id: &str, delta: i32) {
        ids_changed(&mut self.changed_table_ids, table_id, delta);
    }

    /// Records a cell id appearing in or disappearing from a table's union of
    /// cell ids.
    pub fn table_cell_ids_changed(&mut self, table_id: &str, cell_id: &str, delta: i32) {
        let changes = ensure(&mut self.changed_table_cell_ids, table_id);
        ids_changed(changes, cell_id, delta);
        if changes.is_empty() {
            self.changed_table_cell_ids.shift_remove(table_id);
        }
    }

    /// Records a row id appearing or disappearing.
    pub fn row_ids_changed(&mut self, table_id: &str, row_id: &str, delta: i32) {
        let changes = ensure(&mut self.changed_row_ids, table_id);
        ids_changed(changes, row_id, delta);
        if changes.is_empty() {
            self.changed_row_ids.shift_remove(table_id);
        }
    }

    /// Records a cell id appearing or disappearing in a row.
    pub fn cell_ids_changed(&mut self, table_id: &str, row_id: &str, cell_id: &str, delta: i32) {
        let rows = ensure(&mut self.changed_cell_ids, table_id);
        let changes = ensure(rows, row_id);
        ids_changed(changes, cell_id, delta);
        if changes.is_empty() {
            rows.shift_remove(row_id);
            if rows.is_empty() {
                self.changed_cell_ids.shift_remove(table_id);
            }
        }
    }

    /// Records a cell write. The first recorded `old` is kept.
    pub fn cell_changed(
        &mut self,
        table_id: &str,
        row_id: &str,
        cell_id: &str,
        old: Option<Value>,
        new: Option<Value>,
    ) {
        self.cells_touched = true;
        let cells = ensure(ensure(&mut self.changed_cells, table_id), row_id);
        match cells.get_mut(cell_id) {
            Some(pair) => pair.1 = new,
            None => {
                cells.insert(cell_id.into(), (old, new));
            }
        }
    }

    /// Records a rejected cell write.
    pub fn cell_invalid(
        &mut self,
        table_id: Option<&str>,
        row_id: Option<&str>,
        cell_id: Option<&str>,
        invalid: JsonValue,
    ) {
        warn!("invalid cell {:?}/{:?}/{:?}: {}", table_id, row_id, cell_id, invalid);
        self.cells_touched = true;
        self.invalid_cells
            .entry(table_id.map(Id::from))
            .or_default()
            .entry(row_id.map(Id::from))
            .or_default()
            .entry(cell_id.map(Id::from))
            .or_default()
            .push(invalid);
    }

    /// Records a value id appearing or disappearing.
    pub fn value_ids_changed(&mut self, value_id: &str, delta: i32) {
        ids_changed(&mut self.changed_value_ids, value_id, delta);
    }

    /// Records a value write. The first recorded `old` is kept.
    pub fn value_changed(&mut self, value_id: &str, old: Option<Value>, new: Option<Value>) {
        self.values_touched = true;
        match self.changed_values.get_mut(value_id) {
            Some(pair) => pair.1 = new,
            None => {
                self.changed_values.insert(value_id.into(), (old, new));
            }
        }
    }

    /// Records a rejected value write.
    pub fn value_invalid(&mut self, value_id: Option<&str>, invalid: JsonValue) {
        warn!("invalid value {:?}: {}", value_id, invalid);
        self.values_touched = true;
        self.invalid_values
            .entry(value_id.map(Id::from))
            .or_default()
            .push(invalid);
    }

    /// Returns true if any cell was written, deleted or rejected.
    #[inline]
    pub fn cells_touched(&self) -> bool {
        self.cells_touched
    }

    /// Returns true if any value was written, deleted or rejected.
    #[inline]
    pub fn values_touched(&self) -> bool {
        self.values_touched
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        !self.cells_touched && !self.values_touched
    }

    /// Net table id changes.
    pub fn changed_table_ids(&self) -> &IdChanges {
        &self.changed_table_ids
    }

    /// Net changes to each table's union of cell ids.
    pub fn changed_table_cell_ids(&self) -> &IdMap<IdChanges> {
        &self.changed_table_cell_ids
    }

    /// Net row id changes per table.
    pub fn changed_row_ids(&self) -> &IdMap<IdChanges> {
        &self.changed_row_ids
    }

    /// Net cell id changes per row.
    pub fn changed_cell_ids(&self) -> &IdMap<IdMap<IdChanges>> {
        &self.changed_cell_ids
    }

    /// Cell writes, including ones whose net effect is nil.
    pub fn changed_cells(&self) -> &ChangedCells {
        &self.changed_cells
    }

    /// Rejected cell writes.
    pub fn invalid_cells(&self) -> &InvalidCells {
        &self.invalid_cells
    }

    /// Net value id changes.
    pub fn changed_value_ids(&self) -> &IdChanges {
        &self.changed_value_ids
    }

    /// Value writes, including ones whose net effect is nil.
    pub fn changed_values(&self) -> &IdMap<ValuePair> {
        &self.changed_values
    }

    /// Rejected value writes.
    pub fn invalid_values(&self) -> &InvalidValues {
        &self.invalid_values
    }

    /// Returns the net change of a cell, or `None` if it ends where it began.
    pub fn cell_change(&self, table_id: &str, row_id: &str, cell_id: &str) -> Option<&ValuePair> {
        self.changed_cells
            .get(table_id)
            .and_then(|rows| rows.get(row_id))
            .and_then(|cells| cells.get(cell_id))
            .filter(|(old, new)| old != new)
    }

    /// Returns the net change of a value, or `None` if it ends where it began.
    pub fn value_change(&self, value_id: &str) -> Option<&ValuePair> {
        self.changed_values.get(value_id).filter(|(old, new)| old != new)
    }

    /// Returns true if the net content of the store changed.
    pub fn has_net_changes(&self) -> bool {
        let cells = self
            .changed_cells
            .values()
            .flat_map(|rows| rows.values())
            .flat_map(|cells| cells.values())
            .any(|(old, new)| old != new);
        cells || self.changed_values.values().any(|(old, new)| old != new)
    }

    /// Derives the net tables and values diff.
    pub fn transaction_changes(&self) -> TransactionChanges {
        let mut tables = IdMap::default();
        for (table_id, rows) in &self.changed_cells {
            if self.changed_table_ids.get(table_id) == Some(&-1) {
                tables.insert(table_id.clone(), None);
                continue;
            }
            let deleted_rows = self.changed_row_ids.get(table_id);
            let mut table = TableChanges::default();
            for (row_id, cells) in rows {
                if deleted_rows.and_then(|r| r.get(row_id)) == Some(&-1) {
                    table.insert(row_id.clone(), None);
                    continue;
                }
                let row: RowChanges = cells
                    .iter()
                    .filter(|(_, (old, new))| old != new)
                    .map(|(cell_id, (_, new))| (cell_id.clone(), new.clone()))
                    .collect();
                if !row.is_empty() {
                    table.insert(row_id.clone(), Some(row));
                }
            }
            if !table.is_empty() {
                tables.insert(table_id.clone(), Some(table));
            }
        }
        let values = self
            .changed_values
            .iter()
            .filter(|(_, (old, new))| old != new)
            .map(|(value_id, (_, new))| (value_id.clone(), new.clone()))
            .collect();
        TransactionChanges { tables, values }
    }

    /// Keeps the table id order, unless already kept.
    pub fn keep_table_order<'i>(&mut self, ids: impl IntoIterator<Item = &'i Id>) {
        if self.key_orders.tables.is_none() {
            self.key_orders.tables = Some(ids.into_iter().cloned().collect());
        }
    }

    /// Keeps a table's row id order, unless already kept.
    pub fn keep_row_order<'i>(&mut self, table_id: &str, ids: impl IntoIterator<Item = &'i Id>) {
        if !self.key_orders.rows.contains_key(table_id) {
            self.key_orders
                .rows
                .insert(table_id.into(), ids.into_iter().cloned().collect());
        }
    }

    /// Keeps a row's cell id order, unless already kept.
    pub fn keep_cell_order<'i>(&mut self, table_id: &str, row_id: &str, ids: impl IntoIterator<Item = &'i Id>) {
        let rows = ensure(&mut self.key_orders.cells, table_id);
        if !rows.contains_key(row_id) {
            rows.insert(row_id.into(), ids.into_iter().cloned().collect());
        }
    }

    /// Keeps the order of a table's union of cell ids, unless already kept.
    pub fn keep_table_cell_order<'i>(&mut self, table_id: &str, ids: impl IntoIterator<Item = &'i Id>) {
        if !self.key_orders.table_cell_ids.contains_key(table_id) {
            self.key_orders
                .table_cell_ids
                .insert(table_id.into(), ids.into_iter().cloned().collect());
        }
    }

    /// Keeps the value id order, unless already kept.
    pub fn keep_value_order<'i>(&mut self, ids: impl IntoIterator<Item = &'i Id>) {
        if self.key_orders.values.is_none() {
            self.key_orders.values = Some(ids.into_iter().cloned().collect());
        }
    }

    pub(crate) fn key_orders(&self) -> &KeyOrders {
        &self.key_orders
    }

    /// Clears the log for reuse.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn ensure<'a, V: Default>(map: &'a mut IdMap<V>, id: &str) -> &'a mut V {
    map.entry(id.into()).or_default()
}

fn ids_changed(changes: &mut IdChanges, id: &str, delta: i32) {
    let net = changes.get(id).copied().unwrap_or(0) + delta;
    if net == 0 {
        changes.shift_remove(id);
    } else {
        match changes.get_mut(id) {
            Some(existing) => *existing = net,
            None => {
                changes.insert(id.into(), net);
            }
        }
    }
}
