//! Listener dispatch.
//!
//! After a transaction the store walks its change log once per listener
//! kind, in three phases: ids, then single cells and values, then the
//! aggregates they belong to.
//!
//! ```text
//! invalid cell, invalid value,
//! table ids, row ids, sorted row ids, table cell ids, cell ids, value ids,
//! cell, value,
//! row, table, tables, values
//! ```
//!
//! Each listener matching a changed path is called once for that path, in
//! registration order. Callbacks are cloned out of the registry before they
//! are called, so listeners may add or remove listeners while dispatching.

use crate::store::Store;
use alloc::vec::Vec;
use log::trace;
use tabula_core::{Id, IdMap};
use tabula_reactive::{Callback, GetCellChange, GetIdChanges, GetValueChange, ListenerId, ListenerKind};
use tabula_storage::{ChangeLog, IdChanges, ValuePair};

impl Store {
    /// Calls the listeners with the given mutator flag for every change in
    /// `log`.
    pub(crate) fn dispatch(&mut self, log: &ChangeLog, mutator: bool) {
        trace!("dispatching to {} listeners", if mutator { "mutator" } else { "non-mutator" });
        let get_cell = GetCellChange::new(log);
        let get_value = GetValueChange::new(log);

        let cells_touched = log.cells_touched();
        let values_touched = log.values_touched();

        for (table_id, rows) in log.invalid_cells() {
            for (row_id, cells) in rows {
                for (cell_id, invalid) in cells {
                    let path = [table_id.as_deref(), row_id.as_deref(), cell_id.as_deref()];
                    self.each(ListenerKind::InvalidCell, mutator, &path, |store, callback| {
                        if let Callback::InvalidCell(f) = callback {
                            f(store, path[0], path[1], path[2], invalid);
                        }
                    });
                }
            }
        }
        for (value_id, invalid) in log.invalid_values() {
            let path = [value_id.as_deref()];
            self.each(ListenerKind::InvalidValue, mutator, &path, |store, callback| {
                if let Callback::InvalidValue(f) = callback {
                    f(store, path[0], invalid);
                }
            });
        }

        // Ids
        if cells_touched {
            self.dispatch_ids(ListenerKind::TableIds, mutator, &[], Some(log.changed_table_ids()));
            for (table_id, changes) in log.changed_row_ids() {
                self.dispatch_ids(ListenerKind::RowIds, mutator, &[table_id], Some(changes));
            }
            self.dispatch_sorted(log, mutator);
            for (table_id, changes) in log.changed_table_cell_ids() {
                self.dispatch_ids(ListenerKind::TableCellIds, mutator, &[table_id], Some(changes));
            }
            for (table_id, rows) in log.changed_cell_ids() {
                for (row_id, changes) in rows {
                    self.dispatch_ids(ListenerKind::CellIds, mutator, &[table_id, row_id], Some(changes));
                }
            }
        }
        if values_touched {
            self.dispatch_ids(ListenerKind::ValueIds, mutator, &[], Some(log.changed_value_ids()));
        }

        // Cells and values
        if cells_touched {
            for (table_id, rows) in log.changed_cells() {
                for (row_id, cells) in rows {
                    for (cell_id, (old, new)) in cells {
                        if old == new {
                            continue;
                        }
                        let path = [Some(table_id.as_str()), Some(row_id.as_str()), Some(cell_id.as_str())];
                        self.each(ListenerKind::Cell, mutator, &path, |store, callback| {
                            if let Callback::Cell(f) = callback {
                                f(store, table_id, row_id, cell_id, new.as_ref(), old.as_ref(), &get_cell);
                            }
                        });
                    }
                }
            }
        }
        let mut values_changed = false;
        if values_touched {
            for (value_id, (old, new)) in log.changed_values() {
                if old == new {
                    continue;
                }
                values_changed = true;
                self.each(ListenerKind::Value, mutator, &[Some(value_id.as_str())], |store, callback| {
                    if let Callback::Value(f) = callback {
                        f(store, value_id, new.as_ref(), old.as_ref(), &get_value);
                    }
                });
            }
        }

        // Aggregates
        if cells_touched {
            for (table_id, rows) in log.changed_cells() {
                for (row_id, cells) in rows {
                    if !any_changed(cells) {
                        continue;
                    }
                    let path = [Some(table_id.as_str()), Some(row_id.as_str())];
                    self.each(ListenerKind::Row, mutator, &path, |store, callback| {
                        if let Callback::Row(f) = callback {
                            f(store, table_id, row_id, &get_cell);
                        }
                    });
                }
            }

            let mut tables_changed = false;
            for (table_id, rows) in log.changed_cells() {
                if !rows.values().any(any_changed) {
                    continue;
                }
                tables_changed = true;
                self.each(ListenerKind::Table, mutator, &[Some(table_id.as_str())], |store, callback| {
                    if let Callback::Table(f) = callback {
                        f(store, table_id, &get_cell);
                    }
                });
            }
            if tables_changed {
                self.each(ListenerKind::Tables, mutator, &[], |store, callback| {
                    if let Callback::Tables(f) = callback {
                        f(store, &get_cell);
                    }
                });
            }
        }
        if values_changed {
            self.each(ListenerKind::Values, mutator, &[], |store, callback| {
                if let Callback::Values(f) = callback {
                    f(store, &get_value);
                }
            });
        }
    }

    /// Calls id listeners for one scope if any id in it was added or removed.
    fn dispatch_ids(&mut self, kind: ListenerKind, mutator: bool, scope: &[&Id], changes: Option<&IdChanges>) {
        let Some(changes) = changes.filter(|c| !c.is_empty()) else {
            return;
        };
        let path: Vec<Option<&str>> = scope.iter().map(|id| Some(id.as_str())).collect();
        let concrete: Vec<Id> = scope.iter().map(|id| (*id).clone()).collect();
        let get_ids = GetIdChanges::new(Some(changes));
        self.each(kind, mutator, &path, |store, callback| {
            if let Callback::Ids(f) = callback {
                f(store, &concrete, &get_ids);
            }
        });
    }

    /// Recomputes sorted row id listeners on touched tables and calls those
    /// whose ids changed.
    fn dispatch_sorted(&mut self, log: &ChangeLog, mutator: bool) {
        if !self.listeners.has(ListenerKind::SortedRowIds, mutator) {
            return;
        }
        let mut touched: Vec<&Id> = Vec::new();
        for table_id in log.changed_cells().keys().chain(log.changed_row_ids().keys()) {
            if !touched.contains(&table_id) {
                touched.push(table_id);
            }
        }
        for table_id in touched {
            let ids = self
                .listeners
                .matching(ListenerKind::SortedRowIds, mutator, &[Some(table_id.as_str())]);
            for id in ids {
                let Some(state) = self.listeners.get(id).and_then(|l| l.sorted()) else {
                    continue;
                };
                let query = state.query.clone();
                let sorted = self.get_sorted_row_ids(&query);
                if sorted == state.last {
                    continue;
                }
                if let Some(state) = self.listeners.sorted_mut(id) {
                    state.last = sorted.clone();
                }
                if let Some(Callback::SortedRowIds(f)) = self.listeners.callback(id) {
                    trace!("calling sorted row ids listener {}", id);
                    f(self, &query, &sorted);
                }
            }
        }
    }

    /// Calls `call` with each listener of `kind` matching `path`.
    fn each(
        &mut self,
        kind: ListenerKind,
        mutator: bool,
        path: &[Option<&str>],
        mut call: impl FnMut(&mut Store, Callback<Store>),
    ) {
        let ids: Vec<ListenerId> = self.listeners.matching(kind, mutator, path);
        for id in ids {
            // Removed by an earlier listener.
            let Some(callback) = self.listeners.callback(id) else {
                continue;
            };
            trace!("calling {:?} listener {}", kind, id);
            call(self, callback);
        }
    }
}

fn any_changed(cells: &IdMap<ValuePair>) -> bool {
    cells.values().any(|(old, new)| old != new)
}
