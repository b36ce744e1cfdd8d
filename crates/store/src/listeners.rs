//! Listener registration.
//!
//! Each `add_*_listener` method takes the ids the listener is scoped to,
//! where `None` matches any id, the callback, and whether the callback may
//! write to the store. Mutator listeners run before the others and their
//! writes join the transaction being finished; writes from other listeners
//! are ignored.

use crate::store::Store;
use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use serde_json::Value as JsonValue;
use tabula_core::{Id, Value};
use tabula_reactive::{
    Callback, GetCellChange, GetIdChanges, GetValueChange, IdsCallback, ListenerId, ListenerKind, ListenerStats,
};
use tabula_storage::{ChangeLog, SortedRowIdsQuery};

fn scope(ids: &[Option<&str>]) -> Vec<Option<Id>> {
    ids.iter().map(|id| id.map(Id::from)).collect()
}

impl Store {
    /// Listens to any cell change in any table.
    pub fn add_tables_listener(
        &mut self,
        listener: impl Fn(&mut Store, &GetCellChange<'_>) + 'static,
        mutator: bool,
    ) -> ListenerId {
        self.listeners
            .add(ListenerKind::Tables, Vec::new(), mutator, Callback::Tables(Rc::new(listener)))
    }

    /// Listens to tables being added or removed.
    pub fn add_table_ids_listener(
        &mut self,
        listener: impl Fn(&mut Store, &GetIdChanges<'_>) + 'static,
        mutator: bool,
    ) -> ListenerId {
        let callback: IdsCallback<Store> =
            Rc::new(move |store: &mut Store, _: &[Id], changes: &GetIdChanges<'_>| listener(store, changes));
        self.listeners
            .add(ListenerKind::TableIds, Vec::new(), mutator, Callback::Ids(callback))
    }

    /// Listens to any cell change in a table.
    pub fn add_table_listener(
        &mut self,
        table_id: Option<&str>,
        listener: impl Fn(&mut Store, &str, &GetCellChange<'_>) + 'static,
        mutator: bool,
    ) -> ListenerId {
        self.listeners.add(
            ListenerKind::Table,
            scope(&[table_id]),
            mutator,
            Callback::Table(Rc::new(listener)),
        )
    }

    /// Listens to cell ids appearing in or disappearing from a table's rows
    /// as a whole.
    pub fn add_table_cell_ids_listener(
        &mut self,
        table_id: Option<&str>,
        listener: impl Fn(&mut Store, &str, &GetIdChanges<'_>) + 'static,
        mutator: bool,
    ) -> ListenerId {
        let callback: IdsCallback<Store> = Rc::new(move |store: &mut Store, path: &[Id], changes: &GetIdChanges<'_>| {
            if let [table_id] = path {
                listener(store, table_id, changes);
            }
        });
        self.listeners
            .add(ListenerKind::TableCellIds, scope(&[table_id]), mutator, Callback::Ids(callback))
    }

    /// Listens to rows being added to or removed from a table.
    pub fn add_row_ids_listener(
        &mut self,
        table_id: Option<&str>,
        listener: impl Fn(&mut Store, &str, &GetIdChanges<'_>) + 'static,
        mutator: bool,
    ) -> ListenerId {
        let callback: IdsCallback<Store> = Rc::new(move |store: &mut Store, path: &[Id], changes: &GetIdChanges<'_>| {
            if let [table_id] = path {
                listener(store, table_id, changes);
            }
        });
        self.listeners
            .add(ListenerKind::RowIds, scope(&[table_id]), mutator, Callback::Ids(callback))
    }

    /// Listens to the sorted, windowed row ids of a table.
    ///
    /// The listener is called after a transaction touching the table only if
    /// the ids it would receive differ from the last ones.
    pub fn add_sorted_row_ids_listener(
        &mut self,
        query: SortedRowIdsQuery,
        listener: impl Fn(&mut Store, &SortedRowIdsQuery, &[Id]) + 'static,
        mutator: bool,
    ) -> ListenerId {
        let initial = self.get_sorted_row_ids(&query);
        self.listeners
            .add_sorted(query, initial, mutator, Callback::SortedRowIds(Rc::new(listener)))
    }

    /// Listens to any cell change in a row.
    pub fn add_row_listener(
        &mut self,
        table_id: Option<&str>,
        row_id: Option<&str>,
        listener: impl Fn(&mut Store, &str, &str, &GetCellChange<'_>) + 'static,
        mutator: bool,
    ) -> ListenerId {
        self.listeners.add(
            ListenerKind::Row,
            scope(&[table_id, row_id]),
            mutator,
            Callback::Row(Rc::new(listener)),
        )
    }

    /// Listens to cells being added to or removed from a row.
    pub fn add_cell_ids_listener(
        &mut self,
        table_id: Option<&str>,
        row_id: Option<&str>,
        listener: impl Fn(&mut Store, &str, &str, &GetIdChanges<'_>) + 'static,
        mutator: bool,
    ) -> ListenerId {
        let callback: IdsCallback<Store> = Rc::new(move |store: &mut Store, path: &[Id], changes: &GetIdChanges<'_>| {
            if let [table_id, row_id] = path {
                listener(store, table_id, row_id, changes);
            }
        });
        self.listeners
            .add(ListenerKind::CellIds, scope(&[table_id, row_id]), mutator, Callback::Ids(callback))
    }

    /// Listens to a cell's value changing. The callback receives the table,
    /// row and cell ids, then the new value and the old value.
    #[allow(clippy::type_complexity)]
    pub fn add_cell_listener(
        &mut self,
        table_id: Option<&str>,
        row_id: Option<&str>,
        cell_id: Option<&str>,
        listener: impl Fn(&mut Store, &str, &str, &str, Option<&Value>, Option<&Value>, &GetCellChange<'_>) + 'static,
        mutator: bool,
    ) -> ListenerId {
        self.listeners.add(
            ListenerKind::Cell,
            scope(&[table_id, row_id, cell_id]),
            mutator,
            Callback::Cell(Rc::new(listener)),
        )
    }

    /// Listens to cell writes rejected by the schema. Ids the write could
    /// not be attributed to arrive as `None`.
    pub fn add_invalid_cell_listener(
        &mut self,
        table_id: Option<&str>,
        row_id: Option<&str>,
        cell_id: Option<&str>,
        listener: impl Fn(&mut Store, Option<&str>, Option<&str>, Option<&str>, &[JsonValue]) + 'static,
        mutator: bool,
    ) -> ListenerId {
        self.listeners.add(
            ListenerKind::InvalidCell,
            scope(&[table_id, row_id, cell_id]),
            mutator,
            Callback::InvalidCell(Rc::new(listener)),
        )
    }

    /// Listens to any value change.
    pub fn add_values_listener(
        &mut self,
        listener: impl Fn(&mut Store, &GetValueChange<'_>) + 'static,
        mutator: bool,
    ) -> ListenerId {
        self.listeners
            .add(ListenerKind::Values, Vec::new(), mutator, Callback::Values(Rc::new(listener)))
    }

    /// Listens to values being added or removed.
    pub fn add_value_ids_listener(
        &mut self,
        listener: impl Fn(&mut Store, &GetIdChanges<'_>) + 'static,
        mutator: bool,
    ) -> ListenerId {
        let callback: IdsCallback<Store> =
            Rc::new(move |store: &mut Store, _: &[Id], changes: &GetIdChanges<'_>| listener(store, changes));
        self.listeners
            .add(ListenerKind::ValueIds, Vec::new(), mutator, Callback::Ids(callback))
    }

    /// Listens to a value changing. The callback receives the value id, then
    /// the new value and the old value.
    pub fn add_value_listener(
        &mut self,
        value_id: Option<&str>,
        listener: impl Fn(&mut Store, &str, Option<&Value>, Option<&Value>, &GetValueChange<'_>) + 'static,
        mutator: bool,
    ) -> ListenerId {
        self.listeners.add(
            ListenerKind::Value,
            scope(&[value_id]),
            mutator,
            Callback::Value(Rc::new(listener)),
        )
    }

    /// Listens to value writes rejected by the schema.
    pub fn add_invalid_value_listener(
        &mut self,
        value_id: Option<&str>,
        listener: impl Fn(&mut Store, Option<&str>, &[JsonValue]) + 'static,
        mutator: bool,
    ) -> ListenerId {
        self.listeners.add(
            ListenerKind::InvalidValue,
            scope(&[value_id]),
            mutator,
            Callback::InvalidValue(Rc::new(listener)),
        )
    }

    /// Listens to transactions starting.
    pub fn add_start_transaction_listener(&mut self, listener: impl Fn(&mut Store, &ChangeLog) + 'static) -> ListenerId {
        self.listeners.add(
            ListenerKind::StartTransaction,
            Vec::new(),
            false,
            Callback::Transaction(Rc::new(listener)),
        )
    }

    /// Listens to transactions about to finish. The callback may still write
    /// to the store.
    pub fn add_will_finish_transaction_listener(
        &mut self,
        listener: impl Fn(&mut Store, &ChangeLog) + 'static,
    ) -> ListenerId {
        self.listeners.add(
            ListenerKind::WillFinishTransaction,
            Vec::new(),
            false,
            Callback::Transaction(Rc::new(listener)),
        )
    }

    /// Listens to transactions having finished, after every data listener.
    pub fn add_did_finish_transaction_listener(
        &mut self,
        listener: impl Fn(&mut Store, &ChangeLog) + 'static,
    ) -> ListenerId {
        self.listeners.add(
            ListenerKind::DidFinishTransaction,
            Vec::new(),
            false,
            Callback::Transaction(Rc::new(listener)),
        )
    }

    /// Removes a listener. Safe to call from within any listener, including
    /// the one being removed; it will not be called again.
    pub fn del_listener(&mut self, listener_id: ListenerId) -> &mut Self {
        self.listeners.remove(listener_id);
        self
    }

    /// Returns the number of listeners per kind.
    pub fn get_listener_stats(&self) -> ListenerStats {
        self.listeners.stats()
    }

    /// Calls a listener outside of any transaction, with nothing changed.
    ///
    /// Wildcard ids are expanded over the ids currently in the store. Cell and
    /// value listeners receive the current value as both new and old.
    ///
    /// A non-mutator listener runs with the store read-only, as it would
    /// during dispatch.
    pub fn call_listener(&mut self, listener_id: ListenerId) -> &mut Self {
        let Some(mutator) = self.listeners.get(listener_id).map(|l| l.is_mutator()) else {
            return self;
        };
        if mutator {
            self.invoke_listener(listener_id);
        } else {
            let previous = self.transaction.state();
            self.transaction.dispatching();
            self.invoke_listener(listener_id);
            self.transaction.restore(previous);
        }
        self
    }

    fn invoke_listener(&mut self, listener_id: ListenerId) {
        let Some(listener) = self.listeners.get(listener_id) else {
            return;
        };
        let kind = listener.kind();
        let path = listener.path().to_vec();
        let callback = listener.callback().clone();
        let log = ChangeLog::new();
        let no_ids = GetIdChanges::default();

        match callback {
            Callback::Tables(f) => f(self, &GetCellChange::new(&log)),
            Callback::Values(f) => f(self, &GetValueChange::new(&log)),
            Callback::Transaction(f) => f(self, &log),
            Callback::Ids(f) => {
                let paths = match kind {
                    ListenerKind::TableIds | ListenerKind::ValueIds => vec![Vec::new()],
                    _ => self.expand_table_path(&path),
                };
                for concrete in paths {
                    f(self, &concrete, &no_ids);
                }
            }
            Callback::Table(f) => {
                for concrete in self.expand_table_path(&path) {
                    if let [table_id] = concrete.as_slice() {
                        f(self, table_id, &GetCellChange::new(&log));
                    }
                }
            }
            Callback::SortedRowIds(f) => {
                let Some(query) = self.listeners.get(listener_id).and_then(|l| l.sorted()).map(|s| s.query.clone())
                else {
                    return;
                };
                let ids = self.get_sorted_row_ids(&query);
                if let Some(state) = self.listeners.sorted_mut(listener_id) {
                    state.last = ids.clone();
                }
                f(self, &query, &ids);
            }
            Callback::Row(f) => {
                for concrete in self.expand_table_path(&path) {
                    if let [table_id, row_id] = concrete.as_slice() {
                        f(self, table_id, row_id, &GetCellChange::new(&log));
                    }
                }
            }
            Callback::Cell(f) => {
                for concrete in self.expand_table_path(&path) {
                    if let [table_id, row_id, cell_id] = concrete.as_slice() {
                        let cell = self.get_cell(table_id, row_id, cell_id);
                        f(self, table_id, row_id, cell_id, cell.as_ref(), cell.as_ref(), &GetCellChange::new(&log));
                    }
                }
            }
            Callback::Value(f) => {
                let value_ids = match path.first() {
                    Some(Some(value_id)) => vec![value_id.clone()],
                    _ => self.get_value_ids(),
                };
                for value_id in value_ids {
                    let value = self.get_value(&value_id);
                    f(self, &value_id, value.as_ref(), value.as_ref(), &GetValueChange::new(&log));
                }
            }
            Callback::InvalidCell(f) => {
                let id = |i: usize| path.get(i).and_then(|id| id.as_deref());
                f(self, id(0), id(1), id(2), &[]);
            }
            Callback::InvalidValue(f) => {
                f(self, path.first().and_then(|id| id.as_deref()), &[]);
            }
        }
    }

    /// Expands a table, row and cell id scope into the concrete paths that
    /// exist in the store. Pinned ids are kept whether they exist or not.
    fn expand_table_path(&self, path: &[Option<Id>]) -> Vec<Vec<Id>> {
        let mut paths: Vec<Vec<Id>> = vec![Vec::new()];
        for component in path {
            paths = paths
                .into_iter()
                .flat_map(|prefix| {
                    let ids = match component {
                        Some(id) => vec![id.clone()],
                        None => self.child_ids(&prefix),
                    };
                    ids.into_iter().map(move |id| {
                        let mut concrete = prefix.clone();
                        concrete.push(id);
                        concrete
                    })
                })
                .collect();
        }
        paths
    }

    fn child_ids(&self, prefix: &[Id]) -> Vec<Id> {
        match prefix {
            [] => self.get_table_ids(),
            [table_id] => self.get_row_ids(table_id),
            [table_id, row_id] => self.get_cell_ids(table_id, row_id),
            _ => Vec::new(),
        }
    }

    /// Calls every transaction listener of `kind`, in registration order.
    pub(crate) fn call_transaction_listeners(&mut self, kind: ListenerKind, log: &ChangeLog) {
        for id in self.listeners.all(kind, false) {
            if let Some(Callback::Transaction(f)) = self.listeners.callback(id) {
                f(self, log);
            }
        }
    }
}
