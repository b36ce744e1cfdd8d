//! Listener registry.
//!
//! This module provides `ListenerRegistry`, which owns every listener of a
//! store and finds the ones matching a concrete change path. Listeners are
//! indexed separately per kind and per mutator flag, since the two groups
//! are dispatched in different phases of a transaction.

use crate::listener::{Callback, Listener, ListenerId, ListenerKind, SortedState};
use crate::path_index::PathIndex;
use alloc::vec::Vec;
use hashbrown::HashMap;
use tabula_core::Id;
use tabula_storage::SortedRowIdsQuery;

/// Number of listeners registered per kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub tables: usize,
    pub table_ids: usize,
    pub table: usize,
    pub table_cell_ids: usize,
    pub row_ids: usize,
    pub sorted_row_ids: usize,
    pub row: usize,
    pub cell_ids: usize,
    pub cell: usize,
    pub invalid_cell: usize,
    pub values: usize,
    pub value_ids: usize,
    pub value: usize,
    pub invalid_value: usize,
    /// Start, will-finish and did-finish transaction listeners together.
    pub transaction: usize,
}

impl ListenerStats {
    /// Returns the total number of listeners.
    pub fn total(&self) -> usize {
        self.tables
            + self.table_ids
            + self.table
            + self.table_cell_ids
            + self.row_ids
            + self.sorted_row_ids
            + self.row
            + self.cell_ids
            + self.cell
            + self.invalid_cell
            + self.values
            + self.value_ids
            + self.value
            + self.invalid_value
            + self.transaction
    }
}

/// Owns the listeners of a store.
pub struct ListenerRegistry<S> {
    /// Listener ID -> listener
    listeners: HashMap<ListenerId, Listener<S>>,
    /// (kind, mutator) -> path index
    indexes: HashMap<(ListenerKind, bool), PathIndex>,
    /// Next listener ID to assign
    next_id: ListenerId,
}

impl<S> Default for ListenerRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ListenerRegistry<S> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            indexes: HashMap::new(),
            next_id: 1,
        }
    }

    /// Registers a listener and returns its ID.
    ///
    /// `path` must have `kind.path_len()` components; missing trailing
    /// components are treated as wildcards.
    pub fn add(&mut self, kind: ListenerKind, path: Vec<Option<Id>>, mutator: bool, callback: Callback<S>) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        let listener = Listener::new(id, kind, normalize(kind, path), mutator, callback);
        self.insert(listener);
        id
    }

    /// Registers a sorted row id listener with the ids it starts from.
    pub fn add_sorted(
        &mut self,
        query: SortedRowIdsQuery,
        initial: Vec<Id>,
        mutator: bool,
        callback: Callback<S>,
    ) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        let path = alloc::vec![Some(query.table_id.clone())];
        let listener =
            Listener::new(id, ListenerKind::SortedRowIds, path, mutator, callback).with_sorted(query, initial);
        self.insert(listener);
        id
    }

    fn insert(&mut self, listener: Listener<S>) {
        self.indexes
            .entry((listener.kind(), listener.is_mutator()))
            .or_default()
            .insert(listener.path(), listener.id());
        self.listeners.insert(listener.id(), listener);
    }

    /// Removes a listener.
    ///
    /// Returns true if the listener was found and removed.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let Some(listener) = self.listeners.remove(&id) else {
            return false;
        };
        let key = (listener.kind(), listener.is_mutator());
        if let Some(index) = self.indexes.get_mut(&key) {
            index.remove(listener.path(), id);
            if index.is_empty() {
                self.indexes.remove(&key);
            }
        }
        true
    }

    /// Gets a listener.
    pub fn get(&self, id: ListenerId) -> Option<&Listener<S>> {
        self.listeners.get(&id)
    }

    /// Returns a listener's callback, cloned so that it can be called while
    /// the registry changes.
    pub fn callback(&self, id: ListenerId) -> Option<Callback<S>> {
        self.listeners.get(&id).map(|l| l.callback().clone())
    }

    /// Returns the sorted row id state of a listener.
    pub fn sorted_mut(&mut self, id: ListenerId) -> Option<&mut SortedState> {
        self.listeners.get_mut(&id).and_then(|l| l.sorted_mut())
    }

    /// Returns true if any listener of `kind` with this mutator flag exists.
    pub fn has(&self, kind: ListenerKind, mutator: bool) -> bool {
        self.indexes.contains_key(&(kind, mutator))
    }

    /// Returns the listeners of `kind` matching a concrete path, in
    /// registration order.
    pub fn matching(&self, kind: ListenerKind, mutator: bool, path: &[Option<&str>]) -> Vec<ListenerId> {
        let mut out = Vec::new();
        if let Some(index) = self.indexes.get(&(kind, mutator)) {
            index.collect(path, &mut out);
        }
        out.sort_unstable();
        out
    }

    /// Returns every listener of `kind` with this mutator flag, in
    /// registration order.
    pub fn all(&self, kind: ListenerKind, mutator: bool) -> Vec<ListenerId> {
        let mut out = Vec::new();
        if let Some(index) = self.indexes.get(&(kind, mutator)) {
            index.all(&mut out);
        }
        out.sort_unstable();
        out
    }

    /// Returns the number of registered listeners.
    #[inline]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns true if no listener is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Counts listeners per kind.
    pub fn stats(&self) -> ListenerStats {
        let mut stats = ListenerStats::default();
        for listener in self.listeners.values() {
            let count = match listener.kind() {
                ListenerKind::Tables => &mut stats.tables,
                ListenerKind::TableIds => &mut stats.table_ids,
                ListenerKind::Table => &mut stats.table,
                ListenerKind::TableCellIds => &mut stats.table_cell_ids,
                ListenerKind::RowIds => &mut stats.row_ids,
                ListenerKind::SortedRowIds => &mut stats.sorted_row_ids,
                ListenerKind::Row => &mut stats.row,
                ListenerKind::CellIds => &mut stats.cell_ids,
                ListenerKind::Cell => &mut stats.cell,
                ListenerKind::InvalidCell => &mut stats.invalid_cell,
                ListenerKind::Values => &mut stats.values,
                ListenerKind::ValueIds => &mut stats.value_ids,
                ListenerKind::Value => &mut stats.value,
                ListenerKind::InvalidValue => &mut stats.invalid_value,
                ListenerKind::StartTransaction
                | ListenerKind::WillFinishTransaction
                | ListenerKind::DidFinishTransaction => &mut stats.transaction,
            };
            *count += 1;
        }
        stats
    }

    /// Removes every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
        self.indexes.clear();
    }
}

fn normalize(kind: ListenerKind, mut path: Vec<Option<Id>>) -> Vec<Option<Id>> {
    path.resize(kind.path_len(), None);
    path
}
