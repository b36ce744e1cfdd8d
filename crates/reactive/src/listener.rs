//! Listener definitions.
//!
//! A listener is a callback registered against a kind of change and a path of
//! ids. Each path component is either pinned to an id or left open
//! (`None`), which matches any id. Callbacks are generic over the store type
//! `S` so that they can read and, for mutator listeners, write the store that
//! invokes them.

use crate::change::{GetCellChange, GetIdChanges, GetValueChange};
use alloc::rc::Rc;
use alloc::vec::Vec;
use serde_json::Value as JsonValue;
use tabula_core::{Id, Value};
use tabula_storage::{ChangeLog, SortedRowIdsQuery};

/// Unique identifier for a listener. Ids count up from 1, so id order is
/// registration order.
pub type ListenerId = u64;

/// The kinds of change a listener can watch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenerKind {
    /// Any cell in any table.
    Tables,
    /// The set of table ids.
    TableIds,
    /// Any cell in a table.
    Table,
    /// The union of cell ids used across a table's rows.
    TableCellIds,
    /// The set of row ids in a table.
    RowIds,
    /// A sorted, windowed view of a table's row ids.
    SortedRowIds,
    /// Any cell in a row.
    Row,
    /// The set of cell ids in a row.
    CellIds,
    /// One cell.
    Cell,
    /// Rejected cell writes.
    InvalidCell,
    /// Any value.
    Values,
    /// The set of value ids.
    ValueIds,
    /// One value.
    Value,
    /// Rejected value writes.
    InvalidValue,
    /// A transaction starting.
    StartTransaction,
    /// A transaction about to finish; may still write.
    WillFinishTransaction,
    /// A transaction having finished.
    DidFinishTransaction,
}

impl ListenerKind {
    /// Number of path components a listener of this kind is registered with.
    pub fn path_len(&self) -> usize {
        match self {
            ListenerKind::Tables
            | ListenerKind::TableIds
            | ListenerKind::Values
            | ListenerKind::ValueIds
            | ListenerKind::StartTransaction
            | ListenerKind::WillFinishTransaction
            | ListenerKind::DidFinishTransaction => 0,
            ListenerKind::Table
            | ListenerKind::TableCellIds
            | ListenerKind::RowIds
            | ListenerKind::SortedRowIds
            | ListenerKind::Value
            | ListenerKind::InvalidValue => 1,
            ListenerKind::Row | ListenerKind::CellIds => 2,
            ListenerKind::Cell | ListenerKind::InvalidCell => 3,
        }
    }

    /// Returns true for the three transaction listener kinds.
    pub fn is_transaction(&self) -> bool {
        matches!(
            self,
            ListenerKind::StartTransaction
                | ListenerKind::WillFinishTransaction
                | ListenerKind::DidFinishTransaction
        )
    }
}

/// Called with every table change.
pub type TablesCallback<S> = Rc<dyn Fn(&mut S, &GetCellChange<'_>)>;
/// Called with table id, row id or value id set changes; the `&[Id]` holds the
/// concrete path (empty, table, or table and row).
pub type IdsCallback<S> = Rc<dyn Fn(&mut S, &[Id], &GetIdChanges<'_>)>;
/// Called with a table id.
pub type TableCallback<S> = Rc<dyn Fn(&mut S, &str, &GetCellChange<'_>)>;
/// Called with the query and the new sorted row ids.
pub type SortedRowIdsCallback<S> = Rc<dyn Fn(&mut S, &SortedRowIdsQuery, &[Id])>;
/// Called with a table id and row id.
pub type RowCallback<S> = Rc<dyn Fn(&mut S, &str, &str, &GetCellChange<'_>)>;
/// Called with table, row and cell ids, the new cell and the old cell.
pub type CellCallback<S> =
    Rc<dyn Fn(&mut S, &str, &str, &str, Option<&Value>, Option<&Value>, &GetCellChange<'_>)>;
/// Called with the (possibly unattributed) path of rejected cell writes.
pub type InvalidCellCallback<S> = Rc<dyn Fn(&mut S, Option<&str>, Option<&str>, Option<&str>, &[JsonValue])>;
/// Called with every value change.
pub type ValuesCallback<S> = Rc<dyn Fn(&mut S, &GetValueChange<'_>)>;
/// Called with a value id, the new value and the old value.
pub type ValueCallback<S> = Rc<dyn Fn(&mut S, &str, Option<&Value>, Option<&Value>, &GetValueChange<'_>)>;
/// Called with the (possibly unattributed) value id of rejected value writes.
pub type InvalidValueCallback<S> = Rc<dyn Fn(&mut S, Option<&str>, &[JsonValue])>;
/// Called at transaction boundaries with the transaction's change log.
pub type TransactionCallback<S> = Rc<dyn Fn(&mut S, &ChangeLog)>;

/// A callback of any kind.
pub enum Callback<S> {
    /// Tables listener.
    Tables(TablesCallback<S>),
    /// Table id, table cell id, row id, cell id or value id listener.
    Ids(IdsCallback<S>),
    /// Table listener.
    Table(TableCallback<S>),
    /// Sorted row id listener.
    SortedRowIds(SortedRowIdsCallback<S>),
    /// Row listener.
    Row(RowCallback<S>),
    /// Cell listener.
    Cell(CellCallback<S>),
    /// Invalid cell listener.
    InvalidCell(InvalidCellCallback<S>),
    /// Values listener.
    Values(ValuesCallback<S>),
    /// Value listener.
    Value(ValueCallback<S>),
    /// Invalid value listener.
    InvalidValue(InvalidValueCallback<S>),
    /// Transaction listener.
    Transaction(TransactionCallback<S>),
}

impl<S> Clone for Callback<S> {
    fn clone(&self) -> Self {
        match self {
            Callback::Tables(f) => Callback::Tables(f.clone()),
            Callback::Ids(f) => Callback::Ids(f.clone()),
            Callback::Table(f) => Callback::Table(f.clone()),
            Callback::SortedRowIds(f) => Callback::SortedRowIds(f.clone()),
            Callback::Row(f) => Callback::Row(f.clone()),
            Callback::Cell(f) => Callback::Cell(f.clone()),
            Callback::InvalidCell(f) => Callback::InvalidCell(f.clone()),
            Callback::Values(f) => Callback::Values(f.clone()),
            Callback::Value(f) => Callback::Value(f.clone()),
            Callback::InvalidValue(f) => Callback::InvalidValue(f.clone()),
            Callback::Transaction(f) => Callback::Transaction(f.clone()),
        }
    }
}

/// The last result a sorted row id listener was called with.
#[derive(Clone, Debug)]
pub struct SortedState {
    /// The query the listener watches.
    pub query: SortedRowIdsQuery,
    /// The ids it last saw.
    pub last: Vec<Id>,
}

/// A registered listener.
pub struct Listener<S> {
    /// Unique identifier
    id: ListenerId,
    /// Kind of change watched
    kind: ListenerKind,
    /// Whether the callback may write to the store
    mutator: bool,
    /// Pinned ids, `None` for wildcards
    path: Vec<Option<Id>>,
    /// Callback to invoke
    callback: Callback<S>,
    /// Query and last result, for sorted row id listeners
    sorted: Option<SortedState>,
}

impl<S> Listener<S> {
    /// Creates a new listener.
    pub fn new(id: ListenerId, kind: ListenerKind, path: Vec<Option<Id>>, mutator: bool, callback: Callback<S>) -> Self {
        Self {
            id,
            kind,
            mutator,
            path,
            callback,
            sorted: None,
        }
    }

    /// Attaches a sorted row id query and its initial result.
    pub fn with_sorted(mut self, query: SortedRowIdsQuery, initial: Vec<Id>) -> Self {
        self.sorted = Some(SortedState { query, last: initial });
        self
    }

    /// Returns the listener ID.
    #[inline]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Returns the kind of change watched.
    #[inline]
    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    /// Returns whether this listener may write to the store.
    #[inline]
    pub fn is_mutator(&self) -> bool {
        self.mutator
    }

    /// Returns the registered path.
    #[inline]
    pub fn path(&self) -> &[Option<Id>] {
        &self.path
    }

    /// Returns the callback.
    #[inline]
    pub fn callback(&self) -> &Callback<S> {
        &self.callback
    }

    /// Returns the sorted row id state, if any.
    pub fn sorted(&self) -> Option<&SortedState> {
        self.sorted.as_ref()
    }

    pub(crate) fn sorted_mut(&mut self) -> Option<&mut SortedState> {
        self.sorted.as_mut()
    }
}
