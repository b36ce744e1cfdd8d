//! Tabula Reactive - Listener registry for the tabula store.
//!
//! This crate holds the listeners of a store and answers which of them are
//! affected by a change. It does not dispatch anything itself: the store
//! walks a finished transaction's change log, asks the registry for the
//! matching listener ids, and invokes the cloned callbacks with itself.
//!
//! # Core Concepts
//!
//! - `Listener`: A callback registered against a `ListenerKind` and a path of
//!   ids, where `None` components are wildcards
//! - `ListenerRegistry`: Owns listeners and indexes them by path
//! - `GetCellChange`, `GetValueChange`, `GetIdChanges`: Borrowed views of the
//!   transaction being dispatched
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use tabula_reactive::{Callback, GetCellChange, ListenerKind, ListenerRegistry};
//!
//! let mut registry: ListenerRegistry<()> = ListenerRegistry::new();
//! let id = registry.add(
//!     ListenerKind::Row,
//!     vec![Some("pets".into()), None],
//!     false,
//!     Callback::Row(Rc::new(|_: &mut (), _: &str, _: &str, _: &GetCellChange<'_>| {})),
//! );
//!
//! assert_eq!(registry.matching(ListenerKind::Row, false, &[Some("pets"), Some("fido")]), vec![id]);
//! assert!(registry.matching(ListenerKind::Row, false, &[Some("cars"), Some("a")]).is_empty());
//! ```

#![no_std]

extern crate alloc;

pub mod change;
pub mod listener;
pub mod path_index;
pub mod registry;

pub use change::{Change, GetCellChange, GetIdChanges, GetValueChange};
pub use listener::{
    Callback, CellCallback, IdsCallback, InvalidCellCallback, InvalidValueCallback, Listener, ListenerId,
    ListenerKind, RowCallback, SortedRowIdsCallback, SortedState, TableCallback, TablesCallback,
    TransactionCallback, ValueCallback, ValuesCallback,
};
pub use path_index::PathIndex;
pub use registry::{ListenerRegistry, ListenerStats};
