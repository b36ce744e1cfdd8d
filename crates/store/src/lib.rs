//! Tabula - A reactive in-memory store of tables and values.
//!
//! This crate provides the public API of tabula: a single-threaded store
//! holding tables (rows of cells) and a flat map of values, optional schemas
//! that validate every write, transactions with rollback, and listeners that
//! are called when the data they are scoped to changes.
//!
//! # Core Components
//!
//! - `Store`: Readers, writers, schemas, transactions and listeners
//! - `StoreBuilder`: Declares schemas and initial content
//! - `SortedRowIdsQuery`: Sorted, windowed row ids of a table
//! - `GetCellChange`, `GetValueChange`, `GetIdChanges`: What a listener's
//!   transaction changed
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use tabula_store::{create_store, row, Value};
//!
//! let mut store = create_store();
//! let ages = Rc::new(RefCell::new(Vec::new()));
//! let ages_clone = ages.clone();
//!
//! store.add_cell_listener(
//!     Some("pets"),
//!     None,
//!     Some("age"),
//!     move |_, _, row_id, _, new, old, _| {
//!         ages_clone.borrow_mut().push((row_id.to_string(), old.cloned(), new.cloned()));
//!     },
//!     false,
//! );
//!
//! store.set_row("pets", "fido", row! { "species" => "dog", "age" => 3 });
//! store
//!     .transaction(|store| {
//!         store.set_cell("pets", "fido", "age", 4);
//!         store.set_cell("pets", "fido", "age", 5);
//!     })
//!     .unwrap();
//!
//! assert_eq!(
//!     *ages.borrow(),
//!     [
//!         ("fido".to_string(), None, Some(Value::from(3))),
//!         ("fido".to_string(), Some(Value::from(3)), Some(Value::from(5))),
//!     ]
//! );
//! ```

extern crate alloc;

pub mod builder;
pub mod convert;
mod dispatch;
pub mod listeners;
pub mod store;
pub mod transaction;

pub use builder::StoreBuilder;
pub use store::Store;

pub use tabula_core::schema::{CellSchema, TablesSchema, ValueSchema, ValuesSchema};
pub use tabula_core::{row, table, tables, values};
pub use tabula_core::{Error, Id, IdMap, Result, Row, Table, Tables, Value, ValueType, Values};
pub use tabula_reactive::{Change, GetCellChange, GetIdChanges, GetValueChange, ListenerId, ListenerStats};
pub use tabula_storage::{ChangeLog, SortedRowIdsQuery, TransactionChanges};

/// Creates an empty store without schemas.
pub fn create_store() -> Store {
    Store::new()
}
