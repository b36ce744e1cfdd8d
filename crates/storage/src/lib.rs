//! Tabula Storage - Content storage and transaction bookkeeping for the tabula store.
//!
//! This crate provides the storage layer including:
//!
//! - `Content`: Tables, rows, cells and values with cascading deletion
//! - `ContentWriter`: Schema-validated writes with defaults and invalid-write records
//! - `ChangeLog`: Net changes of a transaction, with rollback support
//! - `Transaction`: The transaction state machine
//! - `sorted_row_ids`: Ordering of a table's rows by a cell
//!
//! # Example
//!
//! ```rust
//! use tabula_core::schema::SchemaRegistry;
//! use tabula_core::{row, Value};
//! use tabula_storage::{Content, ContentWriter, Transaction};
//!
//! let schema = SchemaRegistry::new();
//! let mut content = Content::new();
//! let mut tx = Transaction::new();
//!
//! tx.begin().unwrap();
//! ContentWriter::new(&mut content, &schema, tx.log_mut())
//!     .set_row("pets", "fido", row! { "species" => "dog" });
//!
//! assert_eq!(content.cell("pets", "fido", "species"), Some(&Value::from("dog")));
//! assert_eq!(tx.log().changed_row_ids()["pets"]["fido"], 1);
//! tx.end();
//! ```

#![no_std]

extern crate alloc;

pub mod change_log;
pub mod content;
pub mod sort;
pub mod transaction;
pub mod validate;

pub use change_log::{
    ChangeLog, ChangedCells, IdChanges, InvalidCells, InvalidValues, OptIdMap, RowChanges, TableChanges,
    TransactionChanges, ValuePair,
};
pub use content::Content;
pub use sort::{sorted_row_ids, SortedRowIdsQuery};
pub use transaction::{Transaction, TransactionId, TransactionState};
pub use validate::{ContentWriter, JsonTables, JsonValues};
