//! Transaction state for the tabula store.
//!
//! A store runs at most one transaction at a time. Its lifecycle is
//!
//! ```text
//! Idle → Started → Finishing → Dispatching → Idle
//!                     └──── (rollback) ─────→ Idle
//! ```
//!
//! Writes are accepted while `Started` or `Finishing`; the latter is where
//! will-finish and mutator listeners run. `Dispatching` is read-only.

use crate::change_log::ChangeLog;
use crate::content::Content;
use tabula_core::{Error, Result};

/// Transaction counter type.
pub type TransactionId = u64;

/// Transaction state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransactionState {
    /// No transaction is open.
    #[default]
    Idle,
    /// A transaction is open and accepts writes.
    Started,
    /// Finish was requested; will-finish and mutator listeners may still write.
    Finishing,
    /// Non-mutator listeners are running; writes are ignored.
    Dispatching,
}

/// The open transaction of a store, with its change log.
#[derive(Debug, Default)]
pub struct Transaction {
    /// Id of the most recently begun transaction.
    id: TransactionId,
    /// Current state.
    state: TransactionState,
    /// Changes recorded since `begin`.
    log: ChangeLog,
}

impl Transaction {
    /// Creates an idle transaction slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of the current or most recent transaction.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns true if no transaction is open.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state == TransactionState::Idle
    }

    /// Returns true if writes are currently recorded.
    #[inline]
    pub fn accepts_writes(&self) -> bool {
        matches!(self.state, TransactionState::Started | TransactionState::Finishing)
    }

    /// Opens a new transaction with an empty log.
    pub fn begin(&mut self) -> Result<TransactionId> {
        if self.state != TransactionState::Idle {
            return Err(Error::TransactionInProgress);
        }
        self.id += 1;
        self.state = TransactionState::Started;
        self.log.clear();
        Ok(self.id)
    }

    /// Checks that a transaction is open and not yet finishing.
    pub fn check_started(&self) -> Result<()> {
        if self.state != TransactionState::Started {
            return Err(Error::NoTransaction);
        }
        Ok(())
    }

    /// Moves to `Finishing`.
    pub fn finishing(&mut self) {
        self.state = TransactionState::Finishing;
    }

    /// Moves to `Dispatching`.
    pub fn dispatching(&mut self) {
        self.state = TransactionState::Dispatching;
    }

    /// Returns to a state saved before a read-only call.
    pub fn restore(&mut self, state: TransactionState) {
        self.state = state;
    }

    /// Closes the transaction.
    pub fn end(&mut self) {
        self.state = TransactionState::Idle;
    }

    /// Returns the change log.
    #[inline]
    pub fn log(&self) -> &ChangeLog {
        &self.log
    }

    /// Returns the change log for recording.
    #[inline]
    pub fn log_mut(&mut self) -> &mut ChangeLog {
        &mut self.log
    }

    /// Takes the change log, leaving an empty one.
    pub fn take_log(&mut self) -> ChangeLog {
        core::mem::take(&mut self.log)
    }

    /// Reverts every recorded change and clears the log.
    pub fn rollback(&mut self, content: &mut Content) {
        log::debug!("rolling back transaction {}", self.id);
        content.revert(&self.log);
        self.log.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ContentWriter;
    use tabula_core::schema::SchemaRegistry;
    use tabula_core::{row, tables, Value};

    #[test]
    fn test_transaction_begin() {
        let mut tx = Transaction::new();
        assert!(tx.is_idle());
        assert_eq!(tx.begin().unwrap(), 1);
        assert_eq!(tx.state(), TransactionState::Started);
        assert!(tx.accepts_writes());
    }

    #[test]
    fn test_transaction_no_nesting() {
        let mut tx = Transaction::new();
        tx.begin().unwrap();
        assert_eq!(tx.begin(), Err(Error::TransactionInProgress));
        tx.finishing();
        assert_eq!(tx.begin(), Err(Error::TransactionInProgress));
        tx.dispatching();
        assert!(!tx.accepts_writes());
        assert_eq!(tx.begin(), Err(Error::TransactionInProgress));
    }

    #[test]
    fn test_transaction_check_started() {
        let mut tx = Transaction::new();
        assert_eq!(tx.check_started(), Err(Error::NoTransaction));
        tx.begin().unwrap();
        assert!(tx.check_started().is_ok());
        tx.finishing();
        assert_eq!(tx.check_started(), Err(Error::NoTransaction));
        tx.end();
        assert!(tx.is_idle());
    }

    #[test]
    fn test_transaction_begin_clears_log() {
        let mut tx = Transaction::new();
        tx.begin().unwrap();
        tx.log_mut().value_changed("open", None, Some(Value::from(true)));
        tx.end();
        tx.begin().unwrap();
        assert!(tx.log().is_empty());
        assert_eq!(tx.id(), 2);
    }

    #[test]
    fn test_transaction_rollback() {
        let schema = SchemaRegistry::new();
        let mut content = Content::new();
        let mut tx = Transaction::new();

        tx.begin().unwrap();
        ContentWriter::new(&mut content, &schema, tx.log_mut())
            .set_tables(tables! { "pets" => { "fido" => { "species" => "dog" } } });
        tx.end();

        tx.begin().unwrap();
        let mut writer = ContentWriter::new(&mut content, &schema, tx.log_mut());
        writer.set_cell("pets", "fido", "age", Value::from(1));
        writer.set_cell("pets", "fido", "age", Value::from(2));
        writer.del_cell("pets", "fido", "species", false);
        writer.set_row("pets", "felix", row! { "species" => "cat" });
        writer.set_value("open", Value::from(true));

        tx.rollback(&mut content);
        tx.end();

        assert_eq!(content.tables(), &tables! { "pets" => { "fido" => { "species" => "dog" } } });
        assert!(content.values().is_empty());
        assert!(tx.log().is_empty());
    }
}
