//! Transactions.
//!
//! Every write runs inside a transaction. Writers open and finish one
//! implicitly when none is active; callers batch writes with
//! `transaction`, or with `start_transaction` and `finish_transaction`.
//! Listeners are dispatched when the outermost transaction finishes.

use crate::store::Store;
use log::{debug, warn};
use tabula_core::Result;
use tabula_reactive::ListenerKind;
use tabula_storage::{ChangeLog, ContentWriter, TransactionChanges, TransactionState};

impl Store {
    /// Opens a transaction and calls the start listeners.
    ///
    /// Returns `Error::TransactionInProgress` if one is already open or
    /// listeners are being dispatched: transactions do not nest.
    pub fn start_transaction(&mut self) -> Result<&mut Self> {
        let id = self.transaction.begin()?;
        debug!("starting transaction {}", id);
        self.call_transaction_listeners(ListenerKind::StartTransaction, &ChangeLog::new());
        Ok(self)
    }

    /// Finishes the open transaction and dispatches its changes.
    pub fn finish_transaction(&mut self) -> Result<&mut Self> {
        self.finish_transaction_with(|_| false)
    }

    /// Finishes the open transaction, reverting it if `do_rollback` returns
    /// true.
    ///
    /// Will-finish listeners run first and may still write. A rolled back
    /// transaction fires no data listeners; did-finish listeners see an empty
    /// log. Otherwise mutator listeners run (their writes join this
    /// transaction), then the remaining listeners and did-finish listeners
    /// run with the store read-only.
    ///
    /// Returns `Error::NoTransaction` if no transaction was started.
    pub fn finish_transaction_with(&mut self, do_rollback: impl FnOnce(&ChangeLog) -> bool) -> Result<&mut Self> {
        self.transaction.check_started()?;
        self.transaction.finishing();

        if self.listeners.has(ListenerKind::WillFinishTransaction, false) {
            let log = self.transaction.log().clone();
            self.call_transaction_listeners(ListenerKind::WillFinishTransaction, &log);
        }

        if do_rollback(self.transaction.log()) {
            let Store {
                content, transaction, ..
            } = self;
            transaction.rollback(content);
            self.transaction.dispatching();
            self.call_transaction_listeners(ListenerKind::DidFinishTransaction, &ChangeLog::new());
            self.transaction.end();
            return Ok(self);
        }

        if !self.listeners.is_empty() {
            let touched = {
                let log = self.transaction.log();
                log.cells_touched() || log.values_touched()
            };
            if touched {
                let log = self.transaction.log().clone();
                self.dispatch(&log, true);
            }

            self.transaction.dispatching();
            let log = self.transaction.log().clone();
            if touched {
                self.dispatch(&log, false);
            }
            self.call_transaction_listeners(ListenerKind::DidFinishTransaction, &log);
        }

        debug!(
            "finished transaction {} ({} cell changes, {} value changes)",
            self.transaction.id(),
            count_cell_changes(self.transaction.log()),
            self.transaction.log().changed_values().len()
        );
        self.transaction.end();
        Ok(self)
    }

    /// Runs `actions` in a transaction and returns its result.
    ///
    /// Returns `Error::TransactionInProgress` if a transaction is already
    /// open.
    pub fn transaction<R>(&mut self, actions: impl FnOnce(&mut Store) -> R) -> Result<R> {
        self.transaction_with(actions, |_| false)
    }

    /// Runs `actions` in a transaction that is reverted if `do_rollback`
    /// returns true.
    pub fn transaction_with<R>(
        &mut self,
        actions: impl FnOnce(&mut Store) -> R,
        do_rollback: impl FnOnce(&ChangeLog) -> bool,
    ) -> Result<R> {
        self.start_transaction()?;
        let result = actions(self);
        self.finish_transaction_with(do_rollback)?;
        Ok(result)
    }

    /// Applies a net diff, as produced by `get_transaction_changes`, as one
    /// transaction.
    pub fn set_transaction_changes(&mut self, changes: TransactionChanges) -> &mut Self {
        self.write(|w| w.apply_changes(changes));
        self
    }

    /// Returns the net changes of the open transaction.
    pub fn get_transaction_changes(&self) -> TransactionChanges {
        self.transaction.log().transaction_changes()
    }

    /// Returns the change log of the open transaction.
    pub fn get_transaction_log(&self) -> &ChangeLog {
        self.transaction.log()
    }

    /// Returns true while listeners are dispatched with the store read-only.
    pub(crate) fn is_dispatching(&self) -> bool {
        self.transaction.state() == TransactionState::Dispatching
    }

    /// Runs one validated write, inside the open transaction or a new one.
    ///
    /// Returns `None` if the write was ignored because the store is
    /// read-only.
    pub(crate) fn write<R>(&mut self, action: impl FnOnce(&mut ContentWriter<'_>) -> R) -> Option<R> {
        match self.transaction.state() {
            TransactionState::Dispatching => {
                warn!("ignoring write while listeners are dispatching");
                None
            }
            TransactionState::Started | TransactionState::Finishing => Some(self.apply(action)),
            TransactionState::Idle => {
                self.start_transaction().ok()?;
                let result = self.apply(action);
                if let Err(err) = self.finish_transaction() {
                    warn!("implicit transaction not finished: {}", err);
                }
                Some(result)
            }
        }
    }

    fn apply<R>(&mut self, action: impl FnOnce(&mut ContentWriter<'_>) -> R) -> R {
        let Store {
            content,
            schema,
            transaction,
            ..
        } = self;
        let mut writer = ContentWriter::new(content, schema, transaction.log_mut());
        action(&mut writer)
    }
}

fn count_cell_changes(log: &ChangeLog) -> usize {
    log.changed_cells()
        .values()
        .flat_map(|rows| rows.values())
        .map(|cells| cells.len())
        .sum()
}
