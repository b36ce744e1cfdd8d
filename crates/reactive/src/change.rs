//! Change accessors handed to listeners.
//!
//! Listeners never receive the raw change log. Instead each call gets a small
//! borrowed accessor that answers questions about the transaction being
//! dispatched: did this cell change, what ids were added to that row.

use tabula_core::{Id, Value};
use tabula_storage::{ChangeLog, IdChanges};

/// The net change of one cell or value. `None` means absent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Change<'a> {
    /// State at the start of the transaction.
    pub old: Option<&'a Value>,
    /// State at the end of the transaction.
    pub new: Option<&'a Value>,
}

/// Looks up cell changes in the transaction being dispatched.
#[derive(Clone, Copy, Debug)]
pub struct GetCellChange<'a> {
    log: &'a ChangeLog,
}

impl<'a> GetCellChange<'a> {
    /// Creates an accessor over a change log.
    pub fn new(log: &'a ChangeLog) -> Self {
        Self { log }
    }

    /// Returns the net change of a cell, or `None` if it did not change.
    pub fn get(&self, table_id: &str, row_id: &str, cell_id: &str) -> Option<Change<'a>> {
        self.log
            .cell_change(table_id, row_id, cell_id)
            .map(|(old, new)| Change {
                old: old.as_ref(),
                new: new.as_ref(),
            })
    }
}

/// Looks up value changes in the transaction being dispatched.
#[derive(Clone, Copy, Debug)]
pub struct GetValueChange<'a> {
    log: &'a ChangeLog,
}

impl<'a> GetValueChange<'a> {
    /// Creates an accessor over a change log.
    pub fn new(log: &'a ChangeLog) -> Self {
        Self { log }
    }

    /// Returns the net change of a value, or `None` if it did not change.
    pub fn get(&self, value_id: &str) -> Option<Change<'a>> {
        self.log.value_change(value_id).map(|(old, new)| Change {
            old: old.as_ref(),
            new: new.as_ref(),
        })
    }
}

/// Net id additions and removals in the scope a listener watches.
#[derive(Clone, Copy, Debug, Default)]
pub struct GetIdChanges<'a> {
    changes: Option<&'a IdChanges>,
}

impl<'a> GetIdChanges<'a> {
    /// Creates an accessor over one scope's id changes.
    pub fn new(changes: Option<&'a IdChanges>) -> Self {
        Self { changes }
    }

    /// Returns +1 if the id was added, -1 if it was removed.
    pub fn get(&self, id: &str) -> Option<i32> {
        self.changes.and_then(|c| c.get(id)).copied()
    }

    /// Iterates over every changed id with its delta.
    pub fn iter(&self) -> impl Iterator<Item = (&'a Id, i32)> + 'a {
        self.changes
            .into_iter()
            .flat_map(|c| c.iter())
            .map(|(id, delta)| (id, *delta))
    }

    /// Iterates over added ids.
    pub fn added(&self) -> impl Iterator<Item = &'a Id> + 'a {
        self.iter().filter(|(_, d)| *d > 0).map(|(id, _)| id)
    }

    /// Iterates over removed ids.
    pub fn removed(&self) -> impl Iterator<Item = &'a Id> + 'a {
        self.iter().filter(|(_, d)| *d < 0).map(|(id, _)| id)
    }

    /// Returns the number of changed ids.
    pub fn len(&self) -> usize {
        self.changes.map_or(0, |c| c.len())
    }

    /// Returns true if no id changed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_get_cell_change() {
        let mut log = ChangeLog::new();
        log.cell_changed("pets", "fido", "age", Some(Value::from(3)), Some(Value::from(4)));
        log.cell_changed("pets", "fido", "species", Some(Value::from("dog")), Some(Value::from("dog")));

        let get = GetCellChange::new(&log);
        let change = get.get("pets", "fido", "age").unwrap();
        assert_eq!(change.old, Some(&Value::from(3)));
        assert_eq!(change.new, Some(&Value::from(4)));
        assert!(get.get("pets", "fido", "species").is_none());
        assert!(get.get("pets", "rex", "age").is_none());
    }

    #[test]
    fn test_get_value_change() {
        let mut log = ChangeLog::new();
        log.value_changed("open", None, Some(Value::from(true)));
        let get = GetValueChange::new(&log);
        assert_eq!(
            get.get("open"),
            Some(Change {
                old: None,
                new: Some(&Value::from(true))
            })
        );
        assert!(get.get("closed").is_none());
    }

    #[test]
    fn test_get_id_changes() {
        let mut log = ChangeLog::new();
        log.row_ids_changed("pets", "fido", 1);
        log.row_ids_changed("pets", "rex", -1);

        let get = GetIdChanges::new(log.changed_row_ids().get("pets"));
        assert_eq!(get.len(), 2);
        assert_eq!(get.get("fido"), Some(1));
        assert_eq!(get.added().collect::<Vec<_>>(), ["fido"]);
        assert_eq!(get.removed().collect::<Vec<_>>(), ["rex"]);

        let none = GetIdChanges::default();
        assert!(none.is_empty());
        assert_eq!(none.iter().count(), 0);
    }
}
