//! Ids and content containers for the tabula store.
//!
//! Every container keeps its ids in insertion order; removing an id and adding
//! it again moves it to the end.

use crate::value::Value;
use alloc::collections::VecDeque;
use alloc::string::{String, ToString};
use indexmap::IndexMap;

/// Identifier of a table, row, cell or value. Compared by equality.
pub type Id = String;

/// Insertion-ordered map keyed by `Id`.
pub type IdMap<V> = IndexMap<Id, V, hashbrown::hash_map::DefaultHashBuilder>;

/// A row: cell id to cell.
pub type Row = IdMap<Value>;

/// A table: row id to row.
pub type Table = IdMap<Row>;

/// All tables: table id to table.
pub type Tables = IdMap<Table>;

/// Top-level values: value id to value.
pub type Values = IdMap<Value>;

/// Most row ids a pool remembers for reuse.
const MAX_FREED_ROW_IDS: usize = 1000;

/// Allocator of numeric-string row ids for one table.
///
/// Fresh ids count up from `"0"`. Ids released by deletion are pooled and only
/// handed out again when the caller asks for reuse.
#[derive(Clone, Debug, Default)]
pub struct RowIdPool {
    /// Next fresh id.
    next: u64,
    /// Released ids, oldest first.
    freed: VecDeque<Id>,
}

impl RowIdPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a candidate id. The caller must check it is not in use.
    pub fn next_id(&mut self, reuse: bool) -> Id {
        if reuse {
            if let Some(id) = self.freed.pop_front() {
                return id;
            }
        }
        let id = self.next.to_string();
        self.next += 1;
        id
    }

    /// Returns a deleted row id to the pool. Non-numeric ids are ignored.
    pub fn release(&mut self, id: &str) {
        if is_numeric_id(id) && self.freed.len() < MAX_FREED_ROW_IDS && !self.freed.iter().any(|f| f == id) {
            self.freed.push_back(id.into());
        }
    }

    /// Returns the number of pooled ids.
    #[inline]
    pub fn freed_len(&self) -> usize {
        self.freed.len()
    }
}

/// Returns true for ids of the form `"0"`, `"17"` (no sign, no leading zero).
fn is_numeric_id(id: &str) -> bool {
    !id.is_empty()
        && id.bytes().all(|b| b.is_ascii_digit())
        && (id == "0" || !id.starts_with('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_counts_up() {
        let mut pool = RowIdPool::new();
        assert_eq!(pool.next_id(false), "0");
        assert_eq!(pool.next_id(false), "1");
        assert_eq!(pool.next_id(true), "2");
    }

    #[test]
    fn test_pool_reuse_only_when_asked() {
        let mut pool = RowIdPool::new();
        let first = pool.next_id(false);
        pool.release(&first);
        assert_eq!(pool.freed_len(), 1);

        assert_eq!(pool.next_id(false), "1");
        assert_eq!(pool.next_id(true), "0");
        assert_eq!(pool.freed_len(), 0);
    }

    #[test]
    fn test_pool_ignores_non_numeric() {
        let mut pool = RowIdPool::new();
        pool.release("fido");
        pool.release("007");
        pool.release("-1");
        pool.release("");
        assert_eq!(pool.freed_len(), 0);
    }

    #[test]
    fn test_pool_release_is_idempotent() {
        let mut pool = RowIdPool::new();
        pool.release("3");
        pool.release("3");
        assert_eq!(pool.freed_len(), 1);
    }

    #[test]
    fn test_id_map_keeps_insertion_order() {
        let mut map: IdMap<u8> = IdMap::default();
        map.insert("b".into(), 1);
        map.insert("a".into(), 2);
        map.insert("c".into(), 3);
        map.shift_remove("b");
        map.insert("b".into(), 4);
        let keys: alloc::vec::Vec<&str> = map.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["a", "c", "b"]);
    }
}
