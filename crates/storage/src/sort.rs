//! Sorted row ids.
//!
//! Rows are ordered by one cell using `Value::sort_cmp`, or by row id when no
//! cell is given. Ties always break by row id ascending, even when sorting in
//! descending order. Rows lacking the sort cell take the supplied default, or
//! go last in either direction when there is none.

use alloc::vec::Vec;
use core::cmp::Ordering;
use tabula_core::{Id, Table, Value};

/// The parameters of one sorted row id query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortedRowIdsQuery {
    /// Table to sort.
    pub table_id: Id,
    /// Cell to sort by; row ids are used when `None`.
    pub cell_id: Option<Id>,
    /// Reverses the primary order.
    pub descending: bool,
    /// Number of leading ids to skip.
    pub offset: usize,
    /// Maximum number of ids to return.
    pub limit: Option<usize>,
}

impl SortedRowIdsQuery {
    /// Creates an ascending query over a table's row ids.
    pub fn new(table_id: impl Into<Id>) -> Self {
        Self {
            table_id: table_id.into(),
            ..Self::default()
        }
    }

    /// Sorts by the given cell.
    pub fn by(mut self, cell_id: impl Into<Id>) -> Self {
        self.cell_id = Some(cell_id.into());
        self
    }

    /// Sorts in descending order.
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Skips the first `offset` ids.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Returns at most `limit` ids.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Returns the row ids of `table` ordered by `query`, windowed by its offset
/// and limit. `default` stands in for rows that lack the sort cell.
pub fn sorted_row_ids(table: Option<&Table>, query: &SortedRowIdsQuery, default: Option<&Value>) -> Vec<Id> {
    let Some(table) = table else {
        return Vec::new();
    };

    let mut keyed: Vec<(Option<&Value>, &Id)> = table
        .iter()
        .map(|(row_id, row)| {
            let key = query
                .cell_id
                .as_ref()
                .map(|cell_id| row.get(cell_id).or(default));
            (key.flatten(), row_id)
        })
        .collect();

    match &query.cell_id {
        None => keyed.sort_by(|(_, a), (_, b)| {
            let order = a.cmp(b);
            if query.descending {
                order.reverse()
            } else {
                order
            }
        }),
        Some(_) => keyed.sort_by(|(a, a_id), (b, b_id)| {
            compare_cells(*a, *b, query.descending).then_with(|| a_id.cmp(b_id))
        }),
    }

    let ids = keyed.into_iter().skip(query.offset).map(|(_, row_id)| row_id.clone());
    match query.limit {
        Some(limit) => ids.take(limit).collect(),
        None => ids.collect(),
    }
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let order = a.sort_cmp(b);
            if descending {
                order.reverse()
            } else {
                order
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
