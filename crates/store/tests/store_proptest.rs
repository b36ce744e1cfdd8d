//! Property-based tests for the store.
//!
//! Random sequences of writes are applied to a store and the resulting
//! content, change notifications and serialized form are checked against
//! invariants that must hold for any sequence.

use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use tabula_store::{create_store, SortedRowIdsQuery, Store, Value};

/// One write against a small id space, so that writes collide often.
#[derive(Clone, Debug)]
enum Op {
    SetCell(u8, u8, u8, i32),
    DelCell(u8, u8, u8),
    DelRow(u8, u8),
    DelTable(u8),
    SetValue(u8, bool),
    DelValue(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..3u8, 0..4u8, 0..3u8, -5..5i32).prop_map(|(t, r, c, v)| Op::SetCell(t, r, c, v)),
        2 => (0..3u8, 0..4u8, 0..3u8).prop_map(|(t, r, c)| Op::DelCell(t, r, c)),
        1 => (0..3u8, 0..4u8).prop_map(|(t, r)| Op::DelRow(t, r)),
        1 => (0..3u8).prop_map(Op::DelTable),
        1 => (0..3u8, any::<bool>()).prop_map(|(v, b)| Op::SetValue(v, b)),
        1 => (0..3u8).prop_map(Op::DelValue),
    ]
}

fn apply(store: &mut Store, op: &Op) {
    let id = |prefix: &str, n: &u8| format!("{}{}", prefix, n);
    match op {
        Op::SetCell(t, r, c, v) => store.set_cell(&id("t", t), &id("r", r), &id("c", c), *v),
        Op::DelCell(t, r, c) => store.del_cell(&id("t", t), &id("r", r), &id("c", c), false),
        Op::DelRow(t, r) => store.del_row(&id("t", t), &id("r", r)),
        Op::DelTable(t) => store.del_table(&id("t", t)),
        Op::SetValue(v, b) => store.set_value(&id("v", v), *b),
        Op::DelValue(v) => store.del_value(&id("v", v)),
    };
}

/// Every cell in the store as a flat set of paths.
fn cell_paths(store: &Store) -> BTreeSet<(String, String, String)> {
    cell_paths_of(&store.get_tables())
}

proptest! {
    /// No table or row is ever left empty.
    #[test]
    fn no_empty_tables_or_rows(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut store = create_store();
        for op in &ops {
            apply(&mut store, op);
            for (_, table) in store.get_tables() {
                prop_assert!(!table.is_empty());
                for (_, row) in table {
                    prop_assert!(!row.is_empty());
                }
            }
        }
    }

    /// A rolled back transaction leaves content exactly as it was, id order
    /// included.
    #[test]
    fn rollback_restores_content(
        setup in prop::collection::vec(op_strategy(), 0..30),
        ops in prop::collection::vec(op_strategy(), 0..30),
    ) {
        let mut store = create_store();
        for op in &setup {
            apply(&mut store, op);
        }
        let before = store.get_content();
        let before_json = store.get_json();

        store
            .transaction_with(
                |store| {
                    for op in &ops {
                        apply(store, op);
                    }
                },
                |_| true,
            )
            .unwrap();

        prop_assert_eq!(store.get_content(), before);
        prop_assert_eq!(store.get_json(), before_json);
    }

    /// Cell listeners fire exactly for the cells whose value differs between
    /// the start and the end of a transaction.
    #[test]
    fn cell_listener_sees_net_changes(
        setup in prop::collection::vec(op_strategy(), 0..30),
        ops in prop::collection::vec(op_strategy(), 1..30),
    ) {
        let mut store = create_store();
        for op in &setup {
            apply(&mut store, op);
        }
        let before = store.get_content().0;

        let seen = Rc::new(RefCell::new(BTreeSet::new()));
        let seen_clone = seen.clone();
        store.add_cell_listener(
            None,
            None,
            None,
            move |_, t, r, c, _, _, _| {
                seen_clone.borrow_mut().insert((t.to_string(), r.to_string(), c.to_string()));
            },
            false,
        );

        store
            .transaction(|store| {
                for op in &ops {
                    apply(store, op);
                }
            })
            .unwrap();

        let after = store.get_content().0;
        let cell = |tables: &tabula_store::Tables, (t, r, c): &(String, String, String)| {
            tables.get(t).and_then(|table| table.get(r)).and_then(|row| row.get(c)).cloned()
        };
        let mut expected = BTreeSet::new();
        for path in cell_paths_of(&before).union(&cell_paths_of(&after)) {
            if cell(&before, path) != cell(&after, path) {
                expected.insert(path.clone());
            }
        }
        prop_assert_eq!(&*seen.borrow(), &expected);
    }

    /// Serializing and loading back changes nothing.
    #[test]
    fn json_round_trip(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut store = create_store();
        for op in &ops {
            apply(&mut store, op);
        }
        let json = store.get_json();

        let mut copy = create_store();
        copy.set_json(&json).unwrap();
        prop_assert_eq!(copy.get_content(), store.get_content());
        prop_assert_eq!(copy.get_json(), json);
        prop_assert_eq!(cell_paths(&copy), cell_paths(&store));
    }

    /// Descending order reverses ascending order when no two rows tie.
    #[test]
    fn descending_reverses_distinct_keys(keys in prop::collection::btree_set(-1000..1000i32, 0..30)) {
        let mut store = create_store();
        // Row ids chosen so that id order and key order disagree.
        for (i, key) in keys.iter().rev().enumerate() {
            store.set_cell("t", &format!("r{}", i), "k", *key);
        }
        let query = SortedRowIdsQuery::new("t").by("k");
        let ascending = store.get_sorted_row_ids(&query);
        let mut descending = store.get_sorted_row_ids(&query.clone().descending());
        descending.reverse();
        prop_assert_eq!(&ascending, &descending);

        let sorted_keys: Vec<Value> = ascending
            .iter()
            .filter_map(|row_id| store.get_cell("t", row_id, "k"))
            .collect();
        let expected: Vec<Value> = keys.iter().map(|k| Value::from(*k)).collect();
        prop_assert_eq!(sorted_keys, expected);
    }

    /// `offset` and `limit` window the full sorted list.
    #[test]
    fn sorted_window(
        keys in prop::collection::vec(0..5i32, 0..20),
        offset in 0..25usize,
        limit in 0..25usize,
    ) {
        let mut store = create_store();
        for (i, key) in keys.iter().enumerate() {
            store.set_cell("t", &format!("r{}", i), "k", *key);
        }
        let query = SortedRowIdsQuery::new("t").by("k");
        let all = store.get_sorted_row_ids(&query);
        let window = store.get_sorted_row_ids(&query.clone().offset(offset).limit(limit));
        let expected: Vec<String> = all.into_iter().skip(offset).take(limit).collect();
        prop_assert_eq!(window, expected);
    }

    /// Ids handed out by `add_row` never repeat.
    #[test]
    fn add_row_ids_unique(deletes in prop::collection::vec(any::<bool>(), 1..40)) {
        let mut store = create_store();
        let mut seen = BTreeSet::new();
        for delete in deletes {
            let row_id = store.add_row("t", tabula_store::row! { "c" => 1 }, false).unwrap();
            prop_assert!(seen.insert(row_id.clone()));
            if delete {
                store.del_row("t", &row_id);
            }
        }
    }
}

fn cell_paths_of(tables: &tabula_store::Tables) -> BTreeSet<(String, String, String)> {
    tables
        .iter()
        .flat_map(|(t, table)| {
            table.iter().flat_map(move |(r, row)| {
                row.keys().map(move |c| (t.clone(), r.clone(), c.clone()))
            })
        })
        .collect()
}
