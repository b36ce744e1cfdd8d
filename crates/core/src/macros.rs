//! Literal constructors for content containers.

/// Builds a [`Row`](crate::Row) from `cell_id => value` pairs.
///
/// ```rust
/// use tabula_core::{row, Value};
///
/// let row = row! { "species" => "cat", "legs" => 4, "sold" => false };
/// assert_eq!(row.len(), 3);
/// assert_eq!(row["legs"], Value::from(4));
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::Row::default()
    };
    ($($cell_id:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::Row::default();
        $(
            row.insert($crate::__private::String::from($cell_id), $crate::Value::from($value));
        )+
        row
    }};
}

/// Builds a [`Table`](crate::Table) from `row_id => { cells }` entries.
#[macro_export]
macro_rules! table {
    () => {
        $crate::Table::default()
    };
    ($($row_id:expr => { $($cells:tt)* }),+ $(,)?) => {{
        let mut table = $crate::Table::default();
        $(
            table.insert($crate::__private::String::from($row_id), $crate::row! { $($cells)* });
        )+
        table
    }};
}

/// Builds [`Tables`](crate::Tables) from `table_id => { rows }` entries.
///
/// ```rust
/// use tabula_core::tables;
///
/// let tables = tables! {
///     "pets" => {
///         "fido" => { "species" => "dog" },
///         "felix" => { "species" => "cat", "age" => 3 },
///     },
/// };
/// assert_eq!(tables["pets"].len(), 2);
/// ```
#[macro_export]
macro_rules! tables {
    () => {
        $crate::Tables::default()
    };
    ($($table_id:expr => { $($rows:tt)* }),+ $(,)?) => {{
        let mut tables = $crate::Tables::default();
        $(
            tables.insert($crate::__private::String::from($table_id), $crate::table! { $($rows)* });
        )+
        tables
    }};
}

/// Builds [`Values`](crate::Values) from `value_id => value` pairs.
#[macro_export]
macro_rules! values {
    () => {
        $crate::Values::default()
    };
    ($($value_id:expr => $value:expr),+ $(,)?) => {{
        let mut values = $crate::Values::default();
        $(
            values.insert($crate::__private::String::from($value_id), $crate::Value::from($value));
        )+
        values
    }};
}

#[cfg(test)]
mod tests {
    use crate::Value;

    #[test]
    fn test_row_macro_keeps_order() {
        let row = row! { "b" => 1, "a" => "x", "c" => true };
        let ids: alloc::vec::Vec<&str> = row.keys().map(|k| k.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
        assert_eq!(row["c"], Value::Boolean(true));
    }

    #[test]
    fn test_nested_macros() {
        let tables = tables! {
            "pets" => { "fido" => { "species" => "dog" } },
            "owners" => {},
        };
        assert_eq!(tables.len(), 2);
        assert_eq!(tables["pets"]["fido"]["species"], Value::from("dog"));
        assert!(tables["owners"].is_empty());
    }

    #[test]
    fn test_values_macro() {
        let values = values! { "open" => true, "employees" => 3 };
        assert_eq!(values["employees"], Value::Number(3.0));
        assert!(values! {}.is_empty());
    }
}
