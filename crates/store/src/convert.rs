//! JSON interchange.
//!
//! Content serializes as nested objects keyed by id, and `get_json` as the
//! two-element array `[tables, values]`. Parsing rejects malformed input and
//! input of the wrong shape before anything is written; the parsed content
//! then goes through the same validation as any other write.

use crate::store::Store;
use alloc::string::String;
use serde::Serialize;
use tabula_core::schema::{parse_schema_json, parse_tables_schema_json, parse_values_schema_json};
use tabula_core::Result;
use tabula_storage::{JsonTables, JsonValues};

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    // Content holds only string keys and finite scalars.
    serde_json::to_string(value).unwrap_or_default()
}

impl Store {
    pub fn get_tables_json(&self) -> String {
        to_json(self.content.tables())
    }

    pub fn get_values_json(&self) -> String {
        to_json(self.content.values())
    }

    /// Serializes `[tables, values]`.
    pub fn get_json(&self) -> String {
        to_json(&(self.content.tables(), self.content.values()))
    }

    /// Replaces all tables from JSON.
    ///
    /// Returns an error, writing nothing, if the input is not a JSON object of
    /// objects of objects. Cells that are not strings, finite numbers or
    /// booleans are recorded as invalid writes.
    pub fn set_tables_json(&mut self, json: &str) -> Result<&mut Self> {
        let tables: JsonTables = serde_json::from_str(json)?;
        self.write(|w| w.set_tables_from_json(tables));
        Ok(self)
    }

    /// Replaces all values from JSON.
    pub fn set_values_json(&mut self, json: &str) -> Result<&mut Self> {
        let values: JsonValues = serde_json::from_str(json)?;
        self.write(|w| w.set_values_from_json(values));
        Ok(self)
    }

    /// Replaces all tables and values from a `[tables, values]` JSON array,
    /// in one transaction.
    pub fn set_json(&mut self, json: &str) -> Result<&mut Self> {
        let (tables, values): (JsonTables, JsonValues) = serde_json::from_str(json)?;
        self.write(|w| {
            w.set_tables_from_json(tables);
            w.set_values_from_json(values);
        });
        Ok(self)
    }

    pub fn get_tables_schema_json(&self) -> String {
        self.schema.tables_schema_json()
    }

    pub fn get_values_schema_json(&self) -> String {
        self.schema.values_schema_json()
    }

    /// Serializes `[tablesSchema, valuesSchema]`.
    pub fn get_schema_json(&self) -> String {
        self.schema.schema_json()
    }

    /// Installs a tables schema from JSON. Entries with an unknown type are
    /// skipped.
    pub fn set_tables_schema_json(&mut self, json: &str) -> Result<&mut Self> {
        let schema = parse_tables_schema_json(json)?;
        Ok(self.set_tables_schema(schema))
    }

    pub fn set_values_schema_json(&mut self, json: &str) -> Result<&mut Self> {
        let schema = parse_values_schema_json(json)?;
        Ok(self.set_values_schema(schema))
    }

    /// Installs both schemas from a `[tablesSchema, valuesSchema]` JSON array.
    pub fn set_schema_json(&mut self, json: &str) -> Result<&mut Self> {
        let (tables_schema, values_schema) = parse_schema_json(json)?;
        Ok(self.set_schema(tables_schema, values_schema))
    }
}

#[cfg(test)]
mod tests {
    use crate::Store;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tabula_core::{tables, values, Error, Value};

    #[test]
    fn test_get_json() {
        let mut store = Store::new();
        store.set_content(
            tables! { "pets" => { "fido" => { "species" => "dog", "age" => 3, "weight" => 7.5 } } },
            values! { "open" => true },
        );
        assert_eq!(
            store.get_tables_json(),
            r#"{"pets":{"fido":{"species":"dog","age":3,"weight":7.5}}}"#
        );
        assert_eq!(store.get_values_json(), r#"{"open":true}"#);
        assert_eq!(
            store.get_json(),
            r#"[{"pets":{"fido":{"species":"dog","age":3,"weight":7.5}}},{"open":true}]"#
        );
    }

    #[test]
    fn test_empty_json() {
        let store = Store::new();
        assert_eq!(store.get_json(), "[{},{}]");
        assert_eq!(store.get_schema_json(), "[{},{}]");
    }

    #[test]
    fn test_set_json_round_trip() {
        let mut store = Store::new();
        store.set_content(
            tables! { "pets" => { "fido" => { "species" => "dog", "age" => 3 } } },
            values! { "open" => true, "rate" => 0.25 },
        );
        let json = store.get_json();
        store.set_json(&json).unwrap();
        assert_eq!(store.get_json(), json);

        let mut copy = Store::new();
        copy.set_json(&json).unwrap();
        assert_eq!(copy.get_content(), store.get_content());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let mut store = Store::new();
        store.set_cell("pets", "fido", "species", "dog");

        assert!(matches!(store.set_tables_json("{\"pets\":"), Err(Error::MalformedJson { .. })));
        assert!(matches!(store.set_tables_json("[1, 2]"), Err(Error::InvalidContent { .. })));
        assert!(matches!(store.set_json("{}"), Err(Error::InvalidContent { .. })));
        assert_eq!(store.get_cell("pets", "fido", "species"), Some(Value::from("dog")));
    }

    #[test]
    fn test_non_scalar_cells_recorded_invalid() {
        let invalid = Rc::new(RefCell::new(Vec::new()));
        let invalid_clone = invalid.clone();
        let mut store = Store::new();
        store.add_invalid_cell_listener(
            None,
            None,
            None,
            move |_, _, row_id, cell_id, values| {
                invalid_clone.borrow_mut().push((
                    row_id.map(String::from),
                    cell_id.map(String::from),
                    values.to_vec(),
                ));
            },
            false,
        );

        store
            .set_tables_json(r#"{"pets": {"fido": {"species": "dog", "tags": ["a"]}, "rex": {"owner": null}}}"#)
            .unwrap();

        assert_eq!(store.get_tables(), tables! { "pets" => { "fido" => { "species" => "dog" } } });
        assert_eq!(
            *invalid.borrow(),
            [
                (Some("fido".to_string()), Some("tags".to_string()), vec![serde_json::json!(["a"])]),
                (Some("rex".to_string()), Some("owner".to_string()), vec![serde_json::Value::Null]),
            ]
        );
    }

    #[test]
    fn test_schema_json() {
        let mut store = Store::new();
        store
            .set_schema_json(
                r#"[{"pets": {"species": {"type": "string"}, "sold": {"type": "boolean", "default": false}}}, {"open": {"type": "boolean", "default": true}}]"#,
            )
            .unwrap();

        assert_eq!(store.get_value("open"), Some(Value::from(true)));
        assert_eq!(
            store.get_tables_schema_json(),
            r#"{"pets":{"species":{"type":"string"},"sold":{"type":"boolean","default":false}}}"#
        );
        assert_eq!(store.get_values_schema_json(), r#"{"open":{"type":"boolean","default":true}}"#);

        store.set_tables_json(r#"{"pets": {"fido": {"species": "dog", "legs": 4}}}"#).unwrap();
        assert_eq!(
            store.get_tables(),
            tables! { "pets" => { "fido" => { "species" => "dog", "sold" => false } } }
        );
    }

    #[test]
    fn test_schema_json_errors() {
        let mut store = Store::new();
        assert!(matches!(store.set_values_schema_json("nope"), Err(Error::MalformedJson { .. })));
        assert!(matches!(store.set_tables_schema_json("[]"), Err(Error::InvalidContent { .. })));
        assert!(!store.has_tables_schema());
    }
}
