use std::collections::HashSet;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::error::SchemaError;
use crate::value::Value;

static MISSING: Value = Value::Missing;

// ---------------------------------------------------------------------------
// RawTable
// ---------------------------------------------------------------------------

/// Table as handed over by a source: labels untrimmed, rows unchecked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Build from a list of records, each a list of (field, value) pairs.
    ///
    /// Every record must carry the same field set as the first one; field
    /// order may differ between records. Column order follows the first record.
    pub fn from_records(
        name: impl Into<String>,
        records: Vec<Vec<(String, Value)>>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let Some(first) = records.first() else {
            return Ok(Self::new(name, Vec::new(), Vec::new()));
        };

        let columns: Vec<String> = first.iter().map(|(k, _)| k.clone()).collect();
        let column_set: HashSet<&str> = columns.iter().map(String::as_str).collect();
        if column_set.len() != columns.len() {
            return Err(SchemaError::NotTabular {
                table: name,
                reason: "record 0 repeats a field".into(),
            });
        }

        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            let fields: HashSet<&str> = record.iter().map(|(k, _)| k.as_str()).collect();
            if fields != column_set || record.len() != columns.len() {
                return Err(SchemaError::NotTabular {
                    table: name,
                    reason: format!("record {i} does not share the fields of record 0"),
                });
            }
            let mut row = vec![Value::Missing; columns.len()];
            for (key, value) in record {
                if let Some(idx) = columns.iter().position(|c| *c == key) {
                    row[idx] = value;
                }
            }
            rows.push(row);
        }

        Ok(Self::new(name, columns, rows))
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Validated table: unique column labels, one cell per column in every row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn try_new(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    table: name,
                    column: column.clone(),
                });
            }
        }

        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(SchemaError::RaggedRow {
                table: name,
                row,
                expected: columns.len(),
                found: cells.len(),
            });
        }

        Ok(Self { name, columns, rows })
    }

    /// An empty table with no columns, used when an optional source is absent.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Capability query: does this table carry `name`?
    pub fn has_field(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn record(&self, index: usize) -> Option<RecordRef<'_>> {
        (index < self.rows.len()).then_some(RecordRef { table: self, index })
    }

    /// Records in original input order.
    pub fn records(&self) -> impl Iterator<Item = RecordRef<'_>> + '_ {
        (0..self.rows.len()).map(move |index| RecordRef { table: self, index })
    }

    pub fn into_raw(self) -> RawTable {
        RawTable {
            name: self.name,
            columns: self.columns,
            rows: self.rows,
        }
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let records: Vec<RecordRef<'_>> = self.records().collect();
        let mut s = serializer.serialize_struct("Table", 3)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("columns", &self.columns)?;
        s.serialize_field("records", &records)?;
        s.end()
    }
}

// ---------------------------------------------------------------------------
// RecordRef
// ---------------------------------------------------------------------------

/// Borrowed view of one row, addressed by field name.
#[derive(Debug, Clone, Copy)]
pub struct RecordRef<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RecordRef<'a> {
    /// Position of this record in its table.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.table.has_field(name)
    }

    /// Cell for `field`; an absent column reads as `Missing`.
    pub fn get(&self, field: &str) -> &'a Value {
        match self.table.column_index(field) {
            Some(col) => &self.table.rows[self.index][col],
            None => &MISSING,
        }
    }

    /// Stringified cell for display; absent or missing is "".
    pub fn text(&self, field: &str) -> String {
        self.get(field).to_text()
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).as_number()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        let table = self.table;
        let index = self.index;
        table
            .columns
            .iter()
            .zip(table.rows[index].iter())
            .map(|(c, v)| (c.as_str(), v))
    }
}

impl Serialize for RecordRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.columns.len()))?;
        for (field, value) in self.fields() {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = Table::try_new(
            "plan",
            cols(&["a", "b"]),
            vec![vec![Value::Int(1), Value::Int(2)], vec![Value::Int(3)]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::RaggedRow { table: "plan".into(), row: 1, expected: 2, found: 1 }
        );
    }

    #[test]
    fn duplicate_columns_rejected() {
        let err = Table::try_new("plan", cols(&["a", "a"]), vec![]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { .. }));
    }

    #[test]
    fn absent_field_reads_missing() {
        let t = Table::try_new("t", cols(&["a"]), vec![vec![Value::Int(1)]]).unwrap();
        let r = t.record(0).unwrap();
        assert!(t.has_field("a"));
        assert!(!t.has_field("b"));
        assert_eq!(r.get("a"), &Value::Int(1));
        assert_eq!(r.get("b"), &Value::Missing);
        assert_eq!(r.text("b"), "");
        assert!(t.record(1).is_none());
    }

    #[test]
    fn records_from_maps_align_columns() {
        let raw = RawTable::from_records(
            "detail",
            vec![
                vec![("x".into(), Value::Int(1)), ("y".into(), Value::from("a"))],
                vec![("y".into(), Value::from("b")), ("x".into(), Value::Int(2))],
            ],
        )
        .unwrap();
        assert_eq!(raw.columns, cols(&["x", "y"]));
        assert_eq!(raw.rows[1], vec![Value::Int(2), Value::from("b")]);
    }

    #[test]
    fn records_with_different_fields_rejected() {
        let err = RawTable::from_records(
            "detail",
            vec![
                vec![("x".into(), Value::Int(1))],
                vec![("z".into(), Value::Int(2))],
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::NotTabular { .. }));
    }

    #[test]
    fn record_serializes_as_map() {
        let t = Table::try_new("t", cols(&["org", "n"]), vec![vec![Value::from("A"), Value::Int(5)]])
            .unwrap();
        let json = serde_json::to_string(&t.record(0).unwrap()).unwrap();
        assert_eq!(json, r#"{"org":"A","n":5}"#);
    }
}
