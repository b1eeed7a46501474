// JSON import: an array of flat objects, one per record

use std::path::Path;

use ctrlboard_core::{RawTable, SchemaError, Value};

use crate::csv::read_file_as_utf8;
use crate::error::LoadError;

pub fn import(path: &Path, table: &str) -> Result<RawTable, LoadError> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, table)
}

/// Parse a JSON array of objects.
///
/// Strings go through the same cell parsing as CSV, so `"12"` and `12`
/// load alike. Nested values are kept as their JSON text.
pub fn import_from_string(content: &str, table: &str) -> Result<RawTable, LoadError> {
    let content = content.trim_start_matches('\u{feff}');
    let parsed: serde_json::Value = serde_json::from_str(content).map_err(|e| LoadError::Json {
        table: table.to_string(),
        message: e.to_string(),
    })?;

    let serde_json::Value::Array(items) = parsed else {
        return Err(SchemaError::NotTabular {
            table: table.to_string(),
            reason: "expected an array of records".into(),
        }
        .into());
    };

    let mut records: Vec<Vec<(String, Value)>> = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let serde_json::Value::Object(map) = item else {
            return Err(SchemaError::NotTabular {
                table: table.to_string(),
                reason: format!("record {i} is not an object"),
            }
            .into());
        };
        records.push(map.into_iter().map(|(k, v)| (k, to_cell(v))).collect());
    }

    Ok(RawTable::from_records(table, records)?)
}

fn to_cell(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Missing,
        serde_json::Value::Bool(b) => Value::Text(if b { "TRUE" } else { "FALSE" }.into()),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Missing),
        },
        serde_json::Value::String(s) => Value::from_cell(&s),
        nested => Value::Text(nested.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_become_rows() {
        let t = import_from_string(
            r#"[{"Institución":"A","Año":2025,"1Cumplimiento":40.5},
                {"Institución":"B","Año":"2024","1Cumplimiento":null}]"#,
            "PTAR",
        )
        .unwrap();
        assert_eq!(t.rows.len(), 2);
        let year = t.columns.iter().position(|c| c == "Año").unwrap();
        let pct = t.columns.iter().position(|c| c == "1Cumplimiento").unwrap();
        assert_eq!(t.rows[0][year], Value::Int(2025));
        assert_eq!(t.rows[0][pct], Value::Float(40.5));
        assert_eq!(t.rows[1][pct], Value::Missing);
    }

    #[test]
    fn empty_array_is_empty_table() {
        let t = import_from_string("[]", "PTAR").unwrap();
        assert!(t.columns.is_empty());
        assert!(t.rows.is_empty());
    }

    #[test]
    fn object_root_is_schema_error() {
        let err = import_from_string(r#"{"rows":[]}"#, "PTAR").unwrap_err();
        assert!(matches!(err, LoadError::Schema { ref table, .. } if table == "PTAR"));
    }

    #[test]
    fn mismatched_fields_are_schema_error() {
        let err = import_from_string(r#"[{"a":1},{"b":2}]"#, "X").unwrap_err();
        assert!(matches!(err, LoadError::Schema { source: SchemaError::NotTabular { .. }, .. }));
    }

    #[test]
    fn syntax_error_is_json_error() {
        let err = import_from_string("[{", "X").unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
    }

    #[test]
    fn bools_and_nested() {
        let t = import_from_string(r#"[{"ok":true,"tags":["a"]}]"#, "X").unwrap();
        let ok = t.columns.iter().position(|c| c == "ok").unwrap();
        let tags = t.columns.iter().position(|c| c == "tags").unwrap();
        assert_eq!(t.rows[0][ok], Value::Text("TRUE".into()));
        assert_eq!(t.rows[0][tags], Value::Text(r#"["a"]"#.into()));
    }
}
