use serde::Serialize;

use ctrlboard_core::{normalize_display, ColumnNames, RawTable, SchemaError, Table, Value};

/// What cleaning did to one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    pub rows_in: usize,
    pub rows_out: usize,
    /// Rows whose year cell repeated the column label.
    pub header_rows_dropped: usize,
    /// Year cells that could not be read as a whole number.
    pub unparsable_years: usize,
}

/// Clean a table using the default column labels.
pub fn clean(raw: RawTable) -> Result<Table, SchemaError> {
    clean_with(raw, &ColumnNames::default()).map(|(table, _)| table)
}

/// Validate shape and coerce identity columns.
///
/// - column labels are trimmed
/// - rows repeating the year label are dropped; remaining years become
///   integers or `Missing`
/// - organization and sector cells are stringified and trimmed
///
/// Missing columns are fine. Only a non-tabular input is an error.
pub fn clean_with(raw: RawTable, columns: &ColumnNames) -> Result<(Table, CleanStats), SchemaError> {
    let RawTable { name, columns: labels, rows } = raw;
    let labels: Vec<String> = labels.iter().map(|c| c.trim().to_string()).collect();

    // Shape check before touching any cell.
    let table = Table::try_new(name, labels, rows)?;
    let year_idx = table.column_index(&columns.year);
    let org_idx = table.column_index(&columns.organization);
    let sector_idx = table.column_index(&columns.sector);

    let RawTable { name, columns: labels, rows } = table.into_raw();
    let mut stats = CleanStats {
        rows_in: rows.len(),
        ..CleanStats::default()
    };

    let mut cleaned = Vec::with_capacity(rows.len());
    for mut row in rows {
        if let Some(idx) = year_idx {
            if is_header_echo(&row[idx], &columns.year) {
                stats.header_rows_dropped += 1;
                continue;
            }
            row[idx] = coerce_year(&row[idx]);
            if row[idx].is_missing() {
                stats.unparsable_years += 1;
            }
        }
        for idx in [org_idx, sector_idx].into_iter().flatten() {
            row[idx] = coerce_identifier(&row[idx]);
        }
        cleaned.push(row);
    }
    stats.rows_out = cleaned.len();

    if stats.header_rows_dropped > 0 {
        log::debug!("{name}: dropped {} repeated header row(s)", stats.header_rows_dropped);
    }
    if stats.unparsable_years > 0 {
        log::debug!("{name}: {} row(s) without a readable year", stats.unparsable_years);
    }

    let table = Table::try_new(name, labels, cleaned)?;
    Ok((table, stats))
}

fn is_header_echo(cell: &Value, label: &str) -> bool {
    matches!(cell, Value::Text(s) if s.trim() == label)
}

fn coerce_year(cell: &Value) -> Value {
    match cell.as_whole() {
        Some(year) => Value::Int(year),
        None => Value::Missing,
    }
}

fn coerce_identifier(cell: &Value) -> Value {
    match cell {
        Value::Missing => Value::Missing,
        other => Value::Text(normalize_display(&other.to_text())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(columns: &[&str], rows: Vec<Vec<Value>>) -> RawTable {
        RawTable::new("PTAR", columns.iter().map(|s| s.to_string()).collect(), rows)
    }

    #[test]
    fn strips_column_labels() {
        let t = clean(raw(&[" Institución ", "AC_Total  "], vec![])).unwrap();
        assert_eq!(t.columns(), ["Institución", "AC_Total"]);
    }

    #[test]
    fn drops_repeated_header_rows() {
        let (t, stats) = clean_with(
            raw(
                &["Institución", "Año"],
                vec![
                    vec!["A".into(), "2025".into()],
                    vec!["Institución".into(), "Año".into()],
                    vec!["B".into(), Value::Int(2024)],
                ],
            ),
            &ColumnNames::default(),
        )
        .unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(stats.header_rows_dropped, 1);
        assert_eq!(t.record(0).unwrap().get("Año"), &Value::Int(2025));
        assert_eq!(t.record(1).unwrap().get("Año"), &Value::Int(2024));
    }

    #[test]
    fn unparsable_year_becomes_missing_not_dropped() {
        let (t, stats) = clean_with(
            raw(&["Año"], vec![vec!["s/f".into()], vec![Value::Missing], vec![Value::Float(2025.5)]]),
            &ColumnNames::default(),
        )
        .unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(stats.unparsable_years, 3);
        assert!(t.records().all(|r| r.get("Año").is_missing()));
    }

    #[test]
    fn trims_and_stringifies_identifiers() {
        let t = clean(raw(
            &["Institución", "Sector"],
            vec![vec!["  Secretaría X ".into(), Value::Int(12)], vec![Value::Missing, " Salud".into()]],
        ))
        .unwrap();
        let r0 = t.record(0).unwrap();
        assert_eq!(r0.get("Institución"), &Value::from("Secretaría X"));
        assert_eq!(r0.get("Sector"), &Value::from("12"));
        assert_eq!(t.record(1).unwrap().get("Institución"), &Value::Missing);
    }

    #[test]
    fn missing_columns_are_not_errors() {
        let t = clean(raw(&["Otro"], vec![vec![Value::Int(1)]])).unwrap();
        assert_eq!(t.len(), 1);
        assert!(!t.has_field("Año"));
    }

    #[test]
    fn ragged_input_is_a_schema_error() {
        let err = clean(raw(&["a", "b"], vec![vec![Value::Int(1)]])).unwrap_err();
        assert!(matches!(err, SchemaError::RaggedRow { row: 0, .. }));
    }

    #[test]
    fn labels_colliding_after_trim_are_a_schema_error() {
        let err = clean(raw(&["Año", " Año"], vec![])).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { .. }));
    }

    #[test]
    fn custom_year_label() {
        let cols = ColumnNames {
            year: "Ejercicio".into(),
            ..ColumnNames::default()
        };
        let (t, stats) = clean_with(
            raw(&["Ejercicio"], vec![vec!["Ejercicio".into()], vec!["2023".into()]]),
            &cols,
        )
        .unwrap();
        assert_eq!(stats.header_rows_dropped, 1);
        assert_eq!(t.record(0).unwrap().get("Ejercicio"), &Value::Int(2023));
    }

    #[test]
    fn idempotent_on_sample() {
        let input = raw(
            &[" Institución", "Sector ", "Año", "AC_Total"],
            vec![
                vec![" A ".into(), "S1".into(), "2025".into(), "5".into()],
                vec!["Institución".into(), "Sector".into(), "Año".into(), "AC_Total".into()],
                vec!["B".into(), Value::Missing, "x".into(), Value::Int(7)],
            ],
        );
        let once = clean(input).unwrap();
        let twice = clean(once.clone().into_raw()).unwrap();
        assert_eq!(once, twice);
    }
}
