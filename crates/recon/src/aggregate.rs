use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use ctrlboard_core::{FieldKind, FieldSpec, RecordRef};

use crate::scope::{ScopeMode, ScopeSelection};

/// Aggregated field value: counts are integers, percentages keep two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub const ZERO: Number = Number::Int(0);

    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(x) => *x,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            Number::Int(i) => *i,
            Number::Float(x) => x.round() as i64,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}

/// One value per declared field, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    values: Vec<(String, Number)>,
}

impl Aggregate {
    /// Value of `field`; undeclared fields read as zero.
    pub fn get(&self, field: &str) -> Number {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, n)| *n)
            .unwrap_or(Number::ZERO)
    }

    pub fn int(&self, field: &str) -> i64 {
        self.get(field).as_i64()
    }

    pub fn float(&self, field: &str) -> f64 {
        self.get(field).as_f64()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.iter().any(|(name, _)| name == field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Number)> + '_ {
        self.values.iter().map(|(name, n)| (name.as_str(), *n))
    }
}

impl Serialize for Aggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, n) in &self.values {
            map.serialize_entry(name, n)?;
        }
        map.end()
    }
}

/// Aggregate a resolved scope over the declared fields.
pub fn aggregate(scope: &ScopeSelection<'_>, fields: &[FieldSpec]) -> Aggregate {
    aggregate_records(scope.mode(), scope.records(), fields)
}

/// Aggregate arbitrary records.
///
/// ROLLUP sums SUM fields and averages MEAN fields over their numeric cells.
/// SINGLE reads the first record directly. In both modes a field with no
/// numeric input ends up as integer zero, and every declared field is present.
pub fn aggregate_records(mode: ScopeMode, records: &[RecordRef<'_>], fields: &[FieldSpec]) -> Aggregate {
    let values = fields
        .iter()
        .map(|spec| {
            let raw = match mode {
                ScopeMode::Rollup => combine(records, spec),
                ScopeMode::Single => records.first().and_then(|r| read(r, spec)),
            };
            (spec.name.clone(), finalize(raw, spec.kind))
        })
        .collect();
    Aggregate { values }
}

fn read(record: &RecordRef<'_>, spec: &FieldSpec) -> Option<f64> {
    if !record.has_field(&spec.name) {
        return None;
    }
    record.number(&spec.name)
}

fn combine(records: &[RecordRef<'_>], spec: &FieldSpec) -> Option<f64> {
    let numbers: Vec<f64> = records.iter().filter_map(|r| read(r, spec)).collect();
    if numbers.is_empty() {
        return None;
    }
    let total: f64 = numbers.iter().sum();
    match spec.kind {
        FieldKind::Sum => Some(total),
        FieldKind::Mean => Some(total / numbers.len() as f64),
    }
}

fn finalize(raw: Option<f64>, kind: FieldKind) -> Number {
    match (raw, kind) {
        (Some(x), FieldKind::Sum) => Number::Int(x.round() as i64),
        (Some(x), FieldKind::Mean) => Number::Float(round2(x)),
        (None, _) => Number::ZERO,
    }
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlboard_core::{ColumnNames, Table, Value};

    use crate::scope::{resolve_scope, Selection};

    fn plan() -> Table {
        Table::try_new(
            "PTAR",
            vec![
                "Institución".into(),
                "Sector".into(),
                "Año".into(),
                "AC_Total".into(),
                "1Cumplimiento".into(),
            ],
            vec![
                vec!["A".into(), "S1".into(), Value::Int(2025), Value::Int(5), Value::Float(80.0)],
                vec!["B".into(), "S1".into(), Value::Int(2025), "7".into(), "n/a".into()],
                vec!["C".into(), "S1".into(), Value::Int(2025), Value::Missing, Value::Float(65.567)],
                vec!["D".into(), "S2".into(), Value::Int(2025), Value::Float(2.6), Value::Missing],
            ],
        )
        .unwrap()
    }

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::sum("AC_Total"),
            FieldSpec::mean("1Cumplimiento"),
            FieldSpec::sum("Riesgos_Totales"),
            FieldSpec::mean("2Cumplimiento"),
        ]
    }

    #[test]
    fn rollup_sums_counts() {
        let t = plan();
        let scope = resolve_scope(&t, &Selection::sector("A", "S1", 2025), &ColumnNames::default());
        let agg = aggregate(&scope, &fields());
        assert_eq!(agg.get("AC_Total"), Number::Int(12));
    }

    #[test]
    fn rollup_mean_excludes_missing() {
        let t = plan();
        let scope = resolve_scope(&t, &Selection::sector("A", "S1", 2025), &ColumnNames::default());
        let agg = aggregate(&scope, &fields());
        // (80 + 65.567) / 2, "n/a" excluded
        assert_eq!(agg.get("1Cumplimiento"), Number::Float(72.78));
    }

    #[test]
    fn absent_fields_are_zero() {
        let t = plan();
        let scope = resolve_scope(&t, &Selection::sector("A", "S1", 2025), &ColumnNames::default());
        let agg = aggregate(&scope, &fields());
        assert_eq!(agg.get("Riesgos_Totales"), Number::Int(0));
        assert_eq!(agg.get("2Cumplimiento"), Number::Int(0));
        assert_eq!(agg.len(), 4);
    }

    #[test]
    fn single_reads_record_and_rounds_counts() {
        let t = plan();
        let scope = resolve_scope(&t, &Selection::organization("D", 2025), &ColumnNames::default());
        let agg = aggregate(&scope, &fields());
        assert_eq!(agg.get("AC_Total"), Number::Int(3));
        assert_eq!(agg.get("1Cumplimiento"), Number::Int(0));
    }

    #[test]
    fn single_keeps_two_decimals() {
        let t = plan();
        let scope = resolve_scope(&t, &Selection::organization("C", 2025), &ColumnNames::default());
        let agg = aggregate(&scope, &fields());
        assert_eq!(agg.get("1Cumplimiento"), Number::Float(65.57));
        assert_eq!(agg.get("AC_Total"), Number::Int(0));
    }

    #[test]
    fn empty_scope_is_all_zero() {
        let t = plan();
        let scope = resolve_scope(&t, &Selection::organization("Z", 2099), &ColumnNames::default());
        let agg = aggregate(&scope, &fields());
        assert_eq!(agg.len(), 4);
        assert!(agg.iter().all(|(_, n)| n == Number::Int(0)));
    }

    #[test]
    fn undeclared_field_reads_zero() {
        let agg = Aggregate::default();
        assert_eq!(agg.int("anything"), 0);
        assert!(!agg.contains("anything"));
    }

    #[test]
    fn serializes_in_declaration_order() {
        let t = plan();
        let scope = resolve_scope(&t, &Selection::organization("A", 2025), &ColumnNames::default());
        let agg = aggregate(&scope, &fields()[..2]);
        let json = serde_json::to_string(&agg).unwrap();
        assert_eq!(json, r#"{"AC_Total":5,"1Cumplimiento":80.0}"#);
    }
}
