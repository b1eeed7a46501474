use std::collections::BTreeMap;

use serde::Serialize;

use ctrlboard_core::{normalize_match, ColumnNames, RecordRef, Table};

/// Cross-table join key: (normalized organization, year).
///
/// Ordered by year first so reconciliation output reads chronologically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct JoinKey {
    pub year: i64,
    pub organization: String,
}

impl JoinKey {
    pub fn new(organization: &str, year: i64) -> Self {
        Self {
            year,
            organization: normalize_match(organization),
        }
    }

    /// Key of one record; `None` when the organization is blank or the year
    /// is not a whole number.
    pub fn of(record: &RecordRef<'_>, columns: &ColumnNames) -> Option<Self> {
        let year = record.get(&columns.year).as_whole()?;
        let organization = normalize_match(&record.text(&columns.organization));
        if organization.is_empty() {
            return None;
        }
        Some(Self { year, organization })
    }
}

/// Declared value per join key, taken from the first record of each key.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Declared {
    /// Display spelling of the first record.
    pub display_name: String,
    pub value: i64,
}

/// Largest declared total taken at face value. Anything beyond is a
/// corrupt cell and reads as 0.
const MAX_DECLARED_TOTAL: f64 = 1e12;

/// Collect `field` per join key from a plan-shaped table. Later records for
/// an existing key are ignored. Returns the map and the number of records
/// that had no usable key.
pub(crate) fn declared_by_key(
    plan: &Table,
    field: &str,
    columns: &ColumnNames,
) -> (BTreeMap<JoinKey, Declared>, usize) {
    if !plan.has_field(field) {
        log::warn!("{}: no '{field}' column, declared totals read as 0", plan.name());
    }
    let mut declared = BTreeMap::new();
    let mut unkeyed = 0;
    for record in plan.records() {
        let Some(key) = JoinKey::of(&record, columns) else {
            unkeyed += 1;
            continue;
        };
        declared.entry(key).or_insert_with(|| Declared {
            display_name: record.text(&columns.organization),
            value: declared_total(&record, field, plan.name()),
        });
    }
    if unkeyed > 0 {
        log::debug!("{}: {unkeyed} record(s) without organization or year", plan.name());
    }
    (declared, unkeyed)
}

fn declared_total(record: &RecordRef<'_>, field: &str, table: &str) -> i64 {
    match record.number(field) {
        Some(x) if x.abs() <= MAX_DECLARED_TOTAL => x.round() as i64,
        Some(x) => {
            log::warn!("{table}: row {}: '{field}' = {x} out of range, read as 0", record.index());
            0
        }
        None => 0,
    }
}

// ---------------------------------------------------------------------------
// Plan data-quality findings
// ---------------------------------------------------------------------------

/// A join key that occurs more than once in a plan-shaped table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanKeyDuplicate {
    pub table: String,
    /// Display spelling of the record that wins.
    pub organization: String,
    pub year: i64,
    pub occurrences: usize,
}

/// Join keys carried by more than one record. The first record of each
/// key is the one aggregation and reconciliation use.
pub fn find_duplicate_plan_keys(plan: &Table, columns: &ColumnNames) -> Vec<PlanKeyDuplicate> {
    let mut seen: BTreeMap<JoinKey, (String, usize)> = BTreeMap::new();
    for record in plan.records() {
        if let Some(key) = JoinKey::of(&record, columns) {
            seen.entry(key)
                .or_insert_with(|| (record.text(&columns.organization), 0))
                .1 += 1;
        }
    }

    let duplicates: Vec<PlanKeyDuplicate> = seen
        .into_iter()
        .filter(|(_, (_, n))| *n > 1)
        .map(|(key, (organization, occurrences))| PlanKeyDuplicate {
            table: plan.name().to_string(),
            organization,
            year: key.year,
            occurrences,
        })
        .collect();

    for d in &duplicates {
        log::warn!(
            "{}: {} appears {} times for {}; the first record wins",
            d.table,
            d.organization,
            d.occurrences,
            d.year
        );
    }
    duplicates
}
