//! Improvement-action reconciliation: the updated program total declared in
//! the improvement plan against the closing-quarter rows of the detail log.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use ctrlboard_core::{ColumnNames, Table, Value};

use crate::evidence::{compute_summary, ReconOutcome, ReconSummary, Unattributed};
use crate::keys::{declared_by_key, JoinKey};

/// Only rows reported in this quarter are counted.
pub const CLOSING_QUARTER: i64 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImprovementReconRow {
    pub year: i64,
    pub organization: String,
    pub display_name: String,
    pub declared_total: i64,
    pub observed_q4: i64,
    pub difference: i64,
    pub matches: bool,
    pub in_plan: bool,
    pub in_detail: bool,
}

impl ReconOutcome for ImprovementReconRow {
    fn matches(&self) -> bool {
        self.matches
    }
    fn in_plan(&self) -> bool {
        self.in_plan
    }
    fn in_detail(&self) -> bool {
        self.in_detail
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImprovementReconciliation {
    pub rows: Vec<ImprovementReconRow>,
    pub summary: ReconSummary,
    pub unattributed: Unattributed,
}

/// Quarter number of a cell: `4`, `4.0`, `"4"`, `"T4"`, `"4T"`.
pub fn quarter_of(cell: &Value) -> Option<i64> {
    if let Some(q) = cell.as_whole() {
        return Some(q);
    }
    let text = cell.as_str()?.trim();
    let digits = text.trim_matches(|c: char| c.is_alphabetic() || c.is_whitespace());
    digits.parse().ok()
}

/// Reconcile improvement-plan totals against closing-quarter detail rows.
///
/// No deduplication: every closing-quarter row counts once. A detail log
/// without a quarter column contributes nothing.
pub fn reconcile_improvements(
    plan: &Table,
    detail: &Table,
    columns: &ColumnNames,
) -> ImprovementReconciliation {
    let (declared, plan_unkeyed) = declared_by_key(plan, &columns.improvement_updated_total, columns);

    let has_quarter = detail.has_field(&columns.quarter);
    if !has_quarter {
        log::warn!(
            "{}: no '{}' column, no rows counted for quarter {CLOSING_QUARTER}",
            detail.name(),
            columns.quarter
        );
    }

    let mut observed: BTreeMap<JoinKey, (String, i64)> = BTreeMap::new();
    let mut detail_unkeyed = 0;
    for record in detail.records() {
        let Some(key) = JoinKey::of(&record, columns) else {
            detail_unkeyed += 1;
            continue;
        };
        if quarter_of(record.get(&columns.quarter)) != Some(CLOSING_QUARTER) {
            continue;
        }
        observed
            .entry(key)
            .or_insert_with(|| (record.text(&columns.organization), 0))
            .1 += 1;
    }
    if detail_unkeyed > 0 {
        log::warn!(
            "{}: {detail_unkeyed} row(s) without organization or year left out of reconciliation",
            detail.name()
        );
    }

    let all_keys: BTreeSet<&JoinKey> = declared.keys().chain(observed.keys()).collect();
    let rows: Vec<ImprovementReconRow> = all_keys
        .into_iter()
        .map(|key| {
            let plan_side = declared.get(key);
            let detail_side = observed.get(key);
            let declared_total = plan_side.map(|d| d.value).unwrap_or(0);
            let observed_q4 = detail_side.map(|(_, n)| *n).unwrap_or(0);
            let difference = declared_total.saturating_sub(observed_q4);
            ImprovementReconRow {
                year: key.year,
                organization: key.organization.clone(),
                display_name: plan_side
                    .map(|d| d.display_name.clone())
                    .or_else(|| detail_side.map(|(name, _)| name.clone()))
                    .unwrap_or_default(),
                declared_total,
                observed_q4,
                difference,
                matches: difference == 0,
                in_plan: plan_side.is_some(),
                in_detail: detail_side.is_some(),
            }
        })
        .collect();

    let summary = compute_summary(&rows);
    log::info!(
        "improvement actions: {} key(s), {} mismatched",
        summary.total_keys,
        summary.mismatched
    );

    ImprovementReconciliation {
        rows,
        summary,
        unattributed: Unattributed {
            plan: plan_unkeyed,
            detail: detail_unkeyed,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> Table {
        Table::try_new(
            "PTCI",
            vec!["Institución".into(), "Año".into(), "AM_Total".into(), "AM_Total_Actualizado".into()],
            vec![
                vec!["A".into(), Value::Int(2025), Value::Int(9), Value::Int(3)],
                vec!["B".into(), Value::Int(2025), Value::Int(2), Value::Int(2)],
            ],
        )
        .unwrap()
    }

    fn detail() -> Table {
        Table::try_new(
            "AMTRI",
            vec!["Institución".into(), "Año".into(), "Trimestre".into(), "AM".into()],
            vec![
                vec!["A".into(), Value::Int(2025), Value::Int(4), "1".into()],
                vec!["A".into(), Value::Int(2025), "4".into(), "1".into()],
                vec!["a ".into(), Value::Int(2025), "T4".into(), "2".into()],
                vec!["A".into(), Value::Int(2025), Value::Int(3), "3".into()],
                vec!["B".into(), Value::Int(2025), Value::Int(2), "1".into()],
                vec!["C".into(), Value::Int(2025), Value::Int(4), "1".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn counts_closing_quarter_without_dedup() {
        let r = reconcile_improvements(&plan(), &detail(), &ColumnNames::default());
        let a = &r.rows[0];
        assert_eq!(a.organization, "a");
        assert_eq!((a.declared_total, a.observed_q4, a.difference, a.matches), (3, 3, 0, true));
    }

    #[test]
    fn plan_key_without_q4_rows_is_plan_only() {
        let r = reconcile_improvements(&plan(), &detail(), &ColumnNames::default());
        let b = &r.rows[1];
        assert_eq!((b.declared_total, b.observed_q4, b.difference), (2, 0, 2));
        assert!(b.in_plan && !b.in_detail && !b.matches);
    }

    #[test]
    fn absurd_updated_total_reads_zero() {
        let plan = Table::try_new(
            "PTCI",
            vec!["Institución".into(), "Año".into(), "AM_Total_Actualizado".into()],
            vec![vec!["A".into(), Value::Int(2025), "-1e30".into()]],
        )
        .unwrap();
        let detail = Table::try_new(
            "AMTRI",
            vec!["Institución".into(), "Año".into(), "Trimestre".into(), "AM".into()],
            vec![vec!["A".into(), Value::Int(2025), Value::Int(4), "1".into()]],
        )
        .unwrap();
        let r = reconcile_improvements(&plan, &detail, &ColumnNames::default());
        let a = &r.rows[0];
        assert_eq!((a.declared_total, a.observed_q4, a.difference, a.matches), (0, 1, -1, false));
    }

    #[test]
    fn detail_only_key_appears_once() {
        let r = reconcile_improvements(&plan(), &detail(), &ColumnNames::default());
        assert_eq!(r.rows.len(), 3);
        let c = &r.rows[2];
        assert_eq!((c.declared_total, c.observed_q4, c.difference), (0, 1, -1));
        assert_eq!(r.summary.detail_only, 1);
        assert_eq!(r.summary.plan_only, 1);
        assert_eq!(r.summary.matched, 1);
    }

    #[test]
    fn quarter_forms() {
        assert_eq!(quarter_of(&Value::Int(4)), Some(4));
        assert_eq!(quarter_of(&Value::Float(4.0)), Some(4));
        assert_eq!(quarter_of(&Value::from("T4")), Some(4));
        assert_eq!(quarter_of(&Value::from(" 4T ")), Some(4));
        assert_eq!(quarter_of(&Value::from("cuarto")), None);
        assert_eq!(quarter_of(&Value::Missing), None);
    }

    #[test]
    fn missing_quarter_column_counts_nothing() {
        let d = Table::try_new(
            "AMTRI",
            vec!["Institución".into(), "Año".into()],
            vec![vec!["A".into(), Value::Int(2025)]],
        )
        .unwrap();
        let r = reconcile_improvements(&plan(), &d, &ColumnNames::default());
        assert!(r.rows.iter().all(|row| row.observed_q4 == 0));
        assert_eq!(r.rows.len(), 2);
    }
}
