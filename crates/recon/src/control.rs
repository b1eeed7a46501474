//! Control-action reconciliation: plan declared totals against the
//! control-action detail log.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use ctrlboard_core::{ColumnNames, Table};

use crate::evidence::{compute_summary, ReconOutcome, ReconSummary, Unattributed};
use crate::keys::{declared_by_key, JoinKey};

/// One join key of the control-action reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlReconRow {
    pub year: i64,
    /// Join-key form of the organization name.
    pub organization: String,
    /// First spelling seen, plan before detail.
    pub display_name: String,
    pub declared_total: i64,
    pub observed_raw: i64,
    /// `declared_total - observed_raw`.
    pub difference: i64,
    pub has_duplicates: bool,
    pub duplicate_count: i64,
    pub deduplicated_count: i64,
    /// `declared_total == deduplicated_count`.
    pub matches: bool,
    pub in_plan: bool,
    pub in_detail: bool,
}

impl ReconOutcome for ControlReconRow {
    fn matches(&self) -> bool {
        self.matches
    }
    fn in_plan(&self) -> bool {
        self.in_plan
    }
    fn in_detail(&self) -> bool {
        self.in_detail
    }
    fn has_duplicates(&self) -> bool {
        self.has_duplicates
    }
}

/// An action key repeated under one join key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateEntry {
    pub organization: String,
    pub year: i64,
    pub action_key: String,
    /// Occurrences beyond the first.
    pub excess_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControlReconciliation {
    pub rows: Vec<ControlReconRow>,
    pub duplicates: Vec<DuplicateEntry>,
    pub summary: ReconSummary,
    pub unattributed: Unattributed,
}

#[derive(Debug, Default)]
struct DetailTally {
    display_name: String,
    raw: i64,
    /// Occurrences per non-blank action key.
    keys: BTreeMap<String, i64>,
}

/// Reconcile plan control totals against the action detail log.
///
/// Outer join on (normalized organization, year). A key present on one side
/// only gets zero counts on the other. When the detail log has no action-key
/// column, every row counts as distinct.
pub fn reconcile_controls(plan: &Table, detail: &Table, columns: &ColumnNames) -> ControlReconciliation {
    let (declared, plan_unkeyed) = declared_by_key(plan, &columns.control_total, columns);

    let has_action_key = detail.has_field(&columns.control_key);
    if !has_action_key {
        log::warn!(
            "{}: no '{}' column, duplicate detection disabled",
            detail.name(),
            columns.control_key
        );
    }

    let mut observed: BTreeMap<JoinKey, DetailTally> = BTreeMap::new();
    let mut detail_unkeyed = 0;
    for record in detail.records() {
        let Some(key) = JoinKey::of(&record, columns) else {
            detail_unkeyed += 1;
            continue;
        };
        let tally = observed.entry(key).or_insert_with(|| DetailTally {
            display_name: record.text(&columns.organization),
            ..DetailTally::default()
        });
        tally.raw += 1;
        if has_action_key {
            let action = record.text(&columns.control_key).trim().to_string();
            if !action.is_empty() {
                *tally.keys.entry(action).or_insert(0) += 1;
            }
        }
    }
    if detail_unkeyed > 0 {
        log::warn!(
            "{}: {detail_unkeyed} row(s) without organization or year left out of reconciliation",
            detail.name()
        );
    }

    let all_keys: BTreeSet<&JoinKey> = declared.keys().chain(observed.keys()).collect();
    let mut rows = Vec::with_capacity(all_keys.len());
    let mut duplicates = Vec::new();

    for key in all_keys {
        let plan_side = declared.get(key);
        let detail_side = observed.get(key);

        let declared_total = plan_side.map(|d| d.value).unwrap_or(0);
        let observed_raw = detail_side.map(|t| t.raw).unwrap_or(0);
        let (deduplicated_count, duplicate_count) = match detail_side {
            Some(t) if has_action_key => {
                let excess: i64 = t.keys.values().map(|n| n - 1).sum();
                (t.keys.len() as i64, excess)
            }
            Some(t) => (t.raw, 0),
            None => (0, 0),
        };

        if let Some(t) = detail_side {
            duplicates.extend(t.keys.iter().filter(|(_, n)| **n > 1).map(|(action, n)| DuplicateEntry {
                organization: key.organization.clone(),
                year: key.year,
                action_key: action.clone(),
                excess_count: n - 1,
            }));
        }

        let display_name = plan_side
            .map(|d| d.display_name.clone())
            .or_else(|| detail_side.map(|t| t.display_name.clone()))
            .unwrap_or_default();

        rows.push(ControlReconRow {
            year: key.year,
            organization: key.organization.clone(),
            display_name,
            declared_total,
            observed_raw,
            difference: declared_total.saturating_sub(observed_raw),
            has_duplicates: duplicate_count > 0,
            duplicate_count,
            deduplicated_count,
            matches: declared_total == deduplicated_count,
            in_plan: plan_side.is_some(),
            in_detail: detail_side.is_some(),
        });
    }

    let summary = compute_summary(&rows);
    log::info!(
        "control actions: {} key(s), {} mismatched, {} with duplicates",
        summary.total_keys,
        summary.mismatched,
        summary.with_duplicates
    );

    ControlReconciliation {
        rows,
        duplicates,
        summary,
        unattributed: Unattributed {
            plan: plan_unkeyed,
            detail: detail_unkeyed,
        },
    }
}
