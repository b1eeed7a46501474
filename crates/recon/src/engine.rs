use std::collections::BTreeMap;

use ctrlboard_core::fields::{
    detail_progress_fields, improvement_plan_fields, plan_fields, quarter_field, QuarterStatus, QUADRANTS, QUARTERS,
    RISK_CATEGORIES, STRATEGIES,
};
use ctrlboard_core::{ColumnNames, RecordRef, Value};

use crate::aggregate::{aggregate, aggregate_records, round2, Aggregate, Number};
use crate::control::reconcile_controls;
use crate::crosswalk::audit_crosswalk;
use crate::improvement::{quarter_of, reconcile_improvements};
use crate::keys::find_duplicate_plan_keys;
use crate::model::{
    CategoryCount, ChartPoint, ControlActionRow, ControlListing, Dashboard, Header, ImprovementActionRow,
    ImprovementListing, Kpis, QuarterlyRow, ReconReport, RunMeta, Snapshot,
};
use crate::scope::{resolve_scope, select_detail, ScopeMode, ScopeSelection, Selection};

/// Build the dashboard for one selection.
///
/// An empty scope is a valid result: `has_data` is false and every declared
/// field reads zero.
pub fn run(snapshot: &Snapshot, selection: &Selection, columns: &ColumnNames) -> Dashboard {
    let scope = resolve_scope(&snapshot.plan, selection, columns);
    let improvement_scope = resolve_scope(&snapshot.improvement_plan, selection, columns);

    let plan = aggregate(&scope, &plan_fields(columns));
    let improvement_plan = aggregate(&improvement_scope, &improvement_plan_fields(columns));

    if scope.is_empty() {
        log::info!(
            "no plan data for {} / {} in {}",
            selection.organization,
            selection.sector.as_deref().unwrap_or("all sectors"),
            selection.year
        );
    }

    let organizations = scope.organizations(columns);
    let header = header(selection, &scope, &organizations, columns);

    let kpis = Kpis {
        control_total: plan.int(&columns.control_total),
        risk_total: plan.int(&columns.risk_total),
        improvement_total: improvement_plan.int(&columns.improvement_total),
    };

    let control_rows = select_detail(&snapshot.action_detail, selection, &scope, columns);
    let improvement_rows = select_detail(&snapshot.improvement_detail, selection, &improvement_scope, columns);

    Dashboard {
        meta: RunMeta::now(snapshot),
        selection: selection.clone(),
        mode: scope.mode(),
        has_data: !scope.is_empty(),
        organizations,
        header,
        risk_categories: categories(&plan, &RISK_CATEGORIES),
        quadrants: categories(&plan, &QUADRANTS),
        strategies: categories(&plan, &STRATEGIES),
        quarterly: quarterly(&plan),
        improvement_quarterly: quarterly(&improvement_plan),
        chart: chart(&plan),
        control_actions: control_listing(&control_rows, kpis.control_total, columns),
        improvement_actions: improvement_listing(&improvement_rows, columns),
        ignored_plan_records: scope.ignored_duplicates(),
        kpis,
        plan,
        improvement_plan,
    }
}

/// Reconcile both plan/detail pairs and audit the crosswalk when loaded.
pub fn reconcile_all(snapshot: &Snapshot, columns: &ColumnNames) -> ReconReport {
    let mut plan_duplicates = find_duplicate_plan_keys(&snapshot.plan, columns);
    plan_duplicates.extend(find_duplicate_plan_keys(&snapshot.improvement_plan, columns));

    ReconReport {
        meta: RunMeta::now(snapshot),
        control: reconcile_controls(&snapshot.plan, &snapshot.action_detail, columns),
        improvement: reconcile_improvements(&snapshot.improvement_plan, &snapshot.improvement_detail, columns),
        plan_duplicates,
        crosswalk: snapshot
            .crosswalk
            .as_ref()
            .map(|crosswalk| audit_crosswalk(crosswalk, &snapshot.plan, columns)),
    }
}

/// Progress cell for display: two decimals and `%`, blank when not numeric.
pub fn format_progress(cell: &Value) -> String {
    match cell.as_number() {
        Some(x) => format!("{:.2}%", round2(x)),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Dashboard pieces
// ---------------------------------------------------------------------------

fn header(
    selection: &Selection,
    scope: &ScopeSelection<'_>,
    organizations: &[String],
    columns: &ColumnNames,
) -> Header {
    match &selection.sector {
        Some(sector) => Header::Sector {
            sector: sector.trim().to_string(),
            organizations: organizations.to_vec(),
        },
        None => {
            let first = scope.records().first();
            let text = |field: &str| first.map(|r| r.text(field).trim().to_string()).unwrap_or_default();
            Header::Organization {
                organization: selection.organization.trim().to_string(),
                sector: text(&columns.sector),
                acronym: text(&columns.acronym),
            }
        }
    }
}

fn categories(agg: &Aggregate, labels: &[&str]) -> Vec<CategoryCount> {
    labels
        .iter()
        .map(|label| CategoryCount {
            label: label.to_string(),
            value: agg.int(label),
        })
        .collect()
}

fn quarterly(agg: &Aggregate) -> Vec<QuarterlyRow> {
    QuarterStatus::ALL
        .into_iter()
        .map(|status| QuarterlyRow {
            status,
            label: status.label().to_string(),
            values: QUARTERS.map(|q| agg.get(&quarter_field(q, status))),
        })
        .collect()
}

fn chart(agg: &Aggregate) -> Vec<ChartPoint> {
    QUARTERS
        .into_iter()
        .flat_map(|quarter| {
            QuarterStatus::ALL.into_iter().map(move |status| ChartPoint {
                quarter,
                status,
                value: agg.get(&quarter_field(quarter, status)),
            })
        })
        .collect()
}

fn average_progress(records: &[RecordRef<'_>], columns: &ColumnNames) -> (Number, Number) {
    let averages = aggregate_records(ScopeMode::Rollup, records, &detail_progress_fields(columns));
    (
        averages.get(&columns.entity_progress),
        averages.get(&columns.oversight_progress),
    )
}

fn cell(record: &RecordRef<'_>, field: &str) -> String {
    record.text(field).trim().to_string()
}

fn control_listing(records: &[RecordRef<'_>], declared_total: i64, columns: &ColumnNames) -> ControlListing {
    let rows: Vec<ControlActionRow> = records
        .iter()
        .map(|r| ControlActionRow {
            year: r.get(&columns.year).as_whole(),
            acronym: cell(r, &columns.acronym),
            risk: cell(r, &columns.risk_id),
            risk_description: cell(r, &columns.risk_description),
            action_key: cell(r, &columns.control_key),
            description: cell(r, &columns.description),
            entity_progress: format_progress(r.get(&columns.entity_progress)),
            oversight_progress: format_progress(r.get(&columns.oversight_progress)),
        })
        .collect();

    let count_mismatch = declared_total != rows.len() as i64;
    if count_mismatch {
        log::warn!(
            "declared control total {declared_total} differs from {} listed action(s)",
            rows.len()
        );
    }
    let (average_entity_progress, average_oversight_progress) = average_progress(records, columns);

    ControlListing {
        rows,
        declared_total,
        count_mismatch,
        average_entity_progress,
        average_oversight_progress,
    }
}

/// Tally label for a blank classification cell.
const BLANK: &str = "(blank)";

fn improvement_listing(records: &[RecordRef<'_>], columns: &ColumnNames) -> ImprovementListing {
    let mut located: BTreeMap<String, usize> = BTreeMap::new();
    let mut sufficiency: BTreeMap<String, usize> = BTreeMap::new();
    let tally = |map: &mut BTreeMap<String, usize>, value: &str| {
        let key = if value.is_empty() { BLANK } else { value };
        *map.entry(key.to_string()).or_insert(0) += 1;
    };

    let rows: Vec<ImprovementActionRow> = records
        .iter()
        .map(|r| {
            let row = ImprovementActionRow {
                year: r.get(&columns.year).as_whole(),
                quarter: quarter_of(r.get(&columns.quarter)),
                acronym: cell(r, &columns.acronym),
                action_key: cell(r, &columns.improvement_key),
                description: cell(r, &columns.description),
                located: cell(r, &columns.located),
                sufficiency: cell(r, &columns.sufficiency),
                entity_progress: format_progress(r.get(&columns.entity_progress)),
                oversight_progress: format_progress(r.get(&columns.oversight_progress)),
            };
            tally(&mut located, &row.located);
            tally(&mut sufficiency, &row.sufficiency);
            row
        })
        .collect();

    let (average_entity_progress, average_oversight_progress) = average_progress(records, columns);

    ImprovementListing {
        rows,
        located,
        sufficiency,
        average_entity_progress,
        average_oversight_progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlboard_core::Table;

    fn snapshot() -> Snapshot {
        let plan = Table::try_new(
            "PTAR",
            vec![
                "Institución".into(),
                "Sector".into(),
                "Año".into(),
                "Siglas".into(),
                "AC_Total".into(),
                "Riesgos_Totales".into(),
                "Imagen".into(),
                "1Concluidas".into(),
                "1Cumplimiento".into(),
            ],
            vec![
                vec![
                    "A".into(),
                    "S1".into(),
                    Value::Int(2025),
                    "AA".into(),
                    Value::Int(2),
                    Value::Int(3),
                    Value::Int(1),
                    Value::Int(4),
                    Value::Float(50.0),
                ],
                vec![
                    "B".into(),
                    "S1".into(),
                    Value::Int(2025),
                    "BB".into(),
                    Value::Int(1),
                    Value::Int(1),
                    Value::Missing,
                    Value::Int(1),
                    Value::Float(75.5),
                ],
            ],
        )
        .unwrap();
        let detail = Table::try_new(
            "ACTRI",
            vec![
                "Institución".into(),
                "Sector".into(),
                "Año".into(),
                "AC".into(),
                "Avance_Institución".into(),
                "Avance_OIC".into(),
            ],
            vec![
                vec!["A".into(), "S1".into(), Value::Int(2025), "1".into(), Value::Float(40.0), Value::Missing],
                vec!["A".into(), "S1".into(), Value::Int(2025), "2".into(), "60".into(), Value::Float(12.346)],
                vec!["B".into(), "S1".into(), Value::Int(2025), "1".into(), Value::Missing, Value::Missing],
            ],
        )
        .unwrap();
        let improvement_plan = Table::try_new(
            "PTCI",
            vec!["Institución".into(), "Año".into(), "AM_Total".into()],
            vec![vec!["A".into(), Value::Int(2025), Value::Int(4)]],
        )
        .unwrap();
        let improvement_detail = Table::try_new(
            "AMTRI",
            vec![
                "Institución".into(),
                "Año".into(),
                "Trimestre".into(),
                "Localizada".into(),
                "Suficiencia".into(),
            ],
            vec![
                vec!["A".into(), Value::Int(2025), Value::Int(4), "Sí".into(), "Suficiente".into()],
                vec!["A".into(), Value::Int(2025), Value::Int(4), "No".into(), Value::Missing],
                vec!["A".into(), Value::Int(2025), Value::Int(3), "Sí".into(), "Suficiente".into()],
            ],
        )
        .unwrap();
        Snapshot::new(plan, detail, improvement_plan, improvement_detail)
    }

    #[test]
    fn single_selection_reads_one_record() {
        let d = run(&snapshot(), &Selection::organization("A", 2025), &ColumnNames::default());
        assert!(d.has_data);
        assert_eq!(d.mode, ScopeMode::Single);
        assert_eq!(
            d.header,
            Header::Organization {
                organization: "A".into(),
                sector: "S1".into(),
                acronym: "AA".into(),
            }
        );
        assert_eq!(d.kpis, Kpis { control_total: 2, risk_total: 3, improvement_total: 4 });
        assert_eq!(d.control_actions.rows.len(), 2);
        assert!(!d.control_actions.count_mismatch);
    }

    #[test]
    fn sector_selection_rolls_up() {
        let d = run(&snapshot(), &Selection::sector("A", "S1", 2025), &ColumnNames::default());
        assert_eq!(d.mode, ScopeMode::Rollup);
        assert_eq!(d.organizations, vec!["A", "B"]);
        assert_eq!(d.kpis.control_total, 3);
        assert_eq!(d.plan.get("1Cumplimiento"), Number::Float(62.75));
        let imagen = d.risk_categories.iter().find(|c| c.label == "Imagen").unwrap();
        assert_eq!(imagen.value, 1);
        assert_eq!(d.control_actions.rows.len(), 3);
        assert!(!d.control_actions.count_mismatch);
    }

    #[test]
    fn quarterly_matrix_and_chart() {
        let d = run(&snapshot(), &Selection::sector("A", "S1", 2025), &ColumnNames::default());
        assert_eq!(d.quarterly.len(), 4);
        let concluded = d.quarterly.iter().find(|r| r.status == QuarterStatus::Concluded).unwrap();
        assert_eq!(concluded.values, [Number::Int(5), Number::ZERO, Number::ZERO, Number::ZERO]);
        assert_eq!(d.chart.len(), 16);
        assert_eq!(d.chart[0].quarter, 1);
        assert_eq!(d.chart[0].status, QuarterStatus::NoProgress);
    }

    #[test]
    fn listing_formats_progress_and_averages() {
        let d = run(&snapshot(), &Selection::organization("A", 2025), &ColumnNames::default());
        let rows = &d.control_actions.rows;
        assert_eq!(rows[0].entity_progress, "40.00%");
        assert_eq!(rows[0].oversight_progress, "");
        assert_eq!(rows[1].oversight_progress, "12.35%");
        assert_eq!(d.control_actions.average_entity_progress, Number::Float(50.0));
        assert_eq!(d.control_actions.average_oversight_progress, Number::Float(12.35));
    }

    #[test]
    fn improvement_tallies() {
        let d = run(&snapshot(), &Selection::organization("A", 2025), &ColumnNames::default());
        let listing = &d.improvement_actions;
        assert_eq!(listing.rows.len(), 3);
        assert_eq!(listing.located["Sí"], 2);
        assert_eq!(listing.located["No"], 1);
        assert_eq!(listing.sufficiency["(blank)"], 1);
        assert_eq!(listing.average_entity_progress, Number::ZERO);
    }

    #[test]
    fn unknown_selection_is_no_data() {
        let d = run(&snapshot(), &Selection::organization("Z", 2099), &ColumnNames::default());
        assert!(!d.has_data);
        assert!(d.plan.iter().all(|(_, n)| n == Number::ZERO));
        assert!(d.improvement_plan.iter().all(|(_, n)| n == Number::ZERO));
        assert!(d.control_actions.rows.is_empty());
        assert!(!d.control_actions.count_mismatch);
        assert_eq!(
            d.header,
            Header::Organization {
                organization: "Z".into(),
                sector: String::new(),
                acronym: String::new(),
            }
        );
    }

    #[test]
    fn declared_total_differs_from_listing() {
        let mut snap = snapshot();
        snap.action_detail = Table::empty("ACTRI");
        let d = run(&snap, &Selection::organization("A", 2025), &ColumnNames::default());
        assert!(d.control_actions.count_mismatch);
    }

    #[test]
    fn reconcile_all_covers_both_pairs() {
        let report = reconcile_all(&snapshot(), &ColumnNames::default());
        assert_eq!(report.control.rows.len(), 2);
        assert!(report.control.rows.iter().all(|r| r.matches));
        // AM_Total_Actualizado absent: declared 0 against two closing-quarter rows.
        assert_eq!(report.improvement.rows[0].difference, -2);
        assert!(!report.is_clean());
        assert!(report.crosswalk.is_none());
        assert!(report.plan_duplicates.is_empty());
    }

    #[test]
    fn progress_format() {
        assert_eq!(format_progress(&Value::Float(80.0)), "80.00%");
        assert_eq!(format_progress(&Value::from("33.333")), "33.33%");
        assert_eq!(format_progress(&Value::from("n/a")), "");
    }
}
