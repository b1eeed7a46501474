// Snapshot loading: fetch every configured sheet, then clean it

use std::collections::BTreeMap;

use ctrlboard_config::SheetNames;
use ctrlboard_core::{ColumnNames, Table};
use ctrlboard_recon::{clean_with, CleanStats, Snapshot, TableRole};

use crate::error::LoadError;
use crate::source::TableSource;

/// Fetch and clean all tables of one refresh cycle.
///
/// A missing required sheet fails the whole load. A missing crosswalk only
/// disables the crosswalk audit.
pub fn load_snapshot(
    source: &dyn TableSource,
    sheets: &SheetNames,
    columns: &ColumnNames,
) -> Result<Snapshot, LoadError> {
    log::info!("loading snapshot from {}", source.describe());
    let mut stats = BTreeMap::new();

    let plan = load_required(source, &sheets.plan, TableRole::Plan, columns, &mut stats)?;
    let action_detail =
        load_required(source, &sheets.action_detail, TableRole::ActionDetail, columns, &mut stats)?;
    let improvement_plan =
        load_required(source, &sheets.improvement_plan, TableRole::ImprovementPlan, columns, &mut stats)?;
    let improvement_detail = load_required(
        source,
        &sheets.improvement_detail,
        TableRole::ImprovementDetail,
        columns,
        &mut stats,
    )?;

    let mut snapshot = Snapshot::new(plan, action_detail, improvement_plan, improvement_detail);

    if let Some(sheet) = &sheets.crosswalk {
        match load_table(source, sheet, TableRole::Crosswalk, columns, &mut stats)? {
            Some(table) => snapshot = snapshot.with_crosswalk(table),
            None => log::warn!("crosswalk sheet '{sheet}' not found, skipping audit"),
        }
    }

    snapshot.stats = stats;
    Ok(snapshot)
}

fn load_required(
    source: &dyn TableSource,
    sheet: &str,
    role: TableRole,
    columns: &ColumnNames,
    stats: &mut BTreeMap<TableRole, CleanStats>,
) -> Result<Table, LoadError> {
    load_table(source, sheet, role, columns, stats)?.ok_or_else(|| LoadError::MissingTable(sheet.to_string()))
}

fn load_table(
    source: &dyn TableSource,
    sheet: &str,
    role: TableRole,
    columns: &ColumnNames,
    stats: &mut BTreeMap<TableRole, CleanStats>,
) -> Result<Option<Table>, LoadError> {
    let Some(raw) = source.fetch(sheet)? else {
        return Ok(None);
    };
    let (table, table_stats) = clean_with(raw, columns)?;
    if table_stats.header_rows_dropped > 0 {
        log::info!("{role}: dropped {} repeated header row(s)", table_stats.header_rows_dropped);
    }
    if table_stats.unparsable_years > 0 {
        log::warn!("{role}: {} year cell(s) not a whole number", table_stats.unparsable_years);
    }
    log::debug!("{role}: {} of {} row(s) kept", table_stats.rows_out, table_stats.rows_in);
    stats.insert(role, table_stats);
    Ok(Some(table))
}
