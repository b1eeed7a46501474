//! `ctrlboard validate` - load and clean every table without running anything.

use serde::Serialize;

use ctrlboard_recon::{find_duplicate_plan_keys, CleanStats, TableRole};

use crate::workspace::Workspace;
use crate::{print_json, CliError};

#[derive(Serialize)]
struct TableReport {
    role: TableRole,
    sheet: String,
    columns: usize,
    #[serde(flatten)]
    stats: CleanStats,
}

#[derive(Serialize)]
struct ValidateOutput {
    source: String,
    tables: Vec<TableReport>,
    duplicate_plan_keys: usize,
}

pub fn cmd_validate(ws: &Workspace, json_output: bool) -> Result<(), CliError> {
    let snapshot = ws.snapshot()?;

    let tables: Vec<TableReport> = TableRole::ALL
        .iter()
        .filter_map(|&role| {
            let table = snapshot.table(role)?;
            Some(TableReport {
                role,
                sheet: table.name().to_string(),
                columns: table.columns().len(),
                stats: snapshot.stats.get(&role).cloned().unwrap_or_default(),
            })
        })
        .collect();

    let duplicate_plan_keys = find_duplicate_plan_keys(&snapshot.plan, ws.columns()).len()
        + find_duplicate_plan_keys(&snapshot.improvement_plan, ws.columns()).len();

    let out = ValidateOutput {
        source: ws.describe_source(),
        tables,
        duplicate_plan_keys,
    };

    if json_output {
        return print_json(&out);
    }

    eprintln!("source: {}", out.source);
    for t in &out.tables {
        eprintln!(
            "  {:<20} {:<12} {:>3} columns {:>6} rows ({} header row(s) dropped, {} unreadable year(s))",
            t.role.to_string(),
            t.sheet,
            t.columns,
            t.stats.rows_out,
            t.stats.header_rows_dropped,
            t.stats.unparsable_years,
        );
    }
    if snapshot.crosswalk.is_none() {
        eprintln!("  crosswalk not configured or not found");
    }
    if out.duplicate_plan_keys > 0 {
        eprintln!("warning: {} repeated plan key(s); run `ctrlboard recon` for details", out.duplicate_plan_keys);
    }
    eprintln!("ok");
    Ok(())
}
