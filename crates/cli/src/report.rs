//! `ctrlboard report` - dashboard for one selection.

use ctrlboard_recon::{run, Dashboard, Header, Selection};

use crate::exit_codes::EXIT_NO_DATA;
use crate::workspace::Workspace;
use crate::{print_json, CliError};

pub fn cmd_report(
    ws: &Workspace,
    org: &str,
    sector: Option<&str>,
    year: i64,
    json_output: bool,
) -> Result<(), CliError> {
    if org.trim().is_empty() {
        return Err(CliError::args("--org must not be blank"));
    }

    let snapshot = ws.snapshot()?;
    let selection = Selection::from_filter(org, sector.unwrap_or(""), year);
    let dashboard = run(&snapshot, &selection, ws.columns());

    if json_output {
        print_json(&dashboard)?;
    } else {
        print_summary(&dashboard);
    }

    if !dashboard.has_data {
        return Err(CliError::new(
            EXIT_NO_DATA,
            format!("no plan data for '{}' in {}", org.trim(), year),
        )
        .with_hint("run `ctrlboard filters --org <name>` to see available years"));
    }
    Ok(())
}

fn print_summary(d: &Dashboard) {
    match &d.header {
        Header::Sector { sector, organizations } => {
            eprintln!("{} {} - sector rollup ({} organizations)", sector, d.selection.year, organizations.len());
            for org in organizations {
                eprintln!("  {org}");
            }
        }
        Header::Organization { organization, sector, acronym } => {
            eprintln!("{organization} ({acronym}) {} - {sector}", d.selection.year);
        }
    }
    if !d.has_data {
        return;
    }

    eprintln!(
        "controls: {}  risks: {}  improvements: {}",
        d.kpis.control_total, d.kpis.risk_total, d.kpis.improvement_total
    );

    eprintln!();
    eprintln!("{:<16} {:>8} {:>8} {:>8} {:>8}", "", "Q1", "Q2", "Q3", "Q4");
    for row in &d.quarterly {
        eprintln!(
            "{:<16} {:>8} {:>8} {:>8} {:>8}",
            row.label, row.values[0], row.values[1], row.values[2], row.values[3]
        );
    }

    let nonzero: Vec<String> = d
        .risk_categories
        .iter()
        .filter(|c| c.value != 0)
        .map(|c| format!("{} {}", c.label, c.value))
        .collect();
    if !nonzero.is_empty() {
        eprintln!();
        eprintln!("risk categories: {}", nonzero.join(", "));
    }

    let listing = &d.control_actions;
    eprintln!();
    eprintln!(
        "control actions: {} listed, {} declared (avg progress {} / {})",
        listing.rows.len(),
        listing.declared_total,
        listing.average_entity_progress,
        listing.average_oversight_progress,
    );
    if listing.count_mismatch {
        eprintln!("warning: declared control total differs from listed actions");
    }
    eprintln!("improvement actions: {} listed", d.improvement_actions.rows.len());
    if d.ignored_plan_records > 0 {
        eprintln!("note: {} further plan record(s) for this organization ignored", d.ignored_plan_records);
    }
}
