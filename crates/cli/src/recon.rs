//! `ctrlboard recon` - declared totals vs. detail rows.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

use ctrlboard_recon::model::RunMeta;
use ctrlboard_recon::{
    reconcile_all, ControlReconciliation, CrosswalkAudit, ImprovementReconciliation, PlanKeyDuplicate,
    ReconSummary,
};

use crate::exit_codes::EXIT_MISMATCH;
use crate::workspace::Workspace;
use crate::{print_json, CliError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReconKind {
    /// Control actions: plan AC total vs. distinct detail action keys
    Control,
    /// Improvement actions: updated plan total vs. closing-quarter detail rows
    Improvement,
    All,
}

impl ReconKind {
    fn control(self) -> bool {
        matches!(self, Self::Control | Self::All)
    }

    fn improvement(self) -> bool {
        matches!(self, Self::Improvement | Self::All)
    }
}

/// The report, narrowed to the requested reconciliation(s).
#[derive(Serialize)]
struct ReconOutput<'a> {
    meta: &'a RunMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    control: Option<&'a ControlReconciliation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    improvement: Option<&'a ImprovementReconciliation>,
    plan_duplicates: &'a [PlanKeyDuplicate],
    #[serde(skip_serializing_if = "Option::is_none")]
    crosswalk: Option<&'a CrosswalkAudit>,
}

pub fn cmd_recon(
    ws: &Workspace,
    kind: ReconKind,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let snapshot = ws.snapshot()?;
    let report = reconcile_all(&snapshot, ws.columns());

    let out = ReconOutput {
        meta: &report.meta,
        control: kind.control().then_some(&report.control),
        improvement: kind.improvement().then_some(&report.improvement),
        plan_duplicates: &report.plan_duplicates,
        crosswalk: report.crosswalk.as_ref(),
    };

    if let Some(ref path) = output_file {
        let json_str = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        print_json(&out)?;
    } else {
        print_human(&out);
    }

    let mismatched = out.control.map_or(0, |c| c.summary.mismatched)
        + out.improvement.map_or(0, |i| i.summary.mismatched);
    if mismatched > 0 {
        return Err(CliError::new(EXIT_MISMATCH, format!("{mismatched} mismatching row(s)")));
    }
    Ok(())
}

fn summary_line(name: &str, s: &ReconSummary) -> String {
    format!(
        "{name}: {} keys - {} matched, {} mismatched ({} plan only, {} detail only)",
        s.total_keys, s.matched, s.mismatched, s.plan_only, s.detail_only
    )
}

fn print_human(out: &ReconOutput<'_>) {
    if let Some(control) = out.control {
        eprintln!("{}", summary_line("control", &control.summary));
        if control.summary.with_duplicates > 0 {
            eprintln!("  {} key(s) with repeated action keys", control.summary.with_duplicates);
        }
        for r in control.rows.iter().filter(|r| !r.matches) {
            eprintln!(
                "  {} {:<32} declared {:>4}  distinct {:>4}  rows {:>4}",
                r.year, r.display_name, r.declared_total, r.deduplicated_count, r.observed_raw
            );
        }
        if control.unattributed.detail > 0 {
            eprintln!("  {} detail row(s) without organization or year", control.unattributed.detail);
        }
    }

    if let Some(improvement) = out.improvement {
        eprintln!("{}", summary_line("improvement", &improvement.summary));
        for r in improvement.rows.iter().filter(|r| !r.matches) {
            eprintln!(
                "  {} {:<32} declared {:>4}  closing quarter {:>4}",
                r.year, r.display_name, r.declared_total, r.observed_q4
            );
        }
        if improvement.unattributed.detail > 0 {
            eprintln!("  {} detail row(s) without organization or year", improvement.unattributed.detail);
        }
    }

    for dup in out.plan_duplicates {
        eprintln!(
            "warning: {} has {} {} records for {}; the first is used",
            dup.organization, dup.occurrences, dup.table, dup.year
        );
    }

    if let Some(audit) = out.crosswalk {
        eprintln!(
            "crosswalk: {} entries, {} inconsistent, {} plan organization(s) missing",
            audit.entries.len(),
            audit.inconsistent,
            audit.missing_from_crosswalk.len()
        );
        for e in audit.entries.iter().filter(|e| !e.consistent) {
            eprintln!("  {} -> {}", e.organization, e.reference_name);
        }
        for name in &audit.missing_from_crosswalk {
            eprintln!("  missing: {name}");
        }
    }
}
