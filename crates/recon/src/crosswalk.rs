//! Audit of the optional name crosswalk: source-system spellings against an
//! external reference list.

use std::collections::BTreeSet;

use serde::Serialize;

use ctrlboard_core::{normalize_match, ColumnNames, Table, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrosswalkEntry {
    pub organization: String,
    pub reference_name: String,
    pub reference_sector: String,
    /// Flag as stored in the crosswalk; `None` when unreadable.
    pub declared_match: Option<bool>,
    /// Join-key equality of the two names.
    pub computed_match: bool,
    /// Declared and computed flags agree.
    pub consistent: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrosswalkAudit {
    pub entries: Vec<CrosswalkEntry>,
    pub inconsistent: usize,
    /// Plan organizations (display spelling) with no crosswalk entry.
    pub missing_from_crosswalk: Vec<String>,
}

/// Read a yes/no cell. Spanish and English spellings are accepted.
pub fn parse_flag(cell: &Value) -> Option<bool> {
    match cell {
        Value::Int(1) => Some(true),
        Value::Int(0) => Some(false),
        Value::Text(s) => match normalize_match(s).as_str() {
            "true" | "1" | "si" | "yes" | "x" | "verdadero" => Some(true),
            "false" | "0" | "no" | "falso" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Compare each crosswalk entry's stored flag with a recomputed one and list
/// plan organizations the crosswalk does not cover.
pub fn audit_crosswalk(crosswalk: &Table, plan: &Table, columns: &ColumnNames) -> CrosswalkAudit {
    let mut covered = BTreeSet::new();
    let mut entries = Vec::new();

    for record in crosswalk.records() {
        let organization = record.text(&columns.organization).trim().to_string();
        if organization.is_empty() {
            continue;
        }
        let reference_name = record.text(&columns.reference_name).trim().to_string();
        let computed_match = normalize_match(&organization) == normalize_match(&reference_name);
        let declared_match = parse_flag(record.get(&columns.name_matches));
        covered.insert(normalize_match(&organization));
        entries.push(CrosswalkEntry {
            reference_sector: record.text(&columns.reference_sector).trim().to_string(),
            consistent: declared_match == Some(computed_match),
            organization,
            reference_name,
            declared_match,
            computed_match,
        });
    }

    let mut seen = BTreeSet::new();
    let missing_from_crosswalk: Vec<String> = plan
        .records()
        .map(|r| r.text(&columns.organization).trim().to_string())
        .filter(|name| !name.is_empty())
        .filter(|name| {
            let key = normalize_match(name);
            !covered.contains(&key) && seen.insert(key)
        })
        .collect();

    let inconsistent = entries.iter().filter(|e| !e.consistent).count();
    if inconsistent > 0 {
        log::warn!("{}: {inconsistent} entr(ies) with a stale match flag", crosswalk.name());
    }
    if !missing_from_crosswalk.is_empty() {
        log::warn!(
            "{}: {} plan organization(s) not in {}",
            plan.name(),
            missing_from_crosswalk.len(),
            crosswalk.name()
        );
    }

    CrosswalkAudit {
        entries,
        inconsistent,
        missing_from_crosswalk,
    }
}
