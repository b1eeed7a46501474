use std::collections::HashSet;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use ctrlboard_core::{normalize_match, ColumnNames, RecordRef, Table};

/// Filter value meaning "no sector filter".
pub const ALL_SECTORS: &str = "all";

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The active filter: one organization, optionally widened to its sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub organization: String,
    /// `None` selects a single organization; `Some` rolls up the sector.
    pub sector: Option<String>,
    pub year: i64,
}

impl Selection {
    pub fn organization(organization: impl Into<String>, year: i64) -> Self {
        Self {
            organization: organization.into(),
            sector: None,
            year,
        }
    }

    pub fn sector(organization: impl Into<String>, sector: impl Into<String>, year: i64) -> Self {
        Self {
            organization: organization.into(),
            sector: Some(sector.into()),
            year,
        }
    }

    /// Build from raw filter widgets, where the sector widget may hold
    /// [`ALL_SECTORS`] (any case) or be blank.
    pub fn from_filter(organization: &str, sector: &str, year: i64) -> Self {
        let sector = sector.trim();
        if sector.is_empty() || sector.eq_ignore_ascii_case(ALL_SECTORS) {
            Self::organization(organization.trim(), year)
        } else {
            Self::sector(organization.trim(), sector, year)
        }
    }

    pub fn mode(&self) -> ScopeMode {
        if self.sector.is_some() {
            ScopeMode::Rollup
        } else {
            ScopeMode::Single
        }
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeMode {
    /// One organization: values are read straight from its record.
    Single,
    /// A whole sector: values are summed or averaged across members.
    Rollup,
}

/// Plan-shaped records in scope for a selection.
#[derive(Debug, Clone)]
pub struct ScopeSelection<'a> {
    mode: ScopeMode,
    records: Vec<RecordRef<'a>>,
    /// SINGLE mode only: further records for the same organization/year,
    /// ignored in favour of the first.
    ignored_duplicates: usize,
}

impl<'a> ScopeSelection<'a> {
    pub fn new(mode: ScopeMode, records: Vec<RecordRef<'a>>) -> Self {
        Self {
            mode,
            records,
            ignored_duplicates: 0,
        }
    }

    pub fn mode(&self) -> ScopeMode {
        self.mode
    }

    pub fn records(&self) -> &[RecordRef<'a>] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ignored_duplicates(&self) -> usize {
        self.ignored_duplicates
    }

    /// Distinct organization display names in scope, in table order.
    pub fn organizations(&self, columns: &ColumnNames) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.text(&columns.organization))
            .filter(|name| !name.is_empty() && seen.insert(name.clone()))
            .collect()
    }
}

impl Serialize for ScopeSelection<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ScopeSelection", 2)?;
        s.serialize_field("mode", &self.mode)?;
        s.serialize_field("records", &self.records)?;
        s.end()
    }
}

/// Resolve which plan records a selection covers.
///
/// ROLLUP: every record of the sector for the year (exact match on the
/// trimmed sector). SINGLE: the first record of the organization for the
/// year; later duplicates are counted, not used. No match is an empty scope,
/// not an error.
pub fn resolve_scope<'a>(
    plan: &'a Table,
    selection: &Selection,
    columns: &ColumnNames,
) -> ScopeSelection<'a> {
    let in_year = |r: &RecordRef<'_>| r.get(&columns.year).as_whole() == Some(selection.year);

    match &selection.sector {
        Some(sector) => {
            if !plan.has_field(&columns.sector) {
                log::warn!("{}: no '{}' column, sector rollup is empty", plan.name(), columns.sector);
                return ScopeSelection::new(ScopeMode::Rollup, Vec::new());
            }
            let sector = sector.trim();
            let records = plan
                .records()
                .filter(|r| in_year(r) && r.get(&columns.sector).as_str() == Some(sector))
                .collect();
            ScopeSelection::new(ScopeMode::Rollup, records)
        }
        None => {
            let organization = selection.organization.trim();
            let mut matches = plan
                .records()
                .filter(|r| in_year(r) && r.get(&columns.organization).as_str() == Some(organization));
            let first = matches.next();
            let ignored = matches.count();
            if ignored > 0 {
                log::warn!(
                    "{}: {} has {} record(s) for {}; using the first",
                    plan.name(),
                    organization,
                    ignored + 1,
                    selection.year
                );
            }
            ScopeSelection {
                mode: ScopeMode::Single,
                records: first.into_iter().collect(),
                ignored_duplicates: ignored,
            }
        }
    }
}

/// Detail-log records belonging to a resolved scope.
///
/// Year must match. In ROLLUP mode the detail's own sector column decides
/// when present, otherwise membership of the scope's organizations. In
/// SINGLE mode organizations compare by join-key form, so spelling drift
/// between the plan and the log does not hide rows.
pub fn select_detail<'a>(
    detail: &'a Table,
    selection: &Selection,
    scope: &ScopeSelection<'_>,
    columns: &ColumnNames,
) -> Vec<RecordRef<'a>> {
    let in_year = |r: &RecordRef<'_>| r.get(&columns.year).as_whole() == Some(selection.year);
    let org_key = |r: &RecordRef<'_>| normalize_match(&r.text(&columns.organization));

    match (&selection.sector, detail.has_field(&columns.sector)) {
        (Some(sector), true) => {
            let sector = sector.trim();
            detail
                .records()
                .filter(|r| in_year(r) && r.get(&columns.sector).as_str() == Some(sector))
                .collect()
        }
        (Some(_), false) => {
            let members: HashSet<String> = scope
                .organizations(columns)
                .iter()
                .map(|o| normalize_match(o))
                .collect();
            detail
                .records()
                .filter(|r| in_year(r) && members.contains(&org_key(r)))
                .collect()
        }
        (None, _) => {
            let wanted = normalize_match(&selection.organization);
            if wanted.is_empty() {
                return Vec::new();
            }
            detail
                .records()
                .filter(|r| in_year(r) && org_key(r) == wanted)
                .collect()
        }
    }
}
