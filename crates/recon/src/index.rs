use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use ctrlboard_core::{ColumnNames, Table};

use crate::scope::Selection;

/// Filter-widget lists derived from one plan table.
///
/// A read-only projection; build a fresh one for every loaded snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterIndex {
    pub organizations: Vec<String>,
    pub sectors: Vec<String>,
    pub years_by_organization: BTreeMap<String, Vec<i64>>,
    pub years_by_sector: BTreeMap<String, Vec<i64>>,
}

impl FilterIndex {
    pub fn build(plan: &Table, columns: &ColumnNames) -> Self {
        let mut by_org: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();
        let mut by_sector: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();

        for record in plan.records() {
            let year = record.get(&columns.year).as_whole();
            let org = record.text(&columns.organization);
            let sector = record.text(&columns.sector);

            if !org.is_empty() {
                by_org.entry(org).or_default().extend(year);
            }
            if !sector.is_empty() {
                by_sector.entry(sector).or_default().extend(year);
            }
        }

        let collect = |m: BTreeMap<String, BTreeSet<i64>>| -> BTreeMap<String, Vec<i64>> {
            m.into_iter().map(|(k, v)| (k, v.into_iter().collect())).collect()
        };

        Self {
            organizations: by_org.keys().cloned().collect(),
            sectors: by_sector.keys().cloned().collect(),
            years_by_organization: collect(by_org),
            years_by_sector: collect(by_sector),
        }
    }

    /// Years offered for a selection: the sector's when one is selected,
    /// otherwise the organization's.
    pub fn available_years(&self, selection: &Selection) -> &[i64] {
        let years = match &selection.sector {
            Some(sector) => self.years_by_sector.get(sector.trim()),
            None => self.years_by_organization.get(selection.organization.trim()),
        };
        years.map(Vec::as_slice).unwrap_or(&[])
    }
}
