use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use ctrlboard_core::fields::QuarterStatus;
use ctrlboard_core::Table;

use crate::aggregate::{Aggregate, Number};
use crate::clean::CleanStats;
use crate::control::ControlReconciliation;
use crate::crosswalk::CrosswalkAudit;
use crate::improvement::ImprovementReconciliation;
use crate::keys::PlanKeyDuplicate;
use crate::scope::{ScopeMode, Selection};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The five tables a snapshot is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRole {
    Plan,
    ActionDetail,
    ImprovementPlan,
    ImprovementDetail,
    Crosswalk,
}

impl TableRole {
    pub const ALL: [TableRole; 5] = [
        TableRole::Plan,
        TableRole::ActionDetail,
        TableRole::ImprovementPlan,
        TableRole::ImprovementDetail,
        TableRole::Crosswalk,
    ];

    pub fn is_required(&self) -> bool {
        !matches!(self, TableRole::Crosswalk)
    }
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plan => write!(f, "plan"),
            Self::ActionDetail => write!(f, "action_detail"),
            Self::ImprovementPlan => write!(f, "improvement_plan"),
            Self::ImprovementDetail => write!(f, "improvement_detail"),
            Self::Crosswalk => write!(f, "crosswalk"),
        }
    }
}

/// Cleaned tables of one refresh cycle. Never mutated once built.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub plan: Table,
    pub action_detail: Table,
    pub improvement_plan: Table,
    pub improvement_detail: Table,
    pub crosswalk: Option<Table>,
    pub fetched_at: DateTime<Utc>,
    /// Cleaning statistics per loaded table.
    pub stats: BTreeMap<TableRole, CleanStats>,
}

impl Snapshot {
    /// Snapshot of already-clean tables, stamped now.
    pub fn new(plan: Table, action_detail: Table, improvement_plan: Table, improvement_detail: Table) -> Self {
        Self {
            plan,
            action_detail,
            improvement_plan,
            improvement_detail,
            crosswalk: None,
            fetched_at: Utc::now(),
            stats: BTreeMap::new(),
        }
    }

    pub fn with_crosswalk(mut self, crosswalk: Table) -> Self {
        self.crosswalk = Some(crosswalk);
        self
    }

    pub fn table(&self, role: TableRole) -> Option<&Table> {
        match role {
            TableRole::Plan => Some(&self.plan),
            TableRole::ActionDetail => Some(&self.action_detail),
            TableRole::ImprovementPlan => Some(&self.improvement_plan),
            TableRole::ImprovementDetail => Some(&self.improvement_detail),
            TableRole::Crosswalk => self.crosswalk.as_ref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
    pub data_fetched_at: String,
}

impl RunMeta {
    pub(crate) fn now(snapshot: &Snapshot) -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: Utc::now().to_rfc3339(),
            data_fetched_at: snapshot.fetched_at.to_rfc3339(),
        }
    }
}

/// Identity block shown above the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Header {
    Sector {
        sector: String,
        organizations: Vec<String>,
    },
    Organization {
        organization: String,
        sector: String,
        acronym: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub control_total: i64,
    pub risk_total: i64,
    pub improvement_total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub value: i64,
}

/// One status row of the quarter x status matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterlyRow {
    pub status: QuarterStatus,
    pub label: String,
    /// Quarters 1 to 4.
    pub values: [Number; 4],
}

/// Grouped-bar chart input: one bar per (quarter, status).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub quarter: u8,
    pub status: QuarterStatus,
    pub value: Number,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlActionRow {
    pub year: Option<i64>,
    pub acronym: String,
    pub risk: String,
    pub risk_description: String,
    pub action_key: String,
    pub description: String,
    /// Two decimals and `%`, blank when missing.
    pub entity_progress: String,
    pub oversight_progress: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlListing {
    pub rows: Vec<ControlActionRow>,
    pub declared_total: i64,
    /// Declared control total differs from the number of listed rows.
    pub count_mismatch: bool,
    pub average_entity_progress: Number,
    pub average_oversight_progress: Number,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImprovementActionRow {
    pub year: Option<i64>,
    pub quarter: Option<i64>,
    pub acronym: String,
    pub action_key: String,
    pub description: String,
    pub located: String,
    pub sufficiency: String,
    pub entity_progress: String,
    pub oversight_progress: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprovementListing {
    pub rows: Vec<ImprovementActionRow>,
    /// Row counts per located value.
    pub located: BTreeMap<String, usize>,
    /// Row counts per sufficiency value.
    pub sufficiency: BTreeMap<String, usize>,
    pub average_entity_progress: Number,
    pub average_oversight_progress: Number,
}

/// Everything the presentation layer needs for one selection.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub meta: RunMeta,
    pub selection: Selection,
    pub mode: ScopeMode,
    /// False when no plan record is in scope; every aggregate is then zero.
    pub has_data: bool,
    pub organizations: Vec<String>,
    pub header: Header,
    pub plan: Aggregate,
    pub improvement_plan: Aggregate,
    pub kpis: Kpis,
    pub risk_categories: Vec<CategoryCount>,
    pub quadrants: Vec<CategoryCount>,
    pub strategies: Vec<CategoryCount>,
    pub quarterly: Vec<QuarterlyRow>,
    pub improvement_quarterly: Vec<QuarterlyRow>,
    pub chart: Vec<ChartPoint>,
    pub control_actions: ControlListing,
    pub improvement_actions: ImprovementListing,
    /// SINGLE mode: further plan records for the selected organization/year.
    pub ignored_plan_records: usize,
}

// ---------------------------------------------------------------------------
// Reconciliation report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: RunMeta,
    pub control: ControlReconciliation,
    pub improvement: ImprovementReconciliation,
    pub plan_duplicates: Vec<PlanKeyDuplicate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crosswalk: Option<CrosswalkAudit>,
}

impl ReconReport {
    /// No reconciliation row mismatches.
    pub fn is_clean(&self) -> bool {
        self.control.summary.is_clean() && self.improvement.summary.is_clean()
    }
}
