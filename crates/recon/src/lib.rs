//! `ctrlboard-recon` - plan/detail reconciliation and aggregation engine.
//!
//! Pure engine crate: receives cleaned tables, returns aggregates, listings
//! and reconciliation rows. No CLI or IO dependencies.

pub mod aggregate;
pub mod clean;
pub mod control;
pub mod crosswalk;
pub mod engine;
pub mod evidence;
pub mod improvement;
pub mod index;
pub mod keys;
pub mod model;
pub mod scope;

pub use aggregate::{aggregate, Aggregate, Number};
pub use clean::{clean, clean_with, CleanStats};
pub use control::{reconcile_controls, ControlReconRow, ControlReconciliation, DuplicateEntry};
pub use crosswalk::{audit_crosswalk, CrosswalkAudit, CrosswalkEntry};
pub use ctrlboard_core::SchemaError;
pub use engine::{format_progress, reconcile_all, run};
pub use evidence::{ReconSummary, Unattributed};
pub use improvement::{reconcile_improvements, ImprovementReconRow, ImprovementReconciliation, CLOSING_QUARTER};
pub use index::FilterIndex;
pub use keys::{find_duplicate_plan_keys, JoinKey, PlanKeyDuplicate};
pub use model::{Dashboard, Header, ReconReport, Snapshot, TableRole};
pub use scope::{resolve_scope, ScopeMode, ScopeSelection, Selection};
