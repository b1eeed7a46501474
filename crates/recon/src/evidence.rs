use serde::Serialize;

/// Per-key outcome shared by both reconciliations.
pub trait ReconOutcome {
    fn matches(&self) -> bool;
    fn in_plan(&self) -> bool;
    fn in_detail(&self) -> bool;
    fn has_duplicates(&self) -> bool {
        false
    }
}

/// Headline counts for one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total_keys: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub plan_only: usize,
    pub detail_only: usize,
    pub with_duplicates: usize,
}

impl ReconSummary {
    pub fn is_clean(&self) -> bool {
        self.mismatched == 0
    }
}

/// Detail rows that could not be keyed: blank organization or no readable year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Unattributed {
    pub plan: usize,
    pub detail: usize,
}

/// Compute summary statistics from reconciliation rows.
pub fn compute_summary<R: ReconOutcome>(rows: &[R]) -> ReconSummary {
    let mut summary = ReconSummary {
        total_keys: rows.len(),
        ..ReconSummary::default()
    };

    for r in rows {
        if r.matches() {
            summary.matched += 1;
        } else {
            summary.mismatched += 1;
        }
        match (r.in_plan(), r.in_detail()) {
            (true, false) => summary.plan_only += 1,
            (false, true) => summary.detail_only += 1,
            _ => {}
        }
        if r.has_duplicates() {
            summary.with_duplicates += 1;
        }
    }

    summary
}
