use std::collections::BTreeMap;

use crate::engine::{Reconciliation, COBRO};
use crate::model::{ContractRecord, ReconciledOutcome, ReportSummary, VisitCheck};
use crate::visits::VisitLog;

/// Compute run statistics from the joined directory rows.
pub fn compute_summary(
    joined: &[(&ContractRecord, ReconciledOutcome)],
    recon: &Reconciliation,
    log: &VisitLog,
    duplicate_contracts: usize,
) -> ReportSummary {
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut summary = ReportSummary {
        contracts: joined.len(),
        events_read: log.rows_read,
        events_used: recon.events_used,
        dropped_dates: log.dropped_dates,
        dropped_keys: log.dropped_keys,
        unmatched_events: recon.unmatched_events,
        duplicate_contracts,
        ..Default::default()
    };

    for (contract, outcome) in joined {
        if outcome.has_visits() {
            summary.with_visits += 1;
        }
        if contract.has_projection {
            summary.with_projection += 1;
        }
        match outcome.visit_check {
            VisitCheck::Correct => summary.correct_visits += 1,
            VisitCheck::Incorrect => summary.incorrect_visits += 1,
        }
        if let Some(ref code) = outcome.outcome {
            *outcome_counts.entry(code.clone()).or_insert(0) += 1;
            if code == COBRO {
                summary.cobros += 1;
            }
        }
        summary.total_collected += outcome.amount;
    }

    summary.outcome_counts = outcome_counts;
    summary
}
