use std::collections::HashMap;

use crate::branch::BranchTable;
use crate::directory::{build_directory, ContractDirectory};
use crate::error::ReportError;
use crate::model::{ReconciledOutcome, Report, ReportInput, VisitCheck, VisitEvent, Weekday};
use crate::visits::normalize_visits;

/// Detail code of a successful collection.
pub const COBRO: &str = "Cobro";

/// Named weekly outcomes, highest priority first.
pub const PRIORITY_DETAILS: [&str; 3] = [COBRO, "No tenía dinero", "Difirió el pago"];

/// Per-contract outcomes for one week.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub outcomes: HashMap<String, ReconciledOutcome>,
    pub events_used: usize,
    pub unmatched_events: usize,
}

impl Reconciliation {
    /// Outcome for a contract; contracts without any event get the empty default.
    pub fn outcome(&self, contract: &str) -> ReconciledOutcome {
        self.outcomes.get(contract).cloned().unwrap_or_default()
    }
}

/// Build the whole report: directory, visit log, reconciliation, assembly.
pub fn build_report(input: &ReportInput, branches: &BranchTable) -> Result<Report, ReportError> {
    let directory = build_directory(input, branches)?;
    let log = normalize_visits(&input.ecobro)?;
    let recon = reconcile(&directory, &log.events);

    log::info!(
        "reconciled {} contracts from {} events ({} unmatched)",
        directory.contracts.len(),
        recon.events_used,
        recon.unmatched_events,
    );

    Ok(crate::report::assemble(&directory, &recon, &log))
}

/// Reconcile every directory contract against the visit events.
pub fn reconcile(directory: &ContractDirectory, events: &[VisitEvent]) -> Reconciliation {
    let schedule: HashMap<&str, Option<Weekday>> = directory
        .contracts
        .iter()
        .map(|c| (c.contract.as_str(), c.scheduled_day))
        .collect();

    let mut by_contract: HashMap<&str, Vec<&VisitEvent>> = HashMap::new();
    let mut recon = Reconciliation::default();

    for event in events {
        match schedule.get_key_value(event.contract.as_str()) {
            Some((&key, _)) => {
                by_contract.entry(key).or_default().push(event);
                recon.events_used += 1;
            }
            None => recon.unmatched_events += 1,
        }
    }

    for (contract, contract_events) in by_contract {
        let scheduled = schedule.get(contract).copied().flatten();
        recon
            .outcomes
            .insert(contract.to_string(), reconcile_contract(scheduled, &contract_events));
    }

    recon
}

/// Weekly outcome for one contract from its events (any order).
pub fn reconcile_contract(scheduled: Option<Weekday>, events: &[&VisitEvent]) -> ReconciledOutcome {
    let mut slots: [Option<String>; 7] = Default::default();
    for day in Weekday::CYCLE {
        slots[day.index()] = resolve_day(events.iter().copied().filter(|e| e.weekday == day));
    }

    let outcome = weekly_outcome(&slots);

    let (amount, collection_day) = if outcome.as_deref() == Some(COBRO) {
        collection(&slots, events)
    } else {
        (0.0, None)
    };

    let visit_check = match scheduled {
        Some(day) if slots[day.index()].is_some() => VisitCheck::Correct,
        _ => VisitCheck::Incorrect,
    };

    ReconciledOutcome {
        slots,
        outcome,
        amount,
        collection_day,
        visit_check,
    }
}

/// Winning detail for one day: any Cobro wins, otherwise the latest
/// non-blank detail. Days with no usable event stay empty.
pub fn resolve_day<'a, I>(day_events: I) -> Option<String>
where
    I: IntoIterator<Item = &'a VisitEvent>,
{
    let mut latest: Option<&VisitEvent> = None;
    for event in day_events {
        if event.detail == COBRO {
            return Some(COBRO.to_string());
        }
        if event.detail.is_empty() {
            continue;
        }
        if latest.map_or(true, |l| (event.timestamp, event.seq) > (l.timestamp, l.seq)) {
            latest = Some(event);
        }
    }
    latest.map(|e| e.detail.clone())
}

/// Highest-priority named detail anywhere in the week, else the last
/// non-empty slot in cycle order.
pub fn weekly_outcome(slots: &[Option<String>; 7]) -> Option<String> {
    for code in PRIORITY_DETAILS {
        if slots.iter().flatten().any(|d| d == code) {
            return Some(code.to_string());
        }
    }
    slots.iter().rev().flatten().next().cloned()
}

/// First Cobro day in cycle order and the amount of that day's latest Cobro event.
/// Negative amounts collect nothing.
fn collection(slots: &[Option<String>; 7], events: &[&VisitEvent]) -> (f64, Option<Weekday>) {
    let Some(day) = Weekday::CYCLE
        .into_iter()
        .find(|d| slots[d.index()].as_deref() == Some(COBRO))
    else {
        return (0.0, None);
    };

    let amount = events
        .iter()
        .filter(|e| e.weekday == day && e.detail == COBRO)
        .max_by_key(|e| (e.timestamp, e.seq))
        .map(|e| e.amount.max(0.0))
        .unwrap_or(0.0);

    (amount, Some(day))
}
