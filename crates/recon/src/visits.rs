//! Ecobro visit-log normalization.

use chrono::Datelike;

use crate::dates::parse_timestamp;
use crate::error::ReportError;
use crate::model::{VisitEvent, Weekday};
use crate::table::{cell, contract_key, SourceTable};

pub const DATE_COLUMN: &str = "Fecha";
pub const DETAIL_COLUMN: &str = "Detalle";
pub const AMOUNT_COLUMN: &str = "Monto";
pub const CONTRACT_COLUMN: &str = "Contrato";
/// Contract column as the collector app exports it.
pub const RAW_CONTRACT_COLUMN: &str = "No. de Contrato";

/// How far below the first row a banner-shifted header is searched for.
const HEADER_SCAN_ROWS: usize = 10;

/// Normalized visit log plus what was discarded on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitLog {
    /// Sorted by timestamp ascending; ties keep source order.
    pub events: Vec<VisitEvent>,
    pub rows_read: usize,
    pub dropped_dates: usize,
    pub dropped_keys: usize,
}

fn is_visit_header(headers: &[String]) -> bool {
    let has = |name: &str| headers.iter().any(|h| h == name);
    has(DATE_COLUMN)
        && has(DETAIL_COLUMN)
        && has(AMOUNT_COLUMN)
        && (has(RAW_CONTRACT_COLUMN) || has(CONTRACT_COLUMN))
}

/// First required column missing from `table`'s current header.
fn first_missing(table: &SourceTable) -> ReportError {
    let contract_present =
        table.has_column(RAW_CONTRACT_COLUMN) || table.has_column(CONTRACT_COLUMN);
    let missing = [DATE_COLUMN, RAW_CONTRACT_COLUMN, DETAIL_COLUMN, AMOUNT_COLUMN]
        .into_iter()
        .find(|name| {
            if *name == RAW_CONTRACT_COLUMN {
                !contract_present
            } else {
                !table.has_column(name)
            }
        })
        .unwrap_or(DATE_COLUMN);
    ReportError::missing_column(&table.source, missing)
}

/// Parse a currency-formatted number ("$1,250.50"), `None` if it is not one.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    match cleaned.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => None,
    }
}

/// Parse a visit amount. Anything unparseable counts as 0.
pub fn parse_amount(raw: &str) -> f64 {
    parse_number(raw).unwrap_or(0.0)
}

/// Turn the raw Ecobro table into sorted, weekday-tagged visit events.
pub fn normalize_visits(table: &SourceTable) -> Result<VisitLog, ReportError> {
    let mut table = table
        .clone()
        .promote_header(HEADER_SCAN_ROWS, is_visit_header)
        .ok_or_else(|| first_missing(table))?;

    table.rename_column(RAW_CONTRACT_COLUMN, CONTRACT_COLUMN);
    let table = table.dedup_columns();

    let date_idx = table.require(DATE_COLUMN)?;
    let contract_idx = table.require(CONTRACT_COLUMN)?;
    let detail_idx = table.require(DETAIL_COLUMN)?;
    let amount_idx = table.require(AMOUNT_COLUMN)?;

    let mut log = VisitLog::default();

    for (seq, row) in table.rows.iter().enumerate() {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        log.rows_read += 1;

        let Some(timestamp) = parse_timestamp(cell(row, date_idx)) else {
            log.dropped_dates += 1;
            continue;
        };

        let contract = contract_key(cell(row, contract_idx));
        if contract.is_empty() {
            log.dropped_keys += 1;
            continue;
        }

        log.events.push(VisitEvent {
            contract,
            timestamp,
            weekday: Weekday::from_chrono(timestamp.weekday()),
            detail: cell(row, detail_idx).trim().to_string(),
            amount: parse_amount(cell(row, amount_idx)),
            seq,
        });
    }

    // Stable: equal timestamps keep source order.
    log.events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    log::debug!(
        "ecobro: {} rows, {} events, {} bad dates, {} blank contracts",
        log.rows_read,
        log.events.len(),
        log.dropped_dates,
        log.dropped_keys,
    );

    Ok(log)
}
