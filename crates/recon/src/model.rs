use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::table::SourceTable;

// ---------------------------------------------------------------------------
// Weekly cycle
// ---------------------------------------------------------------------------

/// Business weekday. Declaration order is the weekly cycle (Thursday first),
/// so the derived `Ord` sorts in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Jueves,
    Viernes,
    Sabado,
    Domingo,
    Lunes,
    Martes,
    Miercoles,
}

impl Weekday {
    pub const CYCLE: [Weekday; 7] = [
        Weekday::Jueves,
        Weekday::Viernes,
        Weekday::Sabado,
        Weekday::Domingo,
        Weekday::Lunes,
        Weekday::Martes,
        Weekday::Miercoles,
    ];

    /// Position in the weekly cycle (Jueves = 0).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Jueves => "Jueves",
            Self::Viernes => "Viernes",
            Self::Sabado => "Sábado",
            Self::Domingo => "Domingo",
            Self::Lunes => "Lunes",
            Self::Martes => "Martes",
            Self::Miercoles => "Miércoles",
        }
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Lunes,
            chrono::Weekday::Tue => Self::Martes,
            chrono::Weekday::Wed => Self::Miercoles,
            chrono::Weekday::Thu => Self::Jueves,
            chrono::Weekday::Fri => Self::Viernes,
            chrono::Weekday::Sat => Self::Sabado,
            chrono::Weekday::Sun => Self::Domingo,
        }
    }

    /// Match a schedule cell against the seven labels, ignoring case,
    /// surrounding whitespace and accents. Unknown text yields `None`.
    pub fn parse_label(s: &str) -> Option<Self> {
        let folded = fold_label(s);
        if folded.is_empty() {
            return None;
        }
        Self::CYCLE
            .iter()
            .copied()
            .find(|day| fold_label(day.label()) == folded)
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn fold_label(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The five weekly extracts, already materialized as tables.
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub cartera: SourceTable,
    pub pabs: SourceTable,
    pub siggo: SourceTable,
    pub ecobro: SourceTable,
    pub proyecciones: SourceTable,
}

/// One resolved contract from the ledger and its status sources.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractRecord {
    pub contract: String,
    pub contract_date: Option<NaiveDate>,
    pub payment_method: String,
    pub status: String,
    pub branch: String,
    pub client: String,
    pub street: String,
    pub neighborhood: String,
    pub locality: String,
    pub phone: String,
    pub promoter: String,
    pub collector: String,
    pub scheduled_day: Option<Weekday>,
    pub current_payment: String,
    pub collector_unsegmented: String,
    pub has_projection: bool,
}

impl ContractRecord {
    pub fn projection_label(&self) -> &'static str {
        if self.has_projection {
            "Proyeccion"
        } else {
            "Sin proyeccion"
        }
    }
}

/// A single normalized Ecobro visit.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitEvent {
    pub contract: String,
    pub timestamp: NaiveDateTime,
    pub weekday: Weekday,
    pub detail: String,
    pub amount: f64,
    /// Source row order, kept for stable tie-breaks on equal timestamps.
    pub seq: usize,
}

// ---------------------------------------------------------------------------
// Reconciliation output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitCheck {
    Correct,
    Incorrect,
}

impl VisitCheck {
    pub fn label(self) -> &'static str {
        match self {
            Self::Correct => "Correcto",
            Self::Incorrect => "Incorrecto",
        }
    }
}

/// Weekly result for one contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledOutcome {
    /// One slot per weekday, indexed by `Weekday::index`.
    pub slots: [Option<String>; 7],
    pub outcome: Option<String>,
    pub amount: f64,
    pub collection_day: Option<Weekday>,
    pub visit_check: VisitCheck,
}

impl Default for ReconciledOutcome {
    fn default() -> Self {
        Self {
            slots: Default::default(),
            outcome: None,
            amount: 0.0,
            collection_day: None,
            visit_check: VisitCheck::Incorrect,
        }
    }
}

impl ReconciledOutcome {
    pub fn slot(&self, day: Weekday) -> Option<&str> {
        self.slots[day.index()].as_deref()
    }

    /// Aportó: 1 when something was collected.
    pub fn contributed(&self) -> u8 {
        if self.amount > 0.0 {
            1
        } else {
            0
        }
    }

    pub fn has_visits(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A typed output cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

impl ReportValue {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s)
        }
    }

    /// Plain-text rendering used by CSV export, width sizing and previews.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Empty => String::new(),
        }
    }
}

/// One output row, laid out in column order.
pub type ReportRow = Vec<ReportValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub contracts: usize,
    pub with_visits: usize,
    pub cobros: usize,
    pub total_collected: f64,
    pub correct_visits: usize,
    pub incorrect_visits: usize,
    pub with_projection: usize,
    pub outcome_counts: BTreeMap<String, usize>,
    pub events_read: usize,
    pub events_used: usize,
    pub dropped_dates: usize,
    pub dropped_keys: usize,
    pub unmatched_events: usize,
    pub duplicate_contracts: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub columns: Vec<String>,
    pub rows: Vec<ReportRow>,
    pub summary: ReportSummary,
}

impl Report {
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_starts_thursday() {
        assert_eq!(Weekday::CYCLE[0], Weekday::Jueves);
        assert_eq!(Weekday::CYCLE[6], Weekday::Miercoles);
        assert!(Weekday::Jueves < Weekday::Lunes);
        for (i, day) in Weekday::CYCLE.iter().enumerate() {
            assert_eq!(day.index(), i);
        }
    }

    #[test]
    fn parse_label_folds_case_and_accents() {
        assert_eq!(Weekday::parse_label("Miércoles"), Some(Weekday::Miercoles));
        assert_eq!(Weekday::parse_label(" miercoles "), Some(Weekday::Miercoles));
        assert_eq!(Weekday::parse_label("SÁBADO"), Some(Weekday::Sabado));
        assert_eq!(Weekday::parse_label("Sabado"), Some(Weekday::Sabado));
        assert_eq!(Weekday::parse_label("Thursday"), None);
        assert_eq!(Weekday::parse_label(""), None);
    }

    #[test]
    fn from_chrono_maps_every_day() {
        assert_eq!(Weekday::from_chrono(chrono::Weekday::Thu), Weekday::Jueves);
        assert_eq!(Weekday::from_chrono(chrono::Weekday::Sun), Weekday::Domingo);
        assert_eq!(Weekday::from_chrono(chrono::Weekday::Wed), Weekday::Miercoles);
    }

    #[test]
    fn default_outcome_is_empty_and_incorrect() {
        let o = ReconciledOutcome::default();
        assert!(!o.has_visits());
        assert_eq!(o.outcome, None);
        assert_eq!(o.contributed(), 0);
        assert_eq!(o.visit_check, VisitCheck::Incorrect);
    }

    #[test]
    fn render_values() {
        assert_eq!(ReportValue::Number(150.0).render(), "150");
        assert_eq!(ReportValue::Number(99.5).render(), "99.5");
        let d = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
        assert_eq!(ReportValue::Date(d).render(), "2025-03-06");
        assert_eq!(ReportValue::text(""), ReportValue::Empty);
    }

    #[test]
    fn summary_serializes_with_ordered_outcomes() {
        let mut summary = ReportSummary {
            contracts: 2,
            cobros: 1,
            total_collected: 150.0,
            ..Default::default()
        };
        summary.outcome_counts.insert("Visita".into(), 1);
        summary.outcome_counts.insert("Cobro".into(), 1);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["contracts"], 2);
        assert_eq!(json["total_collected"], 150.0);
        let keys: Vec<&String> = json["outcome_counts"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["Cobro", "Visita"]);
    }
}
