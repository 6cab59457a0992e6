//! `cobranza-recon` — weekly collections visit-reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded source tables, returns the
//! assembled report. No CLI or IO dependencies.

pub mod branch;
pub mod config;
pub mod dates;
pub mod directory;
pub mod engine;
pub mod error;
pub mod model;
pub mod report;
pub mod summary;
pub mod table;
pub mod visits;

pub use branch::BranchTable;
pub use config::{ReportConfig, SheetSelector, SourceKind};
pub use engine::{build_report, reconcile};
pub use error::ReportError;
pub use model::{Report, ReportInput, ReportMeta, ReportRow, ReportSummary, ReportValue, Weekday};
pub use table::SourceTable;
