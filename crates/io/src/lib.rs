// File I/O operations

pub mod csv;
pub mod xlsx;

use std::path::Path;

use cobranza_recon::{Report, ReportError, SheetSelector, SourceTable};

/// Raw cell text, row-major, header row first.
pub type Grid = Vec<Vec<String>>;

/// How a source extract is read, picked from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Workbook,
    Csv,
    Tsv,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match extension(path).as_str() {
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Workbook),
            "csv" | "txt" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            _ => None,
        }
    }
}

/// Report file type, picked from the output extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Csv,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match extension(path).as_str() {
            "xlsx" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Load one source extract as a table whose first row is the header.
///
/// `sheet` only applies to workbooks; delimited files have a single table.
pub fn load_source(
    path: &Path,
    sheet: &SheetSelector,
    source: &str,
) -> Result<SourceTable, ReportError> {
    let format = InputFormat::from_path(path).ok_or_else(|| {
        ReportError::Io(format!(
            "{source}: unsupported file type '{}'",
            path.display()
        ))
    })?;

    let grid = match format {
        InputFormat::Workbook => xlsx::import_grid(path, sheet, source)?,
        InputFormat::Csv => csv::import_grid(path).map_err(|e| read_error(source, path, e))?,
        InputFormat::Tsv => csv::import_grid_with_delimiter(path, b'\t')
            .map_err(|e| read_error(source, path, e))?,
    };

    let table = SourceTable::from_grid(source, grid);
    log::info!(
        "{}: {} rows, {} columns from {}",
        source,
        table.len(),
        table.headers.len(),
        path.display()
    );
    Ok(table)
}

fn read_error(source: &str, path: &Path, e: String) -> ReportError {
    ReportError::Io(format!("{source}: failed to read '{}': {e}", path.display()))
}

/// Write the report as XLSX or CSV depending on the path's extension.
pub fn write_report(report: &Report, path: &Path, sheet_name: &str) -> Result<(), String> {
    match OutputFormat::from_path(path) {
        Some(OutputFormat::Xlsx) => xlsx::export_report(report, path, sheet_name),
        Some(OutputFormat::Csv) => csv::export_report(report, path),
        None => Err(format!(
            "unsupported output type '{}' (expected .xlsx or .csv)",
            path.display()
        )),
    }
}
