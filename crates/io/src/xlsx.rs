// Excel import (xlsx, xls, xlsb, ods) and styled report export

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{Duration, NaiveDate};
use rust_xlsxwriter::{
    Color, ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook, Worksheet,
};

use cobranza_recon::{Report, ReportError, ReportValue, SheetSelector};

use crate::Grid;

/// Largest serial Excel can hold (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;
const HEADER_FILL: u32 = 0x1F497D;
const DATE_FORMAT: &str = "yyyy-mm-dd";

/// Read one worksheet into a grid of cell text.
pub fn import_grid(
    path: &Path,
    sheet: &SheetSelector,
    source: &str,
) -> Result<Grid, ReportError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| {
        ReportError::Io(format!(
            "{source}: failed to open '{}': {e}",
            path.display()
        ))
    })?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let name = resolve_sheet(&sheet_names, sheet).ok_or_else(|| ReportError::SheetNotFound {
        source: source.to_string(),
        sheet: sheet.to_string(),
    })?;

    let range = workbook.worksheet_range(&name).map_err(|e| {
        ReportError::Io(format!("{source}: failed to read sheet '{name}': {e}"))
    })?;

    log::debug!(
        "{}: sheet '{}' of {}, {}x{}",
        source,
        name,
        path.display(),
        range.height(),
        range.width()
    );

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

/// Sheet name for a selector; `None` when the workbook has no such sheet.
pub fn resolve_sheet(names: &[String], sheet: &SheetSelector) -> Option<String> {
    match sheet {
        SheetSelector::Index(i) => names.get(*i).cloned(),
        SheetSelector::Name(name) => names
            .iter()
            .find(|n| n.trim().eq_ignore_ascii_case(name.trim()))
            .cloned(),
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Integers without decimals so numeric keys join as text
        Data::Float(n) => format_number(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => String::from(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => serial_to_text(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Excel serial (1900 system) to `YYYY-MM-DD HH:MM:SS`.
fn serial_to_text(serial: f64) -> String {
    if !(0.0..=MAX_EXCEL_SERIAL + 1.0).contains(&serial) {
        return format_number(serial);
    }
    let seconds = (serial * 86_400.0).round() as i64;
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|base| base.checked_add_signed(Duration::seconds(seconds)))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format_number(serial))
}

/// Write the styled report workbook. Nothing touches the disk until the
/// whole workbook has been rendered.
pub fn export_report(report: &Report, path: &Path, sheet_name: &str) -> Result<(), String> {
    let buffer = render_report(report, sheet_name)?;
    std::fs::write(path, buffer)
        .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
    log::info!("wrote {} rows to {}", report.rows.len(), path.display());
    Ok(())
}

pub fn render_report(report: &Report, sheet_name: &str) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(sheet_name)
        .map_err(|e| format!("Failed to create sheet '{}': {}", sheet_name, e))?;

    write_header(worksheet, &report.columns)?;
    write_rows(worksheet, report)?;

    for (col, width) in column_widths(report).into_iter().enumerate() {
        worksheet
            .set_column_width(col as u16, width as f64)
            .map_err(|e| format!("Failed to set width of column {}: {}", col, e))?;
    }
    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("Failed to freeze header row: {}", e))?;

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Failed to render XLSX file: {}", e))
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_text_wrap()
        .set_align(FormatAlign::Top)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_font_color(Color::White)
        .set_border(FormatBorder::Thin)
}

fn write_header(worksheet: &mut Worksheet, columns: &[String]) -> Result<(), String> {
    let format = header_format();
    for (col, label) in columns.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, label, &format)
            .map_err(|e| format!("Failed to write header '{}': {}", label, e))?;
    }
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, report: &Report) -> Result<(), String> {
    let date_format = Format::new().set_num_format(DATE_FORMAT);

    for (i, row) in report.rows.iter().enumerate() {
        let row32 = i as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            let col16 = col as u16;
            let written = match value {
                ReportValue::Empty => continue,
                ReportValue::Text(s) => worksheet.write_string(row32, col16, s).map(|_| ()),
                ReportValue::Number(n) => worksheet.write_number(row32, col16, *n).map(|_| ()),
                ReportValue::Date(d) => {
                    let date = excel_date(*d)?;
                    worksheet
                        .write_datetime_with_format(row32, col16, &date, &date_format)
                        .map(|_| ())
                }
            };
            written.map_err(|e| format!("Failed to write cell ({}, {}): {}", row32, col, e))?;
        }
    }
    Ok(())
}

fn excel_date(date: NaiveDate) -> Result<ExcelDateTime, String> {
    use chrono::Datelike;

    let year = u16::try_from(date.year()).map_err(|_| format!("Date out of range: {}", date))?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8)
        .map_err(|e| format!("Date out of range: {}: {}", date, e))
}

/// Width per column: longest of header and rendered cells, plus 2.
pub fn column_widths(report: &Report) -> Vec<usize> {
    report
        .columns
        .iter()
        .enumerate()
        .map(|(col, label)| {
            let longest = report
                .rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|v| v.render().chars().count())
                .max()
                .unwrap_or(0);
            label.chars().count().max(longest) + 2
        })
        .collect()
}
