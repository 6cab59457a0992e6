//! `cobranza build` and `cobranza validate`: load the five extracts and run the report.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use cobranza_io::OutputFormat;
use cobranza_recon::directory::validate_sources;
use cobranza_recon::visits::normalize_visits;
use cobranza_recon::{
    build_report, Report, ReportConfig, ReportInput, ReportMeta, ReportSummary, SourceKind,
};

use crate::util::{display_width, pad_right};
use crate::{BuildArgs, CliError, SourceArgs};

/// Columns shown by `--preview`.
const PREVIEW_COLUMNS: [&str; 12] = [
    "CONTRATO",
    "Dia de visita semanal",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
    "Lunes",
    "Martes",
    "Miércoles",
    "Resultado",
    "Aportacion Actual",
    "Dia Visita Correcto",
];
const PREVIEW_MAX_WIDTH: usize = 18;

/// A fully resolved run: validated config plus concrete file paths.
#[derive(Debug)]
struct RunPlan {
    config: ReportConfig,
    sources: BTreeMap<SourceKind, PathBuf>,
    output: PathBuf,
}

#[derive(Serialize)]
struct BuildOutput<'a> {
    meta: ReportMeta,
    output: String,
    summary: &'a ReportSummary,
}

fn source_flag(args: &SourceArgs, kind: SourceKind) -> Option<&PathBuf> {
    match kind {
        SourceKind::Cartera => args.cartera.as_ref(),
        SourceKind::Pabs => args.pabs.as_ref(),
        SourceKind::Siggo => args.siggo.as_ref(),
        SourceKind::Ecobro => args.ecobro.as_ref(),
        SourceKind::Proyecciones => args.proyecciones.as_ref(),
    }
}

/// Merge the config file (if any) with per-source flag overrides.
fn resolve_plan(args: &SourceArgs, output: Option<&PathBuf>) -> Result<RunPlan, CliError> {
    let (mut config, base_dir) = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError::config(format!("cannot read config {}: {e}", path.display()))
            })?;
            let config = ReportConfig::from_toml(&text).map_err(CliError::report)?;
            let base_dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf();
            (config, base_dir)
        }
        None => {
            let missing: Vec<String> = SourceKind::ALL
                .into_iter()
                .filter(|&kind| source_flag(args, kind).is_none())
                .map(|kind| format!("--{kind}"))
                .collect();
            if !missing.is_empty() {
                return Err(CliError::usage(format!(
                    "missing source files: {}",
                    missing.join(", ")
                ))
                .with_hint("pass --config FILE or all five source flags"));
            }
            let file = |kind| {
                source_flag(args, kind)
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            };
            let config = ReportConfig::from_files(
                file(SourceKind::Cartera),
                file(SourceKind::Pabs),
                file(SourceKind::Siggo),
                file(SourceKind::Ecobro),
                file(SourceKind::Proyecciones),
            );
            (config, PathBuf::from("."))
        }
    };

    if let Some(sheet) = &args.cartera_sheet {
        config.sources.get_mut(SourceKind::Cartera).sheet = Some(sheet.clone());
    }
    config.validate().map_err(CliError::report)?;

    // Flags are relative to the working directory, config entries to the config file.
    let sources = SourceKind::ALL
        .into_iter()
        .map(|kind| {
            let path = match source_flag(args, kind) {
                Some(flag) => flag.clone(),
                None => config.sources.get(kind).path(&base_dir),
            };
            (kind, path)
        })
        .collect();

    let output = match output {
        Some(path) => path.clone(),
        None => base_dir.join(&config.output.file),
    };

    Ok(RunPlan { config, sources, output })
}

fn load_input(plan: &RunPlan) -> Result<ReportInput, CliError> {
    let load = |kind: SourceKind| {
        let path = &plan.sources[&kind];
        log::debug!("loading {} from {}", kind, path.display());
        cobranza_io::load_source(path, &plan.config.sheet(kind), kind.name())
            .map_err(CliError::report)
    };

    Ok(ReportInput {
        cartera: load(SourceKind::Cartera)?,
        pabs: load(SourceKind::Pabs)?,
        siggo: load(SourceKind::Siggo)?,
        ecobro: load(SourceKind::Ecobro)?,
        proyecciones: load(SourceKind::Proyecciones)?,
    })
}

pub fn cmd_build(args: BuildArgs) -> Result<(), CliError> {
    let plan = resolve_plan(&args.sources, args.output.as_ref())?;

    if OutputFormat::from_path(&plan.output).is_none() {
        return Err(CliError::usage(format!(
            "unsupported output type: {}",
            plan.output.display()
        ))
        .with_hint("use a .xlsx or .csv file name"));
    }

    let input = load_input(&plan)?;
    let report = build_report(&input, &plan.config.branch_table()).map_err(CliError::report)?;

    cobranza_io::write_report(&report, &plan.output, &plan.config.output.sheet_name)
        .map_err(CliError::write)?;

    if args.json {
        let out = BuildOutput {
            meta: ReportMeta {
                name: plan.config.name.clone(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            },
            output: plan.output.display().to_string(),
            summary: &report.summary,
        };
        let json = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    if let Some(n) = args.preview {
        print!("{}", render_preview(&report, n));
    }

    if !args.quiet {
        print_summary(&plan.config.name, &report.summary);
        eprintln!("wrote {}", plan.output.display());
    }

    Ok(())
}

pub fn cmd_validate(args: SourceArgs) -> Result<(), CliError> {
    let plan = resolve_plan(&args, None)?;
    let input = load_input(&plan)?;

    validate_sources(&input).map_err(CliError::report)?;
    let log = normalize_visits(&input.ecobro).map_err(CliError::report)?;

    eprintln!(
        "ok: {} sources valid ({} ledger rows, {} visit rows, {} with unreadable dates)",
        SourceKind::ALL.len(),
        input.cartera.len(),
        log.rows_read,
        log.dropped_dates,
    );
    Ok(())
}

fn print_summary(name: &str, s: &ReportSummary) {
    eprintln!(
        "{}: {} contracts, {} visited, {} cobros (${:.2}), {} correct / {} incorrect visit days",
        name,
        s.contracts,
        s.with_visits,
        s.cobros,
        s.total_collected,
        s.correct_visits,
        s.incorrect_visits,
    );
    if s.dropped_dates > 0 || s.dropped_keys > 0 {
        eprintln!(
            "note: {} visit rows dropped ({} bad dates, {} blank contracts)",
            s.dropped_dates + s.dropped_keys,
            s.dropped_dates,
            s.dropped_keys,
        );
    }
    if s.unmatched_events > 0 {
        eprintln!(
            "note: {} visit events matched no ledger contract",
            s.unmatched_events
        );
    }
}

fn preview_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| pad_right(cell.as_ref(), w))
        .collect();
    format!("{}\n", padded.join("  ").trim_end())
}

/// Fixed-width table of the first `limit` rows over the preview columns.
fn render_preview(report: &Report, limit: usize) -> String {
    let cols: Vec<(usize, &str)> = PREVIEW_COLUMNS
        .iter()
        .filter_map(|&label| report.column_index(label).map(|i| (i, label)))
        .collect();
    let rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .take(limit)
        .map(|row| {
            cols.iter()
                .map(|&(i, _)| row.get(i).map(|v| v.render()).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = cols
        .iter()
        .enumerate()
        .map(|(c, (_, label))| {
            rows.iter()
                .map(|r| display_width(&r[c]))
                .chain(std::iter::once(display_width(label)))
                .max()
                .unwrap_or(0)
                .min(PREVIEW_MAX_WIDTH)
        })
        .collect();

    let dashes: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    let labels: Vec<&str> = cols.iter().map(|&(_, label)| label).collect();

    let mut out = preview_line(&labels, &widths);
    out.push_str(&preview_line(&dashes, &widths));
    for row in &rows {
        out.push_str(&preview_line(row, &widths));
    }
    if report.rows.len() > limit {
        out.push_str(&format!("... {} more rows\n", report.rows.len() - limit));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobranza_recon::ReportValue;

    fn args_with_flags() -> SourceArgs {
        SourceArgs {
            cartera: Some("in/cartera.csv".into()),
            pabs: Some("in/pabs.csv".into()),
            siggo: Some("in/siggo.csv".into()),
            ecobro: Some("in/ecobro.csv".into()),
            proyecciones: Some("in/proyecciones.csv".into()),
            ..Default::default()
        }
    }

    #[test]
    fn plan_from_flags() {
        let plan = resolve_plan(&args_with_flags(), None).unwrap();
        assert_eq!(plan.sources[&SourceKind::Ecobro], PathBuf::from("in/ecobro.csv"));
        assert_eq!(plan.output, PathBuf::from("./reporte_formateado.xlsx"));
        assert_eq!(plan.config.output.sheet_name, "Reporte");
    }

    #[test]
    fn plan_requires_all_flags_without_config() {
        let mut args = args_with_flags();
        args.pabs = None;
        args.siggo = None;
        let err = resolve_plan(&args, None).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        assert_eq!(err.message, "missing source files: --pabs, --siggo");
    }

    #[test]
    fn plan_resolves_config_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("semana.toml");
        std::fs::write(
            &config_path,
            r#"
[sources.cartera]
file = "cartera.xlsx"
[sources.pabs]
file = "pabs.xlsx"
[sources.siggo]
file = "siggo.xlsx"
[sources.ecobro]
file = "ecobro.xlsx"
[sources.proyecciones]
file = "proyecciones.xlsx"
[output]
file = "salida.csv"
"#,
        )
        .unwrap();

        let args = SourceArgs {
            config: Some(config_path),
            ecobro: Some("otro/ecobro.csv".into()),
            cartera_sheet: Some(cobranza_recon::SheetSelector::Name("Cartera".into())),
            ..Default::default()
        };
        let plan = resolve_plan(&args, None).unwrap();
        assert_eq!(plan.sources[&SourceKind::Pabs], dir.path().join("pabs.xlsx"));
        assert_eq!(plan.sources[&SourceKind::Ecobro], PathBuf::from("otro/ecobro.csv"));
        assert_eq!(plan.output, dir.path().join("salida.csv"));
        assert_eq!(
            plan.config.sheet(SourceKind::Cartera),
            cobranza_recon::SheetSelector::Name("Cartera".into())
        );
    }

    #[test]
    fn plan_rejects_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("mala.toml");
        std::fs::write(&config_path, "[sources\n").unwrap();
        let args = SourceArgs {
            config: Some(config_path),
            ..Default::default()
        };
        let err = resolve_plan(&args, None).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_INVALID_CONFIG);
    }

    #[test]
    fn preview_table() {
        let mut columns: Vec<String> = vec!["CONTRATO".into(), "Resultado".into()];
        columns.push("Aportacion Actual".into());
        let report = Report {
            columns,
            rows: vec![
                vec![
                    ReportValue::Text("A0001".into()),
                    ReportValue::Text("Cobro".into()),
                    ReportValue::Number(150.0),
                ],
                vec![
                    ReportValue::Text("B0002".into()),
                    ReportValue::Text("Visita".into()),
                    ReportValue::Number(0.0),
                ],
            ],
            summary: Default::default(),
        };

        let out = render_preview(&report, 1);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "CONTRATO  Resultado  Aportacion Actual");
        assert_eq!(lines[1], "--------  ---------  -----------------");
        assert_eq!(lines[2], "A0001     Cobro      150");
        assert_eq!(lines[3], "... 1 more rows");
    }
}
