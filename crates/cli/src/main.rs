// Cobranza CLI - weekly collections report from the five weekly extracts

mod exit_codes;
mod report;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};

use cobranza_recon::{ReportError, SheetSelector};
use exit_codes::{
    report_exit_code, EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_OUTPUT_WRITE, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "cobranza")]
#[command(about = "Weekly collections report: reconcile collector visits against the contract ledger")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the weekly report and write it as .xlsx or .csv
    #[command(after_help = "\
Examples:
  cobranza build --config semana.toml
  cobranza build --config semana.toml -o reporte.csv --json
  cobranza build --cartera cartera.xlsx --pabs pabs.xlsx --siggo siggo.xlsx \\
                 --ecobro ecobro.xlsx --proyecciones proyecciones.xlsx
  cobranza build --config semana.toml --ecobro ecobro_corregido.csv --preview 20")]
    Build(BuildArgs),

    /// Load every source and check its columns without writing a report
    #[command(after_help = "\
Examples:
  cobranza validate --config semana.toml
  cobranza validate --config semana.toml --cartera-sheet Cartera")]
    Validate(SourceArgs),
}

/// Where the five extracts come from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// TOML config naming the five sources and the output
    #[arg(long, short = 'c', env = "COBRANZA_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Contract ledger (Cartera)
    #[arg(long, value_name = "FILE")]
    pub cartera: Option<PathBuf>,

    /// PABS status extract
    #[arg(long, value_name = "FILE")]
    pub pabs: Option<PathBuf>,

    /// SIGGO status extract with the scheduled visit day
    #[arg(long, value_name = "FILE")]
    pub siggo: Option<PathBuf>,

    /// Ecobro visit log
    #[arg(long, value_name = "FILE")]
    pub ecobro: Option<PathBuf>,

    /// Projections list
    #[arg(long, value_name = "FILE")]
    pub proyecciones: Option<PathBuf>,

    /// Ledger worksheet: 0-based index or sheet name (default 3)
    #[arg(long, value_name = "SHEET")]
    pub cartera_sheet: Option<SheetSelector>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Report file (.xlsx or .csv); overrides [output] file
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the run summary as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Print the first N report rows as a table to stdout
    #[arg(long, value_name = "N", conflicts_with = "json")]
    pub preview: Option<usize>,

    /// Suppress the human summary on stderr
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  cobranza-recon ", env!("CARGO_PKG_VERSION"),
        "\nbuild:   ", env!("BUILD_PROFILE"),
        "\ntarget:  ", env!("BUILD_TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Build(args) => report::cmd_build(args),
        Commands::Validate(args) => report::cmd_validate(args),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    pub fn write(msg: impl Into<String>) -> Self {
        Self { code: EXIT_OUTPUT_WRITE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from a core error with its registered exit code.
    pub fn report(err: ReportError) -> Self {
        let hint = match &err {
            ReportError::MissingColumn { source, .. } => {
                Some(format!("check the header row of the {source} extract"))
            }
            ReportError::SheetNotFound { source, .. } => Some(format!(
                "set `sheet` under [sources.{source}] (or --cartera-sheet for the ledger)"
            )),
            ReportError::EmptySource { source } => {
                Some(format!("the {source} sheet looks empty; is it the right sheet?"))
            }
            _ => None,
        };
        Self { code: report_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
