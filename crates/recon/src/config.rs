use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::branch::BranchTable;
use crate::error::ReportError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub sources: SourcesConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Extra or overriding contract-prefix → branch entries.
    #[serde(default)]
    pub branch_prefixes: BTreeMap<String, String>,
}

fn default_name() -> String {
    "Reporte semanal".into()
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// The five weekly extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Cartera,
    Pabs,
    Siggo,
    Ecobro,
    Proyecciones,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Cartera,
        SourceKind::Pabs,
        SourceKind::Siggo,
        SourceKind::Ecobro,
        SourceKind::Proyecciones,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Cartera => "cartera",
            Self::Pabs => "pabs",
            Self::Siggo => "siggo",
            Self::Ecobro => "ecobro",
            Self::Proyecciones => "proyecciones",
        }
    }

    /// Sheet read when the config does not name one. The ledger workbook
    /// keeps its contract list on the fourth sheet.
    pub fn default_sheet(self) -> SheetSelector {
        match self {
            Self::Cartera => SheetSelector::Index(3),
            _ => SheetSelector::Index(0),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    pub cartera: SourceConfig,
    pub pabs: SourceConfig,
    pub siggo: SourceConfig,
    pub ecobro: SourceConfig,
    pub proyecciones: SourceConfig,
}

impl SourcesConfig {
    pub fn get(&self, kind: SourceKind) -> &SourceConfig {
        match kind {
            SourceKind::Cartera => &self.cartera,
            SourceKind::Pabs => &self.pabs,
            SourceKind::Siggo => &self.siggo,
            SourceKind::Ecobro => &self.ecobro,
            SourceKind::Proyecciones => &self.proyecciones,
        }
    }

    pub fn get_mut(&mut self, kind: SourceKind) -> &mut SourceConfig {
        match kind {
            SourceKind::Cartera => &mut self.cartera,
            SourceKind::Pabs => &mut self.pabs,
            SourceKind::Siggo => &mut self.siggo,
            SourceKind::Ecobro => &mut self.ecobro,
            SourceKind::Proyecciones => &mut self.proyecciones,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub file: String,
    #[serde(default)]
    pub sheet: Option<SheetSelector>,
}

impl SourceConfig {
    pub fn from_file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            sheet: None,
        }
    }

    /// Path resolved against the config file's directory.
    pub fn path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.file)
    }
}

/// Worksheet by 0-based position or by name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SheetSelector {
    Index(usize),
    Name(String),
}

impl std::fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

impl std::str::FromStr for SheetSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<usize>() {
            Ok(i) => Self::Index(i),
            Err(_) => Self::Name(s.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_file")]
    pub file: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
}

fn default_output_file() -> String {
    "reporte_formateado.xlsx".into()
}

fn default_sheet_name() -> String {
    "Reporte".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: default_output_file(),
            sheet_name: default_sheet_name(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

const MAX_SHEET_NAME: usize = 31;
const SHEET_NAME_FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

impl ReportConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReportError> {
        let config: ReportConfig =
            toml::from_str(input).map_err(|e| ReportError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Config built from five file paths with every other setting defaulted.
    pub fn from_files(
        cartera: impl Into<String>,
        pabs: impl Into<String>,
        siggo: impl Into<String>,
        ecobro: impl Into<String>,
        proyecciones: impl Into<String>,
    ) -> Self {
        Self {
            name: default_name(),
            sources: SourcesConfig {
                cartera: SourceConfig::from_file(cartera),
                pabs: SourceConfig::from_file(pabs),
                siggo: SourceConfig::from_file(siggo),
                ecobro: SourceConfig::from_file(ecobro),
                proyecciones: SourceConfig::from_file(proyecciones),
            },
            output: OutputConfig::default(),
            branch_prefixes: BTreeMap::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        for kind in SourceKind::ALL {
            if self.sources.get(kind).file.trim().is_empty() {
                return Err(ReportError::ConfigValidation(format!(
                    "source '{kind}': file must not be empty"
                )));
            }
        }

        for prefix in self.branch_prefixes.keys() {
            if prefix.chars().count() != 2 {
                return Err(ReportError::ConfigValidation(format!(
                    "branch prefix '{prefix}' must be exactly 2 characters"
                )));
            }
        }

        let sheet = &self.output.sheet_name;
        if sheet.trim().is_empty() || sheet.chars().count() > MAX_SHEET_NAME {
            return Err(ReportError::ConfigValidation(format!(
                "output sheet name must be 1-{MAX_SHEET_NAME} characters, got '{sheet}'"
            )));
        }
        if sheet.contains(SHEET_NAME_FORBIDDEN) {
            return Err(ReportError::ConfigValidation(format!(
                "output sheet name '{sheet}' contains a forbidden character"
            )));
        }

        if self.output.file.trim().is_empty() {
            return Err(ReportError::ConfigValidation(
                "output file must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Sheet to read for a source.
    pub fn sheet(&self, kind: SourceKind) -> SheetSelector {
        self.sources
            .get(kind)
            .sheet
            .clone()
            .unwrap_or_else(|| kind.default_sheet())
    }

    pub fn branch_table(&self) -> BranchTable {
        BranchTable::with_overrides(&self.branch_prefixes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
