use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ReportError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty path, bad branch prefix, etc.).
    ConfigValidation(String),
    /// Missing required column in an input source.
    MissingColumn { source: String, column: String },
    /// Requested sheet does not exist in a workbook source.
    SheetNotFound { source: String, sheet: String },
    /// Source has no header row at all.
    EmptySource { source: String },
    /// IO error (file read/write, workbook decoding, etc.).
    Io(String),
}

impl ReportError {
    pub fn missing_column(source: &str, column: &str) -> Self {
        Self::MissingColumn {
            source: source.into(),
            column: column.into(),
        }
    }

    /// True for errors caused by the shape of an input source.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn { .. } | Self::SheetNotFound { .. } | Self::EmptySource { .. }
        )
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { source, column } => {
                write!(f, "source '{source}': missing column '{column}'")
            }
            Self::SheetNotFound { source, sheet } => {
                write!(f, "source '{source}': sheet {sheet} not found")
            }
            Self::EmptySource { source } => write!(f, "source '{source}': no header row"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReportError {}
