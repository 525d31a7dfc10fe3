use std::fmt;

/// Which input a parse error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Payment,
    Portfolio,
    PriorPeriod,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payment => write!(f, "payment batch"),
            Self::Portfolio => write!(f, "portfolio statement"),
            Self::PriorPeriod => write!(f, "prior-period file"),
        }
    }
}

#[derive(Debug)]
pub enum ReconError {
    /// A supplied file cannot be opened or read.
    SourceNotFound { path: String, reason: String },
    /// Expected columns absent or the layout does not fit this file.
    SchemaMismatch { source: SourceKind, detail: String },
    /// A cell that must be numeric cannot be parsed. `row` is 1-based, as shown in a spreadsheet.
    TypeCoercion { source: SourceKind, row: usize, column: String, value: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (overlapping prefix rules, bad sheet names, etc.).
    ConfigValidation(String),
    /// Report workbook could not be written.
    Write { path: String, reason: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceNotFound { path, reason } => {
                write!(f, "cannot open '{path}': {reason}")
            }
            Self::SchemaMismatch { source, detail } => {
                write!(f, "{source}: layout mismatch: {detail}")
            }
            Self::TypeCoercion { source, row, column, value } => {
                write!(f, "{source}, row {row}: cannot read '{value}' in column '{column}' as a number")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Write { path, reason } => write!(f, "cannot write '{path}': {reason}"),
        }
    }
}

impl std::error::Error for ReconError {}
