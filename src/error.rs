use std::path::PathBuf;

/// Failures while reading the sales table. All of them abort startup.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed row at line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("line {line}: unparseable date `{value}`")]
    InvalidDate { line: u64, value: String },

    #[error("line {line}: time `{value}` is not in HH:MM format")]
    InvalidTime { line: u64, value: String },

    #[error("dataset contains no rows")]
    EmptyDataset,
}

/// A selector label that is not part of the catalog.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("unknown time period `{0}`")]
    UnknownTimePeriod(String),

    #[error("unknown branch `{0}`")]
    UnknownBranch(String),
}
