use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the pipeline. There is no partial-result mode: the first
/// error encountered stops the run before any output file is written.
#[derive(Debug, Error)]
pub enum Error {
    /// The required user positions file is absent from the data directory.
    #[error("no user positions file found at {}", path.display())]
    MissingInput { path: PathBuf },

    /// Malformed or degenerate price data, e.g. a zero previous close that
    /// would make a period return undefined.
    #[error("invalid price data: {0}")]
    Data(String),

    /// A date field that cannot be parsed as a calendar date.
    #[error("invalid date: {0}")]
    Date(String),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
