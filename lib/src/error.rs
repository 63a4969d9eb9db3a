use polars::error::PolarsError;
use std::io::Error as IoError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("Data file not found: {}", .0.display())]
    MissingDataFile(PathBuf),

    #[error("Season column in {} is not numeric: {reason}", .path.display())]
    InvalidSeason { path: PathBuf, reason: String },

    #[error("Missing required column: {0}")]
    MissingColumn(String),
}
