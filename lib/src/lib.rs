use parse_display::{Display, FromStr};
use polars::prelude::*;
use serde::Serialize;
use std::path::Path;

pub mod catalog;
mod error;
pub mod evolution;
pub mod loader;
pub mod outcome;
pub mod ranking;
pub mod stats;

pub use error::Error;
pub use loader::{DatasetCache, Datasets, LoadReport};
pub use outcome::Outcome;
pub use stats::StatsDf;

type Result<T> = std::result::Result<T, error::Error>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, FromStr, Serialize)]
#[display(style = "UPPERCASE")]
pub enum Position {
    Qb,
    Rb,
    Wr,
    Te,
}

impl Position {
    pub const ALL: [Position; 4] = [Position::Qb, Position::Rb, Position::Wr, Position::Te];
}

/// Which of the two datasets a query runs against.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Display, FromStr, Serialize)]
#[display(style = "lowercase")]
pub enum Mode {
    #[default]
    Offense,
    Defense,
}

pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let mut file = std::fs::File::open(path)?;
    let df = ParquetReader::new(&mut file).finish()?;
    Ok(df)
}

/// Reads a headered CSV file, inferring column types from every row so a
/// stray value deep in the file is not silently nulled.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;
    Ok(df)
}
