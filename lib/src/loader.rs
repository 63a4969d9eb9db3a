use crate::{
    error::Error,
    stats::{StatsDf, SEASON},
    Mode, Result,
};
use polars::prelude::*;
use std::{
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const OFFENSE_FILE_STEM: &str = "yearly_player_stats_offense";
pub const DEFENSE_FILE_STEM: &str = "yearly_player_stats_defense";

/// The offensive and defensive tables, read-only once loaded.
#[derive(Clone)]
pub struct Datasets {
    pub offense: StatsDf,
    pub defense: StatsDf,
}

/// What a load produced. A file that could not be loaded leaves an empty
/// table behind and its error in `failures`, tagged with the dataset it was
/// meant for.
pub struct LoadReport {
    pub datasets: Datasets,
    pub failures: Vec<(Mode, Error)>,
}

impl LoadReport {
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    /// The load failure of one dataset, if it failed.
    pub fn failure(&self, mode: Mode) -> Option<&Error> {
        self.failures
            .iter()
            .find(|(failed, _)| *failed == mode)
            .map(|(_, err)| err)
    }

    pub fn failed(&self, mode: Mode) -> bool {
        self.failure(mode).is_some()
    }
}

impl Datasets {
    pub fn table(&self, mode: Mode) -> &StatsDf {
        match mode {
            Mode::Offense => &self.offense,
            Mode::Defense => &self.defense,
        }
    }

    /// Loads both datasets from `data_dir`. Never fails as a whole: each file
    /// that can't be read or whose seasons aren't numeric is reported and
    /// replaced by an empty table.
    pub fn load<P: AsRef<Path>>(data_dir: P) -> LoadReport {
        let data_dir = data_dir.as_ref();
        log::trace!("loader::load {}", data_dir.display());
        let mut failures = Vec::new();
        let mut load_or_empty = |mode: Mode, stem: &str| match load_dataset(data_dir, stem) {
            Ok(table) => table,
            Err(err) => {
                log::warn!("{} data unavailable: {}", mode, err);
                failures.push((mode, err));
                StatsDf::empty()
            }
        };

        let offense = load_or_empty(Mode::Offense, OFFENSE_FILE_STEM);
        let defense = load_or_empty(Mode::Defense, DEFENSE_FILE_STEM);
        LoadReport {
            datasets: Datasets { offense, defense },
            failures,
        }
    }
}

/// Reads `<stem>.csv`, falling back to `<stem>.parquet`.
fn load_dataset(data_dir: &Path, stem: &str) -> Result<StatsDf> {
    let csv_path = data_dir.join(format!("{}.csv", stem));
    let parquet_path = data_dir.join(format!("{}.parquet", stem));

    let (path, df) = if csv_path.is_file() {
        let df = crate::load_csv(&csv_path)?;
        (csv_path, df)
    } else if parquet_path.is_file() {
        let df = crate::load_parquet(&parquet_path)?;
        (parquet_path, df)
    } else {
        return Err(Error::MissingDataFile(csv_path));
    };

    let df = coerce_season(df, &path)?;
    log::debug!("{} rows loaded from {}", df.height(), path.display());
    Ok(StatsDf::new(df))
}

/// Casts the season column to a year. Any value that isn't a whole number, or
/// a missing season, fails the whole file.
fn coerce_season(mut df: DataFrame, path: &Path) -> Result<DataFrame> {
    let season = df
        .column(SEASON)
        .map_err(|_| Error::MissingColumn(SEASON.to_string()))?;

    let invalid = |reason: String| Error::InvalidSeason {
        path: path.to_path_buf(),
        reason,
    };
    if season.null_count() > 0 {
        return Err(invalid(format!("{} rows have no season", season.null_count())));
    }
    if season.dtype().is_float() {
        let fractional = season
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .flatten()
            .filter(|year| year.fract() != 0.0)
            .count();
        if fractional > 0 {
            return Err(invalid(format!("{} rows have a fractional season", fractional)));
        }
    }
    let season = season
        .strict_cast(&DataType::Int32)
        .map_err(|err| invalid(err.to_string()))?;

    df.with_column(season)?;
    Ok(df)
}

/// Explicitly owned memo of [`Datasets::load`].
///
/// The first [`get`](DatasetCache::get) loads from disk, later calls share the
/// same report until [`refresh`](DatasetCache::refresh) or
/// [`invalidate`](DatasetCache::invalidate).
pub struct DatasetCache {
    data_dir: PathBuf,
    slot: RwLock<Option<Arc<LoadReport>>>,
}

impl DatasetCache {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            slot: RwLock::new(None),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn get(&self) -> Arc<LoadReport> {
        if let Some(report) = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Arc::clone(report);
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have loaded while we waited for the write lock
        if let Some(report) = slot.as_ref() {
            return Arc::clone(report);
        }
        let report = Arc::new(Datasets::load(&self.data_dir));
        *slot = Some(Arc::clone(&report));
        report
    }

    /// Reloads from disk unconditionally.
    pub fn refresh(&self) -> Arc<LoadReport> {
        let report = Arc::new(Datasets::load(&self.data_dir));
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&report));
        report
    }

    pub fn invalidate(&self) {
        log::debug!("dataset cache invalidated");
        self.slot.write().unwrap_or_else(PoisonError::into_inner).take();
    }
}
