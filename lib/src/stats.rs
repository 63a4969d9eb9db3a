use crate::{error::Error, Result};
use derive_deref::Deref;
use itertools::Itertools;
use polars::prelude::*;

pub const PLAYER_NAME: &str = "player_name";
pub const POSITION: &str = "position";
pub const SEASON: &str = "season";

/// Season-by-season player stats, either raw (possibly several rows per
/// player and season) or aggregated by [`StatsDf::aggregate`].
#[derive(Clone, Deref)]
pub struct StatsDf(DataFrame);

impl StatsDf {
    pub fn new(df: DataFrame) -> Self {
        StatsDf(df)
    }

    pub fn empty() -> Self {
        StatsDf(DataFrame::empty())
    }

    pub fn lazy(&self) -> LazyFrame {
        self.0.clone().lazy()
    }

    pub fn filter(self, filter: Expr) -> Result<Self> {
        let df = self.0.lazy().filter(filter).collect()?;
        Ok(StatsDf(df))
    }

    pub fn is_empty(&self) -> bool {
        self.0.height() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.0.get_column_index(name).is_some()
    }

    pub fn has_position(&self) -> bool {
        self.has_column(POSITION)
    }

    /// Columns identifying a player. Tables without a position column (the
    /// defensive dataset may omit it) identify players by name alone.
    pub fn player_keys(&self) -> Vec<&'static str> {
        if self.has_position() {
            vec![PLAYER_NAME, POSITION]
        } else {
            vec![PLAYER_NAME]
        }
    }

    /// Grouping key of an aggregated row: the player keys plus the season.
    pub fn identity_keys(&self) -> Vec<&'static str> {
        let mut keys = self.player_keys();
        keys.push(SEASON);
        keys
    }

    /// True when `name` is a numeric column that isn't part of the identity
    /// key, i.e. something that can be summed and ranked.
    pub fn is_measure(&self, name: &str) -> bool {
        if [PLAYER_NAME, POSITION, SEASON].contains(&name) {
            return false;
        }
        self.0
            .column(name)
            .map(|series| series.dtype().is_numeric())
            .unwrap_or(false)
    }

    /// Collapses the table to one row per (player_name, position, season),
    /// summing every numeric measure. Non-numeric columns outside the key are
    /// dropped. Rows come back sorted by the key.
    pub fn aggregate(&self) -> Result<Self> {
        log::trace!("stats::aggregate");
        if self.0.width() == 0 {
            return Ok(self.clone());
        }

        let keys = self.identity_keys();
        if let Some(missing) = keys.iter().find(|key| !self.has_column(key)) {
            return Err(Error::MissingColumn(missing.to_string()));
        }

        let measures: Vec<Expr> = self
            .0
            .get_columns()
            .iter()
            .filter(|series| series.dtype().is_numeric())
            .filter(|series| !keys.iter().any(|key| *key == series.name()))
            .map(|series| col(series.name()).sum())
            .collect();
        let group_by: Vec<Expr> = keys.iter().map(|key| col(key)).collect();

        // Rows missing part of their key belong to no player season
        let df = self
            .clone()
            .filter(StatsFilter::new().identified(&keys).build())?
            .lazy()
            .group_by(group_by)
            .agg(measures)
            .sort(keys, SortMultipleOptions::default())
            .collect()?;
        log::debug!(
            "{} raw rows aggregated into {} player seasons",
            self.0.height(),
            df.height()
        );
        Ok(StatsDf(df))
    }

    /// Distinct seasons, newest first.
    pub fn seasons(&self) -> Result<Vec<i32>> {
        if !self.has_column(SEASON) {
            return Ok(Vec::new());
        }
        let seasons = self.0.column(SEASON)?.cast(&DataType::Int32)?;
        let seasons = seasons
            .i32()?
            .into_iter()
            .flatten()
            .unique()
            .sorted_unstable_by(|a, b| b.cmp(a))
            .collect();
        Ok(seasons)
    }

    /// First and last season present, if any.
    pub fn season_span(&self) -> Result<Option<(i32, i32)>> {
        let seasons = self.seasons()?;
        Ok(seasons.last().copied().zip(seasons.first().copied()))
    }
}

#[derive(Clone, Default)]
pub struct StatsFilter {
    filter_expr: Option<Expr>,
}

impl StatsFilter {
    pub fn new() -> Self {
        Self { filter_expr: None }
    }

    pub fn season(self, season: i32) -> Self {
        let expr = col(SEASON).eq(lit(season));
        self.extend_filter(expr)
    }

    pub fn position(self, position: &str) -> Self {
        let expr = col(POSITION).eq(lit(position));
        self.extend_filter(expr)
    }

    /// Keeps only rows where every column in `keys` is set.
    pub fn identified(self, keys: &[&str]) -> Self {
        keys.iter()
            .fold(self, |filter, key| filter.extend_filter(col(key).is_not_null()))
    }

    // Combines the current filter with a new one using AND logic
    fn extend_filter(mut self, new_expr: Expr) -> Self {
        self.filter_expr = match self.filter_expr.take() {
            Some(existing_expr) => Some(existing_expr.and(new_expr)),
            None => Some(new_expr),
        };
        self
    }

    // Builds the final filter expression
    pub fn build(self) -> Expr {
        self.filter_expr.unwrap_or_else(|| lit(true))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn raw_passing() -> StatsDf {
        let df = df!(
            PLAYER_NAME => &["P1", "P1", "P1", "P2", "P2"],
            POSITION => &["QB", "QB", "QB", "QB", "QB"],
            SEASON => &[2020i32, 2020, 2021, 2020, 2021],
            "team" => &["AAA", "BBB", "AAA", "CCC", "CCC"],
            "season_passing_yards" => &[300i64, 50, 400, 500, 100],
            "passer_rating" => &[90.5f64, 80.0, 101.2, 95.0, 70.0],
        )
        .unwrap();
        StatsDf::new(df)
    }

    fn rows(df: &DataFrame, metric: &str) -> Vec<(String, String, i32, i64)> {
        let names = df.column(PLAYER_NAME).unwrap().str().unwrap();
        let positions = df.column(POSITION).unwrap().str().unwrap();
        let seasons = df.column(SEASON).unwrap().i32().unwrap();
        let values = df.column(metric).unwrap().i64().unwrap();
        (0..df.height())
            .map(|i| {
                (
                    names.get(i).unwrap().to_string(),
                    positions.get(i).unwrap().to_string(),
                    seasons.get(i).unwrap(),
                    values.get(i).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn aggregate_sums_multi_team_seasons() {
        let aggregated = raw_passing().aggregate().unwrap();
        assert_eq!(
            rows(&aggregated, "season_passing_yards"),
            vec![
                ("P1".into(), "QB".into(), 2020, 350),
                ("P1".into(), "QB".into(), 2021, 400),
                ("P2".into(), "QB".into(), 2020, 500),
                ("P2".into(), "QB".into(), 2021, 100),
            ]
        );
    }

    #[test]
    fn aggregate_drops_text_columns() {
        let aggregated = raw_passing().aggregate().unwrap();
        assert!(!aggregated.has_column("team"));
        assert!(aggregated.has_column("passer_rating"));
        let rating = aggregated.column("passer_rating").unwrap().f64().unwrap();
        assert!((rating.get(0).unwrap() - 170.5).abs() < 1e-9);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let once = raw_passing().aggregate().unwrap();
        let twice = once.aggregate().unwrap();
        assert!(once.equals(&twice));
    }

    #[test]
    fn aggregate_has_unique_keys() {
        let aggregated = raw_passing().aggregate().unwrap();
        let keys = rows(&aggregated, "season_passing_yards")
            .into_iter()
            .map(|(name, position, season, _)| (name, position, season))
            .collect::<Vec<_>>();
        assert_eq!(keys.iter().unique().count(), keys.len());
    }

    #[test]
    fn position_change_is_a_separate_identity() {
        let df = df!(
            PLAYER_NAME => &["Hybrid", "Hybrid", "Hybrid"],
            POSITION => &["WR", "WR", "RB"],
            SEASON => &[2019i32, 2019, 2020],
            "season_rushing_yards" => &[10i64, 5, 700],
        )
        .unwrap();
        let aggregated = StatsDf::new(df).aggregate().unwrap();
        assert_eq!(
            rows(&aggregated, "season_rushing_yards"),
            vec![
                ("Hybrid".into(), "RB".into(), 2020, 700),
                ("Hybrid".into(), "WR".into(), 2019, 15),
            ]
        );
    }

    #[test]
    fn aggregate_without_position_column() {
        let df = df!(
            PLAYER_NAME => &["D1", "D1"],
            SEASON => &[2022i32, 2022],
            "sack" => &[2.5f64, 1.0],
        )
        .unwrap();
        let aggregated = StatsDf::new(df).aggregate().unwrap();
        assert_eq!(aggregated.height(), 1);
        assert_eq!(aggregated.column("sack").unwrap().f64().unwrap().get(0), Some(3.5));
    }

    #[test]
    fn aggregate_requires_player_name() {
        let df = df!(SEASON => &[2020i32], "sack" => &[1i64]).unwrap();
        assert!(matches!(
            StatsDf::new(df).aggregate(),
            Err(Error::MissingColumn(column)) if column == PLAYER_NAME
        ));
    }

    #[test]
    fn empty_table_stays_empty() {
        let empty = StatsDf::empty();
        assert!(empty.aggregate().unwrap().is_empty());
        assert!(empty.seasons().unwrap().is_empty());
        assert_eq!(empty.season_span().unwrap(), None);
        assert!(!empty.is_measure("sack"));
    }

    #[test]
    fn seasons_newest_first() {
        let table = raw_passing();
        assert_eq!(table.seasons().unwrap(), vec![2021, 2020]);
        assert_eq!(table.season_span().unwrap(), Some((2020, 2021)));
    }

    #[test]
    fn measures_exclude_keys_and_text() {
        let table = raw_passing();
        assert!(table.is_measure("season_passing_yards"));
        assert!(!table.is_measure(SEASON));
        assert!(!table.is_measure("team"));
        assert!(!table.is_measure("missing"));
    }

    #[test]
    fn filter_combines_conditions() {
        let filter = StatsFilter::new().season(2020).position("QB").build();
        let filtered = raw_passing().filter(filter).unwrap();
        assert_eq!(filtered.height(), 3);
    }

    #[test]
    fn aggregate_drops_rows_without_a_name() {
        let df = df!(
            PLAYER_NAME => &[None, Some("P1"), Some("P1")],
            POSITION => &[Some("QB"), Some("QB"), None],
            SEASON => &[2020i32, 2020, 2020],
            "season_passing_yards" => &[900i64, 300, 40],
        )
        .unwrap();
        let aggregated = StatsDf::new(df).aggregate().unwrap();
        assert_eq!(
            rows(&aggregated, "season_passing_yards"),
            vec![("P1".into(), "QB".into(), 2020, 300)]
        );
    }
}
