use crate::{
    outcome::Outcome,
    stats::{StatsDf, StatsFilter, PLAYER_NAME, POSITION},
    Result,
};
use polars::prelude::*;
use serde::Serialize;
use std::{fmt, str::FromStr};

pub const DEFAULT_TOP_N: usize = 20;

/// Either a single season or the whole span of the data (career totals).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SeasonSelector {
    Year(i32),
    #[default]
    All,
}

impl SeasonSelector {
    /// Phrase used in chart titles.
    pub fn period_label(&self) -> String {
        match self {
            SeasonSelector::Year(year) => format!("in the {} season", year),
            SeasonSelector::All => "(all seasons)".to_string(),
        }
    }
}

impl fmt::Display for SeasonSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonSelector::Year(year) => write!(f, "{}", year),
            SeasonSelector::All => f.write_str("all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSeasonError(String);

impl fmt::Display for ParseSeasonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected a season year or \"all\", got \"{}\"", self.0)
    }
}

impl std::error::Error for ParseSeasonError {}

impl FromStr for SeasonSelector {
    type Err = ParseSeasonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(SeasonSelector::All);
        }
        s.parse()
            .map(SeasonSelector::Year)
            .map_err(|_| ParseSeasonError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    /// 1 is the best
    pub rank: usize,
    pub display_name: String,
    pub player_name: String,
    pub position: Option<String>,
    pub value: f64,
    #[serde(skip)]
    fractional: bool,
}

impl RankingEntry {
    fn new(rank: usize, player_name: String, position: Option<String>, value: f64, fractional: bool) -> Self {
        let display_name = match &position {
            Some(position) => format!("{} ({})", player_name, position),
            None => player_name.clone(),
        };
        Self {
            rank,
            display_name,
            player_name,
            position,
            value,
            fractional,
        }
    }

    /// Value as shown on a chart: rates keep one decimal, counts none.
    pub fn display_value(&self) -> String {
        if self.fractional {
            format!("{:.1}", self.value)
        } else {
            format!("{:.0}", self.value)
        }
    }
}

/// Ranks players by `metric`.
///
/// For a single season the rows of that season are ranked; for
/// [`SeasonSelector::All`] each player's seasons are summed into a career
/// total first. Players are identified by name and position. Equal values are
/// ordered by player name, then position.
///
/// Entries come back ascending by value (the reverse of rank order), which is
/// the order a horizontal bar chart draws them in.
pub fn top_n(
    table: &StatsDf,
    metric: &str,
    n: usize,
    season: SeasonSelector,
    position: Option<&str>,
) -> Result<Outcome<Vec<RankingEntry>>> {
    log::trace!("ranking::top_n {} {} {:?}", metric, season, position);
    if n == 0 || !table.is_measure(metric) {
        log::debug!("{} is not a rankable column", metric);
        return Ok(Outcome::NoData);
    }
    if position.is_some() && !table.has_position() {
        return Ok(Outcome::NoData);
    }
    let fractional = table.column(metric)?.dtype().is_float();

    let keys = table.player_keys();
    let mut filter = StatsFilter::new().identified(&keys);
    if let SeasonSelector::Year(year) = season {
        filter = filter.season(year);
    }
    if let Some(position) = position {
        filter = filter.position(position);
    }

    let group_by: Vec<Expr> = keys.iter().map(|key| col(key)).collect();
    let mut order = vec![metric];
    order.extend(keys.iter().copied());
    let descending: Vec<bool> = order.iter().map(|column| *column == metric).collect();

    // A single season of aggregated input has one row per player already, so
    // the grouping only matters for career totals and raw input.
    let df = table
        .lazy()
        .filter(filter.build())
        .group_by(group_by)
        .agg([col(metric).sum()])
        .sort(
            order,
            SortMultipleOptions::default()
                .with_order_descending_multi(descending)
                .with_nulls_last(true),
        )
        .limit(n as IdxSize)
        .collect()?;
    log::debug!("{} players ranked by {}", df.height(), metric);

    let names = df.column(PLAYER_NAME)?.cast(&DataType::String)?;
    let names = names.str()?;
    let positions = match table.has_position() {
        true => Some(df.column(POSITION)?.cast(&DataType::String)?),
        false => None,
    };
    let positions = positions.as_ref().map(|series| series.str()).transpose()?;
    let values = df.column(metric)?.cast(&DataType::Float64)?;
    let values = values.f64()?;

    let mut entries: Vec<RankingEntry> = (0..df.height())
        .map(|i| {
            RankingEntry::new(
                i + 1,
                names.get(i).unwrap_or_default().to_string(),
                positions.and_then(|positions| positions.get(i)).map(str::to_string),
                values.get(i).unwrap_or(0.0),
                fractional,
            )
        })
        .collect();
    entries.reverse();

    Ok(Outcome::from_rows(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{tests::raw_passing, SEASON};

    fn two_quarterbacks() -> StatsDf {
        raw_passing().aggregate().unwrap()
    }

    fn names(outcome: Outcome<Vec<RankingEntry>>) -> Vec<String> {
        outcome
            .found()
            .unwrap()
            .into_iter()
            .map(|entry| entry.display_name)
            .collect()
    }

    #[test]
    fn single_season_picks_the_leader() {
        let ranking = top_n(
            &two_quarterbacks(),
            "season_passing_yards",
            1,
            SeasonSelector::Year(2020),
            None,
        )
        .unwrap()
        .found()
        .unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].player_name, "P2");
        assert_eq!(ranking[0].value, 500.0);
        assert_eq!(ranking[0].rank, 1);
    }

    #[test]
    fn all_seasons_uses_career_totals() {
        let ranking = top_n(
            &two_quarterbacks(),
            "season_passing_yards",
            DEFAULT_TOP_N,
            SeasonSelector::All,
            Some("QB"),
        )
        .unwrap()
        .found()
        .unwrap();
        // ascending by value, P1 = 350 + 400, P2 = 500 + 100
        assert_eq!(ranking[0].display_name, "P2 (QB)");
        assert_eq!(ranking[0].value, 600.0);
        assert_eq!(ranking[0].rank, 2);
        assert_eq!(ranking[1].display_name, "P1 (QB)");
        assert_eq!(ranking[1].value, 750.0);
        assert_eq!(ranking[1].rank, 1);
    }

    #[test]
    fn single_season_player_career_total() {
        let df = df!(
            PLAYER_NAME => &["Rookie", "Vet", "Vet"],
            POSITION => &["RB", "RB", "RB"],
            SEASON => &[2024i32, 2023, 2024],
            "season_rushing_yards" => &[812i64, 600, 650],
        )
        .unwrap();
        let ranking = top_n(&StatsDf::new(df), "season_rushing_yards", 5, SeasonSelector::All, None)
            .unwrap()
            .found()
            .unwrap();
        let rookie = ranking.iter().find(|entry| entry.player_name == "Rookie").unwrap();
        assert_eq!(rookie.value, 812.0);
    }

    #[test]
    fn raw_rows_are_grouped_for_a_season() {
        let ranking = top_n(
            &raw_passing(),
            "season_passing_yards",
            5,
            SeasonSelector::Year(2020),
            None,
        )
        .unwrap()
        .found()
        .unwrap();
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].value, 350.0);
    }

    #[test]
    fn ties_break_by_name() {
        let df = df!(
            PLAYER_NAME => &["Charlie", "Alpha", "Bravo", "Delta"],
            POSITION => &["WR", "WR", "TE", "WR"],
            SEASON => &[2021i32, 2021, 2021, 2021],
            "season_receptions" => &[80i64, 80, 80, 10],
        )
        .unwrap();
        let ranking = top_n(
            &StatsDf::new(df),
            "season_receptions",
            2,
            SeasonSelector::Year(2021),
            None,
        )
        .unwrap();
        assert_eq!(names(ranking), vec!["Bravo (TE)", "Alpha (WR)"]);
    }

    #[test]
    fn nameless_rows_are_not_ranked() {
        let df = df!(
            PLAYER_NAME => &[None, Some("A"), Some("B"), Some("C")],
            POSITION => &[Some("QB"), Some("QB"), Some("QB"), None],
            SEASON => &[2020i32, 2020, 2020, 2020],
            "season_passing_yards" => &[900i64, 100, 50, 700],
        )
        .unwrap();
        let ranking = top_n(
            &StatsDf::new(df),
            "season_passing_yards",
            2,
            SeasonSelector::Year(2020),
            None,
        )
        .unwrap();
        assert_eq!(names(ranking), vec!["B (QB)", "A (QB)"]);
    }

    #[test]
    fn top_n_bound_and_dominance() {
        let table = two_quarterbacks();
        for n in 0..4 {
            let outcome = top_n(&table, "passer_rating", n, SeasonSelector::All, None).unwrap();
            let Some(ranking) = outcome.found() else {
                assert_eq!(n, 0);
                continue;
            };
            assert!(ranking.len() <= n.min(2));
            let lowest_kept = ranking.first().unwrap().value;
            let all = top_n(&table, "passer_rating", 10, SeasonSelector::All, None)
                .unwrap()
                .found()
                .unwrap();
            let dropped = &all[..all.len() - ranking.len()];
            assert!(dropped.iter().all(|entry| entry.value <= lowest_kept));
        }
    }

    #[test]
    fn no_data_cases() {
        let table = two_quarterbacks();
        assert!(top_n(&table, "season_passing_yards", 20, SeasonSelector::Year(1999), None)
            .unwrap()
            .is_no_data());
        assert!(top_n(&table, "season_passing_yards", 20, SeasonSelector::All, Some("TE"))
            .unwrap()
            .is_no_data());
        assert!(top_n(&table, "no_such_stat", 20, SeasonSelector::All, None)
            .unwrap()
            .is_no_data());
        assert!(top_n(&StatsDf::empty(), "sack", 20, SeasonSelector::All, None)
            .unwrap()
            .is_no_data());
    }

    #[test]
    fn defense_without_position() {
        let df = df!(
            PLAYER_NAME => &["D1", "D2"],
            SEASON => &[2022i32, 2022],
            "sack" => &[11.5f64, 7.0],
        )
        .unwrap();
        let table = StatsDf::new(df);
        let ranking = top_n(&table, "sack", 20, SeasonSelector::All, None)
            .unwrap()
            .found()
            .unwrap();
        assert_eq!(ranking[1].display_name, "D1");
        assert_eq!(ranking[1].display_value(), "11.5");
        assert!(top_n(&table, "sack", 20, SeasonSelector::All, Some("LB"))
            .unwrap()
            .is_no_data());
    }

    #[test]
    fn display_value_rounding() {
        let ranking = top_n(
            &two_quarterbacks(),
            "passer_rating",
            1,
            SeasonSelector::Year(2021),
            None,
        )
        .unwrap()
        .found()
        .unwrap();
        assert_eq!(ranking[0].display_value(), "101.2");
        let yards = RankingEntry::new(1, "P".into(), None, 4123.0, false);
        assert_eq!(yards.display_value(), "4123");
    }

    #[test]
    fn season_selector_parsing() {
        assert_eq!("all".parse::<SeasonSelector>().unwrap(), SeasonSelector::All);
        assert_eq!("2020".parse::<SeasonSelector>().unwrap(), SeasonSelector::Year(2020));
        assert!("twenty".parse::<SeasonSelector>().is_err());
        assert_eq!(SeasonSelector::Year(2019).period_label(), "in the 2019 season");
    }
}
