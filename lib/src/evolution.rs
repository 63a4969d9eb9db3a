use crate::{
    outcome::Outcome,
    stats::{StatsDf, StatsFilter, PLAYER_NAME, SEASON},
    Result,
};
use itertools::Itertools;
use polars::prelude::*;
use serde::Serialize;

pub const DEFAULT_TOP_K: usize = 10;

const CAREER_TOTAL: &str = "career_total";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionPoint {
    pub player_name: String,
    pub season: i32,
    pub cumulative_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalStanding {
    pub rank: usize,
    pub player_name: String,
    pub total: f64,
}

impl FinalStanding {
    pub fn medal(&self) -> String {
        match self.rank {
            1 => "🥇".to_string(),
            2 => "🥈".to_string(),
            3 => "🥉".to_string(),
            rank => format!("{}.", rank),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evolution {
    /// Ordered by player name, then season
    pub points: Vec<EvolutionPoint>,
    pub standings: Vec<FinalStanding>,
}

impl Evolution {
    pub fn series(&self, player_name: &str) -> Vec<&EvolutionPoint> {
        self.points
            .iter()
            .filter(|point| point.player_name == player_name)
            .collect()
    }
}

/// Cumulative career trajectories of the `top_k` players by career total.
///
/// The position filter only decides who is selected: once a player is in, their
/// whole history is included, whatever position they played. Seasons a player
/// spent at several positions collapse into one point.
pub fn evolution(
    table: &StatsDf,
    metric: &str,
    position: Option<&str>,
    top_k: usize,
) -> Result<Outcome<Evolution>> {
    log::trace!("evolution::evolution {} {:?}", metric, position);
    if top_k == 0 || !table.is_measure(metric) {
        log::debug!("{} is not a rankable column", metric);
        return Ok(Outcome::NoData);
    }
    if position.is_some() && !table.has_position() {
        return Ok(Outcome::NoData);
    }

    let mut filter = StatsFilter::new().identified(&[PLAYER_NAME]);
    if let Some(position) = position {
        filter = filter.position(position);
    }

    let leaders = table
        .lazy()
        .filter(filter.build())
        .group_by([col(PLAYER_NAME)])
        .agg([col(metric).sum().alias(CAREER_TOTAL)])
        .sort(
            [CAREER_TOTAL, PLAYER_NAME],
            SortMultipleOptions::default()
                .with_order_descending_multi([true, false])
                .with_nulls_last(true),
        )
        .limit(top_k as IdxSize)
        .select([col(PLAYER_NAME)])
        .collect()?;
    log::debug!("{} career leaders by {}", leaders.height(), metric);
    if leaders.height() == 0 {
        return Ok(Outcome::NoData);
    }

    let history = table
        .lazy()
        .join(
            leaders.lazy(),
            [col(PLAYER_NAME)],
            [col(PLAYER_NAME)],
            JoinArgs::new(JoinType::Inner),
        )
        .group_by([col(PLAYER_NAME), col(SEASON)])
        .agg([col(metric).sum()])
        .sort([PLAYER_NAME, SEASON], SortMultipleOptions::default())
        .collect()?;

    let names = history.column(PLAYER_NAME)?.cast(&DataType::String)?;
    let names = names.str()?;
    let seasons = history.column(SEASON)?.cast(&DataType::Int32)?;
    let seasons = seasons.i32()?;
    let values = history.column(metric)?.cast(&DataType::Float64)?;
    let values = values.f64()?;

    let rows = (0..history.height()).map(|i| {
        (
            names.get(i).unwrap_or_default(),
            seasons.get(i).unwrap_or_default(),
            values.get(i).unwrap_or(0.0),
        )
    });

    let mut points = Vec::with_capacity(history.height());
    let by_player = rows.chunk_by(|(player_name, _, _)| *player_name);
    for (player_name, series) in &by_player {
        let mut running = 0.0;
        for (_, season, value) in series {
            running += value;
            points.push(EvolutionPoint {
                player_name: player_name.to_string(),
                season,
                cumulative_value: running,
            });
        }
    }

    let standings = final_standings(&points);
    Ok(Outcome::Found(Evolution { points, standings }))
}

/// Highest cumulative value per player, best first. Ties keep name order.
fn final_standings(points: &[EvolutionPoint]) -> Vec<FinalStanding> {
    points
        .iter()
        .chunk_by(|point| point.player_name.clone())
        .into_iter()
        .map(|(player_name, series)| {
            let total = series
                .map(|point| point.cumulative_value)
                .fold(f64::NEG_INFINITY, f64::max);
            (player_name, total)
        })
        .sorted_by(|(_, a), (_, b)| b.total_cmp(a))
        .enumerate()
        .map(|(i, (player_name, total))| FinalStanding {
            rank: i + 1,
            player_name,
            total,
        })
        .collect()
}

/// Formats a total with thousands separators and no decimals, e.g. `12,345`.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk))
        .join(",");
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
