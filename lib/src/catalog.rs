//! Statistic catalogs: human readable labels mapped to dataset columns.
//!
//! Offensive stats depend on the position being analysed; defensive stats are
//! a single flat list. Adding a statistic only means adding an entry here.

use crate::{Mode, Position};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub label: &'static str,
    pub column: &'static str,
}

impl Stat {
    const fn new(label: &'static str, column: &'static str) -> Self {
        Self { label, column }
    }
}

static QB_STATS: &[Stat] = &[
    Stat::new("Passing Yards", "season_passing_yards"),
    Stat::new("Passing TDs", "season_pass_touchdown"),
    Stat::new("Passer Rating", "passer_rating"),
    Stat::new("Interceptions Thrown", "season_interception"),
];

static RB_STATS: &[Stat] = &[
    Stat::new("Rushing Yards", "season_rushing_yards"),
    Stat::new("Rushing TDs", "season_rush_touchdown"),
    Stat::new("Rush Attempts", "season_rush_attempts"),
    Stat::new("Fumbles", "season_fumble"),
];

// Wide receivers and tight ends share the receiving catalog
static RECEIVER_STATS: &[Stat] = &[
    Stat::new("Receiving Yards", "season_receiving_yards"),
    Stat::new("Receiving TDs", "season_receiving_touchdown"),
    Stat::new("Receptions", "season_receptions"),
    Stat::new("Fumbles", "season_fumble"),
];

static DEFENSE_STATS: &[Stat] = &[
    Stat::new("Interceptions", "interception"),
    Stat::new("Solo Tackles", "solo_tackle"),
    Stat::new("Assisted Tackles", "tackle_with_assist"),
    Stat::new("Sacks", "sack"),
    Stat::new("QB Hits", "qb_hit"),
    Stat::new("Forced Fumbles", "fumble_forced"),
    Stat::new("Defensive TDs", "def_touchdown"),
];

pub fn offense_stats(position: Position) -> &'static [Stat] {
    match position {
        Position::Qb => QB_STATS,
        Position::Rb => RB_STATS,
        Position::Wr | Position::Te => RECEIVER_STATS,
    }
}

pub fn defense_stats() -> &'static [Stat] {
    DEFENSE_STATS
}

/// Catalog for a mode. Offense without a position falls back to quarterbacks,
/// the first position offered.
pub fn stats_for(mode: Mode, position: Option<Position>) -> &'static [Stat] {
    match mode {
        Mode::Offense => offense_stats(position.unwrap_or(Position::Qb)),
        Mode::Defense => defense_stats(),
    }
}

/// Looks a stat up by label (case-insensitive) or by exact column name.
pub fn find_stat(stats: &[Stat], query: &str) -> Option<Stat> {
    stats
        .iter()
        .find(|stat| stat.label.eq_ignore_ascii_case(query) || stat.column == query)
        .copied()
}
