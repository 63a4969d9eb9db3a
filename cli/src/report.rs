use anyhow::Result;
use nflstats::{
    catalog::Stat,
    evolution::{format_thousands, Evolution},
    ranking::{RankingEntry, SeasonSelector},
    Error, Mode, Outcome,
};
use serde::Serialize;

const SOURCE: &str = "Source: Pro-Football-Reference.com";
const NO_DATA: &str = "No data found for the selected filters.";

#[derive(Serialize)]
struct RankingReport<'a> {
    title: String,
    caption: String,
    stat: &'a Stat,
    /// Best first
    entries: Vec<RankingEntry>,
}

#[derive(Serialize)]
struct EvolutionReport<'a> {
    title: String,
    subtitle: String,
    stat: &'a Stat,
    #[serde(flatten)]
    evolution: Evolution,
}

fn caption(season: SeasonSelector, span: Option<(i32, i32)>) -> String {
    match (season, span) {
        (SeasonSelector::Year(year), _) => format!("{} | Season: {}", SOURCE, year),
        (SeasonSelector::All, Some((first, last))) => {
            format!("{} | Data period: {}-{}", SOURCE, first, last)
        }
        (SeasonSelector::All, None) => SOURCE.to_string(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Shown when the queried dataset failed to load, as opposed to a query that
/// matched nothing.
pub fn print_unavailable(mode: Mode, failure: &Error) -> Result<()> {
    println!("The {} data could not be loaded ({}), nothing to show.", mode, failure);
    Ok(())
}

pub fn print_ranking(
    stat: &Stat,
    limit: usize,
    season: SeasonSelector,
    span: Option<(i32, i32)>,
    outcome: Outcome<Vec<RankingEntry>>,
    json: bool,
) -> Result<()> {
    let Some(mut entries) = outcome.found() else {
        println!("{}", NO_DATA);
        return Ok(());
    };
    // Entries arrive in chart order (smallest first); lists read best first
    entries.reverse();

    let report = RankingReport {
        title: format!("Top {} players by {} {}", limit, stat.label, season.period_label()),
        caption: caption(season, span),
        stat,
        entries,
    };
    if json {
        return print_json(&report);
    }

    println!("{}", report.title);
    let width = report
        .entries
        .iter()
        .map(|entry| entry.display_name.chars().count())
        .max()
        .unwrap_or(0);
    for entry in &report.entries {
        println!(
            "{:>3}. {:<width$}  {:>10}",
            entry.rank,
            entry.display_name,
            entry.display_value(),
            width = width
        );
    }
    println!("{}", report.caption);
    Ok(())
}

pub fn print_evolution(
    stat: &Stat,
    top: usize,
    span: Option<(i32, i32)>,
    outcome: Outcome<Evolution>,
    json: bool,
) -> Result<()> {
    let Some(evolution) = outcome.found() else {
        println!("{}", NO_DATA);
        return Ok(());
    };

    let period = match span {
        Some((first, last)) => format!(" ({}-{})", first, last),
        None => String::new(),
    };
    let report = EvolutionReport {
        title: format!("Cumulative career evolution by {}", stat.label),
        subtitle: format!("Based on the top {} career totals{}", top, period),
        stat,
        evolution,
    };
    if json {
        return print_json(&report);
    }

    println!("{}", report.title);
    println!("{}", report.subtitle);
    println!();
    for standing in &report.evolution.standings {
        let series = report
            .evolution
            .series(&standing.player_name)
            .into_iter()
            .map(|point| format!("{} {}", point.season, format_thousands(point.cumulative_value)))
            .collect::<Vec<_>>()
            .join(" | ");
        println!("{}: {}", standing.player_name, series);
    }

    println!();
    println!("🏆 Final ranking");
    for standing in &report.evolution.standings {
        println!(
            "{} {} ({}: {})",
            standing.medal(),
            standing.player_name,
            stat.label,
            format_thousands(standing.total)
        );
    }
    Ok(())
}

pub fn print_seasons(seasons: &[i32], json: bool) -> Result<()> {
    if json {
        return print_json(&seasons);
    }
    if seasons.is_empty() {
        println!("{}", NO_DATA);
    }
    for season in seasons {
        println!("{}", season);
    }
    Ok(())
}

pub fn print_stats(stats: &[Stat], json: bool) -> Result<()> {
    if json {
        return print_json(&stats);
    }
    for stat in stats {
        println!("{:<24} {}", stat.label, stat.column);
    }
    Ok(())
}
