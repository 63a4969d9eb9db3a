use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use nflstats::{
    catalog::{self, Stat},
    evolution::{evolution, DEFAULT_TOP_K},
    loader::DEFAULT_DATA_DIR,
    ranking::{top_n, SeasonSelector, DEFAULT_TOP_N},
    DatasetCache, Mode, Position,
};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::path::PathBuf;

mod report;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(short = 'd', long = "data-dir", value_name = "DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Top players for a stat, in one season or across all seasons
    Top {
        #[command(flatten)]
        selection: Selection,

        #[arg(short = 's', long, default_value = "all")]
        season: SeasonSelector,

        #[arg(short = 'n', long = "limit", default_value_t = DEFAULT_TOP_N)]
        limit: usize,
    },
    /// Cumulative career evolution of the best career totals
    Evolution {
        #[command(flatten)]
        selection: Selection,

        #[arg(short = 'k', long = "top", default_value_t = DEFAULT_TOP_K)]
        top: usize,
    },
    /// Seasons available in a dataset
    Seasons {
        #[arg(short = 'm', long, default_value = "offense")]
        mode: Mode,
    },
    /// Stats that can be ranked
    Stats {
        #[arg(short = 'm', long, default_value = "offense")]
        mode: Mode,

        #[arg(short = 'p', long, value_parser = parse_position)]
        position: Option<Position>,
    },
}

#[derive(clap::Args, Debug)]
struct Selection {
    #[arg(short = 'm', long, default_value = "offense")]
    mode: Mode,

    /// Offensive position (QB, RB, WR, TE); defaults to QB in offense mode
    #[arg(short = 'p', long, value_parser = parse_position)]
    position: Option<Position>,

    /// Stat label (e.g. "Passing Yards") or column name
    #[arg(long)]
    stat: String,
}

impl Selection {
    /// Position the data is filtered by. Defense is never filtered by position.
    fn position(&self) -> Option<Position> {
        match self.mode {
            Mode::Offense => Some(self.position.unwrap_or(Position::Qb)),
            Mode::Defense => None,
        }
    }

    fn stat(&self) -> Result<Stat> {
        let stats = catalog::stats_for(self.mode, self.position());
        match catalog::find_stat(stats, &self.stat) {
            Some(stat) => Ok(stat),
            None => {
                let labels: Vec<&str> = stats.iter().map(|stat| stat.label).collect();
                bail!(
                    "Unknown stat '{}'. Use one of: {}",
                    self.stat,
                    labels.join(", ")
                )
            }
        }
    }
}

fn parse_position(s: &str) -> Result<Position, String> {
    s.to_uppercase().parse().map_err(|_| {
        let known: Vec<String> = Position::ALL.iter().map(|p| p.to_string()).collect();
        format!("Unsupported position '{}'. Use: {}", s, known.join(", "))
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set the default level based on verbosity
    let default_level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let config = ConfigBuilder::new().add_filter_allow_str("nflstats").build();

    TermLogger::init(
        default_level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    log::trace!("Args {:#?}", args);

    let cache = DatasetCache::new(&args.data_dir);
    let loaded = cache.get();
    for (mode, failure) in &loaded.failures {
        eprintln!("warning: {} data: {}", mode, failure);
    }

    match &args.command {
        Command::Top {
            selection,
            season,
            limit,
        } => {
            let stat = selection.stat()?;
            if let Some(failure) = loaded.failure(selection.mode) {
                return report::print_unavailable(selection.mode, failure);
            }
            let table = loaded.datasets.table(selection.mode).aggregate()?;
            log::info!("Loaded {} player seasons", table.height());

            let position = selection.position().map(|position| position.to_string());
            let outcome = top_n(&table, stat.column, *limit, *season, position.as_deref())?;
            let span = table.season_span()?;
            report::print_ranking(&stat, *limit, *season, span, outcome, args.json)
        }
        Command::Evolution { selection, top } => {
            let stat = selection.stat()?;
            if let Some(failure) = loaded.failure(selection.mode) {
                return report::print_unavailable(selection.mode, failure);
            }
            let table = loaded.datasets.table(selection.mode).aggregate()?;
            log::info!("Loaded {} player seasons", table.height());

            let position = selection.position().map(|position| position.to_string());
            let outcome = evolution(&table, stat.column, position.as_deref(), *top)?;
            let span = table.season_span()?;
            report::print_evolution(&stat, *top, span, outcome, args.json)
        }
        Command::Seasons { mode } => {
            if let Some(failure) = loaded.failure(*mode) {
                return report::print_unavailable(*mode, failure);
            }
            let seasons = loaded.datasets.table(*mode).seasons()?;
            report::print_seasons(&seasons, args.json)
        }
        Command::Stats { mode, position } => {
            let stats = catalog::stats_for(*mode, *position);
            report::print_stats(stats, args.json)
        }
    }
}
