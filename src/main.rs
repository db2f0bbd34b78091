mod app;
mod config;
mod engine;
mod error;
mod filter;
mod graph;
mod people;
mod pulse;
mod simulation;
mod spatial;
mod temporal;
mod util;

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::{LaunchOptions, PeopleGraphApp};
use crate::people::{DataSource, PartialDate};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding people.json and relationships.json.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Overrides the people file inside --data-dir.
    #[arg(long)]
    people: Option<PathBuf>,
    /// Overrides the relationships file inside --data-dir.
    #[arg(long)]
    relationships: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Initial time cursor as YYYY, YYYY-MM or YYYY-MM-DD; defaults to today.
    #[arg(long, value_parser = parse_cursor)]
    at: Option<NaiveDate>,
    /// Filter to switch off at startup, e.g. `isOldRumour` or `seminar:KSP`. Repeatable.
    #[arg(long = "hide", value_name = "FILTER")]
    hidden_filters: Vec<String>,
}

fn parse_cursor(value: &str) -> Result<NaiveDate, String> {
    value
        .parse::<PartialDate>()
        .map(|date| date.resolve())
        .map_err(|error| error.to_string())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut source = DataSource::from_dir(&args.data_dir);
    if let Some(people) = args.people {
        source.people = people;
    }
    if let Some(relationships) = args.relationships {
        source.relationships = relationships;
    }

    let config_path = config::config_path(args.config.as_deref());
    let config = config::load_or_default_from_path(&config_path)
        .context("failed to load engine settings")?;
    info!(
        people = %source.people.display(),
        relationships = %source.relationships.display(),
        config = %config_path.display(),
        "starting"
    );

    let launch = LaunchOptions {
        source,
        config,
        config_path,
        initial_time: args.at,
        hidden_filters: args.hidden_filters,
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "people-graph",
        options,
        Box::new(move |cc| Ok(Box::new(PeopleGraphApp::new(cc, launch)))),
    )
    .map_err(|error| anyhow!("failed to run the viewer: {error}"))
}
