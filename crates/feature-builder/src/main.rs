//! Grid Feature Builder CLI
//!
//! Builds the per-cell feature table from raw datasets, then fits the
//! safety model over it.
//!
//! Usage:
//!   build-grid-features build --data-dir data --output data/grid_features.csv
//!   build-grid-features train --table data/grid_features.csv --output safety_model.json
//!   build-grid-features train --data-dir data   # area-level crime/police weights

use anyhow::Result;
use clap::{Parser, Subcommand};
use feature_builder::trainer::AreaWeights;
use feature_builder::{loader, trainer, FeatureBuilder, INCIDENT_FILE, POLICE_FILE};
use safety_grid::{FeatureTable, GRID_STEP};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "build-grid-features",
    about = "Build SafeWalk grid features and fit the safety model"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate raw datasets into the grid feature table
    Build {
        /// Directory holding incident.csv, police.csv and surveillance.csv
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        /// Output feature table
        #[arg(short, long, default_value = "data/grid_features.csv")]
        output: PathBuf,
    },
    /// Fit the linear safety model over a built feature table
    Train {
        /// Feature table produced by `build`
        #[arg(short, long, default_value = "data/grid_features.csv")]
        table: PathBuf,

        /// Output model JSON
        #[arg(short, long, default_value = "safety_model.json")]
        output: PathBuf,

        /// Fit on area-level crime/police weights from this raw data directory
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", "=".repeat(60));
    info!("SafeWalk Grid Feature Builder (step {})", GRID_STEP);
    info!("{}", "=".repeat(60));

    match args.command {
        Command::Build { data_dir, output } => build(data_dir, output),
        Command::Train {
            table,
            output,
            data_dir,
        } => train(table, output, data_dir),
    }
}

fn build(data_dir: PathBuf, output: PathBuf) -> Result<()> {
    let datasets = loader::load_datasets(&data_dir)?;
    if let Some(total) = datasets.incident.total_incidents {
        info!("Area incidents: {:.0} across {} records", total, datasets.incident.rows);
    }

    let (table, summary) = FeatureBuilder::new().build(&datasets)?;
    table.write_csv(&output)?;

    info!("Grid features saved to {:?}", output);
    info!("Total grid cells: {}", summary.cells);
    Ok(())
}

fn train(table_path: PathBuf, output: PathBuf, data_dir: Option<PathBuf>) -> Result<()> {
    let mut table = FeatureTable::read_csv(&table_path)?;

    if let Some(dir) = data_dir {
        let incident = loader::load_incidents(dir.join(INCIDENT_FILE))?;
        let police = loader::load_police(dir.join(POLICE_FILE))?;
        let weights = AreaWeights::from_raw(&incident, &police);
        info!(
            "Area-level weights: crime={:.3} police={:.3}",
            weights.crime, weights.police
        );
        table = weights.apply(&table);
    }

    let model = trainer::fit(&table)?;
    model.save(&output)?;

    info!("Safety model saved to {:?}", output);
    Ok(())
}
