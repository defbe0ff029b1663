//! SafeWalk Grid Feature Builder
//!
//! Offline batch job that turns three raw datasets into the per-cell feature
//! table read by the serving path, and fits the linear safety model over it.
//!
//! # Pipeline
//!
//! ```text
//! incident.csv ─┐
//! police.csv ───┼─► aggregate per GridCell ─► left join ─► fill 0 ─► rescale ─► grid_features.csv
//! surveillance ─┘                                                                     │
//!                                                                       train (OLS) ◄─┘
//! ```
//!
//! Any unreadable source aborts the whole build; nothing is written.

use std::path::PathBuf;
use thiserror::Error;

pub mod builder;
pub mod loader;
pub mod trainer;

pub use builder::{BuildSummary, FeatureBuilder};
pub use loader::{IncidentData, PoliceData, RawDatasets, SurveillanceData, SurveillanceRecord};

/// Point-count proxy weight when surveillance has no `crime_reports` column
pub const INCIDENT_PROXY_FACTOR: f64 = 0.5;

/// Brings crime reports (0-4) into the 0-10 range of the other features
pub const INCIDENT_SCALE: f64 = 2.5;

pub const INCIDENT_FILE: &str = "incident.csv";
pub const POLICE_FILE: &str = "police.csv";
pub const SURVEILLANCE_FILE: &str = "surveillance.csv";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("raw dataset missing: {0}")]
    MissingSource(PathBuf),
    #[error("{file}: required column '{column}' not found")]
    MissingColumn { file: PathBuf, column: String },
    #[error("{file} row {row}: column '{column}' is not a number: {value:?}")]
    InvalidValue {
        file: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("no grid cells to {0}")]
    EmptyTable(&'static str),
    #[error("model fit failed: {0}")]
    Fit(String),
    #[error(transparent)]
    Grid(#[from] safety_grid::GridError),
    #[error(transparent)]
    Scoring(#[from] safety_scoring::ScoringError),
}

pub type Result<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;
    use safety_grid::Coordinate;
    use safety_scoring::{ContextPaths, ScoringContext};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_raw_data_to_served_score() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(INCIDENT_FILE), "area,total_incidents\nA,12\n").unwrap();
        fs::write(dir.path().join(POLICE_FILE), "station\nNorth\nSouth\n").unwrap();
        fs::write(
            dir.path().join(SURVEILLANCE_FILE),
            "lat,lon,cctv_count,crime_reports,police_near\n\
             12.9700,77.5900,6,1,2\n\
             12.9701,77.5901,2,3,0\n\
             12.9900,77.6100,0,4,0\n\
             12.9500,77.5700,9,0,3\n",
        )
        .unwrap();

        let paths = ContextPaths {
            model: dir.path().join("safety_model.json"),
            table: dir.path().join("grid_features.csv"),
        };

        let datasets = loader::load_datasets(dir.path()).unwrap();
        let (table, summary) = FeatureBuilder::new().build(&datasets).unwrap();
        assert_eq!(summary.cells, 3);
        table.write_csv(&paths.table).unwrap();

        let reread = safety_grid::FeatureTable::read_csv(&paths.table).unwrap();
        trainer::fit(&reread).unwrap().save(&paths.model).unwrap();

        let weights = trainer::AreaWeights::from_raw(&datasets.incident, &datasets.police);
        assert_eq!(weights.crime, 12.0 / 1000.0);
        assert_eq!(weights.police, 2.0 / 50.0);
        assert_eq!(weights.apply(&reread).len(), 3);

        let ctx = ScoringContext::load(&paths);
        assert!(ctx.is_ready());
        assert_eq!(ctx.status().cells, 3);

        let engine = ctx.engine();
        let watched = engine
            .score_coordinate(Coordinate::new(12.9500, 77.5700))
            .unwrap();
        let risky = engine
            .score_coordinate(Coordinate::new(12.9900, 77.6100))
            .unwrap();
        assert!((1.0..=10.0).contains(&watched));
        assert!(watched > risky);
    }
}
