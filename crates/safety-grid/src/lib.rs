//! SafeWalk Safety Grid
//!
//! Maps arbitrary (lat, lng) pairs onto a fixed lat/lng grid and looks up the
//! precomputed risk features attached to each cell.
//!
//! # Grid Model
//!
//! ```text
//! cell(v) = round_half_even(v / GRID_STEP) * GRID_STEP
//! ```
//!
//! | Feature        | Source                          | Range  |
//! |----------------|---------------------------------|--------|
//! | crime_score    | incident reports (rescaled)     | ≥ 0    |
//! | camera_count   | CCTV cameras in the cell        | ≥ 0    |
//! | police_score   | police presence indicator       | ≥ 0    |
//!
//! The builder (`feature-builder`) and the serving path (`safety-scoring`)
//! both quantize through [`cell_of`], so [`GRID_STEP`] is defined here and
//! nowhere else.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub mod grid;
pub mod index;
pub mod table;

pub use grid::{cell_of, quantize, GridCell};
pub use index::GridIndex;
pub use table::{CellFeatures, FeatureTable};

/// Grid step in degrees (≈ 165 m of latitude)
pub const GRID_STEP: f64 = 0.0015;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("feature table not found: {0}")]
    TableUnavailable(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid feature row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, GridError>;

/// A WGS84 position as received from a client
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite; no bounds check against the real globe
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    pub fn cell(&self) -> GridCell {
        cell_of(*self)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_from_pair() {
        let c = Coordinate::from([40.0008, -73.0012]);
        assert_eq!(c.lat, 40.0008);
        assert_eq!(c.lng, -73.0012);
    }

    #[test]
    fn test_coordinate_finite() {
        assert!(Coordinate::new(12.9, 77.6).is_finite());
        assert!(!Coordinate::new(f64::NAN, 77.6).is_finite());
        assert!(!Coordinate::new(12.9, f64::INFINITY).is_finite());
    }
}
