//! Coordinate quantization

use crate::{Coordinate, GRID_STEP};
use serde::Serialize;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Snap one component to the nearest multiple of [`GRID_STEP`].
///
/// Ties round to even. `-0.0` is folded into `0.0` so both sides of the
/// equator/meridian agree on a single key.
#[inline]
pub fn quantize(value: f64) -> f64 {
    (value / GRID_STEP).round_ties_even() * GRID_STEP + 0.0
}

/// Quantize a coordinate to its grid cell
#[inline]
pub fn cell_of(coord: Coordinate) -> GridCell {
    GridCell {
        lat: quantize(coord.lat),
        lon: quantize(coord.lng),
    }
}

/// Quantized cell center, used as the feature table key.
///
/// Equality and hashing are on the bit patterns of both components, so two
/// coordinates share a cell iff their quantized values are bit-identical.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GridCell {
    lat: f64,
    lon: f64,
}

impl GridCell {
    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Cell center as a coordinate (quantizes back to `self`)
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

impl PartialEq for GridCell {
    fn eq(&self, other: &Self) -> bool {
        self.lat.to_bits() == other.lat.to_bits() && self.lon.to_bits() == other.lon.to_bits()
    }
}

impl Eq for GridCell {}

impl Hash for GridCell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lat.to_bits().hash(state);
        self.lon.to_bits().hash(state);
    }
}

impl Ord for GridCell {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lat
            .total_cmp(&other.lat)
            .then_with(|| self.lon.total_cmp(&other.lon))
    }
}

impl PartialOrd for GridCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}


// ============================================================================
// Property-based Tests
// ============================================================================
