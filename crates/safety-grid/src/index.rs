//! Read-only cell → features lookup used on the serving path

use crate::grid::{cell_of, GridCell};
use crate::table::{CellFeatures, FeatureTable};
use crate::{Coordinate, Result};
use std::path::Path;

/// Grid feature index.
///
/// Without a table every lookup yields [`CellFeatures::ZERO`]; unknown areas
/// are scored as "no data" instead of failing the request.
#[derive(Debug, Clone, Default)]
pub struct GridIndex {
    table: Option<FeatureTable>,
}

impl GridIndex {
    /// Index with no table loaded
    pub fn empty() -> Self {
        Self { table: None }
    }

    pub fn from_table(table: FeatureTable) -> Self {
        Self { table: Some(table) }
    }

    /// Load from a persisted feature table
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        FeatureTable::read_csv(path).map(Self::from_table)
    }

    pub fn has_table(&self) -> bool {
        self.table.is_some()
    }

    /// Number of cells with data
    pub fn cell_count(&self) -> usize {
        self.table.as_ref().map_or(0, FeatureTable::len)
    }

    pub fn cell_of(&self, coord: Coordinate) -> GridCell {
        cell_of(coord)
    }

    pub fn features_of_cell(&self, cell: &GridCell) -> CellFeatures {
        self.table
            .as_ref()
            .and_then(|t| t.get(cell))
            .copied()
            .unwrap_or(CellFeatures::ZERO)
    }

    pub fn features_of(&self, coord: Coordinate) -> CellFeatures {
        self.features_of_cell(&cell_of(coord))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]

        // Same cell ⇒ same features; the cell is the only lookup input
        #[test]
        fn fuzz_same_cell_same_features(
            lat in 39.99f64..40.01,
            lng in -73.01f64..-72.99,
            dlat in -0.0015f64..0.0015,
            dlng in -0.0015f64..0.0015,
        ) {
            let mut table = FeatureTable::new();
            table.insert(cell_of(Coordinate::new(lat, lng)), CellFeatures::new(1.0, 2.0, 3.0));
            let index = GridIndex::from_table(table);

            let a = Coordinate::new(lat, lng);
            let b = Coordinate::new(lat + dlat, lng + dlng);
            if index.cell_of(a) == index.cell_of(b) {
                prop_assert_eq!(index.features_of(a), index.features_of(b));
            }
        }
    }
}
