//! Per-cell feature table and its CSV persistence

use crate::grid::{cell_of, GridCell};
use crate::{Coordinate, GridError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::{info, warn};

/// Risk features attached to one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CellFeatures {
    pub crime_score: f64,
    pub camera_count: f64,
    pub police_score: f64,
}

impl CellFeatures {
    /// "No data" vector used for cells absent from the table
    pub const ZERO: CellFeatures = CellFeatures {
        crime_score: 0.0,
        camera_count: 0.0,
        police_score: 0.0,
    };

    pub fn new(crime_score: f64, camera_count: f64, police_score: f64) -> Self {
        Self {
            crime_score,
            camera_count,
            police_score,
        }
    }

    /// Model input order: [crime, camera, police]
    pub fn as_array(&self) -> [f64; 3] {
        [self.crime_score, self.camera_count, self.police_score]
    }
}

/// One persisted row. Column names follow the on-disk header.
#[derive(Debug, Serialize, Deserialize)]
struct FeatureRow {
    cell_lat: f64,
    cell_lon: f64,
    camera_count: f64,
    incident_count: f64,
    police_count: f64,
}

impl FeatureRow {
    fn validate(&self, row: usize) -> Result<()> {
        if !self.cell_lat.is_finite() || !self.cell_lon.is_finite() {
            return Err(GridError::InvalidRow {
                row,
                reason: "non-finite cell coordinate".to_string(),
            });
        }
        for (name, value) in [
            ("camera_count", self.camera_count),
            ("incident_count", self.incident_count),
            ("police_count", self.police_count),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(GridError::InvalidRow {
                    row,
                    reason: format!("{} must be a finite value >= 0, got {}", name, value),
                });
            }
        }
        Ok(())
    }
}

/// In-memory mapping GridCell → CellFeatures
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    cells: HashMap<GridCell, CellFeatures>,
}

impl FeatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the features of a cell
    pub fn insert(&mut self, cell: GridCell, features: CellFeatures) -> Option<CellFeatures> {
        self.cells.insert(cell, features)
    }

    pub fn get(&self, cell: &GridCell) -> Option<&CellFeatures> {
        self.cells.get(cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GridCell, &CellFeatures)> {
        self.cells.iter()
    }

    /// Load a persisted table.
    ///
    /// Every row's cell is re-quantized, so decimal text in the file always
    /// resolves to the key the serving path computes. The first row for a
    /// cell wins.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GridError::TableUnavailable(path.to_path_buf()));
        }
        info!("Loading feature table from {:?}", path);

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut table = FeatureTable::new();
        let mut duplicates = 0;

        for (i, record) in reader.deserialize::<FeatureRow>().enumerate() {
            let row = record?;
            // Header is line 1
            row.validate(i + 2)?;

            let cell = cell_of(Coordinate::new(row.cell_lat, row.cell_lon));
            if table.cells.contains_key(&cell) {
                duplicates += 1;
                continue;
            }
            table.cells.insert(
                cell,
                CellFeatures::new(row.incident_count, row.camera_count, row.police_count),
            );
        }

        if duplicates > 0 {
            warn!("Ignored {} duplicate cell rows in {:?}", duplicates, path);
        }
        info!("Loaded {} grid cells", table.len());

        Ok(table)
    }

    /// Persist the table, sorted by cell.
    ///
    /// Writes a sibling temp file and renames it over `path`; a failed write
    /// leaves any existing table untouched.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("csv.tmp");

        let mut cells: Vec<_> = self.cells.iter().collect();
        cells.sort_by(|a, b| a.0.cmp(b.0));

        {
            let file = File::create(&tmp_path)?;
            let mut writer = csv::Writer::from_writer(BufWriter::new(file));
            for (cell, features) in cells {
                writer.serialize(FeatureRow {
                    cell_lat: cell.lat(),
                    cell_lon: cell.lon(),
                    camera_count: features.camera_count,
                    incident_count: features.crime_score,
                    police_count: features.police_score,
                })?;
            }
            writer.flush()?;
        }

        fs::rename(&tmp_path, path)?;
        info!("Wrote {} grid cells to {:?}", self.len(), path);
        Ok(())
    }
}

impl FromIterator<(GridCell, CellFeatures)> for FeatureTable {
    fn from_iter<I: IntoIterator<Item = (GridCell, CellFeatures)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}
