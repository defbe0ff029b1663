//! Per-cell feature aggregation

use crate::loader::RawDatasets;
use crate::{BuildError, Result, INCIDENT_PROXY_FACTOR, INCIDENT_SCALE};
use safety_grid::{cell_of, CellFeatures, Coordinate, FeatureTable, GridCell};
use std::collections::BTreeMap;
use tracing::info;

/// Running per-cell totals
#[derive(Debug, Default)]
struct CellAccumulator {
    camera_sum: f64,
    crime_sum: f64,
    crime_n: usize,
    points: usize,
    police_sum: f64,
}

/// Min/max of one feature column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    fn of(values: impl Iterator<Item = f64>) -> Self {
        values.fold(
            FeatureRange {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            |r, v| FeatureRange {
                min: r.min.min(v),
                max: r.max.max(v),
            },
        )
    }
}

#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub cells: usize,
    pub camera: FeatureRange,
    pub incident: FeatureRange,
    pub police: FeatureRange,
    /// Whether the incident rescale was applied
    pub rescaled: bool,
}

/// Aggregates raw datasets into a [`FeatureTable`]
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    pub incident_proxy_factor: f64,
    pub incident_scale: f64,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self {
            incident_proxy_factor: INCIDENT_PROXY_FACTOR,
            incident_scale: INCIDENT_SCALE,
        }
    }
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the feature table.
    ///
    /// Output cells are exactly the cells holding at least one surveillance
    /// record; incident and police aggregates are left-joined onto them with
    /// 0 for cells that have no value.
    pub fn build(&self, data: &RawDatasets) -> Result<(FeatureTable, BuildSummary)> {
        let surveillance = &data.surveillance;

        let mut cells: BTreeMap<GridCell, CellAccumulator> = BTreeMap::new();
        for record in &surveillance.records {
            let acc = cells
                .entry(cell_of(Coordinate::new(record.lat, record.lon)))
                .or_default();
            acc.camera_sum += record.cctv_count;
            acc.points += 1;
            if let Some(crime) = record.crime_reports {
                acc.crime_sum += crime;
                acc.crime_n += 1;
            }
            if let Some(police) = record.police_near {
                acc.police_sum += police;
            }
        }

        if cells.is_empty() {
            return Err(BuildError::EmptyTable("build"));
        }

        // Area-level police presence spread over every cell
        let police_fallback = data.police.rows as f64 / cells.len() as f64;

        let mut rows: Vec<(GridCell, CellFeatures)> = cells
            .into_iter()
            .map(|(cell, acc)| {
                let incident = if surveillance.has_crime_reports {
                    if acc.crime_n > 0 {
                        acc.crime_sum / acc.crime_n as f64
                    } else {
                        0.0
                    }
                } else {
                    acc.points as f64 * self.incident_proxy_factor
                };
                let police = if surveillance.has_police_near {
                    acc.police_sum
                } else {
                    police_fallback
                };
                (cell, CellFeatures::new(incident, acc.camera_sum, police))
            })
            .collect();

        let incident_max = rows
            .iter()
            .map(|(_, f)| f.crime_score)
            .fold(0.0, f64::max);
        let rescaled = incident_max > 0.0;
        if rescaled {
            for (_, f) in rows.iter_mut() {
                f.crime_score *= self.incident_scale;
            }
        }

        let summary = BuildSummary {
            cells: rows.len(),
            camera: FeatureRange::of(rows.iter().map(|(_, f)| f.camera_count)),
            incident: FeatureRange::of(rows.iter().map(|(_, f)| f.crime_score)),
            police: FeatureRange::of(rows.iter().map(|(_, f)| f.police_score)),
            rescaled,
        };

        info!("Built {} grid cells", summary.cells);
        info!(
            "  camera_count:   {:.1} to {:.1}",
            summary.camera.min, summary.camera.max
        );
        info!(
            "  incident_count: {:.1} to {:.1}",
            summary.incident.min, summary.incident.max
        );
        info!(
            "  police_count:   {:.1} to {:.1}",
            summary.police.min, summary.police.max
        );

        Ok((rows.into_iter().collect(), summary))
    }
}
