//! Offline least-squares fit of the linear safety model

use crate::loader::{IncidentData, PoliceData};
use crate::{BuildError, Result};
use nalgebra::{DMatrix, DVector};
use safety_grid::{CellFeatures, FeatureTable};
use safety_scoring::{clip_score, ScoreModel};
use tracing::info;

/// Synthetic target weights (crime, camera, police) and base
pub const TARGET_BASE: f64 = 10.0;
pub const TARGET_WEIGHTS: [f64; 3] = [-1.2, 0.6, 1.0];

/// Singular values below this are treated as zero (collinear columns)
const SVD_EPS: f64 = 1e-10;

/// Area incident total per unit of crime weight
pub const CRIME_WEIGHT_DIVISOR: f64 = 1000.0;

/// Police records per unit of police weight
pub const POLICE_WEIGHT_DIVISOR: f64 = 50.0;

/// Area-level crime and police weights shared by every cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaWeights {
    pub crime: f64,
    pub police: f64,
}

impl AreaWeights {
    /// A missing `total_incidents` column weighs as zero crime
    pub fn from_raw(incident: &IncidentData, police: &PoliceData) -> Self {
        Self {
            crime: incident.total_incidents.unwrap_or(0.0) / CRIME_WEIGHT_DIVISOR,
            police: police.rows as f64 / POLICE_WEIGHT_DIVISOR,
        }
    }

    /// Same cells and camera counts, crime and police replaced by the area weights
    pub fn apply(&self, table: &FeatureTable) -> FeatureTable {
        table
            .iter()
            .map(|(cell, f)| (*cell, CellFeatures::new(self.crime, f.camera_count, self.police)))
            .collect()
    }
}

/// Hand-specified safety target the model is fitted against
pub fn synthetic_target(features: &CellFeatures) -> f64 {
    let raw = TARGET_WEIGHTS
        .iter()
        .zip(features.as_array())
        .fold(TARGET_BASE, |acc, (w, x)| acc + w * x);
    clip_score(raw)
}

/// Ordinary least squares over every cell of the table.
///
/// Uses an SVD pseudo-inverse so constant or collinear feature columns
/// (area-level police/crime values) still yield a minimum-norm solution.
pub fn fit(table: &FeatureTable) -> Result<ScoreModel> {
    if table.is_empty() {
        return Err(BuildError::EmptyTable("fit"));
    }

    let rows: Vec<CellFeatures> = table.iter().map(|(_, f)| *f).collect();
    let n = rows.len();

    // Column 0 is the intercept
    let x = DMatrix::from_fn(n, 4, |r, c| {
        if c == 0 {
            1.0
        } else {
            rows[r].as_array()[c - 1]
        }
    });
    let y = DVector::from_iterator(n, rows.iter().map(synthetic_target));

    let beta = x
        .clone()
        .svd(true, true)
        .solve(&y, SVD_EPS)
        .map_err(|e| BuildError::Fit(e.to_string()))?;

    let model = ScoreModel::new([beta[1], beta[2], beta[3]], beta[0]);
    if !model.intercept.is_finite() || model.coefficients.iter().any(|c| !c.is_finite()) {
        return Err(BuildError::Fit("non-finite coefficients".to_string()));
    }

    let residual = (&x * &beta - &y).norm() / (n as f64).sqrt();
    info!(
        "Fitted safety model on {} cells: intercept={:.4} crime={:.4} camera={:.4} police={:.4} (rmse {:.4})",
        n, model.intercept, model.coefficients[0], model.coefficients[1], model.coefficients[2], residual
    );

    Ok(model)
}
