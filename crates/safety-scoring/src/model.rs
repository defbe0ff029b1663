//! Fitted linear safety model

use crate::{Result, ScoringError};
use safety_grid::CellFeatures;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

/// `score = intercept + Σ coefficients[i] · features[i]`
///
/// Feature order is [crime, camera, police]. Immutable once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreModel {
    pub coefficients: [f64; 3],
    pub intercept: f64,
}

impl ScoreModel {
    pub fn new(coefficients: [f64; 3], intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// Raw (unclipped) model output
    pub fn predict(&self, features: &CellFeatures) -> f64 {
        self.coefficients
            .iter()
            .zip(features.as_array())
            .fold(self.intercept, |acc, (c, x)| acc + c * x)
    }

    fn validate(&self) -> Result<()> {
        if self.intercept.is_finite() && self.coefficients.iter().all(|c| c.is_finite()) {
            Ok(())
        } else {
            Err(ScoringError::Model(
                "coefficients and intercept must be finite".to_string(),
            ))
        }
    }

    /// Load serialized coefficients + intercept
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading safety model from {:?}", path);

        let file = File::open(path)?;
        let model: ScoreModel = serde_json::from_reader(BufReader::new(file))?;
        model.validate()?;

        info!(
            "Safety model: intercept={:.4} crime={:.4} camera={:.4} police={:.4}",
            model.intercept, model.coefficients[0], model.coefficients[1], model.coefficients[2]
        );
        Ok(model)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.validate()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_predict_linear() {
        let model = ScoreModel::new([-1.2, 0.6, 1.0], 10.0);
        let f = CellFeatures::new(2.0, 5.0, 1.0);
        // 10 - 2.4 + 3.0 + 1.0
        assert!((model.predict(&f) - 11.6).abs() < 1e-12);
        assert_eq!(model.predict(&CellFeatures::ZERO), 10.0);
    }

    #[test]
    fn test_load_model_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"coefficients": [-1.2, 0.6, 1.0], "intercept": 7.5}"#)
            .unwrap();

        let model = ScoreModel::load(file.path()).unwrap();
        assert_eq!(model, ScoreModel::new([-1.2, 0.6, 1.0], 7.5));
    }

    #[test]
    fn test_load_rejects_wrong_arity() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"coefficients": [1.0, 2.0], "intercept": 0.0}"#)
            .unwrap();

        assert!(matches!(
            ScoreModel::load(file.path()),
            Err(ScoringError::Json(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("safety_model.json");
        let model = ScoreModel::new([-0.8, 0.3, 0.9], 6.25);

        model.save(&path).unwrap();
        assert_eq!(ScoreModel::load(&path).unwrap(), model);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            ScoreModel::load(dir.path().join("missing.json")),
            Err(ScoringError::Io(_))
        ));
    }
}
