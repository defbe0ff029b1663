//! Point and route scoring

use crate::model::ScoreModel;
use crate::sampler::RouteSampler;
use crate::{clip_score, round2, Result, ScoringError, SEGMENT_RESPONSE_CAP};
use safety_grid::{CellFeatures, Coordinate, GridIndex};
use serde::Serialize;
use tracing::debug;

/// Route scoring result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteScore {
    /// Mean of the clipped per-point scores, 2 decimals
    pub score: f64,
    /// Clipped per-point scores, 2 decimals, at most `segment_cap` entries
    pub segments: Vec<f64>,
    /// Points actually scored after sampling
    #[serde(skip)]
    pub scored_points: usize,
}

/// Scores feature vectors with an optional fitted model.
///
/// Holds no per-request state; shared read-only between requests.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    model: Option<ScoreModel>,
    index: GridIndex,
    sampler: RouteSampler,
    segment_cap: usize,
}

impl ScoringEngine {
    pub fn new(model: Option<ScoreModel>, index: GridIndex) -> Self {
        Self {
            model,
            index,
            sampler: RouteSampler::default(),
            segment_cap: SEGMENT_RESPONSE_CAP,
        }
    }

    pub fn with_sampler(mut self, sampler: RouteSampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_segment_cap(mut self, cap: usize) -> Self {
        self.segment_cap = cap;
        self
    }

    pub fn model(&self) -> Option<&ScoreModel> {
        self.model.as_ref()
    }

    pub fn index(&self) -> &GridIndex {
        &self.index
    }

    fn require_model(&self) -> Result<&ScoreModel> {
        self.model.as_ref().ok_or(ScoringError::ModelUnavailable)
    }

    /// Clipped, unrounded score
    fn clipped(model: &ScoreModel, features: &CellFeatures) -> f64 {
        clip_score(model.predict(features))
    }

    /// Score one feature vector: clip to [1, 10], 2 decimals
    pub fn score_point(&self, features: &CellFeatures) -> Result<f64> {
        let model = self.require_model()?;
        Ok(round2(Self::clipped(model, features)))
    }

    /// Look up the coordinate's cell and score its features
    pub fn score_coordinate(&self, coord: Coordinate) -> Result<f64> {
        if !coord.is_finite() {
            return Err(ScoringError::InvalidInput(
                "lat and lng must be finite numbers".to_string(),
            ));
        }
        let model = self.require_model()?;
        let features = self.index.features_of(coord);
        Ok(round2(Self::clipped(model, &features)))
    }

    /// Score a polyline.
    ///
    /// Every point is clipped before averaging, so the mean is over clipped
    /// scores. The segment list is truncated independently of how many
    /// points were scored.
    pub fn score_route(&self, coords: &[Coordinate]) -> Result<RouteScore> {
        if coords.is_empty() {
            return Err(ScoringError::InvalidInput("coords must not be empty".to_string()));
        }
        if let Some(i) = coords.iter().position(|c| !c.is_finite()) {
            return Err(ScoringError::InvalidInput(format!(
                "coordinate {} is not a finite [lat, lng] pair",
                i
            )));
        }
        let model = self.require_model()?;

        let sampled = self.sampler.sample(coords);
        let clipped: Vec<f64> = sampled
            .iter()
            .map(|c| Self::clipped(model, &self.index.features_of(*c)))
            .collect();

        let mean = clipped.iter().sum::<f64>() / clipped.len() as f64;
        let segments = clipped
            .iter()
            .take(self.segment_cap)
            .map(|s| round2(*s))
            .collect();

        debug!(
            "Scored route: {} points in, {} scored, mean {:.2}",
            coords.len(),
            clipped.len(),
            mean
        );

        Ok(RouteScore {
            score: round2(mean),
            segments,
            scored_points: clipped.len(),
        })
    }
}
