//! SafeWalk Safety Scoring
//!
//! Applies a fitted linear model to grid features for single points and for
//! route polylines.
//!
//! ```text
//! score = clip(b + c_crime·crime + c_camera·camera + c_police·police, 1, 10)
//! ```
//!
//! Route requests are first bounded by [`RouteSampler`] (at most
//! [`ROUTE_SAMPLE_CAP`] points scored), and the per-segment list in the
//! response is truncated to [`SEGMENT_RESPONSE_CAP`] entries.

use thiserror::Error;

pub mod context;
pub mod engine;
pub mod model;
pub mod sampler;

pub use context::{ContextPaths, ContextStatus, ScoringContext, SharedContext};
pub use engine::{RouteScore, ScoringEngine};
pub use model::ScoreModel;
pub use sampler::RouteSampler;

/// Lowest safety score returned to clients
pub const SCORE_MIN: f64 = 1.0;

/// Highest safety score returned to clients
pub const SCORE_MAX: f64 = 10.0;

/// Maximum coordinates scored per route request
pub const ROUTE_SAMPLE_CAP: usize = 1000;

/// Maximum per-segment scores returned per route response
pub const SEGMENT_RESPONSE_CAP: usize = 100;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("safety model not loaded")]
    ModelUnavailable,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("model file error: {0}")]
    Model(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScoringError>;

/// Clip to [SCORE_MIN, SCORE_MAX].
///
/// A NaN raw score (opposite terms overflowing to +inf and -inf) clips to
/// `SCORE_MIN`: an undefined prediction is reported as least safe.
#[inline]
pub fn clip_score(raw: f64) -> f64 {
    if raw.is_nan() {
        return SCORE_MIN;
    }
    raw.clamp(SCORE_MIN, SCORE_MAX)
}

/// Round to 2 decimal places
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
