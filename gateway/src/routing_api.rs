//! OSRM-compatible routing service client
//!
//! Pass-through only: the upstream JSON is returned unchanged, no retries.

use safety_grid::Coordinate;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("invalid profile {0:?}")]
    InvalidProfile(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream returned {0}")]
    Status(reqwest::StatusCode),
}

pub struct RoutingApi {
    base_url: String,
    client: reqwest::Client,
}

impl RoutingApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RoutingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("safety-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Profile names go into the URL path, so only ASCII letters are allowed
    fn check_profile(profile: &str) -> Result<(), RoutingError> {
        if !profile.is_empty()
            && profile.len() <= 32
            && profile.chars().all(|c| c.is_ascii_alphabetic())
        {
            Ok(())
        } else {
            Err(RoutingError::InvalidProfile(profile.to_string()))
        }
    }

    pub fn route_url(
        &self,
        profile: &str,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<String, RoutingError> {
        Self::check_profile(profile)?;
        // OSRM takes lng,lat
        Ok(format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, profile, start.lng, start.lat, end.lng, end.lat
        ))
    }

    pub async fn route(
        &self,
        profile: &str,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<serde_json::Value, RoutingError> {
        let url = self.route_url(profile, start, end)?;
        tracing::debug!("Routing request: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::Status(status));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> RoutingApi {
        RoutingApi::new("http://osrm.local", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_route_url_lng_lat_order() {
        let url = api()
            .route_url(
                "foot",
                Coordinate::new(12.97, 77.59),
                Coordinate::new(12.99, 77.61),
            )
            .unwrap();
        assert_eq!(
            url,
            "http://osrm.local/route/v1/foot/77.59,12.97;77.61,12.99?overview=full&geometries=geojson"
        );
    }

    #[test]
    fn test_profile_rejected() {
        let start = Coordinate::new(0.0, 0.0);
        assert!(matches!(
            api().route_url("../admin", start, start),
            Err(RoutingError::InvalidProfile(_))
        ));
        assert!(api().route_url("", start, start).is_err());
    }
}
