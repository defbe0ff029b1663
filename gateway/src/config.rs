//! Gateway configuration from environment variables

use anyhow::{Context, Result};
use safety_scoring::ContextPaths;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 600_000;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub grid_path: PathBuf,
    pub db_path: PathBuf,
    pub routing_url: String,
    pub routing_timeout: Duration,
    /// Required in `x-admin-token` for admin routes when set
    pub admin_token: Option<String>,
    pub password_iterations: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            model_path: PathBuf::from("safety_model.json"),
            grid_path: PathBuf::from("data/grid_features.csv"),
            db_path: PathBuf::from("database.db"),
            routing_url: "https://router.project-osrm.org".to_string(),
            routing_timeout: Duration::from_secs(10),
            admin_token: None,
            password_iterations: DEFAULT_PASSWORD_ITERATIONS,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source; unset keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = lookup("SAFEWALK_PORT").or_else(|| lookup("PORT")) {
            config.port = port
                .parse()
                .with_context(|| format!("invalid port: {:?}", port))?;
        }
        if let Some(bind) = lookup("SAFEWALK_BIND") {
            config.bind = bind;
        }
        if let Some(path) = lookup("SAFEWALK_MODEL_PATH") {
            config.model_path = path.into();
        }
        if let Some(path) = lookup("SAFEWALK_GRID_PATH") {
            config.grid_path = path.into();
        }
        if let Some(path) = lookup("SAFEWALK_DB_PATH") {
            config.db_path = path.into();
        }
        if let Some(url) = lookup("SAFEWALK_ROUTING_URL") {
            config.routing_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup("SAFEWALK_ROUTING_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("invalid routing timeout: {:?}", secs))?;
            config.routing_timeout = Duration::from_secs(secs);
        }
        config.admin_token = lookup("SAFEWALK_ADMIN_TOKEN").filter(|t| !t.is_empty());
        if let Some(n) = lookup("SAFEWALK_PASSWORD_ITERATIONS") {
            config.password_iterations = n
                .parse()
                .with_context(|| format!("invalid password iterations: {:?}", n))?;
        }

        Ok(config)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn context_paths(&self) -> ContextPaths {
        ContextPaths {
            model: self.model_path.clone(),
            table: self.grid_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:5001");
        assert_eq!(config.grid_path, PathBuf::from("data/grid_features.csv"));
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_port_fallback_and_overrides() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("SAFEWALK_ROUTING_URL", "http://osrm.local:5000/"),
            ("SAFEWALK_ADMIN_TOKEN", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.routing_url, "http://osrm.local:5000");
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));

        let config = GatewayConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("SAFEWALK_PORT", "9090"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn test_invalid_number_is_error() {
        assert!(GatewayConfig::from_lookup(lookup(&[("SAFEWALK_PORT", "http")])).is_err());
        assert!(
            GatewayConfig::from_lookup(lookup(&[("SAFEWALK_ROUTING_TIMEOUT_SECS", "-1")])).is_err()
        );
    }
}
