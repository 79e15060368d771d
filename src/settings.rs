use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use validator::Validate;

use crate::error::Result;
use crate::utils::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_WEATHER_BASE_URL, DEFAULT_WORKERS,
    ENV_PREFIX,
};

/// Runtime settings, layered as defaults < TOML file < `ANOMALY_*` environment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(range(min = 1, max = 256))]
    pub workers: usize,

    pub api_key: Option<String>,

    #[validate(length(min = 1))]
    pub weather_base_url: String,

    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    pub compute_timeout_secs: Option<u64>,

    #[validate(length(min = 1))]
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration. An explicit `path` must exist; without one the
    /// default `anomaly.toml` in the working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_source = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .set_default("workers", DEFAULT_WORKERS as i64)?
            .set_default("weather_base_url", DEFAULT_WEATHER_BASE_URL)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?
            .set_default("log_level", "info")?
            .add_source(file_source)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn compute_timeout(&self) -> Option<Duration> {
        self.compute_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            api_key: None,
            weather_base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            compute_timeout_secs: None,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_file_overrides_defaults() -> Result<()> {
        let file = toml_file("workers = 3\ncompute_timeout_secs = 120\n");

        let config = AppConfig::load(Some(file.path()))?;
        assert_eq!(config.workers, 3);
        assert_eq!(config.compute_timeout(), Some(Duration::from_secs(120)));
        assert_eq!(config.weather_base_url, DEFAULT_WEATHER_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));

        Ok(())
    }

    #[test]
    fn test_zero_workers_rejected() {
        let file = toml_file("workers = 0\n");
        assert!(AppConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/anomaly.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.workers, DEFAULT_WORKERS);
    }
}
