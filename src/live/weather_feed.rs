//! Current-temperature sources for the live anomaly check.
//!
//! [`WeatherFeed`] is the seam; [`OpenWeatherMapFeed`] talks to the
//! OpenWeatherMap current-weather endpoint using [`reqwest`].

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_WEATHER_BASE_URL, WEATHER_ENDPOINT,
};

/// Supplies the current temperature (°C) for a city.
///
/// Implementations must report an invalid key as [`ProcessingError::Auth`] and
/// every other failure as [`ProcessingError::Fetch`].
#[async_trait]
pub trait WeatherFeed: Send + Sync {
    async fn current_temperature(&self, api_key: &str, city: &str) -> Result<f64>;
}

/// How a feed response status is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Success,
    Unauthorized,
    Failed,
}

impl FeedStatus {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::OK => FeedStatus::Success,
            StatusCode::UNAUTHORIZED => FeedStatus::Unauthorized,
            _ => FeedStatus::Failed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: MainReadings,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

/// HTTP client for the OpenWeatherMap current-weather API (metric units).
pub struct OpenWeatherMapFeed {
    client: reqwest::Client,
    base_url: String,
}

impl OpenWeatherMapFeed {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProcessingError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, WEATHER_ENDPOINT)
    }

    fn fetch_error(city: &str, message: impl Into<String>) -> ProcessingError {
        ProcessingError::Fetch {
            city: city.to_string(),
            message: message.into(),
        }
    }
}

impl Default for OpenWeatherMapFeed {
    fn default() -> Self {
        Self::with_client(
            reqwest::Client::builder()
                .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            DEFAULT_WEATHER_BASE_URL,
        )
    }
}

#[async_trait]
impl WeatherFeed for OpenWeatherMapFeed {
    async fn current_temperature(&self, api_key: &str, city: &str) -> Result<f64> {
        debug!("Requesting current weather for {}", city);

        let response = self
            .client
            .get(self.endpoint())
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .send()
            .await
            .map_err(|e| Self::fetch_error(city, e.to_string()))?;

        let status = response.status();
        match FeedStatus::from_status(status) {
            FeedStatus::Success => {
                let body: CurrentWeather = response
                    .json()
                    .await
                    .map_err(|e| {
                        Self::fetch_error(city, format!("invalid response body: {}", e))
                    })?;
                debug!("{}: current temperature {}°C", city, body.main.temp);
                Ok(body.main.temp)
            }
            FeedStatus::Unauthorized => {
                warn!("Weather feed rejected the API key");
                Err(ProcessingError::Auth {
                    city: city.to_string(),
                })
            }
            FeedStatus::Failed => {
                let body = response.text().await.unwrap_or_default();
                warn!("Weather feed returned {} for {}", status, city);
                Err(Self::fetch_error(
                    city,
                    format!("HTTP {}: {}", status.as_u16(), body.trim()),
                ))
            }
        }
    }
}
