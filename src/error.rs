use thiserror::Error;

use crate::models::Season;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Partition error: {0}")]
    Partition(String),

    #[error("Compute error: {0}")]
    Compute(String),

    #[error("No seasonal statistics for {city} in {season}")]
    Lookup { city: String, season: Season },

    #[error("Invalid API key for weather feed (city: {city})")]
    Auth { city: String },

    #[error("Weather feed request for {city} failed: {message}")]
    Fetch { city: String, message: String },

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ProcessingError {
    pub fn parse(line: u64, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Wrap a partition failure so the message names the city that failed.
    pub fn compute_for_city(city: &str, cause: ProcessingError) -> Self {
        match cause {
            ProcessingError::Compute(message) => {
                Self::Compute(format!("city '{}': {}", city, message))
            }
            other => Self::Compute(format!("city '{}': {}", city, other)),
        }
    }

    /// Pipeline stage that produced the error, used to prefix user-facing messages.
    pub fn stage(&self) -> &'static str {
        match self {
            ProcessingError::Io(_) | ProcessingError::Csv(_) | ProcessingError::Parse { .. } => {
                "load"
            }
            ProcessingError::Partition(_) => "partition",
            ProcessingError::Compute(_) | ProcessingError::TaskJoin(_) => "compute",
            ProcessingError::Lookup { .. } => "lookup",
            ProcessingError::Auth { .. } => "weather-auth",
            ProcessingError::Fetch { .. } => "weather-fetch",
            ProcessingError::Parquet(_)
            | ProcessingError::Arrow(_)
            | ProcessingError::Json(_) => "write",
            ProcessingError::Config(_) | ProcessingError::Validation(_) => "config",
        }
    }
}

impl From<config::ConfigError> for ProcessingError {
    fn from(err: config::ConfigError) -> Self {
        ProcessingError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names_are_distinct_for_feed_errors() {
        let auth = ProcessingError::Auth {
            city: "Berlin".to_string(),
        };
        let fetch = ProcessingError::Fetch {
            city: "Berlin".to_string(),
            message: "HTTP 500".to_string(),
        };

        assert_eq!(auth.stage(), "weather-auth");
        assert_eq!(fetch.stage(), "weather-fetch");
        assert!(auth.to_string().contains("Invalid API key"));
    }

    #[test]
    fn test_compute_for_city_names_city() {
        let err = ProcessingError::compute_for_city(
            "Cairo",
            ProcessingError::Compute("non-finite temperature".to_string()),
        );

        assert_eq!(err.stage(), "compute");
        assert_eq!(
            err.to_string(),
            "Compute error: city 'Cairo': non-finite temperature"
        );
    }

    #[test]
    fn test_lookup_message() {
        let err = ProcessingError::Lookup {
            city: "Sydney".to_string(),
            season: Season::Winter,
        };
        assert_eq!(
            err.to_string(),
            "No seasonal statistics for Sydney in winter"
        );
    }
}
