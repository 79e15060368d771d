use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Season, SeasonalBaseline};

/// Outcome of classifying a single live temperature against a seasonal baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub city: String,
    pub temperature: f64,
    pub season: Season,
    pub mean_season: f64,
    pub std_season: f64,
    pub is_anomaly: bool,
}

impl AnomalyReport {
    pub fn new(city: &str, temperature: f64, season: Season, baseline: SeasonalBaseline) -> Self {
        Self {
            city: city.to_string(),
            temperature,
            season,
            mean_season: baseline.mean,
            std_season: baseline.std,
            is_anomaly: baseline.is_anomalous(temperature),
        }
    }
}

impl fmt::Display for AnomalyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "City: {}\n\
            Current temperature: {:.1}°C\n\
            Season: {} (mean {:.2}°C, std {:.2}°C)\n\
            Anomalous: {}",
            self.city,
            self.temperature,
            self.season,
            self.mean_season,
            self.std_season,
            if self.is_anomaly { "yes" } else { "no" }
        )
    }
}
