use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{Reading, Season, SeasonalBaseline};

/// A reading together with its rolling mean, seasonal baseline and anomaly flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedReading {
    pub row_index: usize,
    pub city: String,
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub season: Season,
    pub roll_mean: Option<f64>,
    pub mean_season: f64,
    pub std_season: f64,
    pub is_anomaly: bool,
}

impl EnrichedReading {
    pub fn from_reading(
        reading: &Reading,
        roll_mean: Option<f64>,
        baseline: SeasonalBaseline,
    ) -> Self {
        Self {
            row_index: reading.row_index,
            city: reading.city.clone(),
            timestamp: reading.timestamp,
            temperature: reading.temperature,
            season: reading.season,
            roll_mean,
            mean_season: baseline.mean,
            std_season: baseline.std,
            is_anomaly: baseline.is_anomalous(reading.temperature),
        }
    }

    pub fn baseline(&self) -> SeasonalBaseline {
        SeasonalBaseline::new(self.mean_season, self.std_season)
    }

    /// Deviation of the reading from its seasonal mean, in standard deviations.
    pub fn z_score(&self) -> Option<f64> {
        let baseline = self.baseline();
        if baseline.is_defined() && baseline.std > 0.0 {
            Some((self.temperature - baseline.mean) / baseline.std)
        } else {
            None
        }
    }
}
