use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Season;
use crate::utils::constants::{MAX_PLAUSIBLE_TEMP, MIN_PLAUSIBLE_TEMP};

/// A single temperature observation as loaded from the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Reading {
    /// Zero-based position of the data row in the source.
    pub row_index: usize,

    #[validate(length(min = 1))]
    pub city: String,

    pub timestamp: NaiveDateTime,

    pub temperature: f64,

    pub season: Season,
}

impl Reading {
    pub fn new(
        row_index: usize,
        city: String,
        timestamp: NaiveDateTime,
        temperature: f64,
        season: Season,
    ) -> Self {
        Self {
            row_index,
            city,
            timestamp,
            temperature,
            season,
        }
    }

    pub fn is_plausible_temperature(&self) -> bool {
        (MIN_PLAUSIBLE_TEMP..=MAX_PLAUSIBLE_TEMP).contains(&self.temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 7, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_reading_validation() {
        let reading = Reading::new(
            0,
            "Tokyo".to_string(),
            timestamp(),
            31.5,
            Season::Summer,
        );
        assert!(reading.validate().is_ok());
        assert!(reading.is_plausible_temperature());

        let unnamed = Reading::new(1, String::new(), timestamp(), 31.5, Season::Summer);
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn test_implausible_temperature() {
        let reading = Reading::new(
            0,
            "Tokyo".to_string(),
            timestamp(),
            75.0,
            Season::Summer,
        );
        assert!(!reading.is_plausible_temperature());
    }
}
