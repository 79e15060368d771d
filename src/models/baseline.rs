use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ProcessingError, Result};
use crate::models::{EnrichedReading, Season};
use crate::utils::constants::ANOMALY_SIGMA;

/// Expected temperature and its dispersion for one city within one season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalBaseline {
    pub mean: f64,
    pub std: f64,
}

impl SeasonalBaseline {
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    pub fn is_defined(&self) -> bool {
        !self.mean.is_nan() && !self.std.is_nan()
    }

    /// `|temperature - mean| > 2 * std`. Undefined statistics never flag an anomaly.
    pub fn is_anomalous(&self, temperature: f64) -> bool {
        if !self.is_defined() {
            return false;
        }
        (temperature - self.mean).abs() > ANOMALY_SIGMA * self.std
    }
}

/// Per-(city, season) baselines extracted from an enriched dataset.
#[derive(Debug, Clone, Default)]
pub struct SeasonalStatsTable {
    baselines: HashMap<(String, Season), SeasonalBaseline>,
}

impl SeasonalStatsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from enriched rows. The baseline is constant per group,
    /// so the first row seen for each (city, season) is taken.
    pub fn from_enriched(records: &[EnrichedReading]) -> Self {
        let mut baselines = HashMap::new();
        for record in records {
            baselines
                .entry((record.city.clone(), record.season))
                .or_insert_with(|| record.baseline());
        }
        Self { baselines }
    }

    pub fn insert(&mut self, city: &str, season: Season, baseline: SeasonalBaseline) {
        self.baselines.insert((city.to_string(), season), baseline);
    }

    pub fn get(&self, city: &str, season: Season) -> Option<&SeasonalBaseline> {
        self.baselines.get(&(city.to_string(), season))
    }

    pub fn lookup(&self, city: &str, season: Season) -> Result<SeasonalBaseline> {
        self.get(city, season)
            .copied()
            .ok_or_else(|| ProcessingError::Lookup {
                city: city.to_string(),
                season,
            })
    }

    /// Baselines for one city ordered winter, spring, summer, autumn.
    pub fn seasons_for(&self, city: &str) -> Vec<(Season, SeasonalBaseline)> {
        Season::ALL
            .iter()
            .filter_map(|season| self.get(city, *season).map(|b| (*season, *b)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_rule() {
        let baseline = SeasonalBaseline::new(-5.0, 1.0);

        assert!(baseline.is_anomalous(-8.0));
        assert!(!baseline.is_anomalous(-6.0));
        // exactly 2 sigma is not an anomaly
        assert!(!baseline.is_anomalous(-7.0));
        assert!(!baseline.is_anomalous(-3.0));
    }

    #[test]
    fn test_undefined_std_never_anomalous() {
        let baseline = SeasonalBaseline::new(10.0, f64::NAN);
        assert!(!baseline.is_defined());
        assert!(!baseline.is_anomalous(1000.0));
    }

    #[test]
    fn test_lookup_missing_combination() {
        let mut table = SeasonalStatsTable::new();
        table.insert("Moscow", Season::Winter, SeasonalBaseline::new(-5.0, 1.0));

        assert!(table.lookup("Moscow", Season::Winter).is_ok());
        assert!(matches!(
            table.lookup("Moscow", Season::Summer),
            Err(ProcessingError::Lookup { .. })
        ));
        assert!(matches!(
            table.lookup("Atlantis", Season::Winter),
            Err(ProcessingError::Lookup { .. })
        ));
    }

    #[test]
    fn test_seasons_for_orders_by_season() {
        let mut table = SeasonalStatsTable::new();
        table.insert("Rome", Season::Autumn, SeasonalBaseline::new(18.0, 2.0));
        table.insert("Rome", Season::Winter, SeasonalBaseline::new(8.0, 3.0));

        let seasons: Vec<Season> = table.seasons_for("Rome").into_iter().map(|(s, _)| s).collect();
        assert_eq!(seasons, vec![Season::Winter, Season::Autumn]);
    }
}
