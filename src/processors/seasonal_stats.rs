use crate::error::{ProcessingError, Result};
use crate::models::{EnrichedReading, Reading, Season, SeasonalBaseline};
use crate::utils::constants::ROLLING_WINDOW;
use crate::utils::stats::{centered_rolling_mean, mean, sample_std};
use std::collections::HashMap;

/// Computes the rolling-mean seasonal model for one city's series.
///
/// Holds no state between calls, so one engine can be shared across worker threads.
pub struct SeasonalStatsEngine {
    window: usize,
}

impl SeasonalStatsEngine {
    pub fn new() -> Self {
        Self {
            window: ROLLING_WINDOW,
        }
    }

    /// Enrich every reading of a single city.
    ///
    /// Readings are ordered by timestamp (stable, so equal timestamps keep their
    /// input order) before the rolling mean is taken. The output is in that
    /// chronological order.
    pub fn compute_for_city(&self, readings: &[Reading]) -> Result<Vec<EnrichedReading>> {
        let Some(first) = readings.first() else {
            return Ok(Vec::new());
        };

        if let Some(other) = readings.iter().find(|r| r.city != first.city) {
            return Err(ProcessingError::Compute(format!(
                "partition mixes cities '{}' and '{}'",
                first.city, other.city
            )));
        }

        if let Some(bad) = readings.iter().find(|r| !r.temperature.is_finite()) {
            return Err(ProcessingError::Compute(format!(
                "non-finite temperature {} at row {}",
                bad.temperature, bad.row_index
            )));
        }

        let mut ordered: Vec<&Reading> = readings.iter().collect();
        ordered.sort_by_key(|r| r.timestamp);

        let temperatures: Vec<f64> = ordered.iter().map(|r| r.temperature).collect();
        let roll_means = centered_rolling_mean(&temperatures, self.window);

        let baselines = season_baselines(
            ordered
                .iter()
                .zip(&roll_means)
                .map(|(r, roll)| (r.season, r.temperature, *roll)),
        );

        let enriched = ordered
            .iter()
            .zip(roll_means)
            .map(|(reading, roll_mean)| {
                let baseline = baselines
                    .get(&reading.season)
                    .copied()
                    .unwrap_or_else(|| SeasonalBaseline::new(f64::NAN, f64::NAN));
                EnrichedReading::from_reading(reading, roll_mean, baseline)
            })
            .collect();

        Ok(enriched)
    }
}

impl Default for SeasonalStatsEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate `(season, temperature, roll_mean)` rows into one baseline per season.
///
/// The mean is taken over defined rolling means; the standard deviation is the
/// sample deviation of `temperature - roll_mean` over the same rows. Rows without
/// a rolling mean contribute nothing. Statistics with too few values are `NaN`.
pub fn season_baselines<I>(rows: I) -> HashMap<Season, SeasonalBaseline>
where
    I: IntoIterator<Item = (Season, f64, Option<f64>)>,
{
    let mut groups: HashMap<Season, (Vec<f64>, Vec<f64>)> = HashMap::new();

    for (season, temperature, roll_mean) in rows {
        let (rolls, residuals) = groups.entry(season).or_default();
        if let Some(roll) = roll_mean {
            rolls.push(roll);
            residuals.push(temperature - roll);
        }
    }

    groups
        .into_iter()
        .map(|(season, (rolls, residuals))| {
            (
                season,
                SeasonalBaseline::new(mean(&rolls), sample_std(&residuals)),
            )
        })
        .collect()
}
