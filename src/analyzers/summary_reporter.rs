use crate::models::{EnrichedReading, Season};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize)]
pub struct CitySummary {
    pub city: String,
    pub observations: usize,
    pub date_range: (NaiveDate, NaiveDate),
    pub min_temp: f64,
    pub max_temp: f64,
    pub mean_temp: f64,
    pub anomaly_count: usize,
    pub seasons: Vec<SeasonSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonSummary {
    pub season: Season,
    pub observations: usize,
    pub anomalies: usize,
    pub mean_season: f64,
    pub std_season: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub total_records: usize,
    pub cities: usize,
    pub date_range: (NaiveDate, NaiveDate),
    pub anomaly_count: usize,
}

/// Descriptive aggregates over an enriched dataset. Always filters by city
/// rather than relying on global row order.
pub struct SummaryReporter;

impl SummaryReporter {
    pub fn new() -> Self {
        Self
    }

    /// Distinct cities, sorted.
    pub fn cities(&self, records: &[EnrichedReading]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.city.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn city_summary(&self, records: &[EnrichedReading], city: &str) -> Option<CitySummary> {
        let rows: Vec<&EnrichedReading> = records.iter().filter(|r| r.city == city).collect();
        let first = rows.first()?;

        let mut min_date = first.timestamp.date();
        let mut max_date = min_date;
        let mut min_temp = f64::INFINITY;
        let mut max_temp = f64::NEG_INFINITY;
        let mut temp_sum = 0.0;
        let mut anomaly_count = 0;
        let mut seasons: BTreeMap<Season, SeasonSummary> = BTreeMap::new();

        for row in &rows {
            let date = row.timestamp.date();
            min_date = min_date.min(date);
            max_date = max_date.max(date);
            min_temp = min_temp.min(row.temperature);
            max_temp = max_temp.max(row.temperature);
            temp_sum += row.temperature;

            let season = seasons.entry(row.season).or_insert_with(|| SeasonSummary {
                season: row.season,
                observations: 0,
                anomalies: 0,
                mean_season: row.mean_season,
                std_season: row.std_season,
            });
            season.observations += 1;

            if row.is_anomaly {
                anomaly_count += 1;
                season.anomalies += 1;
            }
        }

        Some(CitySummary {
            city: city.to_string(),
            observations: rows.len(),
            date_range: (min_date, max_date),
            min_temp,
            max_temp,
            mean_temp: temp_sum / rows.len() as f64,
            anomaly_count,
            seasons: seasons.into_values().collect(),
        })
    }

    pub fn summarize_all(&self, records: &[EnrichedReading]) -> Vec<CitySummary> {
        self.cities(records)
            .iter()
            .filter_map(|city| self.city_summary(records, city))
            .collect()
    }

    pub fn dataset_summary(&self, records: &[EnrichedReading]) -> Option<DatasetSummary> {
        let first = records.first()?.timestamp.date();
        let (min_date, max_date) = records.iter().fold((first, first), |(lo, hi), r| {
            let date = r.timestamp.date();
            (lo.min(date), hi.max(date))
        });

        Some(DatasetSummary {
            total_records: records.len(),
            cities: self.cities(records).len(),
            date_range: (min_date, max_date),
            anomaly_count: records.iter().filter(|r| r.is_anomaly).count(),
        })
    }
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_stat(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.2}", value)
    }
}

impl CitySummary {
    pub fn anomalies_by_season(&self) -> BTreeMap<Season, usize> {
        self.seasons
            .iter()
            .map(|s| (s.season, s.anomalies))
            .collect()
    }

    pub fn summary(&self) -> String {
        let mut out = format!(
            "{}\n\
            Observation period: {} to {} ({} readings)\n\
            Minimum temperature: {:.2}°C\n\
            Maximum temperature: {:.2}°C\n\
            Anomalous readings: {}",
            self.city,
            self.date_range.0,
            self.date_range.1,
            self.observations,
            self.min_temp,
            self.max_temp,
            self.anomaly_count
        );

        out.push_str("\n\nSeasonal baselines:");
        for season in &self.seasons {
            out.push_str(&format!(
                "\n- {}: mean {}°C, std {}°C, {} of {} readings anomalous",
                season.season,
                format_stat(season.mean_season),
                format_stat(season.std_season),
                season.anomalies,
                season.observations
            ));
        }

        out
    }
}

impl DatasetSummary {
    pub fn summary(&self) -> String {
        format!(
            "Records: {} total\n\
            Cities: {}\n\
            Date Range: {} to {}\n\
            Anomalies: {} ({:.1}%)",
            self.total_records,
            self.cities,
            self.date_range.0,
            self.date_range.1,
            self.anomaly_count,
            100.0 * self.anomaly_count as f64 / self.total_records as f64
        )
    }
}
