use chrono::{Local, NaiveDate};
use tracing::info;

use crate::error::Result;
use crate::live::WeatherFeed;
use crate::models::{AnomalyReport, Season, SeasonalStatsTable};

/// Classifies a fresh temperature against the precomputed baseline for the
/// city and the current season.
pub struct LiveAnomalyChecker<'a> {
    stats: &'a SeasonalStatsTable,
}

impl<'a> LiveAnomalyChecker<'a> {
    pub fn new(stats: &'a SeasonalStatsTable) -> Self {
        Self { stats }
    }

    /// Classify using today's local date to pick the season.
    pub fn classify(&self, temperature: f64, city: &str) -> Result<AnomalyReport> {
        self.classify_on(temperature, city, Local::now().date_naive())
    }

    pub fn classify_on(
        &self,
        temperature: f64,
        city: &str,
        date: NaiveDate,
    ) -> Result<AnomalyReport> {
        let season = Season::for_date(&date);
        self.classify_in_season(temperature, city, season)
    }

    pub fn classify_in_season(
        &self,
        temperature: f64,
        city: &str,
        season: Season,
    ) -> Result<AnomalyReport> {
        let baseline = self.stats.lookup(city, season)?;
        Ok(AnomalyReport::new(city, temperature, season, baseline))
    }

    /// Fetch the current temperature from `feed` and classify it.
    ///
    /// Feed failures come back unchanged: `Auth` for a rejected key, `Fetch`
    /// for anything else. Nothing is retried.
    pub async fn fetch_and_classify(
        &self,
        feed: &dyn WeatherFeed,
        api_key: &str,
        city: &str,
    ) -> Result<AnomalyReport> {
        let temperature = feed.current_temperature(api_key, city).await?;
        let report = self.classify(temperature, city)?;
        info!(
            "{}: {:.1}°C in {} is {}",
            city,
            temperature,
            report.season,
            if report.is_anomaly { "anomalous" } else { "normal" }
        );
        Ok(report)
    }
}

/// Check that `api_key` is accepted by the feed by requesting one city.
pub async fn verify_api_key(feed: &dyn WeatherFeed, api_key: &str, city: &str) -> Result<()> {
    feed.current_temperature(api_key, city).await.map(|_| ())
}
