use crate::error::{ProcessingError, Result};
use crate::models::{EnrichedReading, Reading, SeasonalStatsTable};
use crate::processors::{IntegrityChecker, IntegrityReport, ParallelProcessor};
use crate::readers::{SeriesStore, SourceIdentity};
use crate::settings::AppConfig;
use crate::utils::SingleFlightCache;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Everything derived from one loaded dataset. Immutable once built.
#[derive(Debug)]
pub struct AnalysisResult {
    pub readings: Arc<Vec<Reading>>,
    pub enriched: Vec<EnrichedReading>,
    pub stats: SeasonalStatsTable,
    pub integrity: IntegrityReport,
}

impl AnalysisResult {
    pub fn anomaly_count(&self) -> usize {
        self.enriched.iter().filter(|r| r.is_anomaly).count()
    }
}

/// Load → partition → compute, with the result cached per source identity.
///
/// This is the explicit state object handed to consumers; there is no ambient
/// global dataset.
pub struct AnomalyPipeline {
    store: SeriesStore,
    processor: ParallelProcessor,
    checker: IntegrityChecker,
    results: SingleFlightCache<SourceIdentity, AnalysisResult>,
}

impl AnomalyPipeline {
    pub fn new(processor: ParallelProcessor) -> Self {
        Self {
            store: SeriesStore::new(),
            processor,
            checker: IntegrityChecker::new(),
            results: SingleFlightCache::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(ParallelProcessor::new(config.workers))
    }

    pub fn with_store(mut self, store: SeriesStore) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    /// Analyze the dataset at `path`. Repeated calls for an unchanged file return
    /// the cached result; a changed file is reloaded and recomputed.
    pub fn analyze(&self, path: &Path) -> Result<Arc<AnalysisResult>> {
        let identity = SourceIdentity::of(path)?;
        self.results
            .invalidate_where(|key| key.path == identity.path && *key != identity)?;

        self.results.get_or_try_insert_with(&identity, || {
            let readings = self.store.load_identity(&identity)?;
            self.analyze_readings(readings)
        })
    }

    /// Run the full computation on already-loaded readings, bypassing the cache.
    pub fn analyze_readings(&self, readings: Arc<Vec<Reading>>) -> Result<AnalysisResult> {
        let integrity = self.checker.check(&readings);
        if !integrity.is_clean() {
            info!("Integrity check found {} issues", integrity.violations.len());
        }

        let enriched = self.processor.run(&readings)?;
        let stats = SeasonalStatsTable::from_enriched(&enriched);
        info!(
            "Computed {} seasonal baselines, {} anomalous readings",
            stats.len(),
            enriched.iter().filter(|r| r.is_anomaly).count()
        );

        Ok(AnalysisResult {
            readings,
            enriched,
            stats,
            integrity,
        })
    }

    /// [`analyze`](Self::analyze) on a blocking task, failing with a compute
    /// error if it does not finish within `timeout`.
    pub async fn analyze_with_timeout(
        self: Arc<Self>,
        path: PathBuf,
        timeout: Duration,
    ) -> Result<Arc<AnalysisResult>> {
        let task = tokio::task::spawn_blocking(move || self.analyze(&path));
        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined?,
            Err(_) => Err(ProcessingError::Compute(format!(
                "analysis timed out after {:?}",
                timeout
            ))),
        }
    }
}

impl Default for AnomalyPipeline {
    fn default() -> Self {
        Self::new(ParallelProcessor::default())
    }
}
