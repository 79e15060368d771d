use crate::error::{ProcessingError, Result};
use crate::models::{EnrichedReading, Reading};
use crate::processors::SeasonalStatsEngine;
use crate::utils::constants::{DEFAULT_WORKERS, MAX_WORKERS};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Splits readings by city and runs the seasonal model per city on a bounded pool.
#[derive(Debug, Clone)]
pub struct ParallelProcessor {
    max_workers: usize,
    quiet: bool,
    stack_size: Option<usize>,
}

impl ParallelProcessor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.clamp(1, MAX_WORKERS),
            quiet: true,
            stack_size: None,
        }
    }

    /// Stack size in bytes for each worker thread (rayon's default when unset).
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Show a progress bar over cities while running.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.quiet = !show;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Split readings into one partition per city, in first-seen city order.
    /// Row order inside each partition follows the input.
    pub fn partition_by_city(readings: &[Reading]) -> Result<Vec<(String, Vec<Reading>)>> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut partitions: Vec<(String, Vec<Reading>)> = Vec::new();

        for reading in readings {
            if reading.city.is_empty() {
                return Err(ProcessingError::Partition(format!(
                    "row {} has an empty city",
                    reading.row_index
                )));
            }

            let idx = *positions.entry(reading.city.as_str()).or_insert_with(|| {
                partitions.push((reading.city.clone(), Vec::new()));
                partitions.len() - 1
            });
            partitions[idx].1.push(reading.clone());
        }

        Ok(partitions)
    }

    /// Enrich all readings. The first failing city aborts the whole run and no
    /// partial result is returned. Output is in original row order.
    pub fn run(&self, readings: &[Reading]) -> Result<Vec<EnrichedReading>> {
        let partitions = Self::partition_by_city(readings)?;
        info!(
            "Processing {} readings across {} cities with {} workers",
            readings.len(),
            partitions.len(),
            self.max_workers
        );
        if self.max_workers > num_cpus::get() {
            warn!(
                "{} workers requested but only {} CPUs available",
                self.max_workers,
                num_cpus::get()
            );
        }

        let pool = self.build_pool()?;

        let progress = ProgressReporter::new(
            partitions.len() as u64,
            "Computing seasonal statistics...",
            self.quiet,
        );
        let engine = SeasonalStatsEngine::new();

        let results: Result<Vec<Vec<EnrichedReading>>> = pool.install(|| {
            partitions
                .par_iter()
                .map(|(city, rows)| {
                    let result = engine
                        .compute_for_city(rows)
                        .map_err(|e| ProcessingError::compute_for_city(city, e));

                    match &result {
                        Ok(enriched) => debug!(
                            "{}: {} rows, {} anomalies",
                            city,
                            enriched.len(),
                            enriched.iter().filter(|r| r.is_anomaly).count()
                        ),
                        Err(e) => warn!("{}", e),
                    }
                    progress.increment(1);

                    result
                })
                .collect()
        });

        let mut merged: Vec<EnrichedReading> = results?.into_iter().flatten().collect();
        merged.sort_by_key(|r| r.row_index);

        if merged.len() != readings.len() {
            return Err(ProcessingError::Compute(format!(
                "merged {} rows but received {}",
                merged.len(),
                readings.len()
            )));
        }

        progress.finish_with_message(&format!("Processed {} cities", partitions.len()));
        Ok(merged)
    }

    fn build_pool(&self) -> Result<rayon::ThreadPool> {
        let mut builder = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .thread_name(|i| format!("city-worker-{}", i));
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }

        builder
            .build()
            .map_err(|e| ProcessingError::Compute(format!("worker pool: {}", e)))
    }

    /// Same as [`run`](Self::run) but gives up after `timeout`. The abandoned
    /// computation finishes in the background and its output is dropped.
    pub async fn run_with_timeout(
        &self,
        readings: Arc<Vec<Reading>>,
        timeout: Duration,
    ) -> Result<Vec<EnrichedReading>> {
        let processor = self.clone();
        let task = tokio::task::spawn_blocking(move || processor.run(&readings));

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined?,
            Err(_) => Err(ProcessingError::Compute(format!(
                "seasonal computation timed out after {:?}",
                timeout
            ))),
        }
    }
}

impl Default for ParallelProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}
