pub mod integrity_checker;
pub mod parallel_processor;
pub mod pipeline;
pub mod seasonal_stats;

pub use integrity_checker::{
    CityStatistics, IntegrityChecker, IntegrityReport, ReadingViolation, ViolationType,
};
pub use parallel_processor::ParallelProcessor;
pub use pipeline::{AnalysisResult, AnomalyPipeline};
pub use seasonal_stats::{season_baselines, SeasonalStatsEngine};
