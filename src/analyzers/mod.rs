pub mod summary_reporter;

pub use summary_reporter::{CitySummary, DatasetSummary, SeasonSummary, SummaryReporter};
