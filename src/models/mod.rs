pub mod baseline;
pub mod enriched;
pub mod reading;
pub mod report;
pub mod season;

pub use baseline::{SeasonalBaseline, SeasonalStatsTable};
pub use enriched::EnrichedReading;
pub use reading::Reading;
pub use report::AnomalyReport;
pub use season::Season;
