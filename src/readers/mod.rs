pub mod reading_reader;
pub mod series_store;

pub use reading_reader::{parse_timestamp, ReadingReader};
pub use series_store::{SeriesStore, SourceIdentity};
