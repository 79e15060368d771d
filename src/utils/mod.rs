pub mod constants;
pub mod filename;
pub mod logging;
pub mod memo;
pub mod progress;
pub mod stats;

pub use constants::*;
pub use filename::generate_default_output_filename;
pub use logging::init_tracing;
pub use memo::SingleFlightCache;
pub use progress::ProgressReporter;
