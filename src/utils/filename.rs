use chrono::{Datelike, Local};
use std::path::PathBuf;

/// Default output path for the enriched dataset: `output/anomalies-{YYMMDD}.{extension}`
pub fn generate_default_output_filename(extension: &str) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100;

    let filename = format!(
        "anomalies-{:02}{:02}{:02}.{}",
        year,
        now.month(),
        now.day(),
        extension.trim_start_matches('.')
    );
    PathBuf::from("output").join(filename)
}
