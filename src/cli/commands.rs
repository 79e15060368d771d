use crate::analyzers::SummaryReporter;
use crate::cli::args::{Cli, Commands, OutputFormat};
use crate::error::{ProcessingError, Result};
use crate::live::{verify_api_key, LiveAnomalyChecker, OpenWeatherMapFeed};
use crate::processors::{AnalysisResult, AnomalyPipeline, IntegrityChecker, ParallelProcessor};
use crate::readers::SeriesStore;
use crate::settings::AppConfig;
use crate::utils::progress::ProgressReporter;
use crate::utils::{generate_default_output_filename, init_tracing};
use crate::writers::{CsvWriter, ParquetWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    init_tracing(cli.verbose, &config.log_level, cli.log_file.as_deref())?;
    let show_progress = !cli.quiet;

    match cli.command {
        Commands::Analyze {
            input,
            output,
            write,
            format,
            compression,
            city,
            workers,
        } => {
            println!("Analyzing temperature readings...");
            println!("Input file: {}", input.display());

            let result = analyze(&config, &input, workers, show_progress).await?;

            println!("\n{}", IntegrityChecker::new().generate_summary(&result.integrity));

            let reporter = SummaryReporter::new();
            if let Some(summary) = reporter.dataset_summary(&result.enriched) {
                println!("{}", summary.summary());
            }

            match city {
                Some(city) => print_city(&reporter, &result, &city),
                None => {
                    println!("\nAnomalies per city:");
                    for summary in reporter.summarize_all(&result.enriched) {
                        println!(
                            "- {}: {} of {} readings",
                            summary.city, summary.anomaly_count, summary.observations
                        );
                    }
                }
            }

            if output.is_some() || write {
                let output_file =
                    output.unwrap_or_else(|| generate_default_output_filename(format.extension()));
                write_output(&result, &output_file, format, &compression)?;
            }

            println!("\nAnalysis complete!");
        }

        Commands::Summary {
            input,
            city,
            json,
            workers,
        } => {
            let result = analyze(&config, &input, workers, show_progress).await?;
            let reporter = SummaryReporter::new();

            let cities = match city {
                Some(city) => vec![city],
                None => reporter.cities(&result.enriched),
            };

            if json {
                let summaries: Vec<_> = cities
                    .iter()
                    .filter_map(|city| reporter.city_summary(&result.enriched, city))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                for city in &cities {
                    print_city(&reporter, &result, city);
                }
            }
        }

        Commands::Validate { input } => {
            println!("Validating temperature readings...");
            println!("Input file: {}", input.display());

            let progress = ProgressReporter::new_spinner("Loading readings...", !show_progress);
            let store = SeriesStore::new();
            let readings = store.load(&input)?;
            progress.finish_with_message(&format!("Loaded {} readings", readings.len()));

            let checker = IntegrityChecker::new();
            let report = checker.check(&readings);
            println!("\n{}", checker.generate_summary(&report));

            if report.is_clean() {
                println!("✅ All readings passed integrity checks");
            } else {
                println!("⚠️  Found {} integrity issues", report.violations.len());
            }
        }

        Commands::Live {
            input,
            city,
            api_key,
            temperature,
            workers,
        } => {
            let result = analyze(&config, &input, workers, show_progress).await?;
            let checker = LiveAnomalyChecker::new(&result.stats);

            let report = match temperature {
                Some(temperature) => checker.classify(temperature, &city)?,
                None => {
                    let api_key = resolve_api_key(api_key, &config)?;
                    let feed = OpenWeatherMapFeed::new(
                        &config.weather_base_url,
                        config.request_timeout(),
                    )?;
                    checker.fetch_and_classify(&feed, &api_key, &city).await?
                }
            };

            println!("\n{}", report);
        }

        Commands::CheckKey { city, api_key } => {
            let api_key = resolve_api_key(api_key, &config)?;
            let feed =
                OpenWeatherMapFeed::new(&config.weather_base_url, config.request_timeout())?;

            verify_api_key(&feed, &api_key, &city).await?;
            println!("✅ OpenWeatherMap API key accepted");
        }
    }

    Ok(())
}

async fn analyze(
    config: &AppConfig,
    input: &Path,
    workers: Option<usize>,
    show_progress: bool,
) -> Result<Arc<AnalysisResult>> {
    let processor =
        ParallelProcessor::new(workers.unwrap_or(config.workers)).with_progress(show_progress);
    let pipeline = Arc::new(AnomalyPipeline::new(processor));
    let input = input.to_path_buf();

    let result = match config.compute_timeout() {
        Some(timeout) => pipeline.analyze_with_timeout(input, timeout).await?,
        None => tokio::task::spawn_blocking(move || pipeline.analyze(&input)).await??,
    };

    info!(
        "{} readings, {} anomalies",
        result.enriched.len(),
        result.anomaly_count()
    );
    Ok(result)
}

fn print_city(reporter: &SummaryReporter, result: &AnalysisResult, city: &str) {
    match reporter.city_summary(&result.enriched, city) {
        Some(summary) => println!("\n{}", summary.summary()),
        None => println!("\nNo readings for city '{}'", city),
    }
}

fn write_output(
    result: &AnalysisResult,
    output_file: &PathBuf,
    format: OutputFormat,
    compression: &str,
) -> Result<()> {
    if let Some(parent) = output_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    println!(
        "\nWriting {} records to {}...",
        result.enriched.len(),
        output_file.display()
    );

    match format {
        OutputFormat::Parquet => {
            let writer = ParquetWriter::new().with_compression(compression)?;
            writer.write_records(&result.enriched, output_file)?;
            println!("{}", writer.get_file_info(output_file)?.summary());
        }
        OutputFormat::Csv => CsvWriter::new().write_records(&result.enriched, output_file)?,
    }

    Ok(())
}

fn resolve_api_key(api_key: Option<String>, config: &AppConfig) -> Result<String> {
    let usable = |key: &String| !key.trim().is_empty();
    api_key
        .filter(usable)
        .or_else(|| config.api_key.clone().filter(usable))
        .ok_or_else(|| {
            ProcessingError::Config(
                "an OpenWeatherMap API key is required (--api-key or ANOMALY_API_KEY)".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_key_precedence() {
        let config = AppConfig {
            api_key: Some("from-config".to_string()),
            ..AppConfig::default()
        };

        assert_eq!(
            resolve_api_key(Some("from-flag".to_string()), &config).unwrap(),
            "from-flag"
        );
        assert_eq!(resolve_api_key(None, &config).unwrap(), "from-config");
        assert_eq!(
            resolve_api_key(Some("  ".to_string()), &config).unwrap(),
            "from-config"
        );
        assert!(matches!(
            resolve_api_key(Some("  ".to_string()), &AppConfig::default()),
            Err(ProcessingError::Config(_))
        ));
    }
}
