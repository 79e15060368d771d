use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "seasonal-anomaly")]
#[command(about = "Seasonal temperature anomaly detection per city")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Hide progress bars")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Configuration file [default: anomaly.toml if present]")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Parquet,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute rolling baselines and anomaly flags for every city
    Analyze {
        #[arg(short, long, help = "Input CSV with city, timestamp, temperature, season")]
        input: PathBuf,

        #[arg(
            short,
            long,
            help = "Write the enriched dataset here [default: output/anomalies-{YYMMDD}.<format>]"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "Write the enriched dataset to the default output path")]
        write: bool,

        #[arg(short, long, value_enum, default_value = "parquet")]
        format: OutputFormat,

        #[arg(short, long, default_value = "snappy")]
        compression: String,

        #[arg(long, help = "Only print the summary for this city")]
        city: Option<String>,

        #[arg(short, long, help = "Worker threads [default: from config, 6]")]
        workers: Option<usize>,
    },

    /// Print per-city summaries and seasonal baselines
    Summary {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        city: Option<String>,

        #[arg(long, help = "Print summaries as JSON")]
        json: bool,

        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Load and integrity-check a dataset without computing baselines
    Validate {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Classify the current temperature of a city against its seasonal baseline
    Live {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        city: String,

        #[arg(long, help = "OpenWeatherMap API key [default: from config / ANOMALY_API_KEY]")]
        api_key: Option<String>,

        #[arg(
            long,
            allow_hyphen_values = true,
            help = "Classify this temperature instead of fetching one"
        )]
        temperature: Option<f64>,

        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Check that an OpenWeatherMap API key is accepted
    CheckKey {
        #[arg(long)]
        city: String,

        #[arg(long)]
        api_key: Option<String>,
    },
}
