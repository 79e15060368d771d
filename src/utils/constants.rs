/// Anomaly model
pub const ROLLING_WINDOW: usize = 30;
pub const ANOMALY_SIGMA: f64 = 2.0;

/// Required input columns
pub const COLUMN_CITY: &str = "city";
pub const COLUMN_TIMESTAMP: &str = "timestamp";
pub const COLUMN_TEMPERATURE: &str = "temperature";
pub const COLUMN_SEASON: &str = "season";

/// Accepted timestamp layouts, tried in order after RFC 3339
pub const TIMESTAMP_FORMATS: [&str; 3] =
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Plausibility bounds (°C) used by the integrity check
pub const MIN_PLAUSIBLE_TEMP: f64 = -90.0;
pub const MAX_PLAUSIBLE_TEMP: f64 = 60.0;
pub const SUSPICIOUS_JUMP: f64 = 25.0;

/// Processing defaults
pub const DEFAULT_WORKERS: usize = 6;
pub const MAX_WORKERS: usize = 256;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Weather feed
pub const DEFAULT_WEATHER_BASE_URL: &str = "http://api.openweathermap.org";
pub const WEATHER_ENDPOINT: &str = "/data/2.5/weather";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Configuration
pub const DEFAULT_CONFIG_FILE: &str = "anomaly.toml";
pub const ENV_PREFIX: &str = "ANOMALY";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
