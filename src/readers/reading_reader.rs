use crate::error::{ProcessingError, Result};
use crate::models::{Reading, Season};
use crate::utils::constants::{
    COLUMN_CITY, COLUMN_SEASON, COLUMN_TEMPERATURE, COLUMN_TIMESTAMP, DATE_FORMAT,
    DEFAULT_BUFFER_SIZE, TIMESTAMP_FORMATS,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use validator::Validate;

pub struct ReadingReader {
    use_mmap: bool,
}

impl ReadingReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    /// Read all readings from a CSV file with a header row
    pub fn read_readings(&self, path: &Path) -> Result<Vec<Reading>> {
        if self.use_mmap {
            self.read_readings_mmap(path)
        } else {
            let file = File::open(path)?;
            self.read_from(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file))
        }
    }

    /// Read readings using memory-mapped I/O for large files
    fn read_readings_mmap(&self, path: &Path) -> Result<Vec<Reading>> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return self.read_from(std::io::empty());
        }
        let mmap = unsafe { Mmap::map(&file)? };
        self.read_from(&mmap[..])
    }

    /// Parse readings from any CSV source. Columns are matched by header name,
    /// in any order; unknown columns are ignored.
    pub fn read_from<R: Read>(&self, source: R) -> Result<Vec<Reading>> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(source);

        let headers = csv_reader.headers().map_err(csv_to_parse_error)?.clone();
        let columns = ColumnIndex::from_headers(&headers)?;

        let mut readings = Vec::new();
        for (row_index, record) in csv_reader.records().enumerate() {
            let record = record.map_err(csv_to_parse_error)?;
            readings.push(self.parse_record(&record, &columns, row_index)?);
        }

        Ok(readings)
    }

    fn parse_record(
        &self,
        record: &StringRecord,
        columns: &ColumnIndex,
        row_index: usize,
    ) -> Result<Reading> {
        // header is line 1
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(row_index as u64 + 2);

        let field = |idx: usize, name: &str| {
            record
                .get(idx)
                .ok_or_else(|| ProcessingError::parse(line, format!("missing '{}' value", name)))
        };

        let city = field(columns.city, COLUMN_CITY)?.to_string();

        let timestamp_str = field(columns.timestamp, COLUMN_TIMESTAMP)?;
        let timestamp = parse_timestamp(timestamp_str).ok_or_else(|| {
            ProcessingError::parse(line, format!("Invalid timestamp: '{}'", timestamp_str))
        })?;

        let temp_str = field(columns.temperature, COLUMN_TEMPERATURE)?;
        let temperature = temp_str
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| {
                ProcessingError::parse(line, format!("Invalid temperature: '{}'", temp_str))
            })?;

        let season = field(columns.season, COLUMN_SEASON)?
            .parse::<Season>()
            .map_err(|e| ProcessingError::parse(line, e))?;

        let reading = Reading::new(row_index, city, timestamp, temperature, season);
        reading
            .validate()
            .map_err(|e| ProcessingError::parse(line, e.to_string()))?;

        Ok(reading)
    }
}

impl Default for ReadingReader {
    fn default() -> Self {
        Self::new()
    }
}

struct ColumnIndex {
    city: usize,
    timestamp: usize,
    temperature: usize,
    season: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        if headers.is_empty() {
            return Err(ProcessingError::parse(1, "input has no header row"));
        }

        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                ProcessingError::parse(1, format!("missing required column '{}'", name))
            })
        };

        // the city column is the partition key, so its absence is reported separately
        let city = find(COLUMN_CITY).ok_or_else(|| {
            ProcessingError::Partition(format!("missing '{}' column", COLUMN_CITY))
        })?;

        Ok(Self {
            city,
            timestamp: require(COLUMN_TIMESTAMP)?,
            temperature: require(COLUMN_TEMPERATURE)?,
            season: require(COLUMN_SEASON)?,
        })
    }
}

/// Parse a timestamp in RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`,
/// `YYYY-MM-DD HH:MM` or plain `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn csv_to_parse_error(err: csv::Error) -> ProcessingError {
    if err.is_io_error() {
        return ProcessingError::Csv(err);
    }
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    ProcessingError::parse(line, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "city,timestamp,temperature,season\n\
        Berlin,2010-01-01,-2.5,winter\n\
        Berlin,2010-01-02,-1.0,winter\n\
        Cairo,2010-01-01,15.25,winter\n";

    #[test]
    fn test_read_sample() -> Result<()> {
        let readings = ReadingReader::new().read_from(SAMPLE.as_bytes())?;

        assert_eq!(readings.len(), 3);
        assert_eq!(readings[0].city, "Berlin");
        assert_eq!(readings[0].row_index, 0);
        assert_eq!(readings[0].temperature, -2.5);
        assert_eq!(readings[2].row_index, 2);
        assert_eq!(readings[2].season, Season::Winter);
        assert_eq!(
            readings[1].timestamp.format("%Y-%m-%d").to_string(),
            "2010-01-02"
        );

        Ok(())
    }

    #[test]
    fn test_columns_in_any_order_with_extras() -> Result<()> {
        let input = "season,station,temperature,City,timestamp\n\
            summer,7,30.0,Dubai,2020-07-01 12:00:00\n";
        let readings = ReadingReader::new().read_from(input.as_bytes())?;

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].city, "Dubai");
        assert_eq!(readings[0].season, Season::Summer);
        assert_eq!(readings[0].temperature, 30.0);

        Ok(())
    }

    #[test]
    fn test_missing_city_column_is_partition_error() {
        let input = "timestamp,temperature,season\n2010-01-01,1.0,winter\n";
        let result = ReadingReader::new().read_from(input.as_bytes());
        assert!(matches!(result, Err(ProcessingError::Partition(_))));
    }

    #[test]
    fn test_missing_other_column_is_parse_error() {
        let input = "city,timestamp,season\nOslo,2010-01-01,winter\n";
        let result = ReadingReader::new().read_from(input.as_bytes());
        assert!(matches!(result, Err(ProcessingError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_malformed_rows() {
        let cases = [
            "city,timestamp,temperature,season\nOslo,not-a-date,1.0,winter\n",
            "city,timestamp,temperature,season\nOslo,2010-01-01,warm,winter\n",
            "city,timestamp,temperature,season\nOslo,2010-01-01,NaN,winter\n",
            "city,timestamp,temperature,season\nOslo,2010-01-01,1.0,monsoon\n",
            "city,timestamp,temperature,season\n,2010-01-01,1.0,winter\n",
            "city,timestamp,temperature,season\nOslo,2010-01-01,1.0\n",
        ];

        for input in cases {
            let result = ReadingReader::new().read_from(input.as_bytes());
            assert!(
                matches!(result, Err(ProcessingError::Parse { line: 2, .. })),
                "expected parse error on line 2 for {:?}, got {:?}",
                input,
                result
            );
        }
    }

    #[test]
    fn test_empty_input() {
        let result = ReadingReader::new().read_from(&b""[..]);
        assert!(matches!(result, Err(ProcessingError::Parse { .. })));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap();

        assert_eq!(parse_timestamp("2021-03-04 05:06:07"), Some(expected));
        assert_eq!(parse_timestamp("2021-03-04T05:06:07"), Some(expected));
        assert_eq!(parse_timestamp("2021-03-04T05:06:07Z"), Some(expected));
        assert_eq!(
            parse_timestamp("2021-03-04"),
            NaiveDate::from_ymd_opt(2021, 3, 4).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("04/03/2021"), None);
    }

    #[test]
    fn test_mmap_matches_buffered() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        write!(temp_file, "{}", SAMPLE)?;

        let buffered = ReadingReader::new().read_readings(temp_file.path())?;
        let mapped = ReadingReader::with_mmap(true).read_readings(temp_file.path())?;

        assert_eq!(buffered, mapped);
        Ok(())
    }
}
