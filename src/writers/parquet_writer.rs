use crate::error::{ProcessingError, Result};
use crate::models::EnrichedReading;
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, StringArray, TimestampMillisecondArray, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Write the enriched dataset, one record batch per row group
    pub fn write_records(&self, records: &[EnrichedReading], path: &Path) -> Result<()> {
        let schema = Self::create_schema();
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        for chunk in records.chunks(self.row_group_size) {
            let batch = Self::records_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }
        writer.close()?;

        Ok(())
    }

    fn create_schema() -> Arc<Schema> {
        let fields = vec![
            Field::new("row_index", DataType::UInt64, false),
            Field::new("city", DataType::Utf8, false),
            Field::new(
                "timestamp",
                DataType::Timestamp(TimeUnit::Millisecond, None),
                false,
            ),
            Field::new("temperature", DataType::Float64, false),
            Field::new("season", DataType::Utf8, false),
            Field::new("roll_mean", DataType::Float64, true),
            Field::new("mean_season", DataType::Float64, false),
            Field::new("std_season", DataType::Float64, false),
            Field::new("is_anomaly", DataType::Boolean, false),
        ];

        Arc::new(Schema::new(fields))
    }

    fn records_to_batch(records: &[EnrichedReading], schema: Arc<Schema>) -> Result<RecordBatch> {
        let row_index: ArrayRef = Arc::new(UInt64Array::from(
            records.iter().map(|r| r.row_index as u64).collect::<Vec<_>>(),
        ));
        let city: ArrayRef = Arc::new(StringArray::from(
            records.iter().map(|r| r.city.as_str()).collect::<Vec<_>>(),
        ));
        let timestamp: ArrayRef = Arc::new(TimestampMillisecondArray::from(
            records
                .iter()
                .map(|r| r.timestamp.and_utc().timestamp_millis())
                .collect::<Vec<_>>(),
        ));
        let temperature: ArrayRef = Arc::new(Float64Array::from(
            records.iter().map(|r| r.temperature).collect::<Vec<_>>(),
        ));
        let season: ArrayRef = Arc::new(StringArray::from(
            records.iter().map(|r| r.season.as_str()).collect::<Vec<_>>(),
        ));
        let roll_mean: ArrayRef = Arc::new(Float64Array::from(
            records.iter().map(|r| r.roll_mean).collect::<Vec<_>>(),
        ));
        let mean_season: ArrayRef = Arc::new(Float64Array::from(
            records.iter().map(|r| r.mean_season).collect::<Vec<_>>(),
        ));
        let std_season: ArrayRef = Arc::new(Float64Array::from(
            records.iter().map(|r| r.std_season).collect::<Vec<_>>(),
        ));
        let is_anomaly: ArrayRef = Arc::new(BooleanArray::from(
            records.iter().map(|r| r.is_anomaly).collect::<Vec<_>>(),
        ));

        let batch = RecordBatch::try_new(
            schema,
            vec![
                row_index,
                city,
                timestamp,
                temperature,
                season,
                roll_mean,
                mean_season,
                std_season,
                is_anomaly,
            ],
        )?;

        Ok(batch)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size: std::fs::metadata(path)?.len(),
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            avg_rows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Season;
    use chrono::NaiveDate;
    use tempfile::NamedTempFile;

    fn records(n: usize) -> Vec<EnrichedReading> {
        (0..n)
            .map(|i| EnrichedReading {
                row_index: i,
                city: "Helsinki".to_string(),
                timestamp: NaiveDate::from_ymd_opt(2023, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::Duration::days(i as i64),
                temperature: -10.0 + i as f64 * 0.1,
                season: Season::Winter,
                roll_mean: if i % 2 == 0 { Some(-9.5) } else { None },
                mean_season: -9.0,
                std_season: f64::NAN,
                is_anomaly: i == 3,
            })
            .collect()
    }

    #[test]
    fn test_write_and_inspect() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        let writer = ParquetWriter::new().with_row_group_size(4);

        writer.write_records(&records(10), temp_file.path())?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 10);
        assert_eq!(info.row_groups, 3);
        assert_eq!(info.row_group_sizes, vec![4, 4, 2]);
        assert!(info.summary().contains("Total rows: 10"));

        Ok(())
    }

    #[test]
    fn test_write_empty_records() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        let writer = ParquetWriter::new();

        writer.write_records(&[], temp_file.path())?;
        assert_eq!(writer.get_file_info(temp_file.path())?.total_rows, 0);

        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        for compression in ["snappy", "gzip", "lz4", "zstd", "none"] {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new()?;

            let result = writer.write_records(&records(3), temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli-ish").is_err());
        Ok(())
    }
}
