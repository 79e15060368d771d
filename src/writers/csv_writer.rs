use crate::error::Result;
use crate::models::EnrichedReading;
use std::io::Write;
use std::path::Path;

/// Writes the enriched dataset as CSV with a header row. An absent rolling
/// mean is written as an empty field.
pub struct CsvWriter;

impl CsvWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_records(&self, records: &[EnrichedReading], path: &Path) -> Result<()> {
        let writer = csv::Writer::from_path(path)?;
        self.write_all(records, writer)
    }

    pub fn write_to<W: Write>(&self, records: &[EnrichedReading], sink: W) -> Result<()> {
        self.write_all(records, csv::Writer::from_writer(sink))
    }

    fn write_all<W: Write>(
        &self,
        records: &[EnrichedReading],
        mut writer: csv::Writer<W>,
    ) -> Result<()> {
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}
