use crate::models::Reading;
use crate::utils::constants::{MAX_PLAUSIBLE_TEMP, MIN_PLAUSIBLE_TEMP, SUSPICIOUS_JUMP};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub total_records: usize,
    pub violations: Vec<ReadingViolation>,
    pub city_statistics: BTreeMap<String, CityStatistics>,
}

impl IntegrityReport {
    pub fn count(&self, violation_type: ViolationType) -> usize {
        self.violations
            .iter()
            .filter(|v| v.violation_type == violation_type)
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ReadingViolation {
    pub city: String,
    pub row_index: usize,
    pub timestamp: NaiveDateTime,
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationType {
    OutOfOrder,
    DuplicateTimestamp,
    OutOfRange,
    SuspiciousJump,
}

#[derive(Debug, Clone, Default)]
pub struct CityStatistics {
    pub total_records: usize,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
}

/// Reports data problems that would distort the rolling baseline. Never rejects input.
pub struct IntegrityChecker {
    temperature_jump_threshold: f64,
}

impl IntegrityChecker {
    pub fn new() -> Self {
        Self {
            temperature_jump_threshold: SUSPICIOUS_JUMP,
        }
    }

    pub fn with_jump_threshold(threshold: f64) -> Self {
        Self {
            temperature_jump_threshold: threshold,
        }
    }

    pub fn check(&self, readings: &[Reading]) -> IntegrityReport {
        let mut report = IntegrityReport {
            total_records: readings.len(),
            ..Default::default()
        };

        // Input order per city, which is what the rolling window assumes
        let mut by_city: HashMap<&str, Vec<&Reading>> = HashMap::new();
        for reading in readings {
            by_city.entry(reading.city.as_str()).or_default().push(reading);
            self.check_range(reading, &mut report);

            let stats = report
                .city_statistics
                .entry(reading.city.clone())
                .or_default();
            stats.total_records += 1;
            let (temp, ts) = (reading.temperature, reading.timestamp);
            stats.min_temp = Some(stats.min_temp.map_or(temp, |t| t.min(temp)));
            stats.max_temp = Some(stats.max_temp.map_or(temp, |t| t.max(temp)));
            stats.first_timestamp = Some(stats.first_timestamp.map_or(ts, |t| t.min(ts)));
            stats.last_timestamp = Some(stats.last_timestamp.map_or(ts, |t| t.max(ts)));
        }

        for series in by_city.values() {
            self.check_series(series, &mut report);
        }

        report.violations.sort_by_key(|v| v.row_index);
        report
    }

    fn check_range(&self, reading: &Reading, report: &mut IntegrityReport) {
        if !reading.is_plausible_temperature() {
            report.violations.push(violation(
                reading,
                ViolationType::OutOfRange,
                format!(
                    "temperature {} is outside plausible range [{}, {}]",
                    reading.temperature, MIN_PLAUSIBLE_TEMP, MAX_PLAUSIBLE_TEMP
                ),
            ));
        }
    }

    fn check_series(&self, series: &[&Reading], report: &mut IntegrityReport) {
        for window in series.windows(2) {
            let (prev, curr) = (window[0], window[1]);

            if curr.timestamp < prev.timestamp {
                report.violations.push(violation(
                    curr,
                    ViolationType::OutOfOrder,
                    format!("{} comes after {}", curr.timestamp, prev.timestamp),
                ));
                continue;
            }

            if curr.timestamp == prev.timestamp {
                report.violations.push(violation(
                    curr,
                    ViolationType::DuplicateTimestamp,
                    format!("timestamp {} repeated", curr.timestamp),
                ));
                continue;
            }

            let jump = (curr.temperature - prev.temperature).abs();
            if jump > self.temperature_jump_threshold {
                report.violations.push(violation(
                    curr,
                    ViolationType::SuspiciousJump,
                    format!(
                        "temperature jumped {:.1}°C from {} to {}",
                        jump, prev.timestamp, curr.timestamp
                    ),
                ));
            }
        }
    }

    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();

        summary.push_str("=== Integrity Check Report ===\n");
        summary.push_str(&format!("Total Records: {}\n", report.total_records));
        summary.push_str(&format!("Cities: {}\n", report.city_statistics.len()));
        summary.push_str(&format!(
            "Out of order: {}, duplicate timestamps: {}, out of range: {}, suspicious jumps: {}\n",
            report.count(ViolationType::OutOfOrder),
            report.count(ViolationType::DuplicateTimestamp),
            report.count(ViolationType::OutOfRange),
            report.count(ViolationType::SuspiciousJump),
        ));

        if !report.violations.is_empty() {
            summary.push_str("\nTop 10 Violations:\n");
            for (i, v) in report.violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {} row {} ({}): {}\n",
                    i + 1,
                    v.city,
                    v.row_index,
                    v.timestamp,
                    v.details
                ));
            }
        }

        summary
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn violation(
    reading: &Reading,
    violation_type: ViolationType,
    details: String,
) -> ReadingViolation {
    ReadingViolation {
        city: reading.city.clone(),
        row_index: reading.row_index,
        timestamp: reading.timestamp,
        violation_type,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Season;
    use chrono::NaiveDate;

    fn reading(row: usize, city: &str, day: u32, temperature: f64) -> Reading {
        let timestamp = NaiveDate::from_ymd_opt(2022, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Reading::new(row, city.to_string(), timestamp, temperature, Season::Winter)
    }

    #[test]
    fn test_clean_series() {
        let readings = vec![
            reading(0, "Oslo", 1, -3.0),
            reading(1, "Oslo", 2, -4.0),
            reading(2, "Bern", 1, 1.0),
        ];

        let report = IntegrityChecker::new().check(&readings);
        assert!(report.is_clean());
        assert_eq!(report.city_statistics.len(), 2);

        let oslo = &report.city_statistics["Oslo"];
        assert_eq!(oslo.total_records, 2);
        assert_eq!(oslo.min_temp, Some(-4.0));
        assert_eq!(oslo.max_temp, Some(-3.0));
    }

    #[test]
    fn test_detects_each_violation_type() {
        let readings = vec![
            reading(0, "Oslo", 2, -3.0),
            reading(1, "Oslo", 1, -3.0),  // out of order
            reading(2, "Bern", 1, 1.0),
            reading(3, "Bern", 1, 1.5),   // duplicate
            reading(4, "Bern", 2, 40.0),  // jump
            reading(5, "Bern", 3, 75.0),  // out of range, jump
        ];

        let report = IntegrityChecker::new().check(&readings);
        assert_eq!(report.count(ViolationType::OutOfOrder), 1);
        assert_eq!(report.count(ViolationType::DuplicateTimestamp), 1);
        assert_eq!(report.count(ViolationType::OutOfRange), 1);
        assert_eq!(report.count(ViolationType::SuspiciousJump), 2);

        let rows: Vec<usize> = report.violations.iter().map(|v| v.row_index).collect();
        let mut sorted = rows.clone();
        sorted.sort();
        assert_eq!(rows, sorted);

        let summary = IntegrityChecker::new().generate_summary(&report);
        assert!(summary.contains("Total Records: 6"));
        assert!(summary.contains("Top 10 Violations"));
    }
}
