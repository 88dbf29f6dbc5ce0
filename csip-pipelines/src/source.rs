//! Interfaces to the excluded I/O collaborators.
//!
//! The pipeline core consumes in-memory arrays and produces in-memory
//! records; fetching raw gridded files and persisting tables are adapter
//! concerns behind the [`DailySource`] and [`TableSink`] traits. A CSV
//! sink is provided for the yearly country tables; in-memory
//! implementations back the tests.

use chrono::NaiveDate;
use csip_core::errors::{CsipError, CsipResult};
use csip_core::grid::DailyStatistics;
use csip_core::spatial::CountryMonthRecord;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Key of one batch unit: a (year, month) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    /// # Panics
    ///
    /// Panics if `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Self {
        assert!((1..=12).contains(&month), "month out of range: {month}");
        Self { year, month }
    }

    /// First day of the month, the date key of this month's records.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("validated at construction")
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Source of per-month daily-statistics artifacts.
///
/// Absent months must surface as [`CsipError::MissingInput`]; the batch
/// runner skips those, while every other error is reported against the
/// unit that failed.
pub trait DailySource {
    fn load(&self, key: MonthKey) -> CsipResult<DailyStatistics>;
}

/// Sink for the per-year country tables.
pub trait TableSink {
    /// Persist one year's concatenated records. Months absent from the
    /// input simply have no rows; that is not an error.
    fn write_year(&mut self, year: i32, rows: &[CountryMonthRecord]) -> CsipResult<()>;
}

/// In-memory source keyed by month, for tests and pre-loaded batches.
#[derive(Debug, Default)]
pub struct MemoryDailySource {
    months: HashMap<MonthKey, DailyStatistics>,
}

impl MemoryDailySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: MonthKey, daily: DailyStatistics) {
        self.months.insert(key, daily);
    }
}

impl DailySource for MemoryDailySource {
    fn load(&self, key: MonthKey) -> CsipResult<DailyStatistics> {
        self.months
            .get(&key)
            .cloned()
            .ok_or_else(|| CsipError::MissingInput {
                year: key.year,
                month: key.month,
                path: format!("<memory:{key}>"),
            })
    }
}

/// In-memory sink collecting the yearly tables, for tests.
#[derive(Debug, Default)]
pub struct MemoryTableSink {
    pub years: Vec<(i32, Vec<CountryMonthRecord>)>,
}

impl MemoryTableSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableSink for MemoryTableSink {
    fn write_year(&mut self, year: i32, rows: &[CountryMonthRecord]) -> CsipResult<()> {
        self.years.push((year, rows.to_vec()));
        Ok(())
    }
}

/// CSV sink writing one `monthly_<metric>_<year>.csv` per year.
pub struct CsvTableSink {
    dir: PathBuf,
    metric: String,
}

impl CsvTableSink {
    pub fn new(dir: PathBuf, metric: &str) -> Self {
        Self {
            dir,
            metric: metric.to_string(),
        }
    }

    fn path_for(&self, year: i32) -> PathBuf {
        self.dir.join(format!("monthly_{}_{}.csv", self.metric, year))
    }
}

impl TableSink for CsvTableSink {
    fn write_year(&mut self, year: i32, rows: &[CountryMonthRecord]) -> CsipResult<()> {
        let Some(first) = rows.first() else {
            return Ok(());
        };
        let path = self.path_for(year);
        let mut writer =
            csv::Writer::from_path(&path).map_err(|e| CsipError::TableWrite(e.to_string()))?;

        let mut header = vec!["Date".to_string(), "Country".to_string()];
        header.extend(first.values.iter().map(|(column, _)| column.clone()));
        writer
            .write_record(&header)
            .map_err(|e| CsipError::TableWrite(e.to_string()))?;

        for row in rows {
            let mut record = vec![
                row.date.format("%Y-%m-%d").to_string(),
                row.country.clone().unwrap_or_default(),
            ];
            record.extend(row.values.iter().map(|(_, value)| value.to_string()));
            writer
                .write_record(&record)
                .map_err(|e| CsipError::TableWrite(e.to_string()))?;
        }
        writer
            .flush()
            .map_err(|e| CsipError::TableWrite(e.to_string()))?;
        Ok(())
    }
}
