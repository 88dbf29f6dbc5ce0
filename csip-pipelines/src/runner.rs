//! Batch driver over a year range.
//!
//! One run walks the configured years month by month, loads each month's
//! daily-statistics artifact, applies a monthly pipeline and writes one
//! table per year. Months whose artifact is absent are skipped with a log
//! line; a month that fails for any other reason is reported against that
//! month and the rest of the batch continues. The seasonal climatology is
//! a second walk over the same artifacts, folded through the accumulator
//! so at most one month of daily data is resident at a time.

use crate::monthly::MonthlyPipeline;
use crate::source::{DailySource, MonthKey, TableSink};
use csip_core::climatology::{Climatology, ClimatologyAccumulator};
use csip_core::config::PipelineConfig;
use csip_core::errors::CsipResult;
use csip_core::spatial::CountryIndex;
use log::{debug, error, info, warn};
use std::time::Instant;

/// Outcome counts of one batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Months reduced and written.
    pub processed_months: usize,
    /// Months skipped because their artifact was absent.
    pub missing_months: usize,
    /// Months that failed; their errors were logged and the batch went on.
    pub failed_months: usize,
    /// Years for which a table was written.
    pub written_years: usize,
}

/// Drives monthly pipelines and the climatology over a configured batch.
pub struct BatchRunner {
    config: PipelineConfig,
    countries: CountryIndex,
}

impl BatchRunner {
    pub fn new(config: PipelineConfig, countries: CountryIndex) -> Self {
        Self { config, countries }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one monthly pipeline over every configured year, writing one
    /// table per year that produced any rows.
    pub fn run_years(
        &self,
        pipeline: &dyn MonthlyPipeline,
        source: &dyn DailySource,
        sink: &mut dyn TableSink,
    ) -> CsipResult<BatchSummary> {
        let mut summary = BatchSummary::default();
        for year in self.config.years() {
            let started = Instant::now();
            let mut rows = Vec::new();
            for month in 1..=12 {
                let key = MonthKey::new(year, month);
                let daily = match source.load(key) {
                    Ok(daily) => daily,
                    Err(err) if err.is_missing_input() => {
                        debug!("{}: no {} input, skipping", key, pipeline.metric());
                        summary.missing_months += 1;
                        continue;
                    }
                    Err(err) => {
                        error!("{}: loading {} input failed: {err}", key, pipeline.metric());
                        summary.failed_months += 1;
                        continue;
                    }
                };
                match pipeline.process_month(&self.countries, &daily, key) {
                    Ok(records) => {
                        rows.extend(records);
                        summary.processed_months += 1;
                    }
                    Err(err) => {
                        error!("{}: {} pipeline failed: {err}", key, pipeline.metric());
                        summary.failed_months += 1;
                    }
                }
            }
            if rows.is_empty() {
                warn!("{year}: no {} rows, table not written", pipeline.metric());
                continue;
            }
            sink.write_year(year, &rows)?;
            summary.written_years += 1;
            info!(
                "{year}: {} table written ({} rows) in {:.2?}",
                pipeline.metric(),
                rows.len(),
                started.elapsed()
            );
        }
        Ok(summary)
    }

    /// Fold every available month of the batch into the four-season
    /// climatology of the daily mean field.
    ///
    /// Absent months are skipped like in [`Self::run_years`]; any other
    /// error is fatal, since a partial climatology would silently bias the
    /// seasonal means.
    pub fn run_climatology(&self, source: &dyn DailySource) -> CsipResult<Climatology> {
        let mut accumulator = ClimatologyAccumulator::new();
        for year in self.config.years() {
            for month in 1..=12 {
                let key = MonthKey::new(year, month);
                let daily = match source.load(key) {
                    Ok(daily) => daily,
                    Err(err) if err.is_missing_input() => {
                        debug!("{key}: no input, skipping in climatology");
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                accumulator.add(&daily)?;
            }
        }
        accumulator.finalize()
    }
}
