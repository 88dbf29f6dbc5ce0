//! Monthly aggregation pipelines.
//!
//! A [`MonthlyPipeline`] turns one month of daily statistics into
//! per-country records; the batch runner concatenates those into yearly
//! tables. [`DegreeDayPipeline`] covers the two degree-day products
//! (cooling degree-days on temperature, enthalpy degree-days on moist-air
//! enthalpy); [`MeanFieldPipeline`] covers plain monthly field means such
//! as the country-level enthalpy report.

use crate::source::MonthKey;
use csip_core::config::PipelineConfig;
use csip_core::degree_days::monthly_degree_days;
use csip_core::errors::{CsipError, CsipResult};
use csip_core::grid::{DailyStatistics, FloatValue};
use csip_core::spatial::{
    aggregate_by_country, CellField, CountryIndex, CountryMonthRecord, JoinPolicy, Reduction,
};
use csip_core::thermo::baseline_enthalpy;
use ndarray::Axis;

/// One metric's monthly reduction from daily statistics to country records.
pub trait MonthlyPipeline {
    /// Short metric tag used in output file names, e.g. `cdd`.
    fn metric(&self) -> &str;

    /// Reduce one month and aggregate it over the country polygons.
    fn process_month(
        &self,
        index: &CountryIndex,
        daily: &DailyStatistics,
        key: MonthKey,
    ) -> CsipResult<Vec<CountryMonthRecord>>;
}

/// Degree-day pipeline: per-cell piecewise degree-days summed over the
/// month, then averaged and summed per country, alongside monthly means of
/// the underlying daily fields.
pub struct DegreeDayPipeline {
    metric: String,
    base: FloatValue,
    /// (column, which daily field) pairs reported as country means.
    extra_means: Vec<(String, DailyField)>,
    policy: JoinPolicy,
}

/// Which of the three daily fields an extra column reports.
#[derive(Debug, Clone, Copy)]
enum DailyField {
    Mean,
    Min,
    Max,
}

impl DegreeDayPipeline {
    /// Cooling degree-days on daily Celsius temperature statistics.
    pub fn cooling(config: &PipelineConfig) -> Self {
        Self {
            metric: "cdd".to_string(),
            base: config.cdd_base,
            extra_means: vec![
                ("avg_temp".to_string(), DailyField::Mean),
                ("avg_min_temp".to_string(), DailyField::Min),
                ("avg_max_temp".to_string(), DailyField::Max),
            ],
            policy: config.join_policy,
        }
    }

    /// Enthalpy degree-days on daily moist-air enthalpy statistics.
    pub fn enthalpy(config: &PipelineConfig) -> Self {
        Self {
            metric: "qdd".to_string(),
            base: config.qdd_base,
            extra_means: vec![("avg_q".to_string(), DailyField::Mean)],
            policy: config.join_policy,
        }
    }
}

impl MonthlyPipeline for DegreeDayPipeline {
    fn metric(&self) -> &str {
        &self.metric
    }

    fn process_month(
        &self,
        index: &CountryIndex,
        daily: &DailyStatistics,
        key: MonthKey,
    ) -> CsipResult<Vec<CountryMonthRecord>> {
        let monthly = monthly_degree_days(daily, self.base)?;

        let avg_column = format!("{}_avg", self.metric);
        let sum_column = format!("{}_sum", self.metric);
        let mut fields = vec![
            CellField {
                column: &avg_column,
                values: monthly.degree_day_sum.view(),
                reduction: Reduction::Mean,
            },
            CellField {
                column: &sum_column,
                values: monthly.degree_day_sum.view(),
                reduction: Reduction::Sum,
            },
        ];
        for (column, field) in &self.extra_means {
            let values = match field {
                DailyField::Mean => monthly.mean_of_mean.view(),
                DailyField::Min => monthly.mean_of_min.view(),
                DailyField::Max => monthly.mean_of_max.view(),
            };
            fields.push(CellField {
                column,
                values,
                reduction: Reduction::Mean,
            });
        }

        Ok(aggregate_by_country(
            index,
            daily.latitudes(),
            daily.longitudes(),
            &fields,
            key.first_day(),
            self.policy,
        ))
    }
}

/// Plain monthly field means per country, optionally with an excess column
/// against a fixed reference value.
pub struct MeanFieldPipeline {
    metric: String,
    column: String,
    excess: Option<(String, FloatValue)>,
    policy: JoinPolicy,
}

impl MeanFieldPipeline {
    /// Country-level monthly mean enthalpy, with its excess over the
    /// baseline enthalpy at the configured reference state.
    pub fn enthalpy(config: &PipelineConfig) -> Self {
        Self {
            metric: "q".to_string(),
            column: "avg_q".to_string(),
            excess: Some((
                "avg_q_excess".to_string(),
                baseline_enthalpy(&config.psychro),
            )),
            policy: config.join_policy,
        }
    }

    /// Country-level monthly mean temperature.
    pub fn temperature(config: &PipelineConfig) -> Self {
        Self {
            metric: "temp".to_string(),
            column: "avg_temp".to_string(),
            excess: None,
            policy: config.join_policy,
        }
    }
}

impl MonthlyPipeline for MeanFieldPipeline {
    fn metric(&self) -> &str {
        &self.metric
    }

    fn process_month(
        &self,
        index: &CountryIndex,
        daily: &DailyStatistics,
        key: MonthKey,
    ) -> CsipResult<Vec<CountryMonthRecord>> {
        daily.ensure_time_axis("monthly field mean")?;
        let monthly_mean =
            daily
                .mean()
                .mean_axis(Axis(0))
                .ok_or_else(|| CsipError::MissingTimeAxis {
                    context: "monthly field mean".to_string(),
                })?;

        let mut fields = vec![CellField {
            column: &self.column,
            values: monthly_mean.view(),
            reduction: Reduction::Mean,
        }];
        let excess_values = self
            .excess
            .as_ref()
            .map(|(_, reference)| &monthly_mean - *reference);
        if let (Some((column, _)), Some(values)) = (&self.excess, &excess_values) {
            fields.push(CellField {
                column,
                values: values.view(),
                reduction: Reduction::Mean,
            });
        }

        Ok(aggregate_by_country(
            index,
            daily.latitudes(),
            daily.longitudes(),
            &fields,
            key.first_day(),
            self.policy,
        ))
    }
}
