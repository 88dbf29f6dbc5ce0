//! Piecewise degree-day model.
//!
//! One day's accumulated exceedance of a metric above a fixed threshold,
//! estimated from that day's min/mean/max via four mutually exclusive,
//! threshold-ordered branches. The dispatch is an explicit tagged
//! classification so exhaustiveness is checked by the compiler rather than
//! by sequential masked writes.
//!
//! The same model serves cooling degree-days on raw temperature (base 19)
//! and enthalpy degree-days (base 22); the threshold is a parameter.

use crate::errors::{CsipError, CsipResult};
use crate::grid::{DailyStatistics, FloatValue};
use ndarray::{Array2, Axis};

/// The four mutually exclusive branches of the piecewise integral.
///
/// Assumes `min <= mean <= max`; [`monthly_degree_days`] verifies that
/// invariant before dispatching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegreeDayBranch {
    /// `max <= base`: the metric never crosses the threshold.
    AllBelow,
    /// `mean <= base < max`: only the daily peak exceeds the threshold.
    MaxOnlyAbove,
    /// `min < base < mean`: the threshold sits below the daily mean.
    Straddling,
    /// `min >= base`: the whole day sits above the threshold.
    AllAbove,
}

/// Classify one day's statistics against the threshold.
pub fn classify(
    min: FloatValue,
    mean: FloatValue,
    max: FloatValue,
    base: FloatValue,
) -> DegreeDayBranch {
    if max <= base {
        DegreeDayBranch::AllBelow
    } else if mean <= base {
        DegreeDayBranch::MaxOnlyAbove
    } else if min < base {
        DegreeDayBranch::Straddling
    } else {
        DegreeDayBranch::AllAbove
    }
}

/// One day's degree-day value for a single cell.
pub fn degree_days(
    min: FloatValue,
    mean: FloatValue,
    max: FloatValue,
    base: FloatValue,
) -> FloatValue {
    match classify(min, mean, max, base) {
        DegreeDayBranch::AllBelow => 0.0,
        DegreeDayBranch::MaxOnlyAbove => (max - base) / 4.0,
        DegreeDayBranch::Straddling => (max - base) / 2.0 - (base - min) / 4.0,
        DegreeDayBranch::AllAbove => mean - base,
    }
}

/// Per-cell monthly reduction of the degree-day model.
#[derive(Debug, Clone)]
pub struct MonthlyDegreeDays {
    /// Sum of the daily degree-day values over the month, per cell.
    pub degree_day_sum: Array2<FloatValue>,
    /// Monthly mean of the daily mean metric, per cell.
    pub mean_of_mean: Array2<FloatValue>,
    /// Monthly mean of the daily minima, per cell.
    pub mean_of_min: Array2<FloatValue>,
    /// Monthly mean of the daily maxima, per cell.
    pub mean_of_max: Array2<FloatValue>,
}

/// Apply the degree-day model to one month of daily statistics.
///
/// Produces the per-cell monthly degree-day sum plus the monthly means of
/// the daily mean/min/max fields kept for reporting. Cells violating
/// `min <= mean <= max` abort with a domain error carrying the offending
/// coordinates; the invariant is not enforced upstream.
pub fn monthly_degree_days(
    daily: &DailyStatistics,
    base: FloatValue,
) -> CsipResult<MonthlyDegreeDays> {
    daily.ensure_time_axis("degree-day integration")?;

    let n_days = daily.n_days();
    let (_, nlat, nlon) = daily.mean().dim();
    let mut dd_sum: Array2<FloatValue> = Array2::zeros((nlat, nlon));
    let mut sum_mean: Array2<FloatValue> = Array2::zeros((nlat, nlon));
    let mut sum_min: Array2<FloatValue> = Array2::zeros((nlat, nlon));
    let mut sum_max: Array2<FloatValue> = Array2::zeros((nlat, nlon));

    for day in 0..n_days {
        let day_mean = daily.mean().index_axis(Axis(0), day);
        let day_min = daily.min().index_axis(Axis(0), day);
        let day_max = daily.max().index_axis(Axis(0), day);
        for ((i, j), &vmin) in day_min.indexed_iter() {
            let vmean = day_mean[[i, j]];
            let vmax = day_max[[i, j]];
            if !(vmin <= vmean && vmean <= vmax) {
                return Err(CsipError::InvertedDailyStatistics {
                    lat: daily.latitudes()[i],
                    lon: daily.longitudes()[j],
                    min: vmin,
                    mean: vmean,
                    max: vmax,
                });
            }
            dd_sum[[i, j]] += degree_days(vmin, vmean, vmax, base);
            sum_mean[[i, j]] += vmean;
            sum_min[[i, j]] += vmin;
            sum_max[[i, j]] += vmax;
        }
    }

    let n = n_days as FloatValue;
    Ok(MonthlyDegreeDays {
        degree_day_sum: dd_sum,
        mean_of_mean: sum_mean / n,
        mean_of_min: sum_min / n,
        mean_of_max: sum_max / n,
    })
}
