//! Temporal resampling from hourly to daily statistics.
//!
//! Samples are bucketed by their UTC calendar date; each bucket reduces to
//! per-cell mean, min and max. Bucket membership depends only on date
//! truncation, never on record order, and partial first/final days reduce
//! over whatever samples exist.

use crate::errors::{CsipError, CsipResult};
use crate::grid::{DailyStatistics, FloatValue, Grid};
use chrono::NaiveDate;
use ndarray::{Array2, Array3, Axis};
use std::collections::BTreeMap;

/// Reduce an hourly grid to per-day mean/min/max statistics.
pub fn daily_statistics(grid: &Grid) -> CsipResult<DailyStatistics> {
    if grid.times().is_empty() {
        return Err(CsipError::MissingTimeAxis {
            context: "daily resampling".to_string(),
        });
    }

    // BTreeMap keeps the day buckets in calendar order regardless of the
    // order the samples arrived in.
    let mut buckets: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for (idx, instant) in grid.times().iter().enumerate() {
        buckets.entry(instant.date_naive()).or_default().push(idx);
    }

    let (_, nlat, nlon) = grid.dim();
    let n_days = buckets.len();
    let mut dates = Vec::with_capacity(n_days);
    let mut mean = Array3::zeros((n_days, nlat, nlon));
    let mut min = Array3::zeros((n_days, nlat, nlon));
    let mut max = Array3::zeros((n_days, nlat, nlon));

    for (day, (date, samples)) in buckets.iter().enumerate() {
        let mut sum: Array2<FloatValue> = Array2::zeros((nlat, nlon));
        let mut lo = Array2::from_elem((nlat, nlon), FloatValue::INFINITY);
        let mut hi = Array2::from_elem((nlat, nlon), FloatValue::NEG_INFINITY);
        for &idx in samples {
            let slice = grid.values().index_axis(Axis(0), idx);
            sum += &slice;
            lo.zip_mut_with(&slice, |m, &v| {
                if v < *m {
                    *m = v;
                }
            });
            hi.zip_mut_with(&slice, |m, &v| {
                if v > *m {
                    *m = v;
                }
            });
        }
        sum /= samples.len() as FloatValue;
        mean.index_axis_mut(Axis(0), day).assign(&sum);
        min.index_axis_mut(Axis(0), day).assign(&lo);
        max.index_axis_mut(Axis(0), day).assign(&hi);
        dates.push(*date);
    }

    DailyStatistics::new(
        dates,
        grid.latitudes().clone(),
        grid.longitudes().clone(),
        mean,
        min,
        max,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use is_close::is_close;
    use ndarray::array;

    fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 7, d, h, 0, 0).unwrap()
    }

    fn single_cell(times: Vec<DateTime<Utc>>, values: Vec<f64>) -> Grid {
        let n = values.len();
        Grid::new(
            Array3::from_shape_vec((n, 1, 1), values).unwrap(),
            times,
            array![48.0],
            array![2.0],
        )
        .unwrap()
    }

    #[test]
    fn single_sample_day_equals_that_sample() {
        let grid = single_cell(vec![utc(1, 13)], vec![21.5]);
        let daily = daily_statistics(&grid).unwrap();
        assert_eq!(daily.n_days(), 1);
        assert_eq!(daily.mean()[[0, 0, 0]], 21.5);
        assert_eq!(daily.min()[[0, 0, 0]], 21.5);
        assert_eq!(daily.max()[[0, 0, 0]], 21.5);
    }

    #[test]
    fn two_days_bucketed_by_utc_date() {
        let grid = single_cell(
            vec![utc(1, 0), utc(1, 12), utc(2, 0), utc(2, 12)],
            vec![10.0, 20.0, 30.0, 40.0],
        );
        let daily = daily_statistics(&grid).unwrap();
        assert_eq!(daily.n_days(), 2);
        assert_eq!(
            daily.dates(),
            &[
                NaiveDate::from_ymd_opt(2020, 7, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 7, 2).unwrap()
            ]
        );
        assert!(is_close!(daily.mean()[[0, 0, 0]], 15.0));
        assert_eq!(daily.min()[[0, 0, 0]], 10.0);
        assert_eq!(daily.max()[[0, 0, 0]], 20.0);
        assert!(is_close!(daily.mean()[[1, 0, 0]], 35.0));
    }

    #[test]
    fn resampling_invariant_to_record_order() {
        let ordered = single_cell(
            vec![utc(1, 0), utc(1, 6), utc(1, 12), utc(2, 3)],
            vec![1.0, 2.0, 3.0, 9.0],
        );
        let shuffled = single_cell(
            vec![utc(2, 3), utc(1, 12), utc(1, 0), utc(1, 6)],
            vec![9.0, 3.0, 1.0, 2.0],
        );
        let a = daily_statistics(&ordered).unwrap();
        let b = daily_statistics(&shuffled).unwrap();
        assert_eq!(a.dates(), b.dates());
        assert_eq!(a.mean(), b.mean());
        assert_eq!(a.min(), b.min());
        assert_eq!(a.max(), b.max());
    }

    #[test]
    fn partial_final_day_reduces_available_samples() {
        // Two full-ish days then a single trailing sample.
        let grid = single_cell(
            vec![utc(1, 0), utc(1, 23), utc(2, 0)],
            vec![5.0, 7.0, 100.0],
        );
        let daily = daily_statistics(&grid).unwrap();
        assert_eq!(daily.n_days(), 2);
        assert!(is_close!(daily.mean()[[0, 0, 0]], 6.0));
        assert_eq!(daily.mean()[[1, 0, 0]], 100.0);
    }

    #[test]
    fn empty_time_axis_rejected() {
        let grid = single_cell(Vec::new(), Vec::new());
        assert!(matches!(
            daily_statistics(&grid),
            Err(CsipError::MissingTimeAxis { .. })
        ));
    }
}
