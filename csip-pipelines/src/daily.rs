//! Daily derivation stage: hourly Kelvin grids in, daily statistics out.
//!
//! Two derivations share the structure convert-derive-resample: raw
//! temperature for the cooling degree-day chain, and moist-air enthalpy
//! (from temperature plus dew point) for the enthalpy chain. Both run once
//! per (year, month) of hourly data; the resulting [`DailyStatistics`] is
//! the artifact the monthly pipelines consume.

use csip_core::config::PsychroConfig;
use csip_core::errors::CsipResult;
use csip_core::grid::{DailyStatistics, Grid};
use csip_core::resample::daily_statistics;
use csip_core::thermo::{enthalpy_grid, humidity_ratio_grid};

/// Daily temperature statistics from an hourly Kelvin temperature grid.
pub fn daily_temperature(t_kelvin: &Grid) -> CsipResult<DailyStatistics> {
    daily_statistics(&t_kelvin.kelvin_to_celsius())
}

/// Daily moist-air enthalpy statistics from hourly Kelvin temperature and
/// dew-point grids sharing one set of axes.
pub fn daily_enthalpy(
    t_kelvin: &Grid,
    td_kelvin: &Grid,
    psychro: &PsychroConfig,
) -> CsipResult<DailyStatistics> {
    t_kelvin.check_same_shape(td_kelvin, "enthalpy derivation inputs")?;
    let t = t_kelvin.kelvin_to_celsius();
    let td = td_kelvin.kelvin_to_celsius();
    let w = humidity_ratio_grid(&td, psychro.pressure_hpa)?;
    let q = enthalpy_grid(&t, &w)?;
    daily_statistics(&q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use csip_core::errors::CsipError;
    use csip_core::grid::KELVIN_OFFSET;
    use csip_core::thermo::{humidity_ratio, moist_enthalpy};
    use is_close::is_close;
    use ndarray::{array, Array3};

    fn hours(day: u32, n: usize) -> Vec<DateTime<Utc>> {
        (0..n as u32)
            .map(|h| Utc.with_ymd_and_hms(2020, 7, day, h, 0, 0).unwrap())
            .collect()
    }

    fn single_cell(times: Vec<DateTime<Utc>>, celsius: Vec<f64>) -> Grid {
        let kelvin: Vec<f64> = celsius.iter().map(|c| c + KELVIN_OFFSET).collect();
        let n = kelvin.len();
        Grid::new(
            Array3::from_shape_vec((n, 1, 1), kelvin).unwrap(),
            times,
            array![48.0],
            array![2.0],
        )
        .unwrap()
    }

    #[test]
    fn daily_temperature_converts_then_reduces() {
        let grid = single_cell(hours(1, 3), vec![10.0, 20.0, 30.0]);
        let daily = daily_temperature(&grid).unwrap();
        assert_eq!(daily.n_days(), 1);
        assert!(is_close!(daily.mean()[[0, 0, 0]], 20.0));
        assert!(is_close!(daily.min()[[0, 0, 0]], 10.0));
        assert!(is_close!(daily.max()[[0, 0, 0]], 30.0));
    }

    #[test]
    fn daily_enthalpy_matches_scalar_formulas() {
        let t = single_cell(hours(1, 1), vec![30.0]);
        let td = single_cell(hours(1, 1), vec![15.0]);
        let psychro = PsychroConfig::default();

        let daily = daily_enthalpy(&t, &td, &psychro).unwrap();
        let w = humidity_ratio(15.0, psychro.pressure_hpa).unwrap();
        let expected = moist_enthalpy(30.0, w);
        assert!(is_close!(daily.mean()[[0, 0, 0]], expected));
        assert!(is_close!(daily.min()[[0, 0, 0]], expected));
    }

    #[test]
    fn daily_enthalpy_min_tracks_coolest_driest_hour() {
        // Enthalpy increases with both temperature and dew point, so the
        // hour that is coolest and driest sets the daily minimum.
        let t = single_cell(hours(1, 2), vec![20.0, 32.0]);
        let td = single_cell(hours(1, 2), vec![10.0, 24.0]);
        let psychro = PsychroConfig::default();

        let daily = daily_enthalpy(&t, &td, &psychro).unwrap();
        let w_low = humidity_ratio(10.0, psychro.pressure_hpa).unwrap();
        let w_high = humidity_ratio(24.0, psychro.pressure_hpa).unwrap();
        assert!(is_close!(
            daily.min()[[0, 0, 0]],
            moist_enthalpy(20.0, w_low)
        ));
        assert!(is_close!(
            daily.max()[[0, 0, 0]],
            moist_enthalpy(32.0, w_high)
        ));
    }

    #[test]
    fn mismatched_input_axes_rejected() {
        let t = single_cell(hours(1, 1), vec![30.0]);
        let td = Grid::new(
            Array3::from_elem((1, 1, 1), 15.0 + KELVIN_OFFSET),
            hours(2, 1),
            array![48.0],
            array![2.0],
        )
        .unwrap();
        assert!(matches!(
            daily_enthalpy(&t, &td, &PsychroConfig::default()),
            Err(CsipError::CoordinateMismatch { .. })
        ));
    }
}
