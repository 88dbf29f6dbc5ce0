//! Thermodynamic derived-field formulas.
//!
//! Pure elementwise transforms from temperature and dew-point fields to
//! vapor pressure, humidity ratio and moist-air enthalpy:
//!
//! $$ e(T_d) = 6.112 \cdot \exp\left(\frac{17.62 T_d}{243.12 + T_d}\right) $$
//! $$ W(T_d, P) = 0.622 \cdot \frac{e}{P - e} $$
//! $$ Q(T, W) = 1.006 T + W (2501 + 1.86 T) $$
//!
//! All formulas expect Celsius inputs; the Kelvin conversion is the
//! caller's responsibility, performed once per raw grid (see
//! [`Grid::kelvin_to_celsius`]). The humidity-ratio singularity at
//! `e >= P` is guarded and reported per cell as a domain error instead of
//! propagating `inf` downstream.

use crate::config::PsychroConfig;
use crate::errors::{CsipError, CsipResult};
use crate::grid::{FloatValue, Grid};
use ndarray::{Array3, Zip};

/// Ratio of the molecular weights of water vapor and dry air.
const MW_RATIO: FloatValue = 0.622;

/// Specific heat of dry air, kJ/(kg K).
const CP_AIR: FloatValue = 1.006;

/// Specific heat of water vapor, kJ/(kg K).
const CP_VAPOR: FloatValue = 1.86;

/// Latent heat of vaporization at 0 degrees C, kJ/kg.
const LATENT_HEAT: FloatValue = 2501.0;

/// Saturation/actual vapor pressure in hPa from a Celsius temperature.
pub fn vapor_pressure(t: FloatValue) -> FloatValue {
    6.112 * ((17.62 * t) / (243.12 + t)).exp()
}

/// Humidity ratio (kg water / kg dry air) from a Celsius dew point and a
/// total pressure in hPa.
///
/// Returns `None` when the vapor pressure reaches the total pressure,
/// where the formula diverges; grid-level wrappers attach the offending
/// cell's coordinates to the resulting domain error.
pub fn humidity_ratio(td: FloatValue, pressure_hpa: FloatValue) -> Option<FloatValue> {
    let e = vapor_pressure(td);
    if e >= pressure_hpa {
        return None;
    }
    Some(MW_RATIO * e / (pressure_hpa - e))
}

/// Moist-air enthalpy in kJ/kg dry air from a Celsius temperature and a
/// humidity ratio.
pub fn moist_enthalpy(t: FloatValue, w: FloatValue) -> FloatValue {
    CP_AIR * t + w * (LATENT_HEAT + CP_VAPOR * t)
}

/// Baseline enthalpy at the configured reference temperature and humidity
/// ratio, the fixed comparison point for enthalpy-excess metrics.
pub fn baseline_enthalpy(psychro: &PsychroConfig) -> FloatValue {
    moist_enthalpy(psychro.reference_temperature, psychro.reference_humidity_ratio)
}

/// Elementwise humidity ratio over a Celsius dew-point grid.
///
/// The first cell where the vapor pressure reaches the total pressure is
/// reported with its coordinates.
pub fn humidity_ratio_grid(td: &Grid, pressure_hpa: FloatValue) -> CsipResult<Grid> {
    let mut values = Array3::zeros(td.values().dim());
    for ((t_idx, lat_idx, lon_idx), &dew) in td.values().indexed_iter() {
        match humidity_ratio(dew, pressure_hpa) {
            Some(w) => values[[t_idx, lat_idx, lon_idx]] = w,
            None => {
                return Err(CsipError::NonPhysicalHumidity {
                    lat: td.latitudes()[lat_idx],
                    lon: td.longitudes()[lon_idx],
                    vapor_pressure_hpa: vapor_pressure(dew),
                    pressure_hpa,
                })
            }
        }
    }
    Grid::new(
        values,
        td.times().to_vec(),
        td.latitudes().clone(),
        td.longitudes().clone(),
    )
}

/// Elementwise moist-air enthalpy from a Celsius temperature grid and a
/// humidity-ratio grid sharing its axes.
pub fn enthalpy_grid(t: &Grid, w: &Grid) -> CsipResult<Grid> {
    t.check_same_shape(w, "enthalpy inputs")?;
    let mut values = Array3::zeros(t.values().dim());
    Zip::from(&mut values)
        .and(t.values())
        .and(w.values())
        .for_each(|q, &temp, &ratio| *q = moist_enthalpy(temp, ratio));
    Grid::new(
        values,
        t.times().to_vec(),
        t.latitudes().clone(),
        t.longitudes().clone(),
    )
}
