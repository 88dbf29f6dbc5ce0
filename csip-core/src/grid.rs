//! Gridded (time, latitude, longitude) field types.
//!
//! All grids consumed or produced within one pipeline run share identical
//! latitude/longitude axes, so they are positionally joinable without
//! re-gridding. Longitudes are normalized into [-180, 180] exactly once, at
//! construction; downstream stages never re-normalize.

use crate::errors::{CsipError, CsipResult};
use chrono::{DateTime, NaiveDate, Utc};
use ndarray::{Array1, Array3, ArrayView2, Axis};

/// Scalar type used for grid values.
pub type FloatValue = f64;

/// Offset between Kelvin and Celsius.
pub const KELVIN_OFFSET: FloatValue = 273.15;

/// Normalize a longitude from the 0..360 convention into [-180, 180].
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

fn check_axis(axis: &'static str, len: usize, expected: usize) -> CsipResult<()> {
    if len != expected {
        return Err(CsipError::AxisLength {
            axis,
            len,
            expected,
        });
    }
    Ok(())
}

/// A 3-D field indexed by (time, latitude, longitude).
///
/// The time axis is an ordered sequence of UTC instants; latitude and
/// longitude are ordered 1-D coordinate sequences in degrees.
#[derive(Debug, Clone)]
pub struct Grid {
    values: Array3<FloatValue>,
    times: Vec<DateTime<Utc>>,
    latitudes: Array1<f64>,
    longitudes: Array1<f64>,
}

impl Grid {
    /// Create a grid, validating axis lengths against the value shape.
    ///
    /// Longitudes are normalized into [-180, 180] here and nowhere else.
    pub fn new(
        values: Array3<FloatValue>,
        times: Vec<DateTime<Utc>>,
        latitudes: Array1<f64>,
        longitudes: Array1<f64>,
    ) -> CsipResult<Self> {
        let (nt, nlat, nlon) = values.dim();
        check_axis("time", times.len(), nt)?;
        check_axis("latitude", latitudes.len(), nlat)?;
        check_axis("longitude", longitudes.len(), nlon)?;
        Ok(Self {
            values,
            times,
            latitudes,
            longitudes: longitudes.mapv(normalize_longitude),
        })
    }

    pub fn values(&self) -> &Array3<FloatValue> {
        &self.values
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn latitudes(&self) -> &Array1<f64> {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &Array1<f64> {
        &self.longitudes
    }

    /// Shape as (time, latitude, longitude).
    pub fn dim(&self) -> (usize, usize, usize) {
        self.values.dim()
    }

    /// Apply a pure function to every cell, keeping the axes.
    pub fn map<F>(&self, f: F) -> Grid
    where
        F: Fn(FloatValue) -> FloatValue,
    {
        Grid {
            values: self.values.mapv(f),
            times: self.times.clone(),
            latitudes: self.latitudes.clone(),
            longitudes: self.longitudes.clone(),
        }
    }

    /// Convert a raw Kelvin field to Celsius.
    ///
    /// Performed once per raw grid before any derived-field call; the
    /// derived-field formulas expect Celsius inputs.
    pub fn kelvin_to_celsius(&self) -> Grid {
        self.map(|v| v - KELVIN_OFFSET)
    }

    /// Verify the positional-join invariant against another grid.
    pub fn check_same_shape(&self, other: &Grid, context: &str) -> CsipResult<()> {
        if self.latitudes != other.latitudes
            || self.longitudes != other.longitudes
            || self.times != other.times
        {
            return Err(CsipError::CoordinateMismatch {
                context: context.to_string(),
            });
        }
        Ok(())
    }
}

/// Per-day mean/min/max statistics of one derived field.
///
/// The three value arrays share a single daily time axis and the coordinate
/// axes of the hourly grid they were reduced from. This is the artifact
/// persisted per (year, month) and the input to the degree-day model.
#[derive(Debug, Clone)]
pub struct DailyStatistics {
    dates: Vec<NaiveDate>,
    latitudes: Array1<f64>,
    longitudes: Array1<f64>,
    mean: Array3<FloatValue>,
    min: Array3<FloatValue>,
    max: Array3<FloatValue>,
}

impl DailyStatistics {
    /// Create daily statistics, validating that all three arrays share one
    /// shape and that the axes match it.
    pub fn new(
        dates: Vec<NaiveDate>,
        latitudes: Array1<f64>,
        longitudes: Array1<f64>,
        mean: Array3<FloatValue>,
        min: Array3<FloatValue>,
        max: Array3<FloatValue>,
    ) -> CsipResult<Self> {
        let (nd, nlat, nlon) = mean.dim();
        if min.dim() != (nd, nlat, nlon) || max.dim() != (nd, nlat, nlon) {
            return Err(CsipError::CoordinateMismatch {
                context: "daily mean/min/max arrays differ in shape".to_string(),
            });
        }
        check_axis("time", dates.len(), nd)?;
        check_axis("latitude", latitudes.len(), nlat)?;
        check_axis("longitude", longitudes.len(), nlon)?;
        Ok(Self {
            dates,
            latitudes,
            longitudes: longitudes.mapv(normalize_longitude),
            mean,
            min,
            max,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn latitudes(&self) -> &Array1<f64> {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &Array1<f64> {
        &self.longitudes
    }

    pub fn mean(&self) -> &Array3<FloatValue> {
        &self.mean
    }

    pub fn min(&self) -> &Array3<FloatValue> {
        &self.min
    }

    pub fn max(&self) -> &Array3<FloatValue> {
        &self.max
    }

    pub fn n_days(&self) -> usize {
        self.dates.len()
    }

    /// One day's mean field.
    pub fn mean_on(&self, day: usize) -> ArrayView2<'_, FloatValue> {
        self.mean.index_axis(Axis(0), day)
    }

    /// Fail with a schema error when the time axis is empty.
    pub fn ensure_time_axis(&self, context: &str) -> CsipResult<()> {
        if self.dates.is_empty() {
            return Err(CsipError::MissingTimeAxis {
                context: context.to_string(),
            });
        }
        Ok(())
    }

    /// Verify the positional-join invariant against another set of axes.
    pub fn check_same_coords(&self, latitudes: &Array1<f64>, longitudes: &Array1<f64>, context: &str) -> CsipResult<()> {
        if self.latitudes != *latitudes || self.longitudes != *longitudes {
            return Err(CsipError::CoordinateMismatch {
                context: context.to_string(),
            });
        }
        Ok(())
    }
}
