//! Multi-year seasonal climatology.
//!
//! Every day of daily statistics across all available years is assigned to
//! one of four fixed season labels by calendar month (DJF = Dec/Jan/Feb,
//! MAM, JJA, SON) and the accumulator keeps running per-season sums of the
//! daily mean field. Finalizing yields exactly one grid slice per season,
//! ordered DJF, MAM, JJA, SON, each the mean of all accumulated days
//! sharing that label. Accumulation order does not affect the result.

use crate::errors::{CsipError, CsipResult};
use crate::grid::{DailyStatistics, FloatValue};
use chrono::Datelike;
use ndarray::{Array1, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

/// The four meteorological seasons, in climatology output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Season {
    Djf,
    Mam,
    Jja,
    Son,
}

impl Season {
    /// Output order of the climatology slices.
    pub const ALL: [Season; 4] = [Season::Djf, Season::Mam, Season::Jja, Season::Son];

    /// Season containing the given calendar month.
    ///
    /// # Panics
    ///
    /// Panics if `month` is outside 1..=12.
    pub fn from_month(month: u32) -> Season {
        match month {
            12 | 1 | 2 => Season::Djf,
            3..=5 => Season::Mam,
            6..=8 => Season::Jja,
            9..=11 => Season::Son,
            _ => panic!("calendar month out of range: {month}"),
        }
    }

    /// Conventional three-letter label.
    pub fn label(&self) -> &'static str {
        match self {
            Season::Djf => "DJF",
            Season::Mam => "MAM",
            Season::Jja => "JJA",
            Season::Son => "SON",
        }
    }

    fn slot(&self) -> usize {
        match self {
            Season::Djf => 0,
            Season::Mam => 1,
            Season::Jja => 2,
            Season::Son => 3,
        }
    }
}

/// Multi-year mean state of a field, one slice per season.
#[derive(Debug, Clone)]
pub struct Climatology {
    latitudes: Array1<f64>,
    longitudes: Array1<f64>,
    /// (season, lat, lon) in [`Season::ALL`] order.
    values: Array3<FloatValue>,
    /// Number of accumulated days per season.
    days: [usize; 4],
}

impl Climatology {
    pub fn latitudes(&self) -> &Array1<f64> {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &Array1<f64> {
        &self.longitudes
    }

    /// All four season slices in DJF, MAM, JJA, SON order.
    pub fn values(&self) -> &Array3<FloatValue> {
        &self.values
    }

    /// One season's multi-year mean field.
    pub fn season(&self, season: Season) -> ndarray::ArrayView2<'_, FloatValue> {
        self.values.index_axis(Axis(0), season.slot())
    }

    /// Number of days that contributed to a season's mean.
    pub fn days(&self, season: Season) -> usize {
        self.days[season.slot()]
    }
}

/// Append-only accumulator folding monthly chunks into seasonal sums.
///
/// The first added chunk fixes the coordinate axes; later chunks must match
/// them (positional-join invariant), and chunks with an empty time axis
/// abort the enclosing aggregation as a data-integrity error.
#[derive(Debug, Default)]
pub struct ClimatologyAccumulator {
    axes: Option<(Array1<f64>, Array1<f64>)>,
    sums: Option<[Array2<FloatValue>; 4]>,
    days: [usize; 4],
}

impl ClimatologyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one month of daily statistics into the seasonal sums.
    pub fn add(&mut self, daily: &DailyStatistics) -> CsipResult<()> {
        daily.ensure_time_axis("climatology accumulation")?;

        match &self.axes {
            None => {
                self.axes = Some((daily.latitudes().clone(), daily.longitudes().clone()));
                let (_, nlat, nlon) = daily.mean().dim();
                self.sums = Some(std::array::from_fn(|_| Array2::zeros((nlat, nlon))));
            }
            Some((latitudes, longitudes)) => {
                daily.check_same_coords(latitudes, longitudes, "climatology accumulation")?;
            }
        }

        let sums = self.sums.as_mut().expect("sums initialized with axes");
        for (day, date) in daily.dates().iter().enumerate() {
            let slot = Season::from_month(date.month()).slot();
            sums[slot] += &daily.mean_on(day);
            self.days[slot] += 1;
        }
        Ok(())
    }

    /// Compute the per-season means.
    ///
    /// Fails if nothing was accumulated. Seasons with no contributing days
    /// (possible for short runs) come out as NaN slices.
    pub fn finalize(self) -> CsipResult<Climatology> {
        let (latitudes, longitudes) = self.axes.ok_or_else(|| CsipError::MissingTimeAxis {
            context: "climatology finalization: no daily data accumulated".to_string(),
        })?;
        let sums = self.sums.expect("sums initialized with axes");
        let (nlat, nlon) = sums[0].dim();

        let mut values = Array3::zeros((4, nlat, nlon));
        for (slot, sum) in sums.iter().enumerate() {
            let slice = if self.days[slot] == 0 {
                Array2::from_elem((nlat, nlon), FloatValue::NAN)
            } else {
                sum / self.days[slot] as FloatValue
            };
            values.index_axis_mut(Axis(0), slot).assign(&slice);
        }

        Ok(Climatology {
            latitudes,
            longitudes,
            values,
            days: self.days,
        })
    }
}
