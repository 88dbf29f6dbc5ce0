use thiserror::Error;

/// Error type for pipeline failures.
#[derive(Error, Debug)]
pub enum CsipError {
    /// An expected monthly input artifact is absent.
    ///
    /// Not fatal: the batch runner skips the month and the yearly output
    /// simply lacks that month's rows.
    #[error("missing input for {year}-{month:02}: {path}")]
    MissingInput {
        year: i32,
        month: u32,
        path: String,
    },
    /// A grid arrived without a usable time axis. Fatal to the enclosing
    /// aggregation since day buckets cannot be assigned.
    #[error("{context}: grid has an empty time axis")]
    MissingTimeAxis { context: String },
    /// Two grids that must be positionally joinable carry different
    /// latitude/longitude axes.
    #[error("coordinate axes do not match: {context}")]
    CoordinateMismatch { context: String },
    /// A coordinate or time axis length disagrees with the value array shape.
    #[error("{axis} axis has {len} entries but the value array expects {expected}")]
    AxisLength {
        axis: &'static str,
        len: usize,
        expected: usize,
    },
    /// The humidity-ratio formula diverges when the vapor pressure reaches
    /// the total pressure; reported per cell instead of propagating `inf`.
    #[error("non-physical humidity at ({lat}, {lon}): vapor pressure {vapor_pressure_hpa} hPa >= total pressure {pressure_hpa} hPa")]
    NonPhysicalHumidity {
        lat: f64,
        lon: f64,
        vapor_pressure_hpa: f64,
        pressure_hpa: f64,
    },
    /// Daily statistics violating `min <= mean <= max` at some cell.
    #[error("inverted daily statistics at ({lat}, {lon}): min={min}, mean={mean}, max={max}")]
    InvertedDailyStatistics {
        lat: f64,
        lon: f64,
        min: f64,
        mean: f64,
        max: f64,
    },
    #[error("failed to write table: {0}")]
    TableWrite(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CsipError {
    /// True for the skippable absent-input case, as opposed to schema or
    /// domain errors that must surface.
    pub fn is_missing_input(&self) -> bool {
        matches!(self, CsipError::MissingInput { .. })
    }
}

/// Convenience type for `Result<T, CsipError>`.
pub type CsipResult<T> = Result<T, CsipError>;
