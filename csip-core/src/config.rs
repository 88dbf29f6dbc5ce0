//! Explicit pipeline configuration.
//!
//! Every directory, year range and threshold that drives a batch run is a
//! named field with a documented default, loadable from a TOML file.

use crate::errors::{CsipError, CsipResult};
use crate::spatial::JoinPolicy;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Psychrometric constants shared by the enthalpy derivations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PsychroConfig {
    /// Total atmospheric pressure in hPa. Default: 1013.25 (standard).
    pub pressure_hpa: f64,
    /// Reference humidity ratio for the baseline enthalpy, kg/kg dry air.
    /// Default: 0.0116.
    pub reference_humidity_ratio: f64,
    /// Reference temperature for the baseline enthalpy, degrees C.
    /// Default: 25.6.
    pub reference_temperature: f64,
}

impl Default for PsychroConfig {
    fn default() -> Self {
        Self {
            pressure_hpa: 1013.25,
            reference_humidity_ratio: 0.0116,
            reference_temperature: 25.6,
        }
    }
}

/// Configuration for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the per-month daily-statistics artifacts.
    pub data_dir: PathBuf,
    /// Directory receiving the yearly tables and climatology artifacts.
    pub output_dir: PathBuf,
    /// First year of the batch, inclusive. Default: 2000.
    pub start_year: i32,
    /// Last year of the batch, inclusive. Default: 2024.
    pub end_year: i32,
    /// Threshold for cooling degree-days on raw temperature, degrees C.
    /// Default: 19.
    pub cdd_base: f64,
    /// Threshold for enthalpy degree-days, kJ/kg dry air. Default: 22.
    pub qdd_base: f64,
    /// How grid cells outside every country polygon are handled.
    pub join_policy: JoinPolicy,
    /// Psychrometric constants for the enthalpy derivations.
    pub psychro: PsychroConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("daily_data"),
            output_dir: PathBuf::from("output"),
            start_year: 2000,
            end_year: 2024,
            cdd_base: 19.0,
            qdd_base: 22.0,
            join_policy: JoinPolicy::DropUnmatched,
            psychro: PsychroConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// The configured years, oldest first.
    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    /// Load a configuration from a TOML file.
    ///
    /// Missing fields fall back to the documented defaults.
    pub fn from_toml_file(path: &Path) -> CsipResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: PipelineConfig =
            toml::from_str(&raw).map_err(|e| CsipError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot drive a run.
    pub fn validate(&self) -> CsipResult<()> {
        if self.end_year < self.start_year {
            return Err(CsipError::InvalidConfig(format!(
                "end_year {} precedes start_year {}",
                self.end_year, self.start_year
            )));
        }
        if !self.psychro.pressure_hpa.is_finite() || self.psychro.pressure_hpa <= 0.0 {
            return Err(CsipError::InvalidConfig(format!(
                "pressure_hpa must be positive, got {}",
                self.psychro.pressure_hpa
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = PipelineConfig::default();
        assert_eq!(config.cdd_base, 19.0);
        assert_eq!(config.qdd_base, 22.0);
        assert_eq!(config.psychro.pressure_hpa, 1013.25);
        assert_eq!(config.psychro.reference_humidity_ratio, 0.0116);
        assert_eq!(config.join_policy, JoinPolicy::DropUnmatched);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            start_year = 2010
            end_year = 2015
            cdd_base = 18.0
            "#,
        )
        .unwrap();
        assert_eq!(config.start_year, 2010);
        assert_eq!(config.cdd_base, 18.0);
        assert_eq!(config.qdd_base, 22.0);
        assert_eq!(config.years().count(), 6);
    }

    #[test]
    fn inverted_year_range_rejected() {
        let config = PipelineConfig {
            start_year: 2020,
            end_year: 2010,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CsipError::InvalidConfig(_))
        ));
    }
}
