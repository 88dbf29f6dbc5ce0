//! Core grid model and numerics for the climate stress index pipeline.
//!
//! This crate turns hourly gridded reanalysis fields into derived
//! climate-stress metrics and aggregates them from grid-cell resolution to
//! per-country and per-season summaries:
//!
//! - [`grid`]: the (time, latitude, longitude) grid model
//! - [`thermo`]: vapor pressure, humidity ratio and moist-air enthalpy
//! - [`resample`]: hourly to daily mean/min/max reduction
//! - [`degree_days`]: the four-branch piecewise degree-day model
//! - [`spatial`]: grid-cell to country-polygon aggregation
//! - [`climatology`]: multi-year seasonal (DJF/MAM/JJA/SON) means
//! - [`config`]: explicit pipeline configuration with documented defaults

pub mod climatology;
pub mod config;
pub mod degree_days;
pub mod errors;
pub mod grid;
pub mod resample;
pub mod spatial;
pub mod thermo;
