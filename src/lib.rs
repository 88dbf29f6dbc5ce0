//! Climate stress index pipeline.
//!
//! Turns hourly gridded reanalysis temperature and dew-point fields into
//! country-level monthly climate-stress tables (cooling and enthalpy
//! degree-days) and multi-year seasonal climatologies. The grid model and
//! numerics live in [`csip_core`]; the concrete metric pipelines and the
//! batch runner live in [`csip_pipelines`].

pub use csip_core;
pub use csip_pipelines;
