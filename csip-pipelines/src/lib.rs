//! Concrete metric pipelines on top of `csip-core`.
//!
//! - [`source`]: interfaces to the excluded I/O collaborators (monthly
//!   artifact sources, yearly table sinks) plus a CSV sink and in-memory
//!   test doubles
//! - [`daily`]: hourly Kelvin grids to daily Celsius/enthalpy statistics
//! - [`monthly`]: one month of daily statistics to per-country records
//! - [`runner`]: the batch driver looping years and months, skipping
//!   missing inputs and folding the seasonal climatology

pub mod daily;
pub mod monthly;
pub mod runner;
pub mod source;
