//! Post-aggregation analysis.
//!
//! Groups the aggregate table by road section and summarizes average speed,
//! density and flow across time windows, the inputs to per-section
//! fundamental-diagram plots.

pub mod sections;
pub mod utility;
