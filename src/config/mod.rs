// src/config/mod.rs
pub mod forecast;

pub use forecast::{ForecastConfig, Region, RegionSource, Schema, SourceSpec};
