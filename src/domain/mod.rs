//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - pipeline records (`Observation`, `WeatherSample`, `EnrichedRecord`, `Dataset`)
//! - run configuration (`RunConfig`, `EnrichSettings`, `RetryPolicy`, `PresentOptions`)
//! - geographic helpers (`BoundingBox`, `haversine_km`)

pub mod geo;
pub mod types;

pub use geo::*;
pub use types::*;
