//! `critter-weather` library crate.
//!
//! The binary (`critters`) is a thin wrapper around this library so that:
//!
//! - the pipeline stages are testable against in-memory sources
//! - the HTTP clients stay behind two small traits (`data::ObservationSource`,
//!   `data::WeatherSource`)
//!
//! Flow: `fetch` -> `enrich` -> `aggregate` -> presentation (`report`, `plot`, `io`).

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod io;
pub mod plot;
pub mod report;

#[cfg(test)]
mod testing;
