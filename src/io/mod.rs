//! Output helpers.
//!
//! - CSV export of the enriched dataset (`export`)

pub mod export;

pub use export::*;
