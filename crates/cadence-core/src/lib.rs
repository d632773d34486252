//! cadence-core
//!
//! Pure domain records, wire enums, and REST path conventions.
//! No HTTP dependency; this is the shared vocabulary of the Cadence system.

pub mod api_paths;
pub mod error;
pub mod models;
pub mod wire;
