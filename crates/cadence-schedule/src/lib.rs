//! cadence-schedule
//!
//! Questionnaire scheduling rules. Pure functions over the records in
//! `cadence-core`. No I/O, no clock. Every operation takes `now` explicitly
//! so callers (the sweep, the submission path, tests) control time.

pub mod answers;
pub mod error;
pub mod lifecycle;
pub mod occurrence;
pub mod stats;
pub mod tracker;
pub mod validate;
