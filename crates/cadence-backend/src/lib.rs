//! cadence-backend
//!
//! The scheduler's view of the REST backend: the `Backend` trait, an HTTP
//! implementation, an in-memory implementation, the session context, and the
//! cancellable poll task used for periodic refetching.

pub mod backend;
pub mod error;
pub mod http;
pub mod memory;
pub mod poll;
pub mod session;
