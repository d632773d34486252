use thiserror::Error;

use cadence_core::error::CoreError;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("not found: {path}")]
    NotFound { path: String },

    /// A conditional write lost to a concurrent writer.
    #[error("conflicting write: {path}")]
    Conflict { path: String },

    #[error("not signed in or session expired")]
    Unauthorized,

    #[error("backend returned {status} for {path}: {body}")]
    Http { status: u16, path: String, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("session store error: {0}")]
    Session(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
