use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid {kind} record: {reason}")]
    InvalidRecord { kind: &'static str, reason: String },
}
