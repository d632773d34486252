//! JSON encoding of records exchanged with the REST backend.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CoreError;

/// Decode a record body. `kind` names the record in the error message.
pub fn decode<T: DeserializeOwned>(kind: &'static str, body: &[u8]) -> Result<T, CoreError> {
    if body.is_empty() {
        return Err(CoreError::InvalidRecord {
            kind,
            reason: "empty body".to_string(),
        });
    }
    serde_json::from_slice(body).map_err(|e| CoreError::InvalidRecord {
        kind,
        reason: e.to_string(),
    })
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CoreError> {
    Ok(serde_json::to_vec(value)?)
}
