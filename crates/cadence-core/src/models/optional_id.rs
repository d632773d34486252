//! Optional foreign keys on the wire.
//!
//! The backend has historically sent placeholder strings instead of `null`
//! for unset ids (e.g. an assignment without a psychologist). Those map to
//! `None` here so the rest of the system never compares against sentinels.

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

const PLACEHOLDERS: &[&str] = &["", "null", "undefined", "none"];

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None => Ok(None),
        Some(s) if PLACEHOLDERS.contains(&s.to_ascii_lowercase().as_str()) => Ok(None),
        Some(s) => s.parse::<Uuid>().map(Some).map_err(serde::de::Error::custom),
    }
}
