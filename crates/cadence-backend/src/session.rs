//! Session context shared by everything that talks to the backend.
//!
//! A session starts with an explicit [`SessionContext::init`] (login) and
//! ends with [`SessionContext::teardown`] (logout, or a 401 from the
//! backend). It is handed to its users by `Arc`, never read from a global.
//!
//! Optionally the session is mirrored to a JSON file so a restarted client
//! picks it up again.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cadence_core::models::user::Role;

use crate::error::BackendError;

/// Current session file version. Bump this when changing the stored shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub role: Role,
    pub started_at: Timestamp,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    /// Missing or 0 = pre-versioned file.
    #[serde(default)]
    session_version: u32,
    #[serde(flatten)]
    session: Session,
}

/// Where a session is persisted between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/cadence/session.json`.
    pub fn default_location() -> Result<Self, BackendError> {
        let base = dirs::config_dir()
            .ok_or_else(|| BackendError::Session("no config directory found".to_string()))?;
        Ok(Self::at(base.join("cadence").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>, BackendError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;

        // Parse as raw JSON so migrations run before deserializing.
        let json: serde_json::Value = serde_json::from_str(&contents)?;
        let on_disk_version = json
            .get("sessionVersion")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;

        let migrated = migrate(json, on_disk_version)?;
        let stored: StoredSession = serde_json::from_value(migrated)?;
        Ok(Some(stored.session))
    }

    pub fn save(&self, session: &Session) -> Result<(), BackendError> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| BackendError::Session(format!("{} has no parent", self.path.display())))?;
        std::fs::create_dir_all(dir)?;

        let stored = StoredSession {
            session_version: CURRENT_VERSION,
            session: session.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json.as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&tmp_path, &self.path)?;

        tracing::info!(path = %self.path.display(), "session saved");
        Ok(())
    }

    pub fn delete(&self) -> Result<(), BackendError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            tracing::info!(path = %self.path.display(), "session deleted");
        }
        Ok(())
    }
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
fn migrate(mut json: serde_json::Value, from_version: u32) -> Result<serde_json::Value, BackendError> {
    if from_version > CURRENT_VERSION {
        return Err(BackendError::Session(format!(
            "session version {from_version} is newer than this build supports ({CURRENT_VERSION})"
        )));
    }

    // Unversioned files already have the v1 shape; only the marker is new.
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| BackendError::Session("session file is not a JSON object".to_string()))?;
        obj.insert("sessionVersion".to_string(), serde_json::Value::Number(1.into()));
    }

    // Future migrations go here:
    // if from_version < 2 { ... }

    Ok(json)
}

/// The signed-in user, if any.
#[derive(Debug, Default)]
pub struct SessionContext {
    current: RwLock<Option<Session>>,
    store: Option<SessionStore>,
}

impl SessionContext {
    /// A context that lives only in memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context mirrored to `store`, restoring whatever session it holds.
    pub fn with_store(store: SessionStore) -> Result<Self, BackendError> {
        let restored = store.load()?;
        if let Some(session) = &restored {
            tracing::info!(user_id = %session.user_id, "session restored");
        }
        Ok(Self {
            current: RwLock::new(restored),
            store: Some(store),
        })
    }

    pub fn init(&self, session: Session) -> Result<(), BackendError> {
        if let Some(store) = &self.store {
            store.save(&session)?;
        }
        tracing::info!(user_id = %session.user_id, role = ?session.role, "session started");
        match self.current.write() {
            Ok(mut current) => *current = Some(session),
            Err(poisoned) => *poisoned.into_inner() = Some(session),
        }
        Ok(())
    }

    /// End the session. Never fails: a store that cannot be cleaned up is
    /// logged and the in-memory session is dropped regardless.
    pub fn teardown(&self) {
        let previous = match self.current.write() {
            Ok(mut current) => current.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(store) = &self.store {
            if let Err(e) = store.delete() {
                tracing::warn!(error = %e, "failed to delete stored session");
            }
        }
        if let Some(session) = previous {
            tracing::info!(user_id = %session.user_id, "session ended");
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().map(|s| s.clone()).unwrap_or(None)
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }

    pub fn role(&self) -> Option<Role> {
        self.current().map(|s| s.role)
    }

    pub fn is_active(&self) -> bool {
        self.current().is_some()
    }
}
