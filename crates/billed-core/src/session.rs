use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserType {
    Employee,
    Administrator,
}

/// The signed-in user, read once at startup and passed into the app
/// explicitly. Containers never re-read it from ambient storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// No persisted session: the user is not signed in.
    #[error("not signed in: no session at {0}")]
    Missing(String),

    #[error("invalid session: {0}")]
    Invalid(String),
}

impl Session {
    pub fn from_json(raw: &str) -> Result<Self, SessionError> {
        serde_json::from_str(raw).map_err(|e| SessionError::Invalid(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let raw = fs::read_to_string(path)
            .map_err(|_| SessionError::Missing(path.display().to_string()))?;
        Self::from_json(&raw)
    }
}
