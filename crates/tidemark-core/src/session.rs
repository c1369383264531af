use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::SESSION_FILE;
use crate::models::Scope;

/// What the client remembers between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Storage key of the scope the user last had selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scope: Option<String>,
}

/// Session state persisted as JSON under the data directory.
///
/// An absent or undecodable file reads as an empty session, so a client
/// that cannot restore its last visit starts from the all-feeds view.
/// Saves are best-effort; losing one costs a restored selection, nothing
/// more.
pub struct SessionStorage {
    path: PathBuf,
    state: SessionState,
}

impl SessionStorage {
    pub fn new(data_dir: &Path) -> Self {
        let path = data_dir.join(SESSION_FILE);
        let state = Self::load_from_file(&path).unwrap_or_default();
        Self { path, state }
    }

    fn load_from_file(path: &Path) -> Option<SessionState> {
        let raw = fs::read_to_string(path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn save_to_file(&self) {
        if let Ok(json) = serde_json::to_string_pretty(&self.state) {
            let _ = fs::write(&self.path, json);
        }
    }

    /// The scope to restore, when a prior visit was recorded.
    pub fn last_scope(&self) -> Option<Scope> {
        self.state
            .last_scope
            .as_deref()
            .map(Scope::from_storage_key)
    }

    pub fn set_last_scope(&mut self, scope: &Scope) {
        self.state.last_scope = Some(scope.storage_key());
        self.save_to_file();
    }
}
