use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_API_BASE;

/// Runtime configuration for the sync engine.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Base URL of the request/response API, without a trailing slash.
    pub api_base: String,
    /// Base URL of the push channel. Derived from `api_base` unless set.
    pub push_base: String,
    /// Id of the logged-in user, used to drop self-originated push events.
    pub user_id: Option<String>,
    /// Directory holding persisted client state.
    pub data_dir: PathBuf,
}

impl CoreConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        let push_base = derive_push_base(&api_base);
        Self {
            api_base,
            push_base,
            user_id: None,
            data_dir: PathBuf::from("tidemark_data"),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_data_dir<P: AsRef<Path>>(mut self, data_dir: P) -> Self {
        self.data_dir = data_dir.as_ref().to_path_buf();
        self
    }

    pub fn with_push_base(mut self, push_base: impl Into<String>) -> Self {
        self.push_base = push_base.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

/// Map an HTTP API base to the matching websocket base.
fn derive_push_base(api_base: &str) -> String {
    if let Some(rest) = api_base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        api_base.to_string()
    }
}
