//! Where the bearer token for identity lookups comes from.
//!
//! [`TokenStore`] mirrors browser storage: a persistent layer (a JSON object
//! on disk) consulted first, then a session layer that lives in memory.

use super::error::IdentityError;
use crate::config::IdentityConfig;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Supplies the current bearer token, if any.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// A fixed token (or none).
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        non_blank(self.0.clone())
    }
}

/// Layered token storage under a single well-known key.
#[derive(Debug)]
pub struct TokenStore {
    key: String,
    persistent: Option<PathBuf>,
    session: RwLock<HashMap<String, String>>,
}

impl TokenStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            persistent: None,
            session: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        let store = Self::new(config.token_key.clone());
        match &config.token_file {
            Some(path) => store.with_persistent_file(path),
            None => store,
        }
    }

    pub fn with_persistent_file(mut self, path: impl AsRef<Path>) -> Self {
        self.persistent = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Keep a token for the lifetime of this process only.
    pub fn set_session(&self, token: impl Into<String>) {
        let mut session = self
            .session
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        session.insert(self.key.clone(), token.into());
    }

    /// Write the token to persistent storage, keeping other keys intact.
    pub fn persist(&self, token: &str) -> Result<(), IdentityError> {
        let path = self
            .persistent
            .as_ref()
            .ok_or_else(|| {
                IdentityError::Storage("no persistent token file configured".to_string())
            })?;

        let mut map = read_map(path)?.unwrap_or_default();
        map.insert(self.key.clone(), Value::String(token.to_string()));
        write_map(path, &map)
    }

    /// Remove the token from both layers.
    pub fn clear(&self) -> Result<(), IdentityError> {
        self.session
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&self.key);

        if let Some(path) = &self.persistent {
            if let Some(mut map) = read_map(path)? {
                if map.remove(&self.key).is_some() {
                    write_map(path, &map)?;
                }
            }
        }
        Ok(())
    }

    fn persistent_token(&self) -> Option<String> {
        let path = self.persistent.as_ref()?;
        match read_map(path) {
            Ok(map) => map?.get(&self.key)?.as_str().map(String::from),
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring unreadable token file"
                );
                None
            }
        }
    }

    fn session_token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&self.key)
            .cloned()
    }
}

impl TokenSource for TokenStore {
    fn token(&self) -> Option<String> {
        non_blank(self.persistent_token()).or_else(|| non_blank(self.session_token()))
    }
}

fn non_blank(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.trim().is_empty())
}

/// `Ok(None)` when the file does not exist yet.
fn read_map(path: &Path) -> Result<Option<Map<String, Value>>, IdentityError> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        std::fs::read_to_string(path).map_err(|e| IdentityError::Storage(e.to_string()))?;
    if content.trim().is_empty() {
        return Ok(Some(Map::new()));
    }
    match serde_json::from_str(&content) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(IdentityError::Storage(format!(
            "{} does not contain a JSON object",
            path.display()
        ))),
        Err(e) => Err(IdentityError::Storage(e.to_string())),
    }
}

fn write_map(path: &Path, map: &Map<String, Value>) -> Result<(), IdentityError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| IdentityError::Storage(e.to_string()))?;
    }
    let content = serde_json::to_string_pretty(map)
        .map_err(|e| IdentityError::Storage(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| IdentityError::Storage(e.to_string()))
}
