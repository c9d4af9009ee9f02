//! In-memory credential store.
//!
//! Loaded once from a JSON object mapping usernames to password hashes:
//!
//! ```json
//! { "alice": "$argon2id$v=19$m=19456,t=2,p=1$..." }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::backend::CredentialStore;
use crate::error::StorageError;

/// Read-only credential store held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    hashes: HashMap<String, String>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user with the given password hash.
    pub fn with_user(mut self, username: impl Into<String>, hash: impl Into<String>) -> Self {
        self.hashes.insert(username.into(), hash.into());
        self
    }

    /// Loads users from a JSON file.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {e}", path.display())))?;

        let hashes: HashMap<String, String> = serde_json::from_str(&raw)
            .map_err(|e| StorageError::Serialization(format!("{}: {e}", path.display())))?;

        info!(path = %path.display(), users = hashes.len(), "Loaded credentials");
        Ok(Self { hashes })
    }

    /// Returns true if no users are stored.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn password_hash(&self, username: &str) -> Result<Option<String>, StorageError> {
        let hash = self.hashes.get(username).cloned();
        debug!(username, found = hash.is_some(), "Credential lookup");
        Ok(hash)
    }
}
