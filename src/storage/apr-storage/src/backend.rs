//! Credential store trait definition.

use async_trait::async_trait;

use crate::error::StorageError;

/// Source of stored password hashes.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Get the password hash (PHC string) stored for `username`.
    ///
    /// Returns `Ok(None)` if the user does not exist.
    async fn password_hash(&self, username: &str) -> Result<Option<String>, StorageError>;
}
