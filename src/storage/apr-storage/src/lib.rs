//! # APR Storage
//!
//! Credential storage abstraction for APR login.
//!
//! The auth layer only needs one thing from persistence: the stored
//! password hash of a user. Backends implement [`CredentialStore`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod memory;

pub use backend::CredentialStore;
pub use error::StorageError;
pub use memory::MemoryCredentialStore;
