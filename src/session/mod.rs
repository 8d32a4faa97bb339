//! Credential session
//!
//! An explicit session object replaces ambient credential state. The token is
//! persisted through an injectable [`KeyValueStore`], and credential checks go
//! through an opaque [`CredentialVerifier`].

pub mod auth;
pub mod store;

pub use auth::{AuthSession, CredentialVerifier, StaticCredentials, TOKEN_KEY, basic_token};
pub use store::{KeyValueStore, MemoryStore};
