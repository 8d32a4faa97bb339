use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info};

use super::store::KeyValueStore;
use crate::errors::{AppError, AppResult};

/// Store key holding the session token
pub const TOKEN_KEY: &str = "auth_token";

/// Base64 of `username:password`
pub fn basic_token(username: &str, password: &str) -> String {
    STANDARD.encode(format!("{username}:{password}"))
}

/// Checks credentials and issues an opaque token
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// `Ok(None)` means the credentials were rejected
    async fn verify(&self, username: &str, password: &str) -> AppResult<Option<String>>;
}

/// Verifier for a single fixed account
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, username: &str, password: &str) -> AppResult<Option<String>> {
        if username == self.username && password == self.password {
            Ok(Some(basic_token(username, password)))
        } else {
            Ok(None)
        }
    }
}

/// Holds the current token, persisted in `S`
pub struct AuthSession<S: KeyValueStore> {
    store: S,
    token: Option<String>,
}

impl<S: KeyValueStore> AuthSession<S> {
    /// Restore any token previously saved in `store`
    pub fn new(store: S) -> Self {
        let token = store.get(TOKEN_KEY).filter(|t| !t.is_empty());
        Self { store, token }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn set_token(&mut self, token: &str) {
        self.store.set(TOKEN_KEY, token);
        self.token = Some(token.to_string());
    }

    pub fn clear(&mut self) {
        self.store.remove(TOKEN_KEY);
        self.token = None;
    }

    /// `Authorization` header value for authenticated requests
    pub fn authorization_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Basic {t}"))
    }

    pub async fn login(
        &mut self,
        verifier: &dyn CredentialVerifier,
        username: &str,
        password: &str,
    ) -> AppResult<()> {
        match verifier.verify(username, password).await? {
            Some(token) => {
                self.set_token(&token);
                info!("Signed in as {}", username);
                Ok(())
            }
            None => {
                debug!("Credential check rejected for {}", username);
                Err(AppError::unauthorized("invalid username or password"))
            }
        }
    }

    pub fn logout(&mut self) {
        self.clear();
    }
}
