//! Session storage and bearer credential lookup.
//!
//! Privileged view-model operations query a [`CredentialProvider`] at the
//! moment they start; they never read ambient storage directly.

use std::collections::HashMap;
use std::sync::RwLock;

/// Session storage key under which the bearer token is kept.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Synchronous source of the bearer credential.
pub trait CredentialProvider: Send + Sync {
    /// Returns the current bearer token, or `None` when logged out.
    fn bearer_token(&self) -> Option<String>;
}

/// Trait defining session storage operations.
pub trait SessionStoreTrait {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
    fn login(&self, token: &str);
    fn logout(&self);
}

/// In-memory key/value session storage.
#[derive(Debug, Default)]
pub struct SessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `token` as the bearer credential.
    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store.login(token);
        store
    }
}

impl SessionStoreTrait for SessionStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn remove_item(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }

    fn login(&self, token: &str) {
        self.set_item(AUTH_TOKEN_KEY, token);
    }

    fn logout(&self) {
        self.remove_item(AUTH_TOKEN_KEY);
    }
}

impl CredentialProvider for SessionStore {
    fn bearer_token(&self) -> Option<String> {
        self.get_item(AUTH_TOKEN_KEY).filter(|token| !token.is_empty())
    }
}

/// Fixed credential, mostly useful for scripts and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(pub Option<String>);

impl CredentialProvider for StaticCredential {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone().filter(|token| !token.is_empty())
    }
}
