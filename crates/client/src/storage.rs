//! Session-scoped key/value persistence for the bearer token and its expiry.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Key holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";

/// Key holding the token expiry as epoch milliseconds.
pub const EXPIRY_KEY: &str = "expired";

/// Key/value store that outlives individual requests but not the session.
pub trait TokenStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// Process-lifetime storage; everything is gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with a token, as if a previous login persisted it.
    pub fn with_token(token: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.set(TOKEN_KEY, token.into());
        storage
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
    }
}
