//! Session store collaborator contract and the in-memory reference backend.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

/// The contract every session backend implements.
///
/// Values must round-trip nested composites (sequences, mappings, scalars)
/// without loss across a single process's request boundary. Calls are
/// synchronous; backend failures pass through to the caller unmodified —
/// the flash store performs no retry and no local recovery.
pub trait SessionStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Value>, SessionError>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&self, key: &str, value: Value) -> Result<(), SessionError>;

    /// Remove the value stored under `key`, returning what was there.
    fn remove(&self, key: &str) -> Result<Option<Value>, SessionError>;
}

/// Errors surfaced by a session backend.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SessionError {
    pub(crate) fn poisoned<T>(err: PoisonError<T>) -> Self {
        SessionError::Backend(format!("lock poisoned: {err}"))
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}

/// In-memory session backend: the reference implementation and test double.
///
/// One instance models one session's key-value mapping; scope instances per
/// session identity in multi-user hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SessionError> {
        let values = self.values.lock().map_err(SessionError::poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SessionError> {
        let mut values = self.values.lock().map_err(SessionError::poisoned)?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<Option<Value>, SessionError> {
        let mut values = self.values.lock().map_err(SessionError::poisoned)?;
        Ok(values.remove(key))
    }
}
