//! Render-context tokens and the pre-render hook.
//!
//! The host pipeline calls [`FlashStore::prepare_for_render`] exactly once
//! per render, before any template code reads the context. What gets
//! injected under the configured token name depends on the dequeue style:
//! an eager value, a deferred accessor, or a map of per-key deferred
//! accessors. Accessors are built fresh per render and never shared across
//! requests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use crate::config::DequeueStyle;
use crate::flash::FlashStore;
use crate::store::{SessionError, SessionStore};

/// Mutable name-to-token mapping handed to the view layer.
#[derive(Default)]
pub struct RenderContext {
    entries: HashMap<String, FlashToken>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, token: FlashToken) {
        self.entries.insert(name.into(), token);
    }

    pub fn get(&self, name: &str) -> Option<&FlashToken> {
        self.entries.get(name)
    }
}

/// What [`FlashStore::prepare_for_render`] injects into the context.
pub enum FlashToken {
    /// The storage value read eagerly; `None` when nothing was queued.
    Eager(Option<Value>),
    /// Deferred whole-storage accessor (`when_used`).
    Lazy(LazyFlash),
    /// Per-key deferred accessors over a keyed mapping (`by_key`).
    Keyed(KeyedFlash),
}

impl FlashToken {
    /// The eager value, when this token carries one.
    pub fn value(&self) -> Option<&Value> {
        match self {
            FlashToken::Eager(value) => value.as_ref(),
            _ => None,
        }
    }
}

/// Zero-argument deferred accessor over the whole flash storage.
///
/// The first [`resolve`](Self::resolve) reads the session value, clears it,
/// and caches what it read; later calls return the cache without touching
/// the session. If it is never resolved (a redirect that skips rendering),
/// the session stays intact for the next render.
pub struct LazyFlash {
    session: Arc<dyn SessionStore>,
    session_key: String,
    resolved: Mutex<Option<Option<Value>>>,
}

impl LazyFlash {
    pub(crate) fn new(session: Arc<dyn SessionStore>, session_key: String) -> Self {
        Self {
            session,
            session_key,
            resolved: Mutex::new(None),
        }
    }

    /// Read-and-clear on first call, cached thereafter.
    pub fn resolve(&self) -> Result<Option<Value>, SessionError> {
        let mut resolved = self.resolved.lock().map_err(SessionError::poisoned)?;
        if let Some(cached) = resolved.as_ref() {
            return Ok(cached.clone());
        }
        let value = self.session.remove(&self.session_key)?;
        *resolved = Some(value.clone());
        Ok(value)
    }
}

/// Per-key deferred accessors over a keyed flash mapping.
///
/// The mapping is read once into a working copy when the render is
/// prepared. [`take`](Self::take) removes a key from the working copy,
/// writes the remaining copy back to the session, and caches the value for
/// repeat access within the same render. Keys never taken stay queued in
/// the session for the next render, so partial consumption persists
/// correctly across requests.
pub struct KeyedFlash {
    session: Arc<dyn SessionStore>,
    session_key: String,
    state: Mutex<KeyedState>,
}

struct KeyedState {
    working: Map<String, Value>,
    taken: HashMap<String, Option<Value>>,
}

impl KeyedFlash {
    pub(crate) fn new(
        session: Arc<dyn SessionStore>,
        session_key: String,
        working: Map<String, Value>,
    ) -> Self {
        Self {
            session,
            session_key,
            state: Mutex::new(KeyedState {
                working,
                taken: HashMap::new(),
            }),
        }
    }

    /// All keys the mapping held when the render was prepared, taken or not.
    pub fn keys(&self) -> Vec<String> {
        let Ok(state) = self.state.lock() else {
            return Vec::new();
        };
        let mut keys: Vec<String> = state
            .working
            .keys()
            .chain(state.taken.keys())
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Remove and return the value for `key`, cached for repeat access.
    ///
    /// Each first-time take writes the remaining working copy back to the
    /// session. Absent keys yield `None` and still count as taken.
    pub fn take(&self, key: &str) -> Result<Option<Value>, SessionError> {
        let mut state = self.state.lock().map_err(SessionError::poisoned)?;
        if let Some(cached) = state.taken.get(key) {
            return Ok(cached.clone());
        }
        let value = state.working.remove(key);
        self.session
            .set(&self.session_key, Value::Object(state.working.clone()))?;
        state.taken.insert(key.to_string(), value.clone());
        Ok(value)
    }
}

impl FlashStore {
    /// Inject the configured token into `ctx` per the dequeue style.
    ///
    /// Called by the host pipeline once per render, before any template
    /// code reads the context.
    pub fn prepare_for_render(&self, ctx: &mut RenderContext) -> Result<(), SessionError> {
        let token = match self.config.dequeue_style {
            DequeueStyle::Never => FlashToken::Eager(self.session.get(&self.config.session_key)?),
            DequeueStyle::Always => {
                FlashToken::Eager(self.session.remove(&self.config.session_key)?)
            }
            DequeueStyle::WhenUsed => FlashToken::Lazy(LazyFlash::new(
                Arc::clone(&self.session),
                self.config.session_key.clone(),
            )),
            DequeueStyle::ByKey => FlashToken::Keyed(KeyedFlash::new(
                Arc::clone(&self.session),
                self.config.session_key.clone(),
                self.read_map()?,
            )),
        };
        ctx.insert(self.config.token_name.clone(), token);
        Ok(())
    }
}
