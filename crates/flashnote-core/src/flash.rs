//! The flash store facade: enqueue and explicit flush.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::{ConfigError, FlashConfig, QueueStyle};
use crate::reduce::reduce_arguments;
use crate::store::{SessionError, SessionStore};

/// Strategy-configured facade over a session-backed flash mapping.
///
/// Holds the validated configuration and the injected session collaborator.
/// Every operation performs its own session read/write; nothing is cached
/// across calls, so the read-modify-write in [`enqueue`](Self::enqueue) is
/// last-write-wins under concurrent requests sharing one session. Ordering
/// is only guaranteed within a single request's sequential calls.
pub struct FlashStore {
    pub(crate) config: FlashConfig,
    pub(crate) session: Arc<dyn SessionStore>,
}

impl FlashStore {
    /// Build a store over `session`, validating `config` first.
    ///
    /// Validation failure is fatal: the host must not serve requests with an
    /// invalid flash configuration.
    pub fn new(config: FlashConfig, session: Arc<dyn SessionStore>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, session })
    }

    pub fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// Current keyed storage as a working mapping (empty when absent or not
    /// an object).
    pub(crate) fn read_map(&self) -> Result<Map<String, Value>, SessionError> {
        match self.session.get(&self.config.session_key)? {
            Some(Value::Object(map)) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    fn reduce(&self, values: &[Value]) -> Value {
        reduce_arguments(
            self.config.argument_style,
            &self.config.join_separator,
            values,
        )
    }

    /// Queue a payload in the session's flash storage.
    ///
    /// `values` are reduced per the configured argument style;
    /// `QueueStyle::Single` replaces any stored payload, `Multiple` appends
    /// to the stored sequence. Returns the payload that was stored, not the
    /// full storage.
    ///
    /// # Panics
    ///
    /// Panics when the configured queue style is key-addressed; that is a
    /// programming error, use [`enqueue_keyed`](Self::enqueue_keyed).
    pub fn enqueue(&self, values: &[Value]) -> Result<Value, SessionError> {
        assert!(
            !self.config.queue_style.is_keyed(),
            "enqueue with key-addressed queue style {:?}; use enqueue_keyed",
            self.config.queue_style
        );
        let payload = self.reduce(values);
        match self.config.queue_style {
            QueueStyle::Single => {
                self.session
                    .set(&self.config.session_key, payload.clone())?;
            }
            QueueStyle::Multiple => {
                let mut sequence = match self.session.get(&self.config.session_key)? {
                    Some(Value::Array(sequence)) => sequence,
                    _ => Vec::new(),
                };
                sequence.push(payload.clone());
                self.session
                    .set(&self.config.session_key, Value::Array(sequence))?;
            }
            QueueStyle::KeySingle | QueueStyle::KeyMultiple => unreachable!(),
        }
        Ok(payload)
    }

    /// Queue a payload under `key` in the session's flash mapping.
    ///
    /// `QueueStyle::KeySingle` replaces the payload at `key`;
    /// `KeyMultiple` appends to the sequence at `key`, creating it when
    /// absent. Other keys are never removed. Returns the stored payload.
    ///
    /// # Panics
    ///
    /// Panics when the configured queue style is not key-addressed.
    pub fn enqueue_keyed(&self, key: &str, values: &[Value]) -> Result<Value, SessionError> {
        assert!(
            self.config.queue_style.is_keyed(),
            "enqueue_keyed with queue style {:?}; use enqueue",
            self.config.queue_style
        );
        let payload = self.reduce(values);
        let mut map = self.read_map()?;
        match self.config.queue_style {
            QueueStyle::KeySingle => {
                map.insert(key.to_string(), payload.clone());
            }
            QueueStyle::KeyMultiple => {
                let slot = map
                    .entry(key.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()));
                match slot {
                    Value::Array(sequence) => sequence.push(payload.clone()),
                    // Tolerate a non-sequence left by a foreign writer.
                    other => *other = Value::Array(vec![payload.clone()]),
                }
            }
            QueueStyle::Single | QueueStyle::Multiple => unreachable!(),
        }
        self.session
            .set(&self.config.session_key, Value::Object(map))?;
        Ok(payload)
    }

    /// Drain the whole flash storage.
    ///
    /// For endpoints no render cycle will serve (an API response, say).
    /// Clears the session entry and returns what was stored; `None` means
    /// nothing was queued.
    pub fn flush(&self) -> Result<Option<Value>, SessionError> {
        self.session.remove(&self.config.session_key)
    }

    /// Remove and return the named keys from the flash mapping, leaving all
    /// other keys untouched.
    ///
    /// The result is aligned with `keys`; absent keys yield `None` in their
    /// position.
    ///
    /// # Panics
    ///
    /// Panics when the configured queue style is not key-addressed.
    pub fn flush_keys(&self, keys: &[&str]) -> Result<Vec<Option<Value>>, SessionError> {
        assert!(
            self.config.queue_style.is_keyed(),
            "flush_keys with queue style {:?}; use flush",
            self.config.queue_style
        );
        let mut map = self.read_map()?;
        let removed = keys.iter().map(|key| map.remove(*key)).collect();
        self.session
            .set(&self.config.session_key, Value::Object(map))?;
        Ok(removed)
    }
}
