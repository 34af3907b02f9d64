//! Flash store configuration.
//!
//! Fixed at application startup and immutable thereafter. Validation is
//! synchronous and fatal: the host must fix its configuration and restart
//! rather than serve requests with an invalid one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How values queued across enqueue calls accumulate in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStyle {
    /// Storage is one bare payload; last write wins.
    Single,
    /// Storage is an ordered sequence; payloads append, oldest first.
    Multiple,
    /// Storage maps key to payload; last write per key wins.
    KeySingle,
    /// Storage maps key to an ordered sequence of payloads.
    KeyMultiple,
}

impl QueueStyle {
    /// True for the key-addressed styles.
    pub fn is_keyed(&self) -> bool {
        matches!(self, QueueStyle::KeySingle | QueueStyle::KeyMultiple)
    }
}

/// How one enqueue call's values collapse into a single stored payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentStyle {
    /// Keep the first value, discard the rest.
    Single,
    /// Concatenate string forms with [`FlashConfig::join_separator`].
    Join,
    /// One value stays bare; two or more become a sequence.
    Auto,
    /// Always store the full sequence, even for one value.
    Array,
}

/// When stored messages are purged from the session relative to render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DequeueStyle {
    /// Inject the stored value; never touch the session.
    Never,
    /// Inject the stored value and clear the session in the same call.
    Always,
    /// Inject a deferred accessor; the session is cleared on first access.
    WhenUsed,
    /// Per-key deferred accessors; only accessed keys leave the session.
    /// Requires a key-addressed queue style.
    ByKey,
}

/// Flash store configuration.
///
/// Unknown keys and unrecognized enum values are rejected during
/// deserialization; [`validate`](FlashConfig::validate) checks the
/// cross-field invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlashConfig {
    /// Name of the token injected into the render context.
    pub token_name: String,
    /// Session key the flash storage lives under.
    pub session_key: String,
    pub queue_style: QueueStyle,
    pub argument_style: ArgumentStyle,
    pub dequeue_style: DequeueStyle,
    /// Separator used by [`ArgumentStyle::Join`].
    pub join_separator: String,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            token_name: "flash".to_string(),
            session_key: "_flash".to_string(),
            queue_style: QueueStyle::Multiple,
            argument_style: ArgumentStyle::Auto,
            dequeue_style: DequeueStyle::WhenUsed,
            join_separator: String::new(),
        }
    }
}

impl FlashConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token_name(mut self, name: impl Into<String>) -> Self {
        self.token_name = name.into();
        self
    }

    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = key.into();
        self
    }

    pub fn with_queue_style(mut self, style: QueueStyle) -> Self {
        self.queue_style = style;
        self
    }

    pub fn with_argument_style(mut self, style: ArgumentStyle) -> Self {
        self.argument_style = style;
        self
    }

    pub fn with_dequeue_style(mut self, style: DequeueStyle) -> Self {
        self.dequeue_style = style;
        self
    }

    pub fn with_join_separator(mut self, separator: impl Into<String>) -> Self {
        self.join_separator = separator.into();
        self
    }

    /// Load configuration from a JSON string, rejecting unknown keys and
    /// unrecognized style values, then validate it.
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let config: FlashConfig =
            serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the cross-field invariant: `by_key` dequeueing only works when
    /// the storage is key-addressed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dequeue_style == DequeueStyle::ByKey && !self.queue_style.is_keyed() {
            return Err(ConfigError::IncompatibleStyles {
                queue_style: self.queue_style,
            });
        }
        Ok(())
    }
}

/// Configuration validation error. Fatal at startup; there is no recovery
/// path short of fixing the configuration and restarting.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unknown configuration key or unrecognized style value.
    #[error("Invalid flash configuration: {0}")]
    Parse(String),

    /// `by_key` dequeueing combined with a non-key queue style.
    #[error("Dequeue style `by_key` requires queue style `key_single` or `key_multiple`, got `{queue_style:?}`")]
    IncompatibleStyles { queue_style: QueueStyle },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = FlashConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.token_name, "flash");
        assert_eq!(config.session_key, "_flash");
        assert_eq!(config.queue_style, QueueStyle::Multiple);
        assert_eq!(config.argument_style, ArgumentStyle::Auto);
        assert_eq!(config.dequeue_style, DequeueStyle::WhenUsed);
    }

    #[test]
    fn from_json_fills_defaults() {
        let config = FlashConfig::from_json(r#"{"queue_style": "single"}"#).unwrap();
        assert_eq!(config.queue_style, QueueStyle::Single);
        assert_eq!(config.token_name, "flash");
    }

    #[test]
    fn from_json_rejects_unknown_key() {
        let err = FlashConfig::from_json(r#"{"foo": 1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("foo"));
    }

    #[test]
    fn from_json_rejects_unknown_style_value() {
        let err = FlashConfig::from_json(r#"{"argument_style": "jumble"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn by_key_requires_keyed_queue_style() {
        let config = FlashConfig::default().with_dequeue_style(DequeueStyle::ByKey);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IncompatibleStyles { .. })
        ));

        let config = config.with_queue_style(QueueStyle::KeySingle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_json_checks_style_combination() {
        let err = FlashConfig::from_json(
            r#"{"queue_style": "multiple", "dequeue_style": "by_key"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::IncompatibleStyles { .. }));
    }

    #[test]
    fn config_json_round_trip() {
        let config = FlashConfig::default()
            .with_queue_style(QueueStyle::KeyMultiple)
            .with_dequeue_style(DequeueStyle::ByKey)
            .with_join_separator(", ");
        let json = serde_json::to_string(&config).unwrap();
        let back = FlashConfig::from_json(&json).unwrap();
        assert_eq!(back.queue_style, QueueStyle::KeyMultiple);
        assert_eq!(back.dequeue_style, DequeueStyle::ByKey);
        assert_eq!(back.join_separator, ", ");
    }
}
