//! Configuration for the lint pipeline.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Default quiescence window before an edit triggers analysis.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(750);

/// Errors that can occur when loading a pipeline configuration.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON deserialization failed.
    #[error("invalid config JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field value is out of its valid range.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The name of the field that failed validation.
        field: String,
        /// A human-readable explanation of why the value is invalid.
        reason: String,
    },
}

/// Complete pipeline configuration: debounce window + storage keys.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// How long input must stay quiet before an analysis cycle runs.
    pub debounce: Duration,
    /// Keys under which buffer texts are persisted.
    pub keys: StorageKeys,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            keys: StorageKeys::default(),
        }
    }
}

impl PipelineConfig {
    /// Override the debounce window (builder pattern).
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Override the storage keys (builder pattern).
    pub fn with_keys(mut self, keys: StorageKeys) -> Self {
        self.keys = keys;
        self
    }
}

/// Persistence keys for the two source buffers.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Key for the grammar buffer text.
    pub grammar: String,
    /// Key for the code buffer text.
    pub code: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            grammar: "grammarText".into(),
            code: "codeText".into(),
        }
    }
}

impl StorageKeys {
    /// Create a key pair.
    pub fn new(grammar: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            grammar: grammar.into(),
            code: code.into(),
        }
    }
}

/// On-disk form; every field is optional and falls back to the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConfig {
    debounce_ms: Option<u64>,
    grammar_key: Option<String>,
    code_key: Option<String>,
}

/// Parse and validate a pipeline configuration from a JSON string.
///
/// Accepts `{ "debounceMs": 750, "grammarKey": "grammarText", "codeKey": "codeText" }`
/// with every field optional.
pub fn load_config_from_str(s: &str) -> Result<PipelineConfig, ConfigError> {
    let raw: RawConfig = serde_json::from_str(s)?;
    let mut config = PipelineConfig::default();

    if let Some(ms) = raw.debounce_ms {
        if ms == 0 {
            return Err(ConfigError::InvalidField {
                field: "debounceMs".into(),
                reason: "must be > 0".into(),
            });
        }
        config.debounce = Duration::from_millis(ms);
    }

    for (field, value, slot) in [
        ("grammarKey", raw.grammar_key, &mut config.keys.grammar),
        ("codeKey", raw.code_key, &mut config.keys.code),
    ] {
        if let Some(value) = value {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidField {
                    field: field.into(),
                    reason: "must not be empty".into(),
                });
            }
            *slot = value;
        }
    }

    if config.keys.grammar == config.keys.code {
        return Err(ConfigError::InvalidField {
            field: "codeKey".into(),
            reason: format!("must differ from grammarKey ('{}')", config.keys.grammar),
        });
    }

    Ok(config)
}
