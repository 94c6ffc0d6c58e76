//! Engine configuration.
//!
//! Every field has a default, so an empty document is a valid config:
//!
//! ```yaml
//! collisions: last_wins      # or: reject (default)
//! completion_prefix: "#"     # null disables the check
//! suggest_flags: true
//! hide_unpermitted: false
//! catch_panics: true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a table does when two definitions claim the same name or alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Building the table fails with `RegistrationError::DuplicateName`.
    #[default]
    Reject,
    /// The later definition replaces the earlier one; a warning is logged.
    LastWins,
}

/// Tunables shared by a table's dispatcher and suggester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub collisions: CollisionPolicy,
    /// Prefix every completion id must carry, if any.
    pub completion_prefix: Option<String>,
    /// Offer flag tokens when the partial starts with `-`.
    pub suggest_flags: bool,
    /// Drop commands the invoker may not run from first-token suggestions.
    /// Only takes effect when the suggester has an authorizer.
    pub hide_unpermitted: bool,
    /// Turn a panicking action into `Rejection::ActionFailed`.
    pub catch_panics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collisions: CollisionPolicy::Reject,
            completion_prefix: Some("#".to_string()),
            suggest_flags: true,
            hide_unpermitted: false,
            catch_panics: true,
        }
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
}

impl EngineConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        // An empty YAML document deserializes as null, not as an empty map.
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Loads a config file, choosing the format by extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let parse: fn(&str) -> Result<Self, ConfigError> = match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_str,
            Some("json") => Self::from_json_str,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&content)
    }

    pub fn with_collisions(mut self, policy: CollisionPolicy) -> Self {
        self.collisions = policy;
        self
    }

    pub fn with_completion_prefix(mut self, prefix: Option<&str>) -> Self {
        self.completion_prefix = prefix.map(str::to_string);
        self
    }
}
