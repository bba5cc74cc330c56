/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Configuration of the runtime.
///
/// Loaded from `$XDG_CONFIG_HOME/acton-relay/config.toml`; every section and
/// field is optional and falls back to its default.
///
/// ```toml
/// [timeouts]
/// actor_shutdown_timeout_ms = 10000
/// system_shutdown_timeout_ms = 30000
/// default_request_timeout_ms = 5000
///
/// [limits]
/// read_chunk_size = 4096
/// max_frame_size = 16777216
///
/// [defaults]
/// actor_name = "actor"
/// broker_name = "broker"
///
/// [behavior]
/// unexpected_message = "discard"
/// log_unexpected = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActonConfig {
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// Limits for broker I/O
    pub limits: LimitsConfig,
    /// Default names
    pub defaults: DefaultsConfig,
    /// Behavioral switches
    pub behavior: BehaviorConfig,
}

/// Timeout-related configuration values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long [`ActorHandle::stop`](crate::common::ActorHandle::stop) waits, in milliseconds
    pub actor_shutdown_timeout_ms: u64,
    /// How long a full runtime shutdown waits, in milliseconds
    pub system_shutdown_timeout_ms: u64,
    /// Deadline used by requests that do not name one, in milliseconds
    pub default_request_timeout_ms: u64,
}

/// Broker I/O limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Bytes read from a socket per system call
    pub read_chunk_size: usize,
    /// Largest frame a receive policy may ask for, and the bytes a TCP
    /// connection reads ahead of its broker
    pub max_frame_size: usize,
}

/// Default values configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Name given to actors created without one
    pub actor_name: String,
    /// Name given to brokers created without one
    pub broker_name: String,
}

/// What actors do with messages their behavior does not match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnexpectedMessageMode {
    /// Log and drop the message.
    #[default]
    Discard,
    /// Terminate the actor with `UnhandledMessage`.
    Terminate,
}

/// Behavioral configuration switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Default unexpected-message handling for new actors
    pub unexpected_message: UnexpectedMessageMode,
    /// Emit a warning for every discarded unexpected message
    pub log_unexpected: bool,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            actor_shutdown_timeout_ms: 10_000,
            system_shutdown_timeout_ms: 30_000,
            default_request_timeout_ms: 5_000,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: 4096,
            max_frame_size: 16 * 1024 * 1024,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            actor_name: "actor".to_string(),
            broker_name: "broker".to_string(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            unexpected_message: UnexpectedMessageMode::Discard,
            log_unexpected: true,
        }
    }
}

/// Failure to read or parse a configuration file.
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// The file is not valid configuration TOML.
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read configuration file {}: {source}", path.display())
            }
            Self::Parse(source) => write!(f, "failed to parse configuration: {source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(source) => Some(source),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        Self::Parse(error)
    }
}

impl ActonConfig {
    /// Graceful stop timeout for a single actor.
    pub const fn actor_shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.actor_shutdown_timeout_ms)
    }

    /// Timeout for shutting down the whole runtime.
    pub const fn system_shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.system_shutdown_timeout_ms)
    }

    /// Deadline for requests issued without an explicit one.
    pub const fn default_request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.default_request_timeout_ms)
    }

    /// Parses configuration TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed input.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Loads configuration from the XDG config directory.
    ///
    /// Looks for `acton-relay/config.toml` under `$XDG_CONFIG_HOME` (then the
    /// XDG fallbacks). A missing file yields the defaults; an unreadable or
    /// malformed one is logged and also yields the defaults.
    pub fn load() -> Self {
        let xdg_dirs = match xdg::BaseDirectories::with_prefix("acton-relay") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let Some(path) = xdg_dirs.find_config_file("config.toml") else {
            info!("No configuration file found, using defaults");
            return Self::default();
        };

        info!("Loading configuration from: {}", path.display());
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("{e}; using defaults");
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Process-wide configuration, loaded from the XDG config directory on first use.
    pub static ref CONFIG: ActonConfig = ActonConfig::load();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_keep_the_remaining_defaults() {
        let config = ActonConfig::from_toml(
            r#"
            [timeouts]
            default_request_timeout_ms = 250

            [behavior]
            unexpected_message = "terminate"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_request_timeout(), Duration::from_millis(250));
        assert_eq!(config.timeouts.system_shutdown_timeout_ms, 30_000);
        assert_eq!(config.behavior.unexpected_message, UnexpectedMessageMode::Terminate);
        assert!(config.behavior.log_unexpected);
        assert_eq!(config.limits, LimitsConfig::default());
    }

    #[test]
    fn malformed_input_is_an_error() {
        let result = ActonConfig::from_toml("[timeouts]\nactor_shutdown_timeout_ms = \"soon\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn empty_input_is_the_default() {
        assert_eq!(ActonConfig::from_toml("").unwrap(), ActonConfig::default());
    }
}
