//! Engine configuration, loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Navigation behaviour switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Step over `skipNavigation` steps when moving.
    pub honor_skip_navigation: bool,

    /// Record jumps so that `back` returns to where the jump started.
    pub track_history: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            honor_skip_navigation: true,
            track_history: true,
        }
    }
}

/// Logging settings for binaries embedding the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "quest_engine=info,quest_script=info".to_string(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub navigation: NavigationConfig,
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Parse configuration from a TOML string. Missing keys take defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read configuration from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert!(config.navigation.honor_skip_navigation);
        assert!(config.navigation.track_history);
        assert_eq!(config.logging.filter, "quest_engine=info,quest_script=info");
    }

    #[test]
    fn test_partial_config() {
        let config = EngineConfig::from_toml_str(
            r#"
            [navigation]
            honor_skip_navigation = false

            [logging]
            filter = "quest_engine=trace"
            "#,
        )
        .unwrap();

        assert!(!config.navigation.honor_skip_navigation);
        assert!(config.navigation.track_history);
        assert_eq!(config.logging.filter, "quest_engine=trace");
    }

    #[test]
    fn test_invalid_config() {
        let result = EngineConfig::from_toml_str("[navigation]\nhonor_skip_navigation = \"yes\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
