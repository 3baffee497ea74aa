//! Configuration management for dot1xd

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Dot1xError, Dot1xResult};

/// Main dot1xd configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dot1xConfig {
    /// Filesystem paths
    #[serde(default)]
    pub paths: ConfigPaths,
    /// Behavior settings
    #[serde(default)]
    pub behavior: BehaviorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigPaths {
    /// Scratch directory for staged credential files
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorSettings {
    /// Remove the interface registry entry when a disconnect succeeds.
    /// When false (the default) a disconnected interface stays managed
    /// until daemon shutdown.
    #[serde(default)]
    pub forget_on_disconnect: bool,
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
        }
    }
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            forget_on_disconnect: false,
        }
    }
}

impl Dot1xConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Dot1xResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Dot1xError::ConfigError(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| Dot1xError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Dot1xResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Dot1xError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| Dot1xError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Ensure the scratch directory exists
    pub fn ensure_directories(&self) -> Dot1xResult<()> {
        std::fs::create_dir_all(&self.paths.scratch_dir)
            .map_err(|e| Dot1xError::ConfigError(
                format!("Failed to create directory {:?}: {}", self.paths.scratch_dir, e)
            ))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Dot1xConfig::default();
        assert_eq!(config.paths.scratch_dir, PathBuf::from("/tmp"));
        assert!(!config.behavior.forget_on_disconnect);
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot1xd.toml");

        let mut config = Dot1xConfig::default();
        config.behavior.forget_on_disconnect = true;
        config.save(&path).unwrap();

        let loaded = Dot1xConfig::load(&path).unwrap();
        assert!(loaded.behavior.forget_on_disconnect);
        assert_eq!(loaded.paths.scratch_dir, config.paths.scratch_dir);
    }

    #[test]
    fn test_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot1xd.toml");
        std::fs::write(&path, "[behavior]\nforget_on_disconnect = true\n").unwrap();

        let loaded = Dot1xConfig::load(&path).unwrap();
        assert!(loaded.behavior.forget_on_disconnect);
        assert_eq!(loaded.paths.scratch_dir, PathBuf::from("/tmp"));
    }
}
