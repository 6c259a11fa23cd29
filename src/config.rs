use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, Result};

fn default_branch() -> String {
    "main".to_string()
}

/// repository configuration stored in config.toml
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// branch HEAD points at after init
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// glob patterns left out of working tree snapshots
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
}

impl Config {
    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_path(path)?;
        Ok(())
    }

    /// add an ignore pattern, skipping duplicates
    pub fn add_ignore(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if !self.ignore.contains(&pattern) {
            self.ignore.push(pattern);
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
            ignore: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_toml_roundtrip() {
        let config = Config {
            default_branch: "trunk".to_string(),
            ignore: vec!["target".to_string(), "*.tmp".to_string()],
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.default_branch, "main");
        assert!(config.ignore.is_empty());
    }

    #[test]
    fn test_config_add_ignore() {
        let mut config = Config::default();
        config.add_ignore("build");
        config.add_ignore("build");
        assert_eq!(config.ignore, vec!["build".to_string()]);
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.add_ignore("*.o");
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_config_rejects_bad_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_branch = [").unwrap();
        assert!(matches!(Config::load(&path), Err(crate::Error::Config(_))));
    }
}
