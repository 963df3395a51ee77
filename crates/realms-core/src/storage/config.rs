//! TOML-based application configuration.
//!
//! Stores:
//! - The character the CLI acts for
//! - Gathering limits and the polling cadence
//! - An optional path to a custom material catalog
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::catalog::StaticCatalog;
use crate::error::ConfigError;

/// Gathering-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatheringConfig {
    /// How often watchers re-evaluate progress. The engine itself does not
    /// depend on the cadence.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_quantity_goal")]
    pub default_quantity_goal: u32,
    #[serde(default = "default_max_quantity_goal")]
    pub max_quantity_goal: u32,
}

/// Material catalog source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MaterialsConfig {
    /// TOML catalog replacing the built-in one.
    #[serde(default)]
    pub catalog_path: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_character")]
    pub character_id: String,
    #[serde(default)]
    pub gathering: GatheringConfig,
    #[serde(default)]
    pub materials: MaterialsConfig,
}

fn default_character() -> String {
    "adventurer".into()
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_quantity_goal() -> u32 {
    10
}
fn default_max_quantity_goal() -> u32 {
    1000
}

impl Default for GatheringConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            default_quantity_goal: default_quantity_goal(),
            max_quantity_goal: default_max_quantity_goal(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            character_id: default_character(),
            gathering: GatheringConfig::default(),
            materials: MaterialsConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(format!("'{value}': {e}")))?,
                ),
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                // Unset optionals are null; accept "" as clearing them.
                serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };
        if self.character_id.trim().is_empty() {
            return invalid("character_id", "must not be empty");
        }
        if self.gathering.poll_interval_ms == 0 {
            return invalid("gathering.poll_interval_ms", "must be greater than zero");
        }
        if self.gathering.max_quantity_goal == 0 {
            return invalid("gathering.max_quantity_goal", "must be at least 1");
        }
        if self.gathering.default_quantity_goal == 0
            || self.gathering.default_quantity_goal > self.gathering.max_quantity_goal
        {
            return invalid(
                "gathering.default_quantity_goal",
                "must be between 1 and gathering.max_quantity_goal",
            );
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key, validating the result. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// The material catalog this configuration points at.
    ///
    /// # Errors
    /// Returns an error if a custom catalog is configured but unreadable.
    pub fn catalog(&self) -> Result<StaticCatalog, ConfigError> {
        match self.materials.catalog_path.as_deref() {
            Some(path) if !path.trim().is_empty() => StaticCatalog::load(Path::new(path)),
            _ => Ok(StaticCatalog::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.gathering.poll_interval_ms, 1000);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("character_id = \"rook\"").unwrap();
        assert_eq!(parsed.character_id, "rook");
        assert_eq!(parsed.gathering, GatheringConfig::default());
        assert!(parsed.materials.catalog_path.is_none());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("gathering.poll_interval_ms").as_deref(), Some("1000"));
        assert_eq!(cfg.get("character_id").as_deref(), Some("adventurer"));
        assert!(cfg.get("gathering.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.set("gathering.default_quantity_goal", "25").unwrap();
        assert_eq!(cfg.gathering.default_quantity_goal, 25);
    }

    #[test]
    fn set_updates_optional_string() {
        let mut cfg = Config::default();
        cfg.set("materials.catalog_path", "/tmp/catalog.toml").unwrap();
        assert_eq!(cfg.materials.catalog_path.as_deref(), Some("/tmp/catalog.toml"));
        cfg.set("materials.catalog_path", "").unwrap();
        assert_eq!(cfg.materials.catalog_path.as_deref(), Some(""));
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("gathering.turbo", "true"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("gathering.poll_interval_ms", "fast").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_rejects_values_that_break_validation() {
        let mut cfg = Config::default();
        assert!(cfg.set("gathering.poll_interval_ms", "0").is_err());
        assert!(cfg.set("gathering.default_quantity_goal", "5000").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gathering]\npoll_interval_ms = 0\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn default_catalog_is_builtin() {
        let catalog = Config::default().catalog().unwrap();
        assert_eq!(catalog.len(), StaticCatalog::builtin().len());
    }
}
