mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, GatheringConfig, MaterialsConfig};
pub use database::{Database, InventoryEntry};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/eternal-realms[-dev]/`.
///
/// `REALMS_DATA_DIR` overrides the location entirely; otherwise
/// `REALMS_ENV=dev` selects the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("REALMS_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("REALMS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("eternal-realms-dev")
            } else {
                base_dir.join("eternal-realms")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
