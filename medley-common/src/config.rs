//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Resolve the Medley root folder, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. `MEDLEY_ROOT_FOLDER` environment variable
/// 3. `root_folder` key in the TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    if let Ok(path) = std::env::var("MEDLEY_ROOT_FOLDER") {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    if let Ok(config_path) = find_config_file() {
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(root_folder));
                }
            }
        }
    }

    Ok(default_root_folder())
}

/// Create the root folder if it does not already exist
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    if !root.exists() {
        std::fs::create_dir_all(root)?;
        tracing::info!("Created root folder: {}", root.display());
    }
    Ok(())
}

/// Path of the shared Medley database inside the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join("medley.db")
}

/// Locate the platform configuration file (`config.toml`)
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // ~/.config/medley/config.toml first, then /etc/medley/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("medley").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/medley/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let path = dirs::config_dir()
        .map(|d| d.join("medley").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("medley"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/medley"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("medley"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/medley"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("medley"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\medley"))
    } else {
        PathBuf::from("./medley_data")
    }
}
