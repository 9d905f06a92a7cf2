use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::UpwireConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["upwire.toml", "upwire.yaml", "upwire.yml", "upwire.json"];

static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Pin config discovery to a single directory (CLI `--config-dir`).
/// Replaces both standard search locations until cleared.
pub fn set_config_dir(path: impl Into<PathBuf>) {
    *CONFIG_DIR_OVERRIDE.lock().unwrap_or_else(|e| e.into_inner()) = Some(path.into());
}

/// Restore the standard search order.
pub fn clear_config_dir() {
    *CONFIG_DIR_OVERRIDE.lock().unwrap_or_else(|e| e.into_inner()) = None;
}

fn override_dir() -> Option<PathBuf> {
    CONFIG_DIR_OVERRIDE.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<UpwireConfig> {
    let raw = std::fs::read_to_string(path)?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. the override directory, when one is set
/// 2. `./upwire.{toml,yaml,yml,json}` (project-local)
/// 3. `~/.config/upwire/upwire.{toml,yaml,yml,json}` (user-global)
///
/// Returns `UpwireConfig::default()` if no config file is found.
pub fn discover_and_load() -> UpwireConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            }
        }
    } else {
        debug!("no config file found, using defaults");
    }
    UpwireConfig::default()
}

/// Find the first config file in the active search locations.
fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = override_dir() {
        return first_existing(&dir);
    }

    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "upwire") {
        return first_existing(dirs.config_dir());
    }
    None
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES.iter().map(|name| dir.join(name)).find(|p| p.exists())
}

fn parse_config(raw: &str, path: &Path) -> Result<UpwireConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| parse_error(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| parse_error(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| parse_error(path, e)),
        _ => Err(Error::UnknownExtension(ext.to_string())),
    }
}

fn parse_error(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::Parse { path: path.to_path_buf(), message: err.to_string() }
}
