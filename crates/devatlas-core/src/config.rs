use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AtlasError;
use crate::progress::MAX_STREAK_LOOKBACK_DAYS;

/// Environment override for the state directory.
pub const ENV_STATE_DIR: &str = "DEVATLAS_STATE_DIR";
/// Environment override for the catalog file.
pub const ENV_CATALOG: &str = "DEVATLAS_CATALOG";

/// User configuration from `~/.config/devatlas/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AtlasConfig {
    /// Catalog file replacing the built-in curriculum.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Directory holding `state.json`.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    /// Default output mode: `pretty`, `text`, or `json`.
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub streak: StreakConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakConfig {
    #[serde(default = "default_max_lookback_days")]
    pub max_lookback_days: u32,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            max_lookback_days: default_max_lookback_days(),
        }
    }
}

const fn default_max_lookback_days() -> u32 {
    MAX_STREAK_LOOKBACK_DAYS
}

/// Load the user config. A missing config directory or file yields defaults.
///
/// # Errors
///
/// Returns [`AtlasError::Config`] if the file exists but cannot be read or
/// parsed. Unlike progress state, config is hand-written and a typo should
/// be reported rather than silently ignored.
pub fn load_user_config() -> Result<AtlasConfig, AtlasError> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(AtlasConfig::default());
    };
    load_config_from(&config_dir.join("devatlas/config.toml"))
}

/// Load config from an explicit path. A missing file yields defaults.
///
/// # Errors
///
/// Returns [`AtlasError::Config`] if the file cannot be read or parsed.
pub fn load_config_from(path: &Path) -> Result<AtlasConfig, AtlasError> {
    if !path.exists() {
        return Ok(AtlasConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| AtlasError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    toml::from_str::<AtlasConfig>(&content).map_err(|e| AtlasError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Resolve the state directory: flag, then `DEVATLAS_STATE_DIR`, then config,
/// then the platform data dir.
#[must_use]
pub fn resolve_state_dir(cli_flag: Option<&Path>, config: &AtlasConfig) -> PathBuf {
    let env_value = std::env::var_os(ENV_STATE_DIR).map(PathBuf::from);
    resolve_state_dir_inner(cli_flag, env_value, config, dirs::data_dir())
}

fn resolve_state_dir_inner(
    cli_flag: Option<&Path>,
    env_value: Option<PathBuf>,
    config: &AtlasConfig,
    data_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(dir) = cli_flag {
        return dir.to_path_buf();
    }
    if let Some(dir) = env_value.filter(|dir| !dir.as_os_str().is_empty()) {
        return dir;
    }
    if let Some(dir) = &config.state_dir {
        return dir.clone();
    }
    data_dir.map_or_else(|| PathBuf::from(".devatlas"), |dir| dir.join("devatlas"))
}

/// Resolve an explicit catalog path, if any: flag, then `DEVATLAS_CATALOG`,
/// then config. `None` means the built-in catalog.
#[must_use]
pub fn resolve_catalog_path(cli_flag: Option<&Path>, config: &AtlasConfig) -> Option<PathBuf> {
    let env_value = std::env::var_os(ENV_CATALOG).map(PathBuf::from);
    resolve_catalog_path_inner(cli_flag, env_value, config)
}

fn resolve_catalog_path_inner(
    cli_flag: Option<&Path>,
    env_value: Option<PathBuf>,
    config: &AtlasConfig,
) -> Option<PathBuf> {
    cli_flag
        .map(Path::to_path_buf)
        .or_else(|| env_value.filter(|path| !path.as_os_str().is_empty()))
        .or_else(|| config.catalog.clone())
}
