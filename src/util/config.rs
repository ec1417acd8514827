//! Configuration file support for srcbundle.
//!
//! Two configuration file locations are read:
//! - Global: `<config dir>/srcbundle/config.toml` - User-wide defaults
//! - Project: `.srcbundle/config.toml` - Project-specific overrides
//!
//! Values from the project file override the global file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// srcbundle configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache locations
    pub cache: CacheConfig,

    /// Git invocation
    pub git: GitConfig,

    /// Network settings
    pub net: NetConfig,
}

/// Cache-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Build directory holding both cache roots (default: `<project>/build`)
    pub build_dir: Option<PathBuf>,
}

/// Git-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Git executable (default: `git` from PATH)
    pub program: Option<PathBuf>,
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Offline mode (only cached bundles resolve)
    pub offline: bool,
}

impl Config {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// Defaults when `path` is missing. An unreadable or invalid file is
    /// reported and ignored.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.is_file() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Overlay `other` on top of `self`; values set in `other` win.
    pub fn merge(&mut self, other: Config) {
        if other.cache.build_dir.is_some() {
            self.cache.build_dir = other.cache.build_dir;
        }
        if other.git.program.is_some() {
            self.git.program = other.git.program;
        }
        if other.net.offline {
            self.net.offline = true;
        }
    }
}

/// Get the global srcbundle config path.
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "srcbundle", "srcbundle")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Get the project config path (.srcbundle/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".srcbundle").join("config.toml")
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.srcbundle/config.toml)
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}
