//! Global context for srcbundle operations.
//!
//! Provides centralized access to configuration, paths, and environment.
//!
//! Two cache roots live under the project's build directory:
//! - `source-dependencies-all/` - downloaded archives and git checkouts
//! - `source-dependencies/` - extracted bundles, one directory per bundle name

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Directory (under the build dir) for pre-extraction artifacts.
pub const DOWNLOADS_DIR_NAME: &str = "source-dependencies-all";

/// Directory (under the build dir) for extracted bundles.
pub const BUNDLES_DIR_NAME: &str = "source-dependencies";

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Project root; relative local origins resolve against it
    cwd: PathBuf,

    /// Build directory holding the cache roots
    build_dir: PathBuf,

    /// Git executable
    git_program: PathBuf,

    /// Only cached bundles resolve
    offline: bool,
}

impl GlobalContext {
    /// Create a GlobalContext for the current directory, reading config files.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext for a project root, reading config files.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let global = global_config_path();
        let config = load_config(global.as_deref(), &project_config_path(&cwd));
        Self::from_config(cwd, &config)
    }

    /// Create a GlobalContext from an already loaded configuration.
    pub fn from_config(cwd: PathBuf, config: &Config) -> Self {
        let build_dir = match &config.cache.build_dir {
            Some(dir) => cwd.join(dir),
            None => cwd.join("build"),
        };

        let git_program = config
            .git
            .program
            .clone()
            .or_else(|| which::which("git").ok())
            .unwrap_or_else(|| PathBuf::from("git"));

        GlobalContext {
            cwd,
            build_dir,
            git_program,
            offline: config.net.offline,
        }
    }

    /// Override the build directory.
    pub fn with_build_dir(mut self, build_dir: impl AsRef<Path>) -> Self {
        self.build_dir = self.cwd.join(build_dir);
        self
    }

    /// Set offline mode.
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Override the git executable.
    pub fn with_git_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.git_program = program.into();
        self
    }

    /// Get the project root.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the build directory.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Cache root for downloaded archives and git checkouts.
    pub fn downloads_dir(&self) -> PathBuf {
        self.build_dir.join(DOWNLOADS_DIR_NAME)
    }

    /// Cache root for extracted bundles.
    pub fn bundles_dir(&self) -> PathBuf {
        self.build_dir.join(BUNDLES_DIR_NAME)
    }

    pub fn git_program(&self) -> &Path {
        &self.git_program
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_paths() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::from_config(tmp.path().to_path_buf(), &Config::default());

        assert_eq!(ctx.build_dir(), tmp.path().join("build"));
        assert_eq!(
            ctx.downloads_dir(),
            tmp.path().join("build").join(DOWNLOADS_DIR_NAME)
        );
        assert_eq!(
            ctx.bundles_dir(),
            tmp.path().join("build").join(BUNDLES_DIR_NAME)
        );
        assert!(!ctx.is_offline());
    }

    #[test]
    fn test_context_from_project_config() {
        let tmp = TempDir::new().unwrap();
        let config_path = project_config_path(tmp.path());
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(
            &config_path,
            "[cache]\nbuild-dir = \"out\"\n[git]\nprogram = \"my-git\"\n[net]\noffline = true\n",
        )
        .unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        assert_eq!(ctx.build_dir(), tmp.path().join("out"));
        assert_eq!(ctx.git_program(), Path::new("my-git"));
        assert!(ctx.is_offline());
    }

    #[test]
    fn test_build_dir_override_is_relative_to_root() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::from_config(tmp.path().to_path_buf(), &Config::default())
            .with_build_dir("target/bundles");
        assert_eq!(ctx.build_dir(), tmp.path().join("target/bundles"));
    }
}
