//! Bundle manifest (`dependencies.txt`) parsing.
//!
//! The manifest is line oriented:
//!
//! ```text
//! # comment
//! repository: https://maven.example.com/repo
//! commonMainImplementation: com.example:lib:1.0
//! ```
//!
//! A `repository` key declares a repository; any other key names the
//! dependency scope that receives the coordinate. Lines that do not parse
//! are skipped, never reported.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// Name of the manifest file at a bundle root.
pub const MANIFEST_FILE: &str = "dependencies.txt";

const REPOSITORY_KEY: &str = "repository";

/// A repository a bundle needs to resolve its dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Repository {
    pub url: String,
}

/// A dependency coordinate added to a named scope of the consuming project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DependencyEntry {
    pub scope: String,
    pub coordinate: String,
}

/// Parsed manifest of a bundle, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub repositories: Vec<Repository>,
    pub dependencies: Vec<DependencyEntry>,
}

impl Manifest {
    /// Parse manifest contents.
    pub fn parse(contents: &str) -> Self {
        let mut manifest = Manifest::default();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                continue;
            }

            if key == REPOSITORY_KEY {
                manifest.repositories.push(Repository {
                    url: value.to_string(),
                });
            } else {
                manifest.dependencies.push(DependencyEntry {
                    scope: key.to_string(),
                    coordinate: value.to_string(),
                });
            }
        }

        manifest
    }

    /// Load the manifest from a bundle root. A missing file is an empty manifest.
    pub fn load(bundle_root: &Path) -> Result<Self> {
        let path = bundle_root.join(MANIFEST_FILE);
        if !path.is_file() {
            return Ok(Manifest::default());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Ok(Self::parse(&contents))
    }

    /// Dependencies declared for one scope.
    pub fn dependencies_for_scope<'a>(
        &'a self,
        scope: &'a str,
    ) -> impl Iterator<Item = &'a DependencyEntry> + 'a {
        self.dependencies.iter().filter(move |d| d.scope == scope)
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty() && self.dependencies.is_empty()
    }
}
