//! Resolved source bundles.
//!
//! A bundle is an extracted source tree laid out as
//! `src/<setName>{Main|Test}/{kotlin|resources}/`, plus the repositories and
//! dependencies its manifest declares. Bundles are immutable once created.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::declaration::Origin;
use crate::core::manifest::{DependencyEntry, Manifest, Repository};

/// Which root collection of a source set a directory feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RootKind {
    Kotlin,
    Resources,
}

impl RootKind {
    pub const ALL: [RootKind; 2] = [RootKind::Kotlin, RootKind::Resources];

    /// Directory name inside a source-set folder.
    pub fn dir_name(self) -> &'static str {
        match self {
            RootKind::Kotlin => "kotlin",
            RootKind::Resources => "resources",
        }
    }
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Compilation suffix of a source-set folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SetSuffix {
    Main,
    Test,
}

impl SetSuffix {
    /// `Test` when the set name ends in "test" (any case), else `Main`.
    pub fn for_set_name(name: &str) -> Self {
        if name.to_ascii_lowercase().ends_with("test") {
            SetSuffix::Test
        } else {
            SetSuffix::Main
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SetSuffix::Main => "Main",
            SetSuffix::Test => "Test",
        }
    }
}

/// An extracted bundle and its manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
    root_dir: PathBuf,
    source_name: String,
    repositories: Vec<Repository>,
    dependencies: Vec<DependencyEntry>,
}

impl Bundle {
    pub fn new(root_dir: PathBuf, source_name: impl Into<String>, manifest: Manifest) -> Self {
        Bundle {
            root_dir,
            source_name: source_name.into(),
            repositories: manifest.repositories,
            dependencies: manifest.dependencies,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    pub fn dependencies(&self) -> &[DependencyEntry] {
        &self.dependencies
    }

    /// `src/<folder>/<kind>` inside the bundle. The directory may not exist.
    pub fn source_dir(&self, folder: &str, kind: RootKind) -> PathBuf {
        self.root_dir.join("src").join(folder).join(kind.dir_name())
    }
}

/// A bundle together with how it was obtained.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedBundle {
    pub bundle: Bundle,
    pub origin: Origin,
    /// Tree hash, present only when this resolution populated the cache entry.
    pub computed_hash: Option<String>,
}

/// Output of the resolution phase, in declaration order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ResolvedBundles {
    bundles: Vec<ResolvedBundle>,
}

impl ResolvedBundles {
    pub fn new() -> Self {
        ResolvedBundles::default()
    }

    pub fn push(&mut self, resolved: ResolvedBundle) {
        self.bundles.push(resolved);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedBundle> {
        self.bundles.iter()
    }

    pub fn bundles(&self) -> impl Iterator<Item = &Bundle> {
        self.bundles.iter().map(|r| &r.bundle)
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Look up a bundle by source name.
    pub fn get(&self, source_name: &str) -> Option<&ResolvedBundle> {
        self.bundles
            .iter()
            .find(|r| r.bundle.source_name() == source_name)
    }

    /// Existing `src/<name>{Main|Test}/<kind>` directories across all bundles.
    pub fn source_paths(&self, name: &str, kind: RootKind, test: bool) -> BTreeSet<PathBuf> {
        let suffix = if test { SetSuffix::Test } else { SetSuffix::Main };
        let folder = format!("{}{}", name, suffix.as_str());

        self.bundles()
            .map(|b| b.source_dir(&folder, kind))
            .filter(|dir| dir.is_dir())
            .collect()
    }
}

impl<'a> IntoIterator for &'a ResolvedBundles {
    type Item = &'a ResolvedBundle;
    type IntoIter = std::slice::Iter<'a, ResolvedBundle>;

    fn into_iter(self) -> Self::IntoIter {
        self.bundles.iter()
    }
}
