//! The consuming project's target model.
//!
//! The embedding build tool owns its projects, targets and source sets. It
//! exposes them through [`ProjectModel`], resolved once into either a
//! single-target or a multiplatform layout before bundles are applied.
//! [`Project`] is an in-memory implementation loaded from a TOML description.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::bundle::RootKind;
use crate::core::errors::BundleError;
use crate::core::platform::TargetClassification;

/// Shape of the project's compilation setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProjectLayout {
    /// One target; `jvm` when that target compiles for the JVM.
    SingleTarget { jvm: bool },
    Multiplatform,
}

/// A compilation target and the logical source sets it compiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub name: String,
    pub classification: TargetClassification,
    pub source_sets: Vec<String>,
}

impl Target {
    pub fn new<I, S>(name: impl Into<String>, source_sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        Target {
            classification: TargetClassification::for_target(&name),
            name,
            source_sets: source_sets.into_iter().map(Into::into).collect(),
        }
    }
}

/// A named set of code and resource roots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceSet {
    pub name: String,
    pub kotlin: BTreeSet<PathBuf>,
    pub resources: BTreeSet<PathBuf>,
}

impl SourceSet {
    pub fn new(name: impl Into<String>) -> Self {
        SourceSet {
            name: name.into(),
            ..SourceSet::default()
        }
    }

    pub fn roots(&self, kind: RootKind) -> &BTreeSet<PathBuf> {
        match kind {
            RootKind::Kotlin => &self.kotlin,
            RootKind::Resources => &self.resources,
        }
    }

    fn roots_mut(&mut self, kind: RootKind) -> &mut BTreeSet<PathBuf> {
        match kind {
            RootKind::Kotlin => &mut self.kotlin,
            RootKind::Resources => &mut self.resources,
        }
    }
}

/// What bundle application needs from the host project.
pub trait ProjectModel {
    /// Single-target or multiplatform.
    fn layout(&self) -> ProjectLayout;

    /// Compilation targets, each with its owned source-set names.
    fn targets(&self) -> &[Target];

    /// Register a source root. Returns false when it was already registered.
    fn add_source_root(&mut self, source_set: &str, kind: RootKind, dir: &Path) -> bool;

    /// Register a repository. Returns false when it was already registered.
    fn add_repository(&mut self, url: &str) -> bool;

    /// Add a coordinate to a named dependency scope.
    ///
    /// Fails with [`BundleError::UnavailableScope`] when the scope is not declared.
    fn add_dependency(&mut self, scope: &str, coordinate: &str) -> Result<(), BundleError>;
}

/// In-memory project model.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    layout: ProjectLayout,
    targets: Vec<Target>,
    source_sets: BTreeMap<String, SourceSet>,
    repositories: Vec<String>,
    scopes: BTreeMap<String, Vec<String>>,
}

impl Project {
    /// A multiplatform project with no targets yet.
    pub fn multiplatform() -> Self {
        Project {
            layout: ProjectLayout::Multiplatform,
            targets: Vec::new(),
            source_sets: BTreeMap::new(),
            repositories: Vec::new(),
            scopes: BTreeMap::new(),
        }
    }

    /// A single-target project compiling `source_sets`.
    pub fn single_target<I, S>(target: &str, source_sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let target = Target::new(target, source_sets);
        let layout = ProjectLayout::SingleTarget {
            jvm: target.classification.platform.is_jvm(),
        };
        let mut project = Project {
            layout,
            ..Project::multiplatform()
        };
        project.push_target(target);
        project
    }

    /// Add a target to a multiplatform project.
    pub fn with_target<I, S>(mut self, name: &str, source_sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_target(Target::new(name, source_sets));
        self
    }

    /// Declare a dependency scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.entry(scope.into()).or_default();
        self
    }

    fn push_target(&mut self, target: Target) {
        for set in &target.source_sets {
            self.source_sets
                .entry(set.clone())
                .or_insert_with(|| SourceSet::new(set.clone()));
        }
        self.targets.push(target);
    }

    /// Load a project description from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read project description: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("failed to parse project description: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let desc: ProjectDescription = toml::from_str(contents)?;

        let mut project = match desc.kind {
            ProjectKind::SingleTarget => {
                let [target] = desc.targets.as_slice() else {
                    bail!(
                        "a single-target project needs exactly one target, found {}",
                        desc.targets.len()
                    );
                };
                Project::single_target(&target.name, target.source_sets.iter().cloned())
            }
            ProjectKind::Multiplatform => desc
                .targets
                .iter()
                .fold(Project::multiplatform(), |project, target| {
                    project.with_target(&target.name, target.source_sets.iter().cloned())
                }),
        };

        for scope in desc.scopes {
            project = project.with_scope(scope);
        }

        Ok(project)
    }

    pub fn source_set(&self, name: &str) -> Option<&SourceSet> {
        self.source_sets.get(name)
    }

    pub fn source_sets(&self) -> impl Iterator<Item = &SourceSet> {
        self.source_sets.values()
    }

    pub fn repositories(&self) -> &[String] {
        &self.repositories
    }

    /// Coordinates added to a scope, or None if the scope is undeclared.
    pub fn scope(&self, name: &str) -> Option<&[String]> {
        self.scopes.get(name).map(Vec::as_slice)
    }
}

impl ProjectModel for Project {
    fn layout(&self) -> ProjectLayout {
        self.layout
    }

    fn targets(&self) -> &[Target] {
        &self.targets
    }

    fn add_source_root(&mut self, source_set: &str, kind: RootKind, dir: &Path) -> bool {
        self.source_sets
            .entry(source_set.to_string())
            .or_insert_with(|| SourceSet::new(source_set))
            .roots_mut(kind)
            .insert(dir.to_path_buf())
    }

    fn add_repository(&mut self, url: &str) -> bool {
        if self.repositories.iter().any(|r| r == url) {
            return false;
        }
        self.repositories.push(url.to_string());
        true
    }

    fn add_dependency(&mut self, scope: &str, coordinate: &str) -> Result<(), BundleError> {
        match self.scopes.get_mut(scope) {
            Some(coordinates) => {
                coordinates.push(coordinate.to_string());
                Ok(())
            }
            None => Err(BundleError::UnavailableScope {
                scope: scope.to_string(),
                coordinate: coordinate.to_string(),
            }),
        }
    }
}

/// On-disk project description.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ProjectDescription {
    kind: ProjectKind,
    #[serde(default)]
    scopes: Vec<String>,
    #[serde(default)]
    targets: Vec<TargetDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ProjectKind {
    SingleTarget,
    Multiplatform,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TargetDescription {
    name: String,
    #[serde(default)]
    source_sets: Vec<String>,
}
