//! Core data structures for srcbundle.
//!
//! This module contains the foundational types used throughout srcbundle:
//! - Declarations and their classified origins
//! - Bundles and their manifests
//! - Platform classification of compilation targets
//! - The project model bundles are applied to

pub mod bundle;
pub mod declaration;
pub mod errors;
pub mod manifest;
pub mod platform;
pub mod project;

pub use bundle::{Bundle, ResolvedBundle, ResolvedBundles, RootKind, SetSuffix};
pub use declaration::{Declaration, GitOrigin, Origin};
pub use errors::BundleError;
pub use manifest::{DependencyEntry, Manifest, Repository, MANIFEST_FILE};
pub use platform::{Category, CategorySet, Platform, TargetClassification};
pub use project::{Project, ProjectLayout, ProjectModel, SourceSet, Target};
