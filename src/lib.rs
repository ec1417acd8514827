//! srcbundle - fetch, verify and cache source bundles and wire them into
//! platform source sets.
//!
//! A bundle is declared as `origin["##"sha256]`, where the origin is a local
//! directory or archive, an HTTP(S) URL, or `repo.git[::subfolder[::ref]]`.
//! [`ops::resolve`] materializes bundles into the build directory, checking
//! the tree hash on first extraction; [`ops::apply`] registers their
//! repositories, dependencies and source roots with a [`core::ProjectModel`].

pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test fixtures for srcbundle unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// builds bundle trees, archives and git repositories on disk.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    Bundle, BundleError, Declaration, Manifest, Origin, Project, ProjectModel, ResolvedBundle,
    ResolvedBundles,
};
pub use ops::{apply, resolve, ApplyReport};
pub use util::context::GlobalContext;
