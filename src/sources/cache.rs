//! On-disk bundle cache.
//!
//! Extracted bundles live under the bundles root, one directory per bundle
//! name. Downloads and git checkouts live under the downloads root; a git
//! checkout carries a `<pack path>.refname` marker recording the reference
//! it was last reset to.
//!
//! A bundle directory, once present, is never re-verified or re-extracted.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::{BundleError, Declaration, Origin};
use crate::sources::{GitSource, HttpSource, PathSource, Source};
use crate::util::context::GlobalContext;
use crate::util::fs::{dir_size, ensure_dir, list_subdirs, remove_dir_all_if_exists};
use crate::util::hash::sha256_tree;

/// Prefix of in-progress population directories.
const STAGING_PREFIX: &str = ".staging-";

/// Suffix of git ref marker files.
const MARKER_SUFFIX: &str = ".refname";

/// A bundle directory made available by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    pub dir: PathBuf,
    /// Tree hash, present only when this call populated the directory.
    pub computed_hash: Option<String>,
}

/// A cached bundle, as listed by `cache list`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Key to directory mapping for bundles, downloads and checkouts.
#[derive(Debug, Clone)]
pub struct BundleCache {
    downloads_dir: PathBuf,
    bundles_dir: PathBuf,
}

impl BundleCache {
    pub fn new(ctx: &GlobalContext) -> Self {
        BundleCache {
            downloads_dir: ctx.downloads_dir(),
            bundles_dir: ctx.bundles_dir(),
        }
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    pub fn bundles_dir(&self) -> &Path {
        &self.bundles_dir
    }

    /// Directory of an extracted bundle.
    pub fn bundle_dir(&self, bundle_name: &str) -> PathBuf {
        self.bundles_dir.join(bundle_name)
    }

    /// File a download for `base_name` is stored in.
    pub fn download_path(&self, base_name: &str, ext: &str) -> PathBuf {
        self.downloads_dir.join(format!("{}.{}", base_name, ext))
    }

    /// Checkout directory for a sanitized git pack path.
    pub fn checkout_dir(&self, pack_path: &str) -> PathBuf {
        self.downloads_dir.join(pack_path)
    }

    /// Ref marker beside a git checkout.
    pub fn marker_path(&self, pack_path: &str) -> PathBuf {
        self.downloads_dir
            .join(format!("{}{}", pack_path, MARKER_SUFFIX))
    }

    /// The reference a checkout was last reset to, if recorded.
    pub fn read_marker(&self, pack_path: &str) -> Option<String> {
        std::fs::read_to_string(self.marker_path(pack_path)).ok()
    }

    pub fn write_marker(&self, pack_path: &str, reference: &str) -> Result<()> {
        let marker = self.marker_path(pack_path);
        if let Some(parent) = marker.parent() {
            ensure_dir(parent)?;
        }
        std::fs::write(&marker, reference)
            .with_context(|| format!("failed to write ref marker: {}", marker.display()))
    }

    pub fn is_populated(&self, bundle_name: &str) -> bool {
        self.bundle_dir(bundle_name).is_dir()
    }

    /// Make the bundle directory for `bundle_name` available.
    ///
    /// On a cache hit nothing is read or hashed. Otherwise `fill` writes the
    /// tree into a staging directory beside the final one; the staged tree is
    /// hashed and checked against `expected_hash` before being moved into
    /// place. On a mismatch the staging directory is removed and no entry
    /// is left behind.
    pub fn populate<F>(
        &self,
        bundle_name: &str,
        expected_hash: Option<&str>,
        fill: F,
    ) -> Result<Materialized>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        let dir = self.bundle_dir(bundle_name);
        if dir.is_dir() {
            tracing::debug!("Bundle `{}` already extracted at {}", bundle_name, dir.display());
            return Ok(Materialized {
                dir,
                computed_hash: None,
            });
        }

        ensure_dir(&self.bundles_dir)?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.bundles_dir)
            .with_context(|| {
                format!("failed to create staging directory in {}", self.bundles_dir.display())
            })?;

        fill(staging.path())?;

        let computed = sha256_tree(staging.path())?;
        match expected_hash {
            None => tracing::warn!(
                "Not checking SHA256 for bundle `{}`. Pin it with SHA256 = {}",
                bundle_name,
                computed
            ),
            Some(expected) if !expected.eq_ignore_ascii_case(&computed) => {
                return Err(BundleError::IntegrityMismatch {
                    bundle: bundle_name.to_string(),
                    expected: expected.to_string(),
                    actual: computed,
                }
                .into());
            }
            Some(_) => tracing::info!("Matching bundle SHA256 = {}", computed),
        }

        if let Some(parent) = dir.parent() {
            ensure_dir(parent)?;
        }
        std::fs::rename(staging.path(), &dir).with_context(|| {
            format!(
                "failed to move {} into {}",
                staging.path().display(),
                dir.display()
            )
        })?;

        Ok(Materialized {
            dir,
            computed_hash: Some(computed),
        })
    }

    /// Create the source that materializes a declaration.
    pub fn create_source(&self, ctx: &GlobalContext, decl: &Declaration) -> Result<Box<dyn Source>> {
        let expected = decl.expected_hash().map(str::to_string);
        let base_name = decl.base_name().map(str::to_string);
        if let Some(name) = &base_name {
            check_bundle_name(decl.raw(), name)?;
        }

        let source: Box<dyn Source> = match decl.origin() {
            Origin::Path { path } => Box::new(PathSource::new(
                self.clone(),
                ctx.cwd().join(path),
                base_name,
                expected,
            )?),
            Origin::Http { url } => Box::new(HttpSource::new(
                self.clone(),
                url.clone(),
                base_name,
                expected,
                ctx.is_offline(),
            )?),
            Origin::Git(git) => Box::new(GitSource::new(
                self.clone(),
                git.clone(),
                base_name,
                expected,
                ctx,
            )?),
        };

        Ok(source)
    }

    /// Every extracted bundle, sorted by name.
    pub fn list(&self) -> Result<Vec<CacheEntry>> {
        let mut entries = Vec::new();
        for path in list_subdirs(&self.bundles_dir)? {
            let name = match path.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };
            if name.starts_with(STAGING_PREFIX) {
                continue;
            }
            entries.push(CacheEntry {
                size: dir_size(&path),
                name,
                path,
            });
        }
        Ok(entries)
    }

    /// Remove both cache roots.
    pub fn clean(&self) -> Result<()> {
        remove_dir_all_if_exists(&self.bundles_dir)?;
        remove_dir_all_if_exists(&self.downloads_dir)?;
        Ok(())
    }
}

/// An explicit bundle name must be a single plain path component.
fn check_bundle_name(origin: &str, name: &str) -> Result<(), BundleError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.starts_with(STAGING_PREFIX) => Ok(()),
        _ => Err(BundleError::invalid_origin(
            origin,
            format!("bundle name `{}` must be a single directory name", name),
        )),
    }
}
