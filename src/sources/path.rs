//! Path source - bundles from a local directory or archive.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::BundleError;
use crate::sources::cache::{BundleCache, Materialized};
use crate::sources::Source;
use crate::util::archive::{extract_archive, ArchiveFormat};
use crate::util::fs::copy_dir_all;

/// A source for a local bundle directory or archive.
pub struct PathSource {
    cache: BundleCache,

    /// Directory or archive file
    path: PathBuf,

    bundle_name: String,

    expected_hash: Option<String>,
}

impl PathSource {
    pub fn new(
        cache: BundleCache,
        path: PathBuf,
        base_name: Option<String>,
        expected_hash: Option<String>,
    ) -> Result<Self> {
        let bundle_name = match base_name {
            Some(name) => name,
            None => default_bundle_name(&path).ok_or_else(|| {
                BundleError::invalid_origin(
                    path.display().to_string(),
                    "cannot derive a bundle name from this path",
                )
            })?,
        };

        Ok(PathSource {
            cache,
            path,
            bundle_name,
            expected_hash,
        })
    }
}

/// Bundle name for a local path.
///
/// Directories keep their full name. Files drop a recognized archive
/// suffix, or else their last extension.
pub fn default_bundle_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_string_lossy().into_owned();
    if path.is_dir() {
        return Some(file_name);
    }

    if let Some((stem, _, _)) = ArchiveFormat::split_suffix(&file_name) {
        return Some(stem.to_string());
    }

    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

impl Source for PathSource {
    fn name(&self) -> &str {
        "path"
    }

    fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    fn is_cached(&self) -> bool {
        self.cache.is_populated(&self.bundle_name)
    }

    fn materialize(&mut self) -> Result<Materialized> {
        if !self.is_cached() && !self.path.exists() {
            return Err(BundleError::acquisition_failed(
                self.path.display().to_string(),
                "no such file or directory",
            )
            .into());
        }

        let src = self.path.as_path();
        self.cache
            .populate(&self.bundle_name, self.expected_hash.as_deref(), |staging| {
                if src.is_dir() {
                    tracing::info!("Copying {}", src.display());
                    copy_dir_all(src, staging)
                } else {
                    tracing::info!("Extracting {}", src.display());
                    extract_archive(src, staging)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{list_files, test_context, write_tar_gz, write_tree, write_zip};
    use tempfile::TempDir;

    fn source(tmp: &TempDir, path: PathBuf, expected: Option<&str>) -> PathSource {
        let cache = BundleCache::new(&test_context(tmp.path()));
        PathSource::new(cache, path, None, expected.map(str::to_string)).unwrap()
    }

    #[test]
    fn test_default_bundle_name() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("korio.v1");
        std::fs::create_dir_all(&dir).unwrap();

        assert_eq!(default_bundle_name(&dir).as_deref(), Some("korio.v1"));
        assert_eq!(
            default_bundle_name(&tmp.path().join("a-1.0.tar.gz")).as_deref(),
            Some("a-1.0")
        );
        assert_eq!(
            default_bundle_name(&tmp.path().join("lib.kotlinsourcezip")).as_deref(),
            Some("lib")
        );
        assert_eq!(
            default_bundle_name(&tmp.path().join("lib.bin")).as_deref(),
            Some("lib")
        );
    }

    #[test]
    fn test_directory_bundle_is_copied() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("mylib");
        write_tree(&src, &[("src/commonMain/kotlin/A.kt", "class A")]);

        let mut source = source(&tmp, src.clone(), None);
        assert_eq!(source.bundle_name(), "mylib");
        assert!(!source.is_cached());

        let done = source.materialize().unwrap();
        assert!(done.computed_hash.is_some());
        assert_eq!(list_files(&src), list_files(&done.dir));
        assert!(source.is_cached());
    }

    #[test]
    fn test_zip_and_tarball_bundles_hash_alike() {
        let tmp = TempDir::new().unwrap();
        let files = [("src/commonMain/kotlin/A.kt", "class A"), ("dependencies.txt", "")];
        write_zip(&tmp.path().join("z.zip"), &files);
        write_tar_gz(&tmp.path().join("t.tar.gz"), &files);

        let zip = source(&tmp, tmp.path().join("z.zip"), None).materialize().unwrap();
        let tar = source(&tmp, tmp.path().join("t.tar.gz"), None).materialize().unwrap();

        assert!(zip.dir.ends_with("z"));
        assert!(tar.dir.ends_with("t"));
        assert_eq!(zip.computed_hash, tar.computed_hash);
    }

    #[test]
    fn test_cache_hit_skips_source() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("lib.zip");
        write_zip(&archive, &[("a.txt", "hi")]);

        source(&tmp, archive.clone(), None).materialize().unwrap();
        std::fs::remove_file(&archive).unwrap();

        // The archive is gone but the extracted bundle still resolves.
        let again = source(&tmp, archive, None).materialize().unwrap();
        assert!(again.computed_hash.is_none());
        assert!(again.dir.join("a.txt").is_file());
    }

    #[test]
    fn test_missing_path_fails() {
        let tmp = TempDir::new().unwrap();
        let err = source(&tmp, tmp.path().join("nope.zip"), None)
            .materialize()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BundleError>(),
            Some(BundleError::AcquisitionFailed { .. })
        ));
    }
}
