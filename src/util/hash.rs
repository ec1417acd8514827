//! Hashing utilities for bundle integrity.
//!
//! The tree hash is a single SHA-256 over every included file, taken in
//! codepoint order of its forward-slash relative path. Each file contributes
//! the UTF-8 bytes of `"<path>[<byteLength>]"` followed by its raw bytes, so
//! the result depends only on paths, sizes and contents.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// Compute SHA256 hash of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Forward-slash form of a relative path, without leading or trailing slashes.
pub fn normalize_relative(path: &Path) -> String {
    let parts: Vec<_> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    parts.join("/").trim_matches('/').to_string()
}

/// Whether a normalized relative path is left out of the tree hash.
///
/// Excludes anything under a `.git` segment and files named exactly
/// `.DS_Store` or `thumbs.db`.
pub fn is_excluded(relative: &str) -> bool {
    let mut segments = relative.split('/');
    if segments.clone().any(|s| s == ".git") {
        return true;
    }
    matches!(segments.next_back(), Some(".DS_Store") | Some("thumbs.db"))
}

/// Compute the tree hash of a directory.
pub fn sha256_tree(root: &Path) -> Result<String> {
    let mut files: BTreeMap<String, PathBuf> = BTreeMap::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let key = normalize_relative(relative);
        if !is_excluded(&key) {
            files.insert(key, entry.into_path());
        }
    }

    let mut hasher = Sha256::new();
    for (key, path) in &files {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        let header = format!("{}[{}]", key, bytes.len());
        hasher.update(header.as_bytes());
        hasher.update(&bytes);

        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!("SHA256: {}: {}", header, hex::encode(hasher.clone().finalize()));
        }
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_tree;
    use tempfile::TempDir;

    #[test]
    fn test_sha256_bytes() {
        assert_eq!(
            sha256_bytes(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_tree_hash_known_value() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), &[("dir/b.txt", "bye"), ("a.txt", "hi")]);

        assert_eq!(
            sha256_tree(tmp.path()).unwrap(),
            "47ee92e21124416c90715476cb019f57eede33734a968ee67cd7ba67322c87f6"
        );
    }

    #[test]
    fn test_empty_tree_hash() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            sha256_tree(tmp.path()).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_git_directory_is_excluded() {
        let with_git = TempDir::new().unwrap();
        write_tree(with_git.path(), &[("a.txt", "hi"), (".git/x", "junk")]);
        let plain = TempDir::new().unwrap();
        write_tree(plain.path(), &[("a.txt", "hi")]);

        assert_eq!(
            sha256_tree(with_git.path()).unwrap(),
            sha256_tree(plain.path()).unwrap()
        );
        assert_eq!(
            sha256_tree(plain.path()).unwrap(),
            "379cf725d61232c88a4201314082dc126723972da0161b6e7d4e98f19623a427"
        );
    }

    #[test]
    fn test_os_metadata_files_are_excluded() {
        let tmp = TempDir::new().unwrap();
        write_tree(
            tmp.path(),
            &[("a.txt", "hi"), ("sub/.DS_Store", "x"), ("thumbs.db", "y")],
        );
        assert_eq!(
            sha256_tree(tmp.path()).unwrap(),
            "379cf725d61232c88a4201314082dc126723972da0161b6e7d4e98f19623a427"
        );
    }

    #[test]
    fn test_exclusion_is_case_sensitive() {
        assert!(is_excluded("thumbs.db"));
        assert!(is_excluded("a/b/.DS_Store"));
        assert!(is_excluded(".git/HEAD"));
        assert!(is_excluded("vendor/.git/objects/ab"));
        assert!(!is_excluded("Thumbs.DB"));
        assert!(!is_excluded(".gitignore"));
        assert!(!is_excluded(".github/workflows/ci.yml"));
        assert!(!is_excluded("x.DS_Store"));
    }

    #[test]
    fn test_hash_sensitive_to_rename_and_content() {
        let base = TempDir::new().unwrap();
        write_tree(base.path(), &[("a.txt", "hi")]);
        let renamed = TempDir::new().unwrap();
        write_tree(renamed.path(), &[("b.txt", "hi")]);
        let changed = TempDir::new().unwrap();
        write_tree(changed.path(), &[("a.txt", "ho")]);
        let added = TempDir::new().unwrap();
        write_tree(added.path(), &[("a.txt", "hi"), ("c.txt", "")]);

        let h = sha256_tree(base.path()).unwrap();
        assert_ne!(h, sha256_tree(renamed.path()).unwrap());
        assert_ne!(h, sha256_tree(changed.path()).unwrap());
        assert_ne!(h, sha256_tree(added.path()).unwrap());
    }

    #[test]
    fn test_hash_ignores_mtime() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), &[("a.txt", "hi")]);
        let before = sha256_tree(tmp.path()).unwrap();

        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(tmp.path().join("a.txt"))
            .unwrap();
        file.set_modified(std::time::SystemTime::UNIX_EPOCH).unwrap();
        drop(file);

        assert_eq!(before, sha256_tree(tmp.path()).unwrap());
    }

    #[test]
    fn test_normalize_relative() {
        assert_eq!(normalize_relative(Path::new("a/b/c.txt")), "a/b/c.txt");
        assert_eq!(normalize_relative(Path::new("./a/b/")), "a/b");
    }
}
