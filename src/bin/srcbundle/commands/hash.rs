//! `srcbundle hash` command
//!
//! Prints the tree hash of a directory or archive, for pinning with `##`.

use anyhow::{bail, Context, Result};

use crate::cli::HashArgs;
use srcbundle::util::archive::extract_archive;
use srcbundle::util::hash::sha256_tree;
use srcbundle::util::shell::Shell;

pub fn execute(args: HashArgs, shell: &Shell) -> Result<()> {
    let path = &args.path;

    let hash = if path.is_dir() {
        sha256_tree(path)?
    } else if path.is_file() {
        let tmp = tempfile::tempdir().context("failed to create temporary directory")?;
        extract_archive(path, tmp.path())?;
        sha256_tree(tmp.path())?
    } else {
        bail!("no such file or directory: {}", path.display());
    };

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "hash",
            "path": path,
            "sha256": hash,
        }));
    } else {
        shell.print(&hash);
    }

    Ok(())
}
