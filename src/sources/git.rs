//! Git source - bundles from a subtree of a git repository at a reference.
//!
//! Checkouts are made with the git CLI under the downloads root, keyed by
//! the sanitized `host/path/ref` pack path. After a hard reset the `.git`
//! directory is deleted and a `<pack path>.refname` marker records the
//! reference, so the checkout is a plain tree pinned to that reference.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use url::Url;

use crate::core::{BundleError, GitOrigin};
use crate::sources::cache::{BundleCache, Materialized};
use crate::sources::Source;
use crate::util::context::GlobalContext;
use crate::util::fs::{copy_dir_all, ensure_dir, remove_dir_all_if_exists};
use crate::util::process::ProcessBuilder;

static SLASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new("/+").expect("valid regex"));

/// A source for git repositories.
pub struct GitSource {
    cache: BundleCache,

    origin: GitOrigin,

    /// Selected subtree, relative to the checkout
    subfolder: PathBuf,

    /// Cache key of the checkout
    pack_path: String,

    bundle_name: String,

    expected_hash: Option<String>,

    git_program: PathBuf,

    offline: bool,
}

impl GitSource {
    pub fn new(
        cache: BundleCache,
        origin: GitOrigin,
        base_name: Option<String>,
        expected_hash: Option<String>,
        ctx: &GlobalContext,
    ) -> Result<Self> {
        let pack_path = pack_path(&origin.repo, &origin.reference)?;

        let mut subfolder = PathBuf::new();
        for component in Path::new(&origin.subfolder).components() {
            match component {
                Component::Normal(part) => subfolder.push(part),
                Component::RootDir | Component::CurDir => {}
                _ => {
                    return Err(BundleError::invalid_origin(
                        origin.repo.as_str(),
                        format!("subfolder `{}` must stay inside the repository", origin.subfolder),
                    )
                    .into())
                }
            }
        }

        let bundle_name =
            base_name.unwrap_or_else(|| default_bundle_name(&pack_path, &origin.subfolder));

        Ok(GitSource {
            cache,
            origin,
            subfolder,
            pack_path,
            bundle_name,
            expected_hash,
            git_program: ctx.git_program().to_path_buf(),
            offline: ctx.is_offline(),
        })
    }

    pub fn pack_path(&self) -> &str {
        &self.pack_path
    }

    /// Directory of the checkout, before subfolder selection.
    pub fn checkout_dir(&self) -> PathBuf {
        self.cache.checkout_dir(&self.pack_path)
    }

    fn git(&self, dir: &Path) -> ProcessBuilder {
        ProcessBuilder::new(&self.git_program)
            .args(["-c", "core.autocrlf=false"])
            .cwd(dir)
    }

    /// Run git, mapping any failure to an acquisition error.
    fn run(&self, cmd: ProcessBuilder) -> Result<()> {
        cmd.exec_and_check()
            .map_err(|e| BundleError::acquisition_failed(self.origin.repo.as_str(), format!("{:#}", e)))?;
        Ok(())
    }

    /// Bring the checkout to the declared reference.
    ///
    /// A matching marker means nothing to do. A `.git` directory without a
    /// matching marker is an interrupted earlier run: the clone is reused and
    /// only the reset and cleanup are repeated.
    fn ensure_checkout(&self) -> Result<()> {
        let dir = self.checkout_dir();
        let reference = &self.origin.reference;

        if self.cache.read_marker(&self.pack_path).as_deref() == Some(reference.as_str()) {
            tracing::debug!("Already at reference {} @ {}", reference, self.origin.repo);
            return Ok(());
        }

        if dir.join(".git").is_dir() {
            tracing::info!("Already cloned {}", self.origin.repo);
        } else {
            if self.offline {
                return Err(BundleError::acquisition_failed(
                    self.origin.repo.as_str(),
                    "not cloned yet and offline mode is enabled",
                )
                .into());
            }

            remove_dir_all_if_exists(&dir)?;
            ensure_dir(&dir)?;

            tracing::info!("Cloning {} @ {}", self.origin.repo, reference);
            self.run(
                self.git(&dir)
                    .arg("clone")
                    .arg(self.origin.repo.as_str())
                    .arg("."),
            )?;
        }

        tracing::info!("Resetting {} to {}", self.pack_path, reference);
        self.run(self.git(&dir).args(["reset", "--hard"]).arg(reference))?;

        remove_dir_all_if_exists(&dir.join(".git"))?;
        self.cache.write_marker(&self.pack_path, reference)?;

        Ok(())
    }
}

/// Sanitized cache key for a repository at a reference.
///
/// Lowercases host and path, turns backslashes into slashes, collapses
/// repeated slashes and strips `.git` suffixes from each segment. The
/// reference keeps its case and becomes the last segment, with `%` and `/`
/// percent-encoded so checkouts of `a` and `a/b` never nest. A `..`
/// segment is rejected.
pub fn pack_path(repo: &Url, reference: &str) -> Result<String, BundleError> {
    let invalid = |reason: &str| {
        BundleError::invalid_origin(format!("{}::{}", repo, reference), reason)
    };

    let location = format!("{}/{}", repo.host_str().unwrap_or_default(), repo.path())
        .to_lowercase()
        .replace('\\', "/");
    let collapsed = SLASHES.replace_all(&location, "/");

    let mut segments = Vec::new();
    for segment in collapsed.trim_matches('/').split('/') {
        if segment == ".." {
            return Err(invalid("`..` segments are not allowed in git origins"));
        }
        let segment = segment.strip_suffix(".git").unwrap_or(segment);
        if segment.is_empty() || segment == "." {
            continue;
        }
        segments.push(segment.replace(':', "_"));
    }

    if segments.is_empty() {
        return Err(BundleError::invalid_origin(repo.as_str(), "empty repository path"));
    }

    let reference = reference.replace('\\', "/");
    if reference.split('/').any(|part| part == "..") {
        return Err(invalid("`..` segments are not allowed in git origins"));
    }
    let encoded = reference
        .replace('%', "%25")
        .replace('/', "%2F")
        .replace(':', "_");
    if encoded.is_empty() || encoded == "." {
        return Err(invalid("empty git reference"));
    }
    segments.push(encoded);

    Ok(segments.join("/"))
}

/// Bundle name for a checkout: the pack path and subfolder joined with `-`.
fn default_bundle_name(pack_path: &str, subfolder: &str) -> String {
    let mut name = pack_path.replace('/', "-");
    let subfolder = subfolder.trim_matches(|c: char| c == '/' || c == '\\');
    if !subfolder.is_empty() {
        name.push('-');
        name.push_str(&subfolder.replace(['/', '\\'], "-"));
    }
    name
}

impl Source for GitSource {
    fn name(&self) -> &str {
        "git"
    }

    fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    fn is_cached(&self) -> bool {
        self.cache.is_populated(&self.bundle_name)
    }

    fn materialize(&mut self) -> Result<Materialized> {
        self.ensure_checkout()?;

        let tree = self.checkout_dir().join(&self.subfolder);
        if !self.is_cached() && !tree.is_dir() {
            return Err(BundleError::acquisition_failed(
                self.origin.repo.as_str(),
                format!("subfolder `{}` not found at {}", self.origin.subfolder, self.origin.reference),
            )
            .into());
        }

        self.cache
            .populate(&self.bundle_name, self.expected_hash.as_deref(), |staging| {
                tracing::info!("Copying {}", tree.display());
                copy_dir_all(&tree, staging)
            })
    }
}
