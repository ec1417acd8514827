//! Bundle declarations - WHERE a bundle comes from.
//!
//! A declaration is the caller-facing string `origin["##"sha256]`. Parsing
//! classifies the origin into a local path, an HTTP URL or a git reference.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use url::Url;

use crate::core::errors::BundleError;

/// Separator between an origin and its expected hash.
const HASH_SEPARATOR: &str = "##";

/// Separator between the git repository, subfolder and reference.
const GIT_SEPARATOR: &str = "::";

/// Reference checked out when a git declaration names none.
pub const DEFAULT_GIT_REF: &str = "master";

/// A classified bundle origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Origin {
    /// A directory or archive on the local filesystem, relative to the project root.
    Path { path: PathBuf },
    /// An archive reachable with a plain GET.
    Http { url: Url },
    /// A subtree of a git repository at a reference.
    Git(GitOrigin),
}

/// Git repository, subtree and reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitOrigin {
    pub repo: Url,
    pub subfolder: String,
    pub reference: String,
}

impl Origin {
    /// Classify an origin string (without its `##` hash suffix).
    ///
    /// Anything mentioning `.git` is a git origin, then `http(s)://` URLs,
    /// then local paths.
    pub fn parse(origin: &str) -> Result<Self, BundleError> {
        if origin.contains(".git") {
            let mut parts = origin.splitn(3, GIT_SEPARATOR);
            let repo = parts.next().unwrap_or_default();
            let subfolder = parts.next().unwrap_or_default();
            let reference = parts
                .next()
                .filter(|r| !r.is_empty())
                .unwrap_or(DEFAULT_GIT_REF);

            let repo = Url::parse(repo)
                .map_err(|e| BundleError::invalid_origin(origin, format!("bad repository URL: {e}")))?;

            return Ok(Origin::Git(GitOrigin {
                repo,
                subfolder: subfolder.to_string(),
                reference: reference.to_string(),
            }));
        }

        if origin.starts_with("http://") || origin.starts_with("https://") {
            let url = Url::parse(origin)
                .map_err(|e| BundleError::invalid_origin(origin, format!("bad URL: {e}")))?;
            return Ok(Origin::Http { url });
        }

        if origin.is_empty() {
            return Err(BundleError::invalid_origin(origin, "empty origin"));
        }

        Ok(Origin::Path {
            path: PathBuf::from(origin),
        })
    }

    /// Short name of the origin kind, for display.
    pub fn kind(&self) -> &'static str {
        match self {
            Origin::Path { .. } => "path",
            Origin::Http { .. } => "http",
            Origin::Git(_) => "git",
        }
    }

    pub fn is_git(&self) -> bool {
        matches!(self, Origin::Git(_))
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Path { path } => write!(f, "{}", path.display()),
            Origin::Http { url } => write!(f, "{}", url),
            Origin::Git(git) => {
                write!(f, "{}", git.repo)?;
                if !git.subfolder.is_empty() {
                    write!(f, "::{}", git.subfolder)?;
                }
                write!(f, " @ {}", git.reference)
            }
        }
    }
}

/// A parsed bundle declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    raw: String,
    origin: Origin,
    expected_hash: Option<String>,
    base_name: Option<String>,
}

impl Declaration {
    /// Parse a declaration string.
    pub fn parse(raw: &str) -> Result<Self, BundleError> {
        let (origin, expected_hash) = match raw.split_once(HASH_SEPARATOR) {
            Some((origin, hash)) if !hash.is_empty() => {
                if !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(BundleError::invalid_origin(
                        raw,
                        format!("expected hash `{hash}` is not hexadecimal"),
                    ));
                }
                (origin, Some(hash.to_string()))
            }
            Some((origin, _)) => (origin, None),
            None => (raw, None),
        };

        Ok(Declaration {
            raw: raw.to_string(),
            origin: Origin::parse(origin)?,
            expected_hash,
            base_name: None,
        })
    }

    /// Override the bundle name derived from the origin.
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = Some(base_name.into());
        self
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn expected_hash(&self) -> Option<&str> {
        self.expected_hash.as_deref()
    }

    pub fn base_name(&self) -> Option<&str> {
        self.base_name.as_deref()
    }
}

impl FromStr for Declaration {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Declaration::parse(s)
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
