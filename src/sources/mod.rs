//! Bundle sources.
//!
//! Sources are responsible for materializing bundles from their origins
//! (local paths and archives, HTTP downloads, git repositories) into the
//! bundle cache.

pub mod cache;
pub mod git;
pub mod http;
pub mod path;
pub mod source;

pub use cache::{BundleCache, CacheEntry, Materialized};
pub use git::GitSource;
pub use http::HttpSource;
pub use path::PathSource;
pub use source::Source;
