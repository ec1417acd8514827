//! Source trait - common interface for all bundle origins.

use anyhow::Result;

use crate::sources::cache::Materialized;

/// A place a bundle can be materialized from.
pub trait Source {
    /// Get the origin kind for display.
    fn name(&self) -> &str;

    /// Cache name of the extracted bundle.
    fn bundle_name(&self) -> &str;

    /// Check if the bundle is already extracted.
    fn is_cached(&self) -> bool;

    /// Fetch, verify and extract the bundle if needed.
    fn materialize(&mut self) -> Result<Materialized>;
}
