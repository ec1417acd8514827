//! Command implementations

pub mod apply;
pub mod cache;
pub mod completions;
pub mod hash;
pub mod resolve;

use anyhow::Result;

use srcbundle::Declaration;

/// Parse declaration arguments, stopping at the first invalid one.
pub fn parse_declarations(raw: &[String]) -> Result<Vec<Declaration>> {
    raw.iter()
        .map(|d| Declaration::parse(d).map_err(anyhow::Error::from))
        .collect()
}
