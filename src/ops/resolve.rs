//! Bundle resolution.
//!
//! Turns declarations into extracted, verified bundles with their manifests.
//! Declarations run strictly in order and the first failure aborts the pass.

use anyhow::{Context, Result};

use crate::core::{Bundle, Declaration, Manifest, ResolvedBundle, ResolvedBundles};
use crate::sources::BundleCache;
use crate::util::context::GlobalContext;

/// Resolve every declaration in order.
pub fn resolve(ctx: &GlobalContext, declarations: &[Declaration]) -> Result<ResolvedBundles> {
    let cache = BundleCache::new(ctx);
    let mut resolved = ResolvedBundles::new();

    for decl in declarations {
        let bundle = resolve_one(ctx, &cache, decl)?;

        if let Some(existing) = resolved.get(bundle.bundle.source_name()) {
            if existing.origin != bundle.origin {
                tracing::warn!(
                    "Bundle name `{}` from {} is already used by {}; keeping the first",
                    bundle.bundle.source_name(),
                    bundle.origin,
                    existing.origin
                );
            }
            continue;
        }

        resolved.push(bundle);
    }

    Ok(resolved)
}

/// Resolve a single declaration.
pub fn resolve_one(
    ctx: &GlobalContext,
    cache: &BundleCache,
    decl: &Declaration,
) -> Result<ResolvedBundle> {
    let mut source = cache.create_source(ctx, decl)?;
    tracing::debug!(
        "Resolving `{}` as {} bundle `{}`",
        decl,
        source.name(),
        source.bundle_name()
    );

    let materialized = source
        .materialize()
        .with_context(|| format!("failed to resolve `{}`", decl.raw()))?;

    let manifest = Manifest::load(&materialized.dir)?;
    tracing::info!("Bundle `{}` at {}", source.bundle_name(), materialized.dir.display());

    Ok(ResolvedBundle {
        bundle: Bundle::new(materialized.dir, source.bundle_name(), manifest),
        origin: decl.origin().clone(),
        computed_hash: materialized.computed_hash,
    })
}
