//! `srcbundle cache` command
//!
//! Inspect and clean the bundle cache under the build directory.

use anyhow::Result;

use crate::cli::{CacheArgs, CacheCommands};
use srcbundle::sources::BundleCache;
use srcbundle::util::fs::format_size;
use srcbundle::util::shell::{Shell, Status};
use srcbundle::GlobalContext;

pub fn execute(args: CacheArgs, ctx: &GlobalContext, shell: &Shell) -> Result<()> {
    let cache = BundleCache::new(ctx);
    match args.command {
        CacheCommands::List => list_cache(&cache, shell),
        CacheCommands::Path => show_path(&cache, shell),
        CacheCommands::Clean => clean_cache(&cache, shell),
    }
}

/// List extracted bundles with their sizes.
fn list_cache(cache: &BundleCache, shell: &Shell) -> Result<()> {
    let entries = cache.list()?;

    if shell.is_json() {
        for entry in &entries {
            shell.json_event(&serde_json::json!({
                "reason": "cache-entry",
                "name": entry.name,
                "path": entry.path,
                "size": entry.size,
            }));
        }
        return Ok(());
    }

    if entries.is_empty() {
        shell.note(format!("no bundles in {}", cache.bundles_dir().display()));
        return Ok(());
    }

    for entry in &entries {
        shell.print(format!("{} ({})", entry.name, format_size(entry.size)));
    }

    Ok(())
}

fn show_path(cache: &BundleCache, shell: &Shell) -> Result<()> {
    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "cache-path",
            "bundles": cache.bundles_dir(),
            "downloads": cache.downloads_dir(),
        }));
    } else {
        shell.print(format!("bundles:   {}", cache.bundles_dir().display()));
        shell.print(format!("downloads: {}", cache.downloads_dir().display()));
    }
    Ok(())
}

fn clean_cache(cache: &BundleCache, shell: &Shell) -> Result<()> {
    let existed = cache.bundles_dir().exists() || cache.downloads_dir().exists();
    cache.clean()?;

    if existed {
        shell.status(Status::Removed, cache.bundles_dir().display());
        shell.status(Status::Removed, cache.downloads_dir().display());
    } else {
        shell.note("cache is already empty");
    }
    Ok(())
}
