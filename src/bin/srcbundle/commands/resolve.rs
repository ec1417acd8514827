//! `srcbundle resolve` command
//!
//! Fetches, verifies and extracts bundles into the build directory.

use anyhow::{bail, Result};

use crate::cli::ResolveArgs;
use crate::commands::parse_declarations;
use srcbundle::core::ResolvedBundle;
use srcbundle::util::shell::{Shell, Status};
use srcbundle::GlobalContext;

pub fn execute(args: ResolveArgs, ctx: &GlobalContext, shell: &Shell) -> Result<()> {
    let mut declarations = parse_declarations(&args.declarations)?;

    if let Some(name) = args.name {
        if declarations.len() != 1 {
            bail!("--name needs exactly one declaration, got {}", declarations.len());
        }
        declarations = declarations
            .into_iter()
            .map(|d| d.with_base_name(name.clone()))
            .collect();
    }

    let spinner = shell.spinner(format!("Resolving {} bundle(s)", declarations.len()));
    let resolved = srcbundle::resolve(ctx, &declarations)?;
    spinner.finish();

    for bundle in &resolved {
        report_resolved(shell, bundle);
    }

    Ok(())
}

/// Print one resolved bundle.
pub fn report_resolved(shell: &Shell, resolved: &ResolvedBundle) {
    let bundle = &resolved.bundle;

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "bundle-resolved",
            "name": bundle.source_name(),
            "origin": resolved.origin,
            "path": bundle.root_dir(),
            "sha256": resolved.computed_hash,
            "repositories": bundle.repositories(),
            "dependencies": bundle.dependencies(),
        }));
        return;
    }

    shell.status(
        Status::Resolved,
        format!(
            "{} ({}) -> {}",
            bundle.source_name(),
            resolved.origin.kind(),
            bundle.root_dir().display()
        ),
    );
    if let Some(hash) = &resolved.computed_hash {
        shell.status(Status::Hash, hash);
    }
}
