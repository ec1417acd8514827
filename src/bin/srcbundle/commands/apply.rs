//! `srcbundle apply` command
//!
//! Resolves bundles, then applies them to a project description and
//! reports the source roots, repositories and dependencies added.

use anyhow::Result;

use crate::cli::ApplyArgs;
use crate::commands::parse_declarations;
use crate::commands::resolve::report_resolved;
use srcbundle::core::Project;
use srcbundle::util::shell::{Shell, Status};
use srcbundle::GlobalContext;

pub fn execute(args: ApplyArgs, ctx: &GlobalContext, shell: &Shell) -> Result<()> {
    let mut project = Project::load(&ctx.cwd().join(&args.project))?;
    let declarations = parse_declarations(&args.declarations)?;

    let spinner = shell.spinner(format!("Resolving {} bundle(s)", declarations.len()));
    let resolved = srcbundle::resolve(ctx, &declarations)?;
    spinner.finish();

    for bundle in &resolved {
        report_resolved(shell, bundle);
    }

    shell.status(Status::Applying, format!("{} bundle(s)", resolved.len()));
    let report = srcbundle::apply(&resolved, &mut project)?;

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "apply-report",
            "report": report,
            "project": project,
        }));
        return Ok(());
    }

    for repo in &report.repositories {
        shell.status(Status::Registered, format!("repository {}", repo));
    }
    for dep in &report.dependencies {
        shell.status(Status::Registered, format!("{} -> {}", dep.scope, dep.coordinate));
    }
    for dep in &report.skipped_dependencies {
        shell.status(
            Status::Skipped,
            format!("{} -> {} (scope not available)", dep.scope, dep.coordinate),
        );
    }
    for root in &report.source_roots {
        shell.print(format!(
            "{}.{} {}",
            root.source_set,
            root.kind,
            root.dir.display()
        ));
    }

    shell.note(format!(
        "{} source root(s), {} repository(ies), {} dependency(ies), {} skipped",
        report.source_roots.len(),
        report.repositories.len(),
        report.dependencies.len(),
        report.skipped_dependencies.len()
    ));

    Ok(())
}
