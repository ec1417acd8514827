//! Applying resolved bundles to a project.
//!
//! For each bundle: register its repositories, add its dependencies to the
//! named scopes, then map its `src/<folder>/{kotlin,resources}` directories
//! onto the project's source sets.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::core::{
    Bundle, DependencyEntry, ProjectLayout, ProjectModel, ResolvedBundles, RootKind,
    SetSuffix, Target,
};

/// A source root registered with the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredRoot {
    pub bundle: String,
    pub source_set: String,
    pub kind: RootKind,
    pub dir: PathBuf,
}

/// What applying bundles changed in the project.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    pub repositories: Vec<String>,
    pub dependencies: Vec<DependencyEntry>,
    /// Dependencies whose scope the project does not declare.
    pub skipped_dependencies: Vec<DependencyEntry>,
    pub source_roots: Vec<RegisteredRoot>,
}

/// Apply every resolved bundle to `project`, in resolution order.
///
/// Unavailable dependency scopes are recorded and skipped; any other error
/// from the project model stops the pass.
pub fn apply<P: ProjectModel + ?Sized>(
    resolved: &ResolvedBundles,
    project: &mut P,
) -> Result<ApplyReport> {
    let mut report = ApplyReport::default();

    for bundle in resolved.bundles() {
        tracing::info!("Applying bundle `{}`", bundle.source_name());
        add_repositories(bundle, project, &mut report);
        add_dependencies(bundle, project, &mut report)?;
        map_source_sets(bundle, project, &mut report);
    }

    Ok(report)
}

fn add_repositories<P: ProjectModel + ?Sized>(
    bundle: &Bundle,
    project: &mut P,
    report: &mut ApplyReport,
) {
    for repo in bundle.repositories() {
        if project.add_repository(&repo.url) {
            tracing::info!("Repository: {}", repo.url);
            report.repositories.push(repo.url.clone());
        }
    }
}

fn add_dependencies<P: ProjectModel + ?Sized>(
    bundle: &Bundle,
    project: &mut P,
    report: &mut ApplyReport,
) -> Result<()> {
    for dep in bundle.dependencies() {
        match project.add_dependency(&dep.scope, &dep.coordinate) {
            Ok(()) => {
                tracing::info!("Dependency: {} -> {}", dep.scope, dep.coordinate);
                report.dependencies.push(dep.clone());
            }
            Err(e) if !e.is_fatal() => {
                tracing::info!("Dependency: {} -> {} -- available=false", dep.scope, dep.coordinate);
                report.skipped_dependencies.push(dep.clone());
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!(
                    "failed to add dependency {} -> {} from bundle `{}`",
                    dep.scope,
                    dep.coordinate,
                    bundle.source_name()
                )));
            }
        }
    }

    Ok(())
}

/// Bundle folders a source set of `target` may draw from, exact match first.
///
/// `set_name` already carries its `Main`/`Test` suffix; the suffix is
/// appended to the shared folders.
pub fn candidate_folders(layout: ProjectLayout, target: &Target, set_name: &str) -> Vec<String> {
    let suffix = SetSuffix::for_set_name(set_name).as_str();
    let mut folders = vec![set_name.to_string()];

    match layout {
        ProjectLayout::SingleTarget { jvm } => {
            folders.push(format!("common{}", suffix));
            if jvm {
                folders.push(format!("jvm{}", suffix));
            }
        }
        ProjectLayout::Multiplatform => {
            folders.extend(
                target
                    .classification
                    .categories
                    .iter()
                    .filter_map(|c| c.folder())
                    .map(|folder| format!("{}{}", folder, suffix)),
            );
        }
    }

    folders.dedup();
    folders
}

fn map_source_sets<P: ProjectModel + ?Sized>(
    bundle: &Bundle,
    project: &mut P,
    report: &mut ApplyReport,
) {
    let layout = project.layout();
    let plan: Vec<(String, Vec<String>)> = project
        .targets()
        .iter()
        .flat_map(|target| {
            target
                .source_sets
                .iter()
                .map(move |set| (set.clone(), candidate_folders(layout, target, set)))
        })
        .collect();

    for (set, folders) in plan {
        for folder in &folders {
            for kind in RootKind::ALL {
                let dir = bundle.source_dir(folder, kind);
                if !dir.is_dir() {
                    tracing::debug!("  {}.{}: {} (not existing)", set, kind, dir.display());
                    continue;
                }
                if project.add_source_root(&set, kind, &dir) {
                    tracing::info!("  {}.{}: {}", set, kind, dir.display());
                    report.source_roots.push(RegisteredRoot {
                        bundle: bundle.source_name().to_string(),
                        source_set: set.clone(),
                        kind,
                        dir,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BundleError, Manifest, Origin, Project, ResolvedBundle};
    use crate::test_support::write_tree;
    use std::path::Path;
    use tempfile::TempDir;

    fn resolved_from(root: &Path, name: &str, manifest: &str) -> ResolvedBundles {
        let mut resolved = ResolvedBundles::new();
        resolved.push(ResolvedBundle {
            bundle: Bundle::new(root.to_path_buf(), name, Manifest::parse(manifest)),
            origin: Origin::Path {
                path: root.to_path_buf(),
            },
            computed_hash: None,
        });
        resolved
    }

    /// A project whose dependency scopes are locked.
    struct LockedScopes(Project);

    impl ProjectModel for LockedScopes {
        fn layout(&self) -> ProjectLayout {
            self.0.layout()
        }

        fn targets(&self) -> &[Target] {
            self.0.targets()
        }

        fn add_source_root(&mut self, source_set: &str, kind: RootKind, dir: &Path) -> bool {
            self.0.add_source_root(source_set, kind, dir)
        }

        fn add_repository(&mut self, url: &str) -> bool {
            self.0.add_repository(url)
        }

        fn add_dependency(&mut self, _scope: &str, coordinate: &str) -> Result<(), BundleError> {
            Err(BundleError::acquisition_failed(coordinate, "dependency scopes are locked"))
        }
    }

    fn kotlin_roots(project: &Project, set: &str) -> Vec<PathBuf> {
        project
            .source_set(set)
            .map(|s| s.roots(RootKind::Kotlin).iter().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_ios_fan_out() {
        let tmp = TempDir::new().unwrap();
        write_tree(
            tmp.path(),
            &[
                ("src/nativeCommonMain/kotlin/N.kt", ""),
                ("src/iosCommonMain/kotlin/I.kt", ""),
                ("src/iosCommonMain/resources/r.txt", ""),
                ("src/commonMain/kotlin/C.kt", ""),
            ],
        );
        let resolved = resolved_from(tmp.path(), "lib", "");
        let mut project = Project::multiplatform().with_target("iosX64", ["iosX64Main"]);

        let report = apply(&resolved, &mut project).unwrap();

        let roots = kotlin_roots(&project, "iosX64Main");
        assert!(roots.contains(&tmp.path().join("src/nativeCommonMain/kotlin")));
        assert!(roots.contains(&tmp.path().join("src/iosCommonMain/kotlin")));
        assert!(!roots.contains(&tmp.path().join("src/commonMain/kotlin")));
        assert_eq!(roots.len(), 2);

        let resources = project
            .source_set("iosX64Main")
            .unwrap()
            .roots(RootKind::Resources);
        assert!(resources.contains(&tmp.path().join("src/iosCommonMain/resources")));
        assert_eq!(report.source_roots.len(), 3);
    }

    #[test]
    fn test_ios_candidates_include_every_category() {
        let target = Target::new("iosArm64", ["iosArm64Test"]);
        let folders = candidate_folders(ProjectLayout::Multiplatform, &target, "iosArm64Test");

        for expected in [
            "iosArm64Test",
            "nativeCommonTest",
            "nativePosixTest",
            "nativePosixAppleTest",
            "iosWatchosTvosCommonTest",
            "iosWatchosCommonTest",
            "iosTvosCommonTest",
            "macosIosTvosCommonTest",
            "macosIosWatchosCommonTest",
            "iosCommonTest",
        ] {
            assert!(folders.iter().any(|f| f == expected), "missing {}", expected);
        }
        assert!(!folders.iter().any(|f| f == "nativeDesktopTest"));
        assert!(!folders.iter().any(|f| f == "nativePosixNonAppleTest"));
        assert!(!folders.iter().any(|f| f == "commonTest"));
    }

    #[test]
    fn test_linux_candidates() {
        let target = Target::new("linuxX64", ["linuxX64Main"]);
        let folders = candidate_folders(ProjectLayout::Multiplatform, &target, "linuxX64Main");
        assert_eq!(
            folders,
            vec![
                "linuxX64Main",
                "nativeCommonMain",
                "nativeDesktopMain",
                "nativePosixMain",
                "nativePosixNonAppleMain",
            ]
        );
    }

    #[test]
    fn test_single_target_jvm() {
        let tmp = TempDir::new().unwrap();
        write_tree(
            tmp.path(),
            &[
                ("src/commonMain/kotlin/C.kt", ""),
                ("src/jvmMain/kotlin/J.kt", ""),
                ("src/commonTest/kotlin/T.kt", ""),
                ("src/nativeCommonMain/kotlin/N.kt", ""),
            ],
        );
        let resolved = resolved_from(tmp.path(), "lib", "");
        let mut project = Project::single_target("jvm", ["main", "test"]);

        apply(&resolved, &mut project).unwrap();

        let main = kotlin_roots(&project, "main");
        assert_eq!(
            main,
            vec![
                tmp.path().join("src/commonMain/kotlin"),
                tmp.path().join("src/jvmMain/kotlin"),
            ]
        );
        assert_eq!(
            kotlin_roots(&project, "test"),
            vec![tmp.path().join("src/commonTest/kotlin")]
        );
    }

    #[test]
    fn test_single_target_non_jvm_skips_jvm_folder() {
        let target = Target::new("js", ["main"]);
        let folders = candidate_folders(ProjectLayout::SingleTarget { jvm: false }, &target, "main");
        assert_eq!(folders, vec!["main", "commonMain"]);
    }

    #[test]
    fn test_shared_set_is_registered_once() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), &[("src/commonMain/kotlin/C.kt", "")]);
        let resolved = resolved_from(tmp.path(), "lib", "");
        let mut project = Project::multiplatform()
            .with_target("jvm", ["commonMain", "jvmMain"])
            .with_target("js", ["commonMain", "jsMain"]);

        let report = apply(&resolved, &mut project).unwrap();

        assert_eq!(kotlin_roots(&project, "commonMain").len(), 1);
        assert_eq!(report.source_roots.len(), 1);

        // Applying again changes nothing.
        let again = apply(&resolved, &mut project).unwrap();
        assert!(again.source_roots.is_empty());
        assert_eq!(kotlin_roots(&project, "commonMain").len(), 1);
    }

    #[test]
    fn test_repositories_and_dependencies() {
        let tmp = TempDir::new().unwrap();
        let resolved = resolved_from(
            tmp.path(),
            "lib",
            "repository: https://m.example/repo\n\
             repository: https://m.example/repo\n\
             commonMainApi: g:a:1.0\n\
             kaptMissing: g:b:2.0\n",
        );
        let mut project = Project::multiplatform().with_scope("commonMainApi");

        let report = apply(&resolved, &mut project).unwrap();

        assert_eq!(project.repositories(), ["https://m.example/repo"]);
        assert_eq!(report.repositories, vec!["https://m.example/repo"]);
        assert_eq!(project.scope("commonMainApi").unwrap(), ["g:a:1.0"]);
        assert_eq!(report.dependencies.len(), 1);
        assert_eq!(report.skipped_dependencies.len(), 1);
        assert_eq!(report.skipped_dependencies[0].scope, "kaptMissing");
    }

    #[test]
    fn test_fatal_dependency_error_stops_apply() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), &[("src/commonMain/kotlin/C.kt", "")]);
        let resolved = resolved_from(tmp.path(), "lib", "commonMainApi: g:a:1.0\n");
        let mut project = LockedScopes(
            Project::multiplatform()
                .with_scope("commonMainApi")
                .with_target("jvm", ["commonMain"]),
        );

        let err = apply(&resolved, &mut project).unwrap_err();
        assert!(err.to_string().contains("g:a:1.0"));
        assert!(matches!(
            err.downcast_ref::<BundleError>(),
            Some(BundleError::AcquisitionFailed { .. })
        ));
        assert!(kotlin_roots(&project.0, "commonMain").is_empty());
    }

    #[test]
    fn test_missing_folders_are_silent() {
        let tmp = TempDir::new().unwrap();
        let resolved = resolved_from(tmp.path(), "empty", "");
        let mut project = Project::multiplatform().with_target("macosX64", ["macosX64Main"]);

        let report = apply(&resolved, &mut project).unwrap();
        assert!(report.source_roots.is_empty());
        assert!(kotlin_roots(&project, "macosX64Main").is_empty());
    }
}
