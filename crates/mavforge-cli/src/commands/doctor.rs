use super::{fail_line, ok_line, CommandError, EXIT_FAILURE, EXIT_SUCCESS};
use mavforge_config::{load_manifest, DialectLayout, PinnedVersion, ProjectLayout};
use mavforge_runtime::{check_container_prereqs, docker_available, SystemRunner};
use std::path::Path;

/// Diagnose the host environment and project layout without touching any
/// checkout.
#[allow(clippy::unnecessary_wraps)]
pub fn run(project_root: &Path, manifest_name: &Path) -> Result<u8, CommandError> {
    let mut all_pass = true;
    let mut report = |pass: bool, msg: &str| {
        if pass {
            println!("  {}", ok_line(msg));
        } else {
            all_pass = false;
            println!("  {}", fail_line(msg));
        }
    };

    println!("mavforge doctor\n");

    let missing = check_container_prereqs();
    report(
        missing.is_empty(),
        &if missing.is_empty() {
            "host tools present (git, docker)".to_owned()
        } else {
            format!(
                "missing host tools: {}",
                missing
                    .iter()
                    .map(|m| m.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        },
    );
    report(
        docker_available(&SystemRunner),
        "container engine reachable",
    );

    let project = ProjectLayout::new(project_root);
    match PinnedVersion::from_file(project.version_file()) {
        Ok(pinned) => {
            let layout = DialectLayout::for_version(&pinned);
            report(true, &format!("pinned version {pinned} ({layout:?} layout)"));
            match load_manifest(project_root.join(manifest_name)) {
                Ok(manifest) => {
                    report(true, &format!("manifest ok ({} targets)", manifest.firmware.targets.len()));
                    for prefix in [&manifest.firmware.patch_prefix, &manifest.library.patch_prefix] {
                        let patch = project.patch_file(prefix, &pinned);
                        report(
                            patch.is_file(),
                            &format!("patch {}", patch.display()),
                        );
                    }
                    let dialect = project.dialect_file(&manifest.dialect.definition);
                    report(dialect.is_file(), &format!("dialect definition {}", dialect.display()));
                }
                Err(e) => report(false, &format!("manifest: {e}")),
            }
        }
        Err(e) => report(false, &format!("pinned version: {e}")),
    }

    println!();
    if all_pass {
        println!("All checks passed.");
        Ok(EXIT_SUCCESS)
    } else {
        println!("Some checks failed. See above for details.");
        Ok(EXIT_FAILURE)
    }
}
