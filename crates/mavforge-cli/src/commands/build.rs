use super::{headline, ok_line, CommandError, EXIT_SUCCESS};
use mavforge_config::{load_manifest, BuildManifest, ProjectLayout};
use mavforge_core::{ArtifactClasses, BuildRequest, CoreError, Engine};
use mavforge_runtime::container::CONTAINER_WORKDIR;
use mavforge_runtime::{
    check_container_prereqs, check_pipeline_prereqs, docker_available, docker_run_spec,
    format_missing, git, select_image, CommandRunner, SystemRunner,
};
use std::path::{Path, PathBuf};
use tracing::info;

pub struct BuildArgs {
    pub bindings: bool,
    pub firmware: bool,
    pub plugin: bool,
    pub targets: Vec<String>,
    pub run_version: Option<String>,
    pub inner: bool,
}

pub fn run(project_root: &Path, manifest_name: &Path, args: BuildArgs) -> Result<u8, CommandError> {
    let manifest = load_manifest(project_root.join(manifest_name))
        .map_err(|e| CommandError::Config(e.to_string()))?;
    let classes = ArtifactClasses {
        bindings: args.bindings,
        firmware: args.firmware,
        plugin: args.plugin,
    };
    if classes.plugin && !classes.bindings {
        return Err(CommandError::Failure(
            "the dissector plugin requires the bindings pipeline; pass --bindings too".to_owned(),
        ));
    }
    if !classes.any() {
        info!("no artifact classes requested; checkouts will be reconciled and staged only");
    }

    let runner = SystemRunner;
    if args.inner {
        run_inner(&runner, project_root, manifest, classes, args)
    } else {
        run_host(&runner, project_root, &manifest, classes, &args)
    }
}

/// Host side: validate the environment, then re-invoke this binary with
/// `--inner` inside the build container, with the project mounted at the
/// fixed container workdir.
fn run_host(
    runner: &SystemRunner,
    project_root: &Path,
    manifest: &BuildManifest,
    classes: ArtifactClasses,
    args: &BuildArgs,
) -> Result<u8, CommandError> {
    if classes.firmware && std::env::consts::ARCH == "aarch64" {
        return Err(CommandError::Failure(
            "firmware cross-compilation is not available on ARM hosts; re-run with --bindings or --plugin only"
                .to_owned(),
        ));
    }

    let missing = check_container_prereqs();
    if !missing.is_empty() {
        return Err(CommandError::Failure(format_missing(&missing)));
    }
    if !docker_available(runner) {
        return Err(CommandError::Failure(
            "cannot talk to the container engine; is the daemon running, and is your user in the docker group (or run with sudo)?"
                .to_owned(),
        ));
    }

    let root = project_root
        .canonicalize()
        .map_err(|e| format!("cannot resolve project root: {e}"))?;
    let run_version = match &args.run_version {
        Some(v) => v.clone(),
        None => default_run_version(runner, &root)?,
    };

    // The mounted checkout ends up owned by a different uid after the
    // container run; pre-authorize it so host git operations keep working.
    let firmware_dir = ProjectLayout::new(&root).firmware_dir();
    runner
        .run_capture(&git(
            [
                "config",
                "--global",
                "--add",
                "safe.directory",
                &firmware_dir.display().to_string(),
            ],
            &root,
        ))
        .map_err(|e| e.to_string())?;

    let image = select_image(
        &manifest.container.full_image,
        &manifest.container.bindings_image,
        classes.firmware,
    );
    let inner_args = inner_invocation(std::env::current_exe().ok(), &root, classes, args, &run_version);

    println!("{}", headline(&format!("launching build container {image}")));
    let spec = docker_run_spec(image, &root, &inner_args);
    info!("running: {}", spec.display_line());
    runner.run(&spec).map_err(|e| e.to_string())?;

    println!("{}", ok_line(&format!("artifacts written to {}", root.join("dist").display())));
    Ok(EXIT_SUCCESS)
}

/// Container side: run the pipeline directly against the mounted project.
fn run_inner(
    runner: &SystemRunner,
    project_root: &Path,
    manifest: BuildManifest,
    classes: ArtifactClasses,
    args: BuildArgs,
) -> Result<u8, CommandError> {
    let missing = check_pipeline_prereqs();
    if !missing.is_empty() {
        return Err(CommandError::Failure(format_missing(&missing)));
    }

    let run_version = match args.run_version {
        Some(v) => v,
        None => default_run_version(runner, project_root)?,
    };

    let engine = Engine::new(runner, ProjectLayout::new(project_root), manifest);
    engine
        .run(&BuildRequest {
            classes,
            targets: args.targets,
            run_version,
        })
        .map_err(|e| match e {
            CoreError::Manifest(inner) => CommandError::Config(inner.to_string()),
            CoreError::Version(inner) => CommandError::Config(inner.to_string()),
            other => CommandError::Failure(other.to_string()),
        })?;
    Ok(EXIT_SUCCESS)
}

/// Default run version: the short commit hash of the project repository.
fn default_run_version(runner: &SystemRunner, project_root: &Path) -> Result<String, CommandError> {
    let out = runner
        .run_capture(&git(["rev-parse", "--short", "HEAD"], project_root))
        .map_err(|e| format!("cannot derive a run version from the project repository ({e}); pass --run-version"))?;
    Ok(out.trim().to_owned())
}

/// The argv executed inside the container. When this binary lives under the
/// project root its mounted path is used, so the container needs no separate
/// install; otherwise it must be on the image's PATH.
fn inner_invocation(
    current_exe: Option<PathBuf>,
    project_root: &Path,
    classes: ArtifactClasses,
    args: &BuildArgs,
    run_version: &str,
) -> Vec<String> {
    let mut argv = vec![
        inner_program(current_exe, project_root),
        "build".to_owned(),
        "--inner".to_owned(),
        "--run-version".to_owned(),
        run_version.to_owned(),
    ];
    if classes.bindings {
        argv.push("--bindings".to_owned());
    }
    if classes.firmware {
        argv.push("--firmware".to_owned());
    }
    if classes.plugin {
        argv.push("--plugin".to_owned());
    }
    for target in &args.targets {
        argv.push("--target".to_owned());
        argv.push(target.clone());
    }
    argv
}

fn inner_program(current_exe: Option<PathBuf>, project_root: &Path) -> String {
    let fallback = "mavforge".to_owned();
    let Some(exe) = current_exe else {
        return fallback;
    };
    let exe = exe.canonicalize().unwrap_or(exe);
    let Ok(root) = project_root.canonicalize() else {
        return fallback;
    };
    match exe.strip_prefix(&root) {
        Ok(rel) => Path::new(CONTAINER_WORKDIR).join(rel).display().to_string(),
        Err(_) => fallback,
    }
}
