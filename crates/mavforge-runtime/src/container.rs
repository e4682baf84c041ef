use crate::runner::{CommandRunner, CommandSpec};
use std::path::Path;

/// Mount point of the project root inside the build container.
pub const CONTAINER_WORKDIR: &str = "/work";

/// Pick the container image for a run. The full cross-toolchain image is only
/// needed when firmware is requested; a bindings-only run uses the slimmer
/// image, which is also available for ARM hosts.
pub fn select_image<'a>(full_image: &'a str, bindings_image: &'a str, firmware: bool) -> &'a str {
    if firmware {
        full_image
    } else {
        bindings_image
    }
}

/// Whether the container engine is reachable for the current user.
/// A failing probe usually means the daemon is down or requires elevation.
pub fn docker_available(runner: &dyn CommandRunner) -> bool {
    runner.probe(&CommandSpec::new("docker", ["info"]))
}

/// Build the `docker run` invocation that re-enters the pipeline inside the
/// isolated environment, mounting the project root read-write at `/work`.
pub fn docker_run_spec(image: &str, project_root: &Path, inner_args: &[String]) -> CommandSpec {
    let mut args = vec![
        "run".to_owned(),
        "--rm".to_owned(),
        "-w".to_owned(),
        CONTAINER_WORKDIR.to_owned(),
        "-v".to_owned(),
        format!("{}:{CONTAINER_WORKDIR}:rw", project_root.display()),
        image.to_owned(),
    ];
    args.extend(inner_args.iter().cloned());
    CommandSpec::new("docker", args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRunner;

    #[test]
    fn firmware_runs_use_the_full_image() {
        assert_eq!(select_image("full:1", "slim:1", true), "full:1");
    }

    #[test]
    fn bindings_only_runs_use_the_slim_image() {
        assert_eq!(select_image("full:1", "slim:1", false), "slim:1");
    }

    #[test]
    fn docker_run_spec_mounts_project_at_work() {
        let inner = vec!["build".to_owned(), "--inner".to_owned()];
        let spec = docker_run_spec("img:latest", Path::new("/home/op/proj"), &inner);
        assert_eq!(spec.program, "docker");
        assert_eq!(
            spec.args,
            vec![
                "run",
                "--rm",
                "-w",
                "/work",
                "-v",
                "/home/op/proj:/work:rw",
                "img:latest",
                "build",
                "--inner",
            ]
        );
    }

    #[test]
    fn docker_available_reflects_probe() {
        let runner = MockRunner::new();
        assert!(docker_available(&runner));
        runner.fail_on("docker info");
        assert!(!docker_available(&runner));
    }
}
