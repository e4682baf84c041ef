use std::fmt;
use std::process::Command;

/// A missing prerequisite with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: &'static str,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

fn command_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check prerequisites for the host side: launching the build container.
/// Returns a list of missing items. Empty list means all prerequisites are met.
pub fn check_container_prereqs() -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    if !command_exists("git") {
        missing.push(MissingPrereq {
            name: "git",
            purpose: "fetching and patching upstream checkouts",
            install_hint: "apt install git | dnf install git | pacman -S git",
        });
    }

    if !command_exists("docker") {
        missing.push(MissingPrereq {
            name: "docker",
            purpose: "isolated build environment",
            install_hint: "https://docs.docker.com/engine/install/",
        });
    }

    missing
}

/// Check prerequisites for the inner pipeline, which expects the toolchain
/// image to provide the compiler and generator.
pub fn check_pipeline_prereqs() -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    if !command_exists("git") {
        missing.push(MissingPrereq {
            name: "git",
            purpose: "fetching and patching upstream checkouts",
            install_hint: "apt install git | dnf install git | pacman -S git",
        });
    }

    if !command_exists("make") {
        missing.push(MissingPrereq {
            name: "make",
            purpose: "driving the firmware build",
            install_hint: "apt install build-essential | dnf install make",
        });
    }

    if !command_exists("python3") {
        missing.push(MissingPrereq {
            name: "python3",
            purpose: "binding generation and packaging",
            install_hint: "apt install python3 | dnf install python3",
        });
    }

    missing
}

/// Format a list of missing prerequisites into a user-friendly error message.
pub fn format_missing(missing: &[MissingPrereq]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("missing prerequisites:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    msg.push_str("\nmavforge requires these tools to produce build artifacts.");
    msg
}
