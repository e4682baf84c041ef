//! Process execution layer for mavforge.
//!
//! This crate implements the narrow capability everything else is built on:
//! running an external command with a working directory and environment
//! overrides (`CommandRunner`, with a real `SystemRunner` and a scriptable
//! `MockRunner`), host prerequisite checks, and the container boundary that
//! re-invokes the pipeline inside an isolated environment.

pub mod container;
pub mod mock;
pub mod prereq;
pub mod runner;

pub use container::{docker_available, docker_run_spec, select_image};
pub use mock::MockRunner;
pub use prereq::{check_container_prereqs, check_pipeline_prereqs, format_missing, MissingPrereq};
pub use runner::{git, CommandRunner, CommandSpec, SystemRunner};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("command '{command}' exited with code {code}{}", fmt_stderr(.stderr))]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },
}

fn fmt_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}
