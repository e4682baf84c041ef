use crate::RunnerError;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// One external command invocation: program, arguments, optional working
/// directory, and environment overrides layered on the inherited environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new<S: AsRef<str>>(program: &str, args: impl IntoIterator<Item = S>) -> Self {
        Self {
            program: program.to_owned(),
            args: args.into_iter().map(|a| a.as_ref().to_owned()).collect(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_owned(), value.to_owned()));
        self
    }

    /// The command line as a single display string, used in logs and errors.
    pub fn display_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Executes external commands. The exit status is the only observable
/// contract; there are no retries and no timeouts — runs are
/// operator-attended and a hung tool hangs the run.
pub trait CommandRunner {
    /// Run to completion with inherited stdio. Non-zero exit is an error.
    fn run(&self, spec: &CommandSpec) -> Result<(), RunnerError>;

    /// Run capturing stdout as UTF-8 (lossy). Non-zero exit is an error
    /// carrying the captured stderr.
    fn run_capture(&self, spec: &CommandSpec) -> Result<String, RunnerError>;

    /// Run quietly and report only whether the command succeeded.
    fn probe(&self, spec: &CommandSpec) -> bool {
        self.run_capture(spec).is_ok()
    }
}

/// The real runner, backed by `std::process::Command`.
pub struct SystemRunner;

impl SystemRunner {
    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<(), RunnerError> {
        debug!("running: {}", spec.display_line());
        let status = Self::command(spec)
            .status()
            .map_err(|source| RunnerError::Launch {
                command: spec.display_line(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(RunnerError::CommandFailed {
                command: spec.display_line(),
                code: status.code().unwrap_or(-1),
                stderr: String::new(),
            })
        }
    }

    fn run_capture(&self, spec: &CommandSpec) -> Result<String, RunnerError> {
        debug!("capturing: {}", spec.display_line());
        let output = Self::command(spec)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RunnerError::Launch {
                command: spec.display_line(),
                source,
            })?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(RunnerError::CommandFailed {
                command: spec.display_line(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}

/// Git invocation in a working tree, shared by the reconciliation and
/// staging code paths.
pub fn git(args: impl IntoIterator<Item = impl AsRef<str>>, dir: &Path) -> CommandSpec {
    CommandSpec::new("git", args.into_iter().map(|a| a.as_ref().to_owned())).in_dir(dir)
}
