use crate::runner::{CommandRunner, CommandSpec};
use crate::RunnerError;
use std::path::PathBuf;
use std::sync::Mutex;

/// Scriptable in-memory runner for deterministic tests.
///
/// Records every invocation in order. Captured output and failures are
/// scripted by substring match against the command's display line, so tests
/// can target `"remote show"` or a specific `make` target without spelling
/// out full command lines.
#[derive(Default)]
pub struct MockRunner {
    calls: Mutex<Vec<CommandSpec>>,
    captures: Mutex<Vec<(String, String)>>,
    failures: Mutex<Vec<String>>,
    touches: Mutex<Vec<(String, PathBuf)>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script stdout for any captured command whose display line contains
    /// `needle`. First matching stub wins.
    pub fn stub_capture(&self, needle: &str, stdout: &str) {
        self.captures
            .lock()
            .expect("captures mutex poisoned")
            .push((needle.to_owned(), stdout.to_owned()));
    }

    /// Create an empty file at `path` whenever a command whose display line
    /// contains `needle` succeeds. Approximates tools that write outputs as
    /// a side effect.
    pub fn touch_on(&self, needle: &str, path: impl Into<PathBuf>) {
        self.touches
            .lock()
            .expect("touches mutex poisoned")
            .push((needle.to_owned(), path.into()));
    }

    /// Fail any command whose display line contains `needle`.
    pub fn fail_on(&self, needle: &str) {
        self.failures
            .lock()
            .expect("failures mutex poisoned")
            .push(needle.to_owned());
    }

    /// Snapshot of all invocations received so far.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    /// Display lines of all invocations, in order.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::display_line).collect()
    }

    fn record(&self, spec: &CommandSpec) {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(spec.clone());
    }

    fn scripted_failure(&self, line: &str) -> Option<RunnerError> {
        let failures = self.failures.lock().expect("failures mutex poisoned");
        failures
            .iter()
            .find(|needle| line.contains(needle.as_str()))
            .map(|_| RunnerError::CommandFailed {
                command: line.to_owned(),
                code: 1,
                stderr: "scripted failure".to_owned(),
            })
    }

    fn apply_touches(&self, line: &str) {
        let touches = self.touches.lock().expect("touches mutex poisoned");
        for (needle, path) in touches.iter() {
            if line.contains(needle.as_str()) {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).expect("create touch parent");
                }
                std::fs::write(path, b"").expect("write touch file");
            }
        }
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, spec: &CommandSpec) -> Result<(), RunnerError> {
        self.record(spec);
        let line = spec.display_line();
        match self.scripted_failure(&line) {
            Some(err) => Err(err),
            None => {
                self.apply_touches(&line);
                Ok(())
            }
        }
    }

    fn run_capture(&self, spec: &CommandSpec) -> Result<String, RunnerError> {
        self.record(spec);
        let line = spec.display_line();
        if let Some(err) = self.scripted_failure(&line) {
            return Err(err);
        }
        self.apply_touches(&line);
        let captures = self.captures.lock().expect("captures mutex poisoned");
        Ok(captures
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, stdout)| stdout.clone())
            .unwrap_or_default())
    }
}
