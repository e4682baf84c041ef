//! Commit staging: snapshotting the reconciled, injected checkout in a local
//! commit so the downstream generator and packaging tools, which only operate
//! on committed trees, see the injected dialect instead of stale state.

use crate::CoreError;
use mavforge_runtime::{git, CommandRunner};
use std::path::Path;
use tracing::{debug, info};

/// Fixed message for the throwaway local commit; it is never pushed.
pub const COMMIT_MESSAGE: &str = "Local commit to facilitate build";

const PLACEHOLDER_NAME: &str = "mavforge";
const PLACEHOLDER_EMAIL: &str = "build@mavforge.local";

/// Explicit outcome of staging, so a clean tree on re-run is distinguishable
/// from a real command failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Committed,
    /// The working tree had nothing to commit; treated as success to keep
    /// re-runs idempotent.
    NoChanges,
}

/// Stage and commit all working-tree changes of `dir`.
///
/// The no-changes case is detected up front from `git status --porcelain`
/// rather than inferred from the commit command's exit status, so it cannot
/// be conflated with other tool failures. A commit identity is configured
/// only when none exists; an operator's own identity is never overwritten.
pub fn stage(runner: &dyn CommandRunner, dir: &Path) -> Result<StageOutcome, CoreError> {
    let status = runner.run_capture(&git(["status", "--porcelain"], dir))?;
    if status.trim().is_empty() {
        debug!("nothing to commit in {}", dir.display());
        return Ok(StageOutcome::NoChanges);
    }

    ensure_identity(runner, dir)?;

    info!("committing injected changes in {}", dir.display());
    runner.run(&git(["add", "."], dir))?;
    runner.run(&git(["commit", "-m", COMMIT_MESSAGE], dir))?;
    Ok(StageOutcome::Committed)
}

fn ensure_identity(runner: &dyn CommandRunner, dir: &Path) -> Result<(), CoreError> {
    // `git config user.email` exits non-zero when the key is unset; either
    // way an empty value means no identity is configured.
    let configured = runner
        .run_capture(&git(["config", "user.email"], dir))
        .map(|out| !out.trim().is_empty())
        .unwrap_or(false);
    if configured {
        return Ok(());
    }

    debug!("no commit identity configured, setting placeholder");
    runner.run(&git(["config", "user.email", PLACEHOLDER_EMAIL], dir))?;
    runner.run(&git(["config", "user.name", PLACEHOLDER_NAME], dir))?;
    Ok(())
}
