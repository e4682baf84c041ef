//! Core orchestration for mavforge builds.
//!
//! This crate ties the configuration layer and the process runner into the
//! `Engine`: reconciling upstream checkouts to the pinned version, injecting
//! the vendor dialect definition, snapshotting the patched tree in a local
//! commit, and producing firmware, binding, and dissector-plugin artifacts
//! in dependency order.

pub mod engine;
pub mod inject;
pub mod janitor;
pub mod pipeline;
pub mod reconcile;
pub mod stage;

pub use engine::{BuildRequest, Engine};
pub use inject::inject;
pub use janitor::{clean_directory, copy_tree};
pub use pipeline::{ArtifactClasses, BuildError, Pipeline};
pub use reconcile::{ensure_present, reconcile, Checkout, ReconcileError};
pub use stage::{stage, StageOutcome};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config error: {0}")]
    Manifest(#[from] mavforge_config::ManifestError),
    #[error("config error: {0}")]
    Version(#[from] mavforge_config::VersionError),
    #[error("reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),
    #[error("build error: {0}")]
    Build(#[from] BuildError),
    #[error("command error: {0}")]
    Runner(#[from] mavforge_runtime::RunnerError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
