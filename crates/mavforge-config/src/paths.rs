use crate::version::PinnedVersion;
use std::path::{Path, PathBuf};

/// Fixed on-disk layout of a mavforge project root.
///
/// The root holds the pinned-version file, the patches directory, the dialect
/// definition, working checkouts under `build/`, and the flat artifact
/// directory `dist/`.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Single-line file naming the pinned upstream release.
    pub fn version_file(&self) -> PathBuf {
        self.root.join(".px4-version")
    }

    pub fn patches_dir(&self) -> PathBuf {
        self.root.join("patches")
    }

    /// Version-specific patch for one repository, named by a fixed template.
    pub fn patch_file(&self, prefix: &str, version: &PinnedVersion) -> PathBuf {
        self.patches_dir().join(format!("{prefix}_{version}.patch"))
    }

    /// The vendor dialect definition at the project root.
    pub fn dialect_file(&self, definition: &str) -> PathBuf {
        self.root.join(definition)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    pub fn firmware_dir(&self) -> PathBuf {
        self.build_dir().join("PX4-Autopilot")
    }

    /// Flat artifact output directory, fully owned by one run.
    pub fn dist_dir(&self) -> PathBuf {
        self.root.join("dist")
    }
}
