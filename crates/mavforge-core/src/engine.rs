//! The build engine: one strictly ordered, synchronous run from pinned
//! version to artifacts.

use crate::pipeline::{ArtifactClasses, Pipeline};
use crate::reconcile::{ensure_present, reconcile, Checkout};
use crate::stage::stage;
use crate::{inject, CoreError};
use mavforge_config::{BuildManifest, DialectLayout, PinnedVersion, ProjectLayout};
use mavforge_runtime::{CommandRunner, CommandSpec};
use std::fs;
use tracing::info;

/// What one engine run should produce.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub classes: ArtifactClasses,
    /// Firmware targets to build; empty means the manifest's target list.
    pub targets: Vec<String>,
    /// Local identifier woven into firmware artifact names.
    pub run_version: String,
}

/// Drives a full build: reconcile checkouts to the pinned version, inject the
/// dialect, snapshot the tree in a local commit, then produce the requested
/// artifacts. Each step must succeed before the next starts; there is no
/// rollback of completed steps.
pub struct Engine<'a> {
    runner: &'a dyn CommandRunner,
    project: ProjectLayout,
    manifest: BuildManifest,
}

impl<'a> Engine<'a> {
    pub fn new(runner: &'a dyn CommandRunner, project: ProjectLayout, manifest: BuildManifest) -> Self {
        Self {
            runner,
            project,
            manifest,
        }
    }

    pub fn run(&self, request: &BuildRequest) -> Result<(), CoreError> {
        let pinned = PinnedVersion::from_file(self.project.version_file())?;
        let layout = DialectLayout::for_version(&pinned);
        info!("pinned upstream version {pinned}");

        let firmware_dir = self.project.firmware_dir();
        let library_dir = layout.library_dir(&self.project.build_dir(), &firmware_dir);

        // On the legacy layout the library is its own clone, tracked at
        // branch head; its exact state is re-derived by reset-then-patch in
        // the binding pipeline. Bring it in before touching the firmware so a
        // clone failure aborts while the firmware tree is still untouched.
        if !layout.library_is_submodule() {
            fs::create_dir_all(self.project.build_dir())?;
            let library = Checkout::new("library", &library_dir, &self.manifest.library.repo);
            ensure_present(self.runner, &library)?;
        }

        let firmware = Checkout::new("firmware", &firmware_dir, &self.manifest.firmware.repo);
        let firmware_patch = self
            .project
            .patch_file(&self.manifest.firmware.patch_prefix, &pinned);
        reconcile(self.runner, &firmware, &pinned, &firmware_patch)?;

        // The packaging tool builds wheels, which the slim bindings image
        // does not ship out of the box.
        self.runner.run(&CommandSpec::new(
            "python3",
            ["-m", "pip", "install", "--upgrade", "pip", "wheel"],
        ))?;
        // The generator and packaging tools import from the library tree.
        self.runner.run(
            &CommandSpec::new("python3", ["-m", "pip", "install", "-r", "requirements.txt"])
                .in_dir(&library_dir),
        )?;

        let dialect_source = self.project.dialect_file(&self.manifest.dialect.definition);
        let injected = inject::inject(
            self.runner,
            layout,
            &firmware_dir,
            &library_dir,
            &dialect_source,
        )?;

        stage(self.runner, &firmware_dir)?;

        fs::create_dir_all(self.project.dist_dir())?;
        let targets = if request.targets.is_empty() {
            &self.manifest.firmware.targets
        } else {
            &request.targets
        };
        let pipeline = Pipeline::new(self.runner, &self.project, &self.manifest, &pinned, layout);
        pipeline.produce(request.classes, targets, &request.run_version, &injected)?;

        info!("build finished, artifacts in {}", self.project.dist_dir().display());
        Ok(())
    }
}
