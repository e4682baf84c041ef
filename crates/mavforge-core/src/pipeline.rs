//! The artifact pipeline: binding packaging, dissector-plugin generation,
//! and firmware compilation, in dependency order, with outputs copied into
//! the single flat artifact directory.

use crate::inject::generator_spec;
use crate::janitor::{clean_directory, copy_tree};
use mavforge_config::{BuildManifest, DialectLayout, PinnedVersion, ProjectLayout};
use mavforge_runtime::{git, CommandRunner, CommandSpec, RunnerError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const FIRMWARE_IMAGE_SUFFIX: &str = ".px4";
pub const BINDING_SUFFIXES: &[&str] = &[".tar.gz", ".whl"];

/// Which artifact classes a run should produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactClasses {
    pub bindings: bool,
    pub firmware: bool,
    pub plugin: bool,
}

impl ArtifactClasses {
    pub fn any(self) -> bool {
        self.bindings || self.firmware || self.plugin
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("the dissector plugin requires the bindings pipeline; request both")]
    PluginWithoutBindings,
    #[error("no library patch file: expected {0}")]
    MissingLibraryPatch(PathBuf),
    #[error(transparent)]
    Runner(#[from] RunnerError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Artifact filename for one firmware target, encoding the target, the
/// pinned upstream version, and the run version so artifacts from different
/// runs never collide in a shared directory.
pub fn firmware_artifact_name(target: &str, pinned: &PinnedVersion, run_version: &str) -> String {
    format!("{target}.{pinned}.{run_version}{FIRMWARE_IMAGE_SUFFIX}")
}

/// Produces the requested artifact classes from reconciled, snapshotted
/// checkouts. Every external invocation is fail-fast; partial artifacts from
/// earlier steps are deliberately left in place for operator inspection.
pub struct Pipeline<'a> {
    runner: &'a dyn CommandRunner,
    project: &'a ProjectLayout,
    manifest: &'a BuildManifest,
    pinned: &'a PinnedVersion,
    layout: DialectLayout,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        project: &'a ProjectLayout,
        manifest: &'a BuildManifest,
        pinned: &'a PinnedVersion,
        layout: DialectLayout,
    ) -> Self {
        Self {
            runner,
            project,
            manifest,
            pinned,
            layout,
        }
    }

    fn library_dir(&self) -> PathBuf {
        self.layout
            .library_dir(&self.project.build_dir(), &self.project.firmware_dir())
    }

    /// Run the requested sub-pipelines in dependency order. The plugin
    /// generator reuses the binding pipeline's injected definition path, so
    /// requesting it alone fails before any external process is invoked.
    pub fn produce(
        &self,
        classes: ArtifactClasses,
        targets: &[String],
        run_version: &str,
        definition: &Path,
    ) -> Result<(), BuildError> {
        if classes.plugin && !classes.bindings {
            return Err(BuildError::PluginWithoutBindings);
        }

        if classes.bindings {
            self.package_bindings()?;
            if classes.plugin {
                self.generate_plugin(definition)?;
            }
        }

        if classes.firmware {
            self.build_firmware(targets, run_version)?;
        }

        Ok(())
    }

    /// Package the language bindings: reset and re-patch the library tree,
    /// sync the firmware's message definitions into it so both trees encode
    /// the exact same schema, then hand off to the external packaging tool
    /// with the dialect name bound into its environment.
    fn package_bindings(&self) -> Result<(), BuildError> {
        let library_dir = self.library_dir();
        let dist_dir = self.project.dist_dir();

        info!("packaging {} bindings", self.manifest.dialect.name);

        let patch = self
            .project
            .patch_file(&self.manifest.library.patch_prefix, self.pinned);
        if !patch.is_file() {
            return Err(BuildError::MissingLibraryPatch(patch));
        }
        self.runner.run(&git(["reset", "--hard"], &library_dir))?;
        self.runner.run(&git(
            [
                "apply",
                "--ignore-space-change",
                "--ignore-whitespace",
                &patch.display().to_string(),
            ],
            &library_dir,
        ))?;

        let source_definitions = self
            .layout
            .message_definitions_dir(&self.project.firmware_dir());
        let library_definitions = library_dir.join("message_definitions").join("v1.0");
        if library_definitions.exists() {
            fs::remove_dir_all(&library_definitions)?;
        }
        copy_tree(&source_definitions, &library_definitions)?;

        let library_dist = library_dir.join("dist");
        clean_directory(&library_dist, BINDING_SUFFIXES)?;
        clean_directory(&dist_dir, BINDING_SUFFIXES)?;

        self.runner.run(
            &CommandSpec::new("python3", ["setup.py", "sdist", "bdist_wheel"])
                .in_dir(&library_dir)
                .with_env("MAVLINK_DIALECT", &self.manifest.dialect.name),
        )?;

        // Copy every produced file into the shared artifact directory as-is.
        for entry in fs::read_dir(&library_dist)? {
            let entry = entry?;
            fs::copy(entry.path(), dist_dir.join(entry.file_name()))?;
        }
        Ok(())
    }

    /// Generate the protocol-dissector plugin straight into the artifact
    /// directory. Only valid after the binding pipeline has run.
    fn generate_plugin(&self, definition: &Path) -> Result<(), BuildError> {
        let plugin = self
            .project
            .dist_dir()
            .join(format!("{}.lua", self.manifest.dialect.name));
        info!("generating dissector plugin {}", plugin.display());
        self.runner.run(&generator_spec(
            "WLua",
            &plugin,
            definition,
            &self.library_dir(),
        ))?;
        Ok(())
    }

    /// Compile each target in the caller-supplied order and copy its image
    /// into the artifact directory. Targets are independent: a later failure
    /// leaves earlier artifacts in place, but aborts the run immediately.
    fn build_firmware(&self, targets: &[String], run_version: &str) -> Result<(), BuildError> {
        let firmware_dir = self.project.firmware_dir();
        let firmware_build_dir = firmware_dir.join("build");
        let dist_dir = self.project.dist_dir();

        clean_directory(&firmware_build_dir, &[FIRMWARE_IMAGE_SUFFIX])?;
        clean_directory(&dist_dir, &[FIRMWARE_IMAGE_SUFFIX])?;

        for target in targets {
            info!("building firmware target {target}");
            self.runner.run(
                &CommandSpec::new("make", [target.as_str(), "-j"]).in_dir(&firmware_dir),
            )?;

            let image = firmware_build_dir
                .join(target)
                .join(format!("{target}{FIRMWARE_IMAGE_SUFFIX}"));
            let artifact = dist_dir.join(firmware_artifact_name(target, self.pinned, run_version));
            fs::copy(&image, &artifact)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mavforge_runtime::MockRunner;

    struct Fixture {
        _dir: tempfile::TempDir,
        project: ProjectLayout,
        manifest: BuildManifest,
        pinned: PinnedVersion,
        layout: DialectLayout,
    }

    /// A nested-layout project with a fake firmware checkout, library tree,
    /// and library patch on disk.
    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectLayout::new(dir.path());
        let manifest = BuildManifest::default();
        let pinned = PinnedVersion::new("v1.13.2");
        let layout = DialectLayout::for_version(&pinned);

        let firmware = project.firmware_dir();
        fs::create_dir_all(layout.message_definitions_dir(&firmware)).unwrap();
        fs::write(
            layout.message_definitions_dir(&firmware).join("bell.xml"),
            "<mavlink/>",
        )
        .unwrap();
        let library = layout.library_dir(&project.build_dir(), &firmware);
        fs::create_dir_all(library.join("dist")).unwrap();
        fs::create_dir_all(project.dist_dir()).unwrap();
        fs::create_dir_all(project.patches_dir()).unwrap();
        fs::write(
            project.patch_file(&manifest.library.patch_prefix, &pinned),
            "--- a\n+++ b\n",
        )
        .unwrap();

        Fixture {
            _dir: dir,
            project,
            manifest,
            pinned,
            layout,
        }
    }

    fn place_image(f: &Fixture, target: &str) {
        let image_dir = f.project.firmware_dir().join("build").join(target);
        fs::create_dir_all(&image_dir).unwrap();
        fs::write(image_dir.join(format!("{target}.px4")), b"image").unwrap();
    }

    #[test]
    fn plugin_without_bindings_fails_before_any_process() {
        let f = fixture();
        let runner = MockRunner::new();
        let pipeline = Pipeline::new(&runner, &f.project, &f.manifest, &f.pinned, f.layout);

        let err = pipeline
            .produce(
                ArtifactClasses {
                    plugin: true,
                    ..ArtifactClasses::default()
                },
                &[],
                "r1",
                Path::new("/x/bell.xml"),
            )
            .unwrap_err();

        assert!(matches!(err, BuildError::PluginWithoutBindings));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn later_target_failure_keeps_earlier_artifacts() {
        let f = fixture();
        place_image(&f, "board_a");
        place_image(&f, "board_b");
        let runner = MockRunner::new();
        runner.fail_on("make board_b");
        let pipeline = Pipeline::new(&runner, &f.project, &f.manifest, &f.pinned, f.layout);

        let err = pipeline
            .produce(
                ArtifactClasses {
                    firmware: true,
                    ..ArtifactClasses::default()
                },
                &["board_a".to_owned(), "board_b".to_owned()],
                "r1",
                Path::new("/x/bell.xml"),
            )
            .unwrap_err();

        assert!(matches!(err, BuildError::Runner(_)));
        let kept = f
            .project
            .dist_dir()
            .join(firmware_artifact_name("board_a", &f.pinned, "r1"));
        assert!(kept.exists(), "board_a artifact must survive the failure");
        assert!(!f
            .project
            .dist_dir()
            .join(firmware_artifact_name("board_b", &f.pinned, "r1"))
            .exists());
    }

    #[test]
    fn run_versions_keep_artifacts_distinct() {
        let f = fixture();
        place_image(&f, "board_a");
        let runner = MockRunner::new();
        let pipeline = Pipeline::new(&runner, &f.project, &f.manifest, &f.pinned, f.layout);
        let classes = ArtifactClasses {
            firmware: true,
            ..ArtifactClasses::default()
        };

        pipeline
            .produce(classes, &["board_a".to_owned()], "r1", Path::new("/x"))
            .unwrap();
        // Artifacts of a different run version are not cleaned: the janitor
        // only matches the image suffix inside the firmware build tree and
        // the previous artifact was named with r1.
        let first = f
            .project
            .dist_dir()
            .join(firmware_artifact_name("board_a", &f.pinned, "r1"));
        assert!(first.exists());

        pipeline
            .produce(classes, &["board_a".to_owned()], "r2", Path::new("/x"))
            .unwrap();
        let second = f
            .project
            .dist_dir()
            .join(firmware_artifact_name("board_a", &f.pinned, "r2"));
        assert!(second.exists());
        assert_ne!(first, second);
    }

    #[test]
    fn bindings_reset_patch_sync_and_package() {
        let f = fixture();
        let library = f
            .layout
            .library_dir(&f.project.build_dir(), &f.project.firmware_dir());
        // Stale outputs in the shared artifact directory must be cleaned.
        fs::write(f.project.dist_dir().join("old-1.0.whl"), b"stale").unwrap();
        let runner = MockRunner::new();
        runner.touch_on("setup.py", library.join("dist").join("pymavlink-2.4.tar.gz"));
        runner.touch_on("setup.py", library.join("dist").join("pymavlink-2.4.whl"));
        let pipeline = Pipeline::new(&runner, &f.project, &f.manifest, &f.pinned, f.layout);

        pipeline
            .produce(
                ArtifactClasses {
                    bindings: true,
                    ..ArtifactClasses::default()
                },
                &[],
                "r1",
                Path::new("/x/bell.xml"),
            )
            .unwrap();

        let lines = runner.command_lines();
        assert!(lines.iter().any(|l| l.contains("reset --hard")));
        assert!(lines.iter().any(|l| l.contains("apply") && l.contains("pymavlink_v1.13.2.patch")));
        assert!(lines.iter().any(|l| l.contains("setup.py sdist bdist_wheel")));
        // The packaging invocation carries the dialect in its environment.
        let package_call = runner
            .calls()
            .into_iter()
            .find(|c| c.display_line().contains("setup.py"))
            .unwrap();
        assert!(package_call
            .env
            .contains(&("MAVLINK_DIALECT".to_owned(), "bell".to_owned())));

        // Definitions synced from the firmware tree.
        assert!(library
            .join("message_definitions")
            .join("v1.0")
            .join("bell.xml")
            .exists());
        // Outputs copied flat; stale output gone.
        assert!(f.project.dist_dir().join("pymavlink-2.4.tar.gz").exists());
        assert!(f.project.dist_dir().join("pymavlink-2.4.whl").exists());
        assert!(!f.project.dist_dir().join("old-1.0.whl").exists());
    }

    #[test]
    fn plugin_generation_follows_bindings() {
        let f = fixture();
        let runner = MockRunner::new();
        let pipeline = Pipeline::new(&runner, &f.project, &f.manifest, &f.pinned, f.layout);
        let definition = f
            .layout
            .message_definitions_dir(&f.project.firmware_dir())
            .join("bell.xml");

        pipeline
            .produce(
                ArtifactClasses {
                    bindings: true,
                    plugin: true,
                    ..ArtifactClasses::default()
                },
                &[],
                "r1",
                &definition,
            )
            .unwrap();

        let lines = runner.command_lines();
        let plugin_call = lines.iter().find(|l| l.contains("--lang=WLua")).unwrap();
        assert!(plugin_call.contains("bell.lua"));
        // Ordering: packaging before plugin generation.
        let package_idx = lines.iter().position(|l| l.contains("setup.py")).unwrap();
        let plugin_idx = lines.iter().position(|l| l.contains("--lang=WLua")).unwrap();
        assert!(package_idx < plugin_idx);
    }

    #[test]
    fn missing_library_patch_fails_before_reset() {
        let f = fixture();
        fs::remove_file(f.project.patch_file(&f.manifest.library.patch_prefix, &f.pinned))
            .unwrap();
        let runner = MockRunner::new();
        let pipeline = Pipeline::new(&runner, &f.project, &f.manifest, &f.pinned, f.layout);

        let err = pipeline
            .produce(
                ArtifactClasses {
                    bindings: true,
                    ..ArtifactClasses::default()
                },
                &[],
                "r1",
                Path::new("/x/bell.xml"),
            )
            .unwrap_err();

        assert!(matches!(err, BuildError::MissingLibraryPatch(_)));
        assert!(runner.calls().is_empty());
    }
}
