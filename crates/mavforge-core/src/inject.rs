//! Dialect injection: placing the vendor message-definition file inside the
//! reconciled checkout, at the path the pinned version's layout expects.

use crate::CoreError;
use mavforge_config::DialectLayout;
use mavforge_runtime::{CommandRunner, CommandSpec};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Copy the dialect definition into the layout's message-definition
/// directory (overwriting any previous copy) and, on the legacy layout only,
/// run the external generator to emit C bindings. The post-boundary firmware
/// build generates bindings itself at compile time, so generating here again
/// would be redundant work against the wrong tree.
///
/// Returns the path of the injected definition file.
pub fn inject(
    runner: &dyn CommandRunner,
    layout: DialectLayout,
    firmware_dir: &Path,
    library_dir: &Path,
    dialect_source: &Path,
) -> Result<PathBuf, CoreError> {
    let definitions_dir = layout.message_definitions_dir(firmware_dir);
    let file_name = dialect_source
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "dialect definition has no filename"))?;
    let injected = definitions_dir.join(file_name);

    info!("injecting dialect definition at {}", injected.display());
    fs::copy(dialect_source, &injected)?;

    if layout.generates_bindings() {
        let generated_dir = layout.generated_sources_dir(firmware_dir);
        info!("generating C bindings into {}", generated_dir.display());
        runner.run(&generator_spec(
            "C",
            &generated_dir,
            &injected,
            library_dir,
        ))?;
    }

    Ok(injected)
}

/// Invocation of the external binding generator. Run from the library's
/// parent directory so the generator package resolves as a module.
pub fn generator_spec(
    lang: &str,
    output: &Path,
    definition: &Path,
    library_dir: &Path,
) -> CommandSpec {
    let cwd = library_dir.parent().unwrap_or(library_dir).to_path_buf();
    CommandSpec::new(
        "python3",
        [
            "-m",
            "pymavlink.tools.mavgen",
            &format!("--lang={lang}"),
            "--wire-protocol=2.0",
            &format!("--output={}", output.display()),
            &definition.display().to_string(),
        ],
    )
    .in_dir(cwd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mavforge_runtime::MockRunner;

    fn fake_checkouts(root: &Path, layout: DialectLayout) -> (PathBuf, PathBuf, PathBuf) {
        let firmware = root.join("build").join("PX4-Autopilot");
        fs::create_dir_all(layout.message_definitions_dir(&firmware)).unwrap();
        let library = layout.library_dir(&root.join("build"), &firmware);
        fs::create_dir_all(&library).unwrap();
        let dialect = root.join("bell.xml");
        fs::write(&dialect, "<mavlink/>").unwrap();
        (firmware, library, dialect)
    }

    #[test]
    fn legacy_layout_copies_and_generates() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DialectLayout::Legacy;
        let (firmware, library, dialect) = fake_checkouts(dir.path(), layout);
        let runner = MockRunner::new();

        let injected = inject(&runner, layout, &firmware, &library, &dialect).unwrap();

        assert!(injected.exists());
        assert!(injected.starts_with(layout.message_definitions_dir(&firmware)));
        let lines = runner.command_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("--lang=C"));
        assert!(lines[0].contains("--wire-protocol=2.0"));
    }

    #[test]
    fn nested_layout_copies_without_generating() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DialectLayout::Nested;
        let (firmware, library, dialect) = fake_checkouts(dir.path(), layout);
        let runner = MockRunner::new();

        let injected = inject(&runner, layout, &firmware, &library, &dialect).unwrap();

        assert!(injected.exists());
        assert!(injected.ends_with("message_definitions/v1.0/bell.xml"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn injection_overwrites_previous_definition() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DialectLayout::Nested;
        let (firmware, library, dialect) = fake_checkouts(dir.path(), layout);
        let stale = layout.message_definitions_dir(&firmware).join("bell.xml");
        fs::write(&stale, "<outdated/>").unwrap();
        let runner = MockRunner::new();

        inject(&runner, layout, &firmware, &library, &dialect).unwrap();

        assert_eq!(fs::read_to_string(&stale).unwrap(), "<mavlink/>");
    }

    #[test]
    fn generator_runs_from_library_parent() {
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join("pymavlink");
        let spec = generator_spec("WLua", Path::new("/out/bell.lua"), Path::new("/d/bell.xml"), &library);
        assert_eq!(spec.cwd.as_deref(), Some(dir.path()));
        assert!(spec.display_line().contains("--lang=WLua"));
    }
}
