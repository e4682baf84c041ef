//! Small filesystem helpers shared by the pipeline stages.

use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Delete direct entries of `dir` whose filename ends with any of the given
/// suffixes. A missing directory is a no-op.
pub fn clean_directory(dir: &Path, suffixes: &[&str]) -> io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if suffixes.iter().any(|s| name.ends_with(s)) {
            debug!("removing stale output {}", entry.path().display());
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Recursively copy a directory tree. The destination is created; existing
/// files are overwritten.
pub fn copy_tree(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
