use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("failed to read pinned version file: {0}")]
    Io(#[from] std::io::Error),
    #[error("pinned version file is empty: {0}")]
    Empty(String),
}

/// The single upstream release tag a run targets.
///
/// Read once per run and threaded through every component as an immutable
/// value; it selects both the checkout target and the patch/layout variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedVersion(String);

impl PinnedVersion {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Read a pinned version from a single-line file, trimming whitespace.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VersionError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let tag = raw.trim();
        if tag.is_empty() {
            return Err(VersionError::Empty(path.display().to_string()));
        }
        Ok(Self(tag.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this version sorts strictly before `other`.
    ///
    /// Tags of the form `v<major>.<minor>.<patch>` are compared numerically,
    /// so `v1.9.2` correctly precedes `v1.13.0`. Anything else falls back to
    /// plain string ordering.
    pub fn precedes(&self, other: &Self) -> bool {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a < b,
            _ => self.0 < other.0,
        }
    }

    fn numeric(&self) -> Option<(u64, u64, u64)> {
        let rest = self.0.strip_prefix('v')?;
        let mut parts = rest.splitn(3, '.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        Some((major, minor, patch))
    }
}

impl fmt::Display for PinnedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
