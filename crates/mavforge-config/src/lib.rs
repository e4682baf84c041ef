//! Configuration layer for mavforge builds.
//!
//! This crate defines the immutable inputs of a run: the pinned upstream
//! version (`PinnedVersion`), the version-gated dialect layout selection
//! (`DialectLayout`), the optional TOML build manifest (`BuildManifest`),
//! and the fixed on-disk project layout (`ProjectLayout`).

pub mod layout;
pub mod manifest;
pub mod paths;
pub mod version;

pub use layout::{DialectLayout, LAYOUT_BOUNDARY};
pub use manifest::{
    load_manifest, parse_manifest_str, BuildManifest, ContainerSection, DialectSection,
    FirmwareSection, LibrarySection, ManifestError,
};
pub use paths::ProjectLayout;
pub use version::{PinnedVersion, VersionError};
