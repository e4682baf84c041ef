use crate::version::PinnedVersion;
use std::path::{Path, PathBuf};

/// First upstream release where the protocol library moved into the firmware
/// tree as a submodule and the firmware build started generating its own
/// protocol bindings at compile time.
pub const LAYOUT_BOUNDARY: &str = "v1.13.0";

/// Which of the two historical upstream layouts holds the message-definition
/// tree, selected once per run from the pinned version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectLayout {
    /// Pre-boundary: the library is a standalone checkout and C bindings must
    /// be generated explicitly after injecting the dialect.
    Legacy,
    /// Post-boundary: the library ships as a submodule of the firmware tree
    /// and the firmware build system generates bindings itself.
    Nested,
}

impl DialectLayout {
    pub fn for_version(version: &PinnedVersion) -> Self {
        if version.precedes(&PinnedVersion::new(LAYOUT_BOUNDARY)) {
            Self::Legacy
        } else {
            Self::Nested
        }
    }

    /// Whether dialect injection must also run the external binding generator.
    /// Load-bearing asymmetry: the post-boundary firmware build generates its
    /// own bindings at compile time.
    pub fn generates_bindings(self) -> bool {
        matches!(self, Self::Legacy)
    }

    /// Whether the library arrives as a submodule of the firmware checkout
    /// instead of its own clone.
    pub fn library_is_submodule(self) -> bool {
        matches!(self, Self::Nested)
    }

    /// Directory inside the firmware tree holding the message definitions.
    pub fn message_definitions_dir(self, firmware_dir: &Path) -> PathBuf {
        match self {
            Self::Legacy => firmware_dir
                .join("mavlink")
                .join("include")
                .join("mavlink")
                .join("v2.0")
                .join("message_definitions"),
            Self::Nested => firmware_dir
                .join("src")
                .join("modules")
                .join("mavlink")
                .join("mavlink")
                .join("message_definitions")
                .join("v1.0"),
        }
    }

    /// Output directory for generated bindings. Only meaningful on the legacy
    /// layout, where generation is triggered explicitly.
    pub fn generated_sources_dir(self, firmware_dir: &Path) -> PathBuf {
        match self {
            Self::Legacy => firmware_dir
                .join("mavlink")
                .join("include")
                .join("mavlink")
                .join("v2.0"),
            Self::Nested => firmware_dir.join("src").join("modules").join("mavlink").join("mavlink"),
        }
    }

    /// Location of the protocol library checkout for this layout.
    pub fn library_dir(self, build_dir: &Path, firmware_dir: &Path) -> PathBuf {
        match self {
            Self::Legacy => build_dir.join("pymavlink"),
            Self::Nested => firmware_dir
                .join("src")
                .join("modules")
                .join("mavlink")
                .join("mavlink")
                .join("pymavlink"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_boundary_selects_legacy() {
        let layout = DialectLayout::for_version(&PinnedVersion::new("v1.12.3"));
        assert_eq!(layout, DialectLayout::Legacy);
        assert!(layout.generates_bindings());
        assert!(!layout.library_is_submodule());
    }

    #[test]
    fn boundary_and_later_select_nested() {
        for tag in ["v1.13.0", "v1.13.2", "v1.14.0"] {
            let layout = DialectLayout::for_version(&PinnedVersion::new(tag));
            assert_eq!(layout, DialectLayout::Nested, "tag {tag}");
            assert!(!layout.generates_bindings());
            assert!(layout.library_is_submodule());
        }
    }

    #[test]
    fn old_minor_versions_are_legacy() {
        // Would be mis-classified by a plain string compare.
        let layout = DialectLayout::for_version(&PinnedVersion::new("v1.9.2"));
        assert_eq!(layout, DialectLayout::Legacy);
    }

    #[test]
    fn definition_paths_differ_per_layout() {
        let fw = Path::new("/work/build/PX4-Autopilot");
        let legacy = DialectLayout::Legacy.message_definitions_dir(fw);
        let nested = DialectLayout::Nested.message_definitions_dir(fw);
        assert!(legacy.ends_with("mavlink/v2.0/message_definitions"));
        assert!(nested.ends_with("mavlink/message_definitions/v1.0"));
        assert_ne!(legacy, nested);
    }

    #[test]
    fn library_dir_per_layout() {
        let build = Path::new("/work/build");
        let fw = Path::new("/work/build/PX4-Autopilot");
        assert_eq!(
            DialectLayout::Legacy.library_dir(build, fw),
            build.join("pymavlink")
        );
        assert!(DialectLayout::Nested
            .library_dir(build, fw)
            .starts_with(fw));
    }
}
