use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("firmware.targets must not be empty")]
    EmptyTargets,
    #[error("dialect.name must not be empty")]
    EmptyDialectName,
}

/// Optional `mavforge.toml` describing the upstream repositories and the
/// vendor dialect. Every field is defaulted so a missing manifest still
/// produces a usable configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BuildManifest {
    #[serde(default)]
    pub firmware: FirmwareSection,
    #[serde(default)]
    pub library: LibrarySection,
    #[serde(default)]
    pub dialect: DialectSection,
    #[serde(default)]
    pub container: ContainerSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FirmwareSection {
    #[serde(default = "default_firmware_repo")]
    pub repo: String,
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,
    /// Patch filename prefix; the full name is `<prefix>_<pinned>.patch`.
    #[serde(default = "default_firmware_patch_prefix")]
    pub patch_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LibrarySection {
    #[serde(default = "default_library_repo")]
    pub repo: String,
    #[serde(default = "default_library_patch_prefix")]
    pub patch_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DialectSection {
    #[serde(default = "default_dialect_name")]
    pub name: String,
    /// Definition file at the project root, injected into the checkout.
    #[serde(default = "default_dialect_definition")]
    pub definition: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContainerSection {
    /// Image with the full firmware cross-toolchain.
    #[serde(default = "default_full_image")]
    pub full_image: String,
    /// Lighter image sufficient when only bindings/plugin are requested.
    #[serde(default = "default_bindings_image")]
    pub bindings_image: String,
}

impl Default for FirmwareSection {
    fn default() -> Self {
        Self {
            repo: default_firmware_repo(),
            targets: default_targets(),
            patch_prefix: default_firmware_patch_prefix(),
        }
    }
}

impl Default for LibrarySection {
    fn default() -> Self {
        Self {
            repo: default_library_repo(),
            patch_prefix: default_library_patch_prefix(),
        }
    }
}

impl Default for DialectSection {
    fn default() -> Self {
        Self {
            name: default_dialect_name(),
            definition: default_dialect_definition(),
        }
    }
}

impl Default for ContainerSection {
    fn default() -> Self {
        Self {
            full_image: default_full_image(),
            bindings_image: default_bindings_image(),
        }
    }
}

fn default_firmware_repo() -> String {
    "https://github.com/PX4/PX4-Autopilot".to_owned()
}

fn default_targets() -> Vec<String> {
    // Pixhawk v5X, v6c, v6x and the NXP FMUK66.
    vec![
        "px4_fmu-v5x_default".to_owned(),
        "px4_fmu-v6c_default".to_owned(),
        "px4_fmu-v6x_default".to_owned(),
        "nxp_fmuk66-v3_default".to_owned(),
    ]
}

fn default_firmware_patch_prefix() -> String {
    "hil_gps_heading".to_owned()
}

fn default_library_repo() -> String {
    "https://github.com/ardupilot/pymavlink".to_owned()
}

fn default_library_patch_prefix() -> String {
    "pymavlink".to_owned()
}

fn default_dialect_name() -> String {
    "bell".to_owned()
}

fn default_dialect_definition() -> String {
    "bell.xml".to_owned()
}

fn default_full_image() -> String {
    "docker.io/px4io/px4-dev-nuttx-focal:latest".to_owned()
}

fn default_bindings_image() -> String {
    "docker.io/library/python:3.11-buster".to_owned()
}

impl BuildManifest {
    fn validate(self) -> Result<Self, ManifestError> {
        if self.firmware.targets.is_empty() {
            return Err(ManifestError::EmptyTargets);
        }
        if self.dialect.name.trim().is_empty() {
            return Err(ManifestError::EmptyDialectName);
        }
        Ok(self)
    }
}

pub fn parse_manifest_str(input: &str) -> Result<BuildManifest, ManifestError> {
    toml::from_str::<BuildManifest>(input)?.validate()
}

/// Load `mavforge.toml` if present; a missing file yields the defaults.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<BuildManifest, ManifestError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(BuildManifest::default());
    }
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_manifest() {
        let input = r#"
[firmware]
repo = "https://example.com/firmware"
targets = ["custom_board_default"]
patch_prefix = "custom_fix"

[library]
repo = "https://example.com/protocol"
patch_prefix = "protocol"

[dialect]
name = "acme"
definition = "acme.xml"

[container]
full_image = "example.com/toolchain:1"
bindings_image = "example.com/python:3"
"#;
        let manifest = parse_manifest_str(input).expect("should parse");
        assert_eq!(manifest.firmware.repo, "https://example.com/firmware");
        assert_eq!(manifest.firmware.targets, vec!["custom_board_default"]);
        assert_eq!(manifest.dialect.name, "acme");
        assert_eq!(manifest.container.bindings_image, "example.com/python:3");
    }

    #[test]
    fn empty_manifest_uses_defaults() {
        let manifest = parse_manifest_str("").expect("should parse");
        assert_eq!(manifest, BuildManifest::default());
        assert_eq!(manifest.firmware.targets.len(), 4);
        assert_eq!(manifest.dialect.name, "bell");
        assert_eq!(manifest.dialect.definition, "bell.xml");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = load_manifest(dir.path().join("mavforge.toml")).unwrap();
        assert_eq!(manifest, BuildManifest::default());
    }

    #[test]
    fn rejects_unknown_fields() {
        let input = r#"
[dialect]
name = "acme"
unknown_field = true
"#;
        assert!(parse_manifest_str(input).is_err());
    }

    #[test]
    fn rejects_empty_targets() {
        let input = r"
[firmware]
targets = []
";
        assert!(matches!(
            parse_manifest_str(input),
            Err(ManifestError::EmptyTargets)
        ));
    }

    #[test]
    fn rejects_blank_dialect_name() {
        let input = r#"
[dialect]
name = " "
"#;
        assert!(matches!(
            parse_manifest_str(input),
            Err(ManifestError::EmptyDialectName)
        ));
    }
}
