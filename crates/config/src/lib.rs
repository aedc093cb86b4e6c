// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default schema version for YAML manifests
fn default_schema_version() -> String {
    "1.0".to_string()
}

pub const SUPPORTED_SCHEMA_VERSION: &str = "1.0";

/// Instruction set the guest code is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestMode {
    #[serde(alias = "aarch64", alias = "arm64")]
    A64,
    #[serde(alias = "arm", alias = "aarch32")]
    A32,
    #[serde(alias = "t16", alias = "t32")]
    Thumb,
}

impl std::str::FromStr for GuestMode {
    type Err = ManifestError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a64" | "aarch64" | "arm64" => Ok(GuestMode::A64),
            "a32" | "arm" | "aarch32" => Ok(GuestMode::A32),
            "thumb" | "t16" | "t32" => Ok(GuestMode::Thumb),
            _ => Err(ManifestError::UnknownMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Elf,
    #[serde(alias = "bin")]
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Function,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageConfig {
    pub path: String,
    #[serde(default)]
    pub format: ImageFormat,
    /// Where a raw image is placed in the guest address space.
    #[serde(default)]
    pub load_address: Option<u64>,
    #[serde(default)]
    pub max_size: Option<String>, // e.g. "64MB"
}

impl ImageConfig {
    pub fn max_size_bytes(&self) -> Result<Option<u64>> {
        self.max_size.as_deref().map(parse_size).transpose()
    }
}

/// One decode request: an address or a symbol, and how far to follow it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DecodeTarget {
    #[serde(default)]
    pub entry: Option<u64>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub strategy: Strategy,
}

impl DecodeTarget {
    /// Name used in listings and error messages.
    pub fn label(&self) -> String {
        match (&self.symbol, self.entry) {
            (Some(symbol), _) => symbol.clone(),
            (None, Some(entry)) => format!("{:#x}", entry),
            (None, None) => "<unnamed>".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DecodeManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub image: ImageConfig,
    /// Overrides the mode inferred from the image. Required for raw images.
    #[serde(default)]
    pub mode: Option<GuestMode>,
    pub targets: Vec<DecodeTarget>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    #[error("Unsupported schema_version '{0}'. Supported versions: '1.0'")]
    UnsupportedVersion(String),
    #[error("Image 'path' cannot be empty")]
    EmptyImagePath,
    #[error("Manifest must list at least one target")]
    NoTargets,
    #[error("Target #{0} must set exactly one of 'entry' or 'symbol'")]
    AmbiguousTarget(usize),
    #[error("'load_address' is only meaningful for raw images")]
    LoadAddressOnElf,
    #[error("Raw images need an explicit 'mode'")]
    RawWithoutMode,
    #[error("Unknown guest mode '{0}'. Expected a64, a32 or thumb")]
    UnknownMode(String),
}

impl DecodeManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to open decode manifest at {:?}", path.as_ref()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let manifest: Self =
            serde_yaml::from_str(yaml).context("Failed to parse Decode Manifest YAML")?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(ManifestError::UnsupportedVersion(self.schema_version.clone()).into());
        }

        if self.image.path.trim().is_empty() {
            return Err(ManifestError::EmptyImagePath.into());
        }

        match self.image.format {
            ImageFormat::Elf if self.image.load_address.is_some() => {
                return Err(ManifestError::LoadAddressOnElf.into());
            }
            ImageFormat::Raw if self.mode.is_none() => {
                return Err(ManifestError::RawWithoutMode.into());
            }
            _ => {}
        }

        if self.targets.is_empty() {
            return Err(ManifestError::NoTargets.into());
        }

        for (i, target) in self.targets.iter().enumerate() {
            if target.entry.is_some() == target.symbol.is_some() {
                return Err(ManifestError::AmbiguousTarget(i).into());
            }
        }

        if let Some(max) = &self.image.max_size {
            parse_size(max).with_context(|| format!("Invalid image 'max_size' {:?}", max))?;
        }

        if self.image.format == ImageFormat::Raw && self.image.load_address.is_none() {
            tracing::warn!("Raw image without 'load_address'; assuming 0x0");
        }

        Ok(())
    }

    /// Resolves a relative image path against the manifest's directory.
    pub fn image_path(&self, manifest_dir: &Path) -> std::path::PathBuf {
        let path = Path::new(&self.image.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            manifest_dir.join(path)
        }
    }
}

pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    let s: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    const FULL: &str = r#"
schema_version: "1.0"
image:
  path: "build/app.elf"
  max_size: "64MB"
mode: aarch64
targets:
  - entry: 0x80000000
    strategy: block
  - symbol: "main"
output:
  format: json
"#;

    fn manifest_error(yaml: &str) -> ManifestError {
        let err = DecodeManifest::from_yaml(yaml).unwrap_err();
        err.downcast::<ManifestError>()
            .expect("expected a validation error")
    }

    #[test]
    fn test_valid_manifest() {
        let manifest = DecodeManifest::from_yaml(FULL).unwrap();

        assert_eq!(manifest.image.format, ImageFormat::Elf);
        assert_eq!(manifest.image.max_size_bytes().unwrap(), Some(64_000_000));
        assert_eq!(manifest.mode, Some(GuestMode::A64));
        assert_eq!(manifest.targets.len(), 2);
        assert_eq!(manifest.targets[0].entry, Some(0x8000_0000));
        assert_eq!(manifest.targets[0].strategy, Strategy::Block);
        assert_eq!(manifest.targets[1].strategy, Strategy::Function);
        assert_eq!(manifest.targets[1].label(), "main");
        assert_eq!(manifest.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_defaults() {
        let yaml = r#"
image:
  path: "app.elf"
targets:
  - entry: 0x1000
"#;
        let manifest = DecodeManifest::from_yaml(yaml).unwrap();
        assert_eq!(manifest.schema_version, "1.0");
        assert_eq!(manifest.mode, None);
        assert_eq!(manifest.output.format, OutputFormat::Text);
        assert_eq!(manifest.targets[0].label(), "0x1000");
    }

    #[test]
    fn test_invalid_version() {
        let yaml = r#"
schema_version: "2.0"
image: { path: "app.elf" }
targets: [{ entry: 0 }]
"#;
        assert_eq!(
            manifest_error(yaml),
            ManifestError::UnsupportedVersion("2.0".to_string())
        );
    }

    #[test]
    fn test_empty_image_path() {
        let yaml = r#"
image: { path: "  " }
targets: [{ entry: 0 }]
"#;
        assert_eq!(manifest_error(yaml), ManifestError::EmptyImagePath);
    }

    #[test]
    fn test_targets_need_exactly_one_locator() {
        let none = r#"
image: { path: "app.elf" }
targets: [{ strategy: block }]
"#;
        assert_eq!(manifest_error(none), ManifestError::AmbiguousTarget(0));

        let both = r#"
image: { path: "app.elf" }
targets:
  - entry: 0
  - entry: 4
    symbol: "main"
"#;
        assert_eq!(manifest_error(both), ManifestError::AmbiguousTarget(1));

        let empty = r#"
image: { path: "app.elf" }
targets: []
"#;
        assert_eq!(manifest_error(empty), ManifestError::NoTargets);
    }

    #[test]
    fn test_raw_image_rules() {
        let raw_no_mode = r#"
image: { path: "app.bin", format: raw, load_address: 0x8000 }
targets: [{ entry: 0x8000 }]
"#;
        assert_eq!(manifest_error(raw_no_mode), ManifestError::RawWithoutMode);

        let elf_with_base = r#"
image: { path: "app.elf", load_address: 0x8000 }
targets: [{ entry: 0x8000 }]
"#;
        assert_eq!(manifest_error(elf_with_base), ManifestError::LoadAddressOnElf);

        let raw = r#"
image: { path: "app.bin", format: raw, load_address: 0x8000 }
mode: t16
targets: [{ entry: 0x8000 }]
"#;
        let manifest = DecodeManifest::from_yaml(raw).unwrap();
        assert_eq!(manifest.mode, Some(GuestMode::Thumb));
        assert_eq!(manifest.image.load_address, Some(0x8000));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let yaml = r#"
image: { path: "app.elf" }
targets: [{ entry: 0 }]
max_steps: 10
"#;
        assert!(DecodeManifest::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_bad_max_size() {
        let yaml = r#"
image: { path: "app.elf", max_size: "lots" }
targets: [{ entry: 0 }]
"#;
        assert!(DecodeManifest::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_guest_mode_from_str() {
        assert_eq!("A64".parse::<GuestMode>(), Ok(GuestMode::A64));
        assert_eq!("arm".parse::<GuestMode>(), Ok(GuestMode::A32));
        assert_eq!(" thumb ".parse::<GuestMode>(), Ok(GuestMode::Thumb));
        assert_eq!(
            "mips".parse::<GuestMode>(),
            Err(ManifestError::UnknownMode("mips".to_string()))
        );
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1KiB").unwrap(), 1024);
        assert_eq!(parse_size("2MB").unwrap(), 2_000_000);
        assert!(parse_size("twelve").is_err());
    }

    #[test]
    fn test_image_path_resolution() {
        let manifest = DecodeManifest::from_yaml(FULL).unwrap();
        assert_eq!(
            manifest.image_path(Path::new("/work")),
            Path::new("/work/build/app.elf")
        );
    }

    fn write_temp_file(prefix: &str, contents: &str) -> std::path::PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push("armature-config-tests");
        let _ = std::fs::create_dir_all(&dir);

        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = dir.join(format!("{}-{}.yaml", prefix, nonce));
        std::fs::write(&path, contents).expect("Failed to write temp file");
        path
    }

    #[test]
    fn test_from_file() {
        let path = write_temp_file("manifest", FULL);
        let manifest = DecodeManifest::from_file(&path).unwrap();
        assert_eq!(manifest.targets.len(), 2);
        let _ = std::fs::remove_file(path);

        assert!(DecodeManifest::from_file("/nonexistent/armature.yaml").is_err());
    }
}
