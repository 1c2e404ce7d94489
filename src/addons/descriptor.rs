//! Addon descriptor parsing.
//!
//! Each addon is described by one TOML file in the addon directory:
//!
//! ```toml
//! [addon]
//! name = "kimpanel"
//! general_name = "KDE Input Method Panel"
//! category = "ui"
//! library = "addon-kimpanel.so"
//! dependency = "dbus"
//! priority = 100
//! ```
//!
//! Files are read in lexicographic filename order, which is the discovery
//! order the registry uses to break priority ties.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::AddonError;
use super::record::{AddonCategory, AddonRecord, AddonType};

/// File extension of addon descriptors.
pub const DESCRIPTOR_EXTENSION: &str = "toml";

/// Addon descriptor file.
#[derive(Debug, Clone, Deserialize)]
pub struct AddonDescriptor {
    pub addon: AddonSection,
}

/// The `[addon]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct AddonSection {
    pub name: String,
    #[serde(default)]
    pub general_name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub category: AddonCategory,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub library: String,
    #[serde(default, rename = "type")]
    pub addon_type: AddonType,
    /// Comma-separated addon names
    #[serde(default)]
    pub dependency: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub sub_config: String,
    #[serde(default)]
    pub register_method: String,
    #[serde(default)]
    pub register_argument: String,
}

fn default_enabled() -> bool {
    true
}

impl AddonDescriptor {
    pub fn into_record(self) -> AddonRecord {
        let section = self.addon;
        let mut record = AddonRecord::new(section.name, section.category)
            .with_enabled(section.enabled)
            .with_type(section.addon_type)
            .with_library(section.library)
            .with_priority(section.priority)
            .with_dependency(section.dependency);
        if !section.general_name.is_empty() {
            record.general_name = section.general_name;
        }
        record.comment = section.comment;
        record.sub_config = section.sub_config;
        record.register_method = section.register_method;
        record.register_argument = section.register_argument;
        record
    }
}

/// Parse descriptor text. `path` is only used in errors.
pub fn parse_descriptor(content: &str, path: &Path) -> Result<AddonRecord, AddonError> {
    let descriptor: AddonDescriptor =
        toml::from_str(content).map_err(|source| AddonError::DescriptorParse {
            path: path.to_path_buf(),
            source,
        })?;

    validate(&descriptor, path)?;
    Ok(descriptor.into_record())
}

/// Read and parse one descriptor file.
pub fn load_descriptor(path: &Path) -> Result<AddonRecord, AddonError> {
    let content = fs::read_to_string(path).map_err(|source| AddonError::DescriptorIo {
        path: path.to_path_buf(),
        source,
    })?;
    parse_descriptor(&content, path)
}

/// Load every descriptor in `dir`, in filename order.
///
/// A missing directory yields no records. Descriptors that fail to read or
/// parse are skipped with a warning.
pub fn load_descriptors(dir: &Path) -> Result<Vec<AddonRecord>, AddonError> {
    let mut records = Vec::new();
    for path in descriptor_paths(dir)? {
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        tracing::info!(file = %file_name, "Load addon config file");

        match load_descriptor(&path) {
            Ok(record) => {
                tracing::debug!(
                    file = %file_name,
                    addon = %record.name,
                    "Addon config {} is {}",
                    file_name,
                    if record.enabled { "enabled" } else { "disabled" }
                );
                records.push(record);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping addon descriptor");
            }
        }
    }
    Ok(records)
}

/// Descriptor files in `dir`, sorted by filename.
pub fn descriptor_paths(dir: &Path) -> Result<Vec<PathBuf>, AddonError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "Addon directory does not exist");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(AddonError::DescriptorIo {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(DESCRIPTOR_EXTENSION)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

fn validate(descriptor: &AddonDescriptor, path: &Path) -> Result<(), AddonError> {
    let name = &descriptor.addon.name;
    if name.trim().is_empty() {
        return Err(AddonError::InvalidDescriptor {
            path: path.to_path_buf(),
            reason: "addon name is required".into(),
        });
    }
    if name.contains(super::record::DEPENDENCY_SEPARATOR) {
        return Err(AddonError::InvalidDescriptor {
            path: path.to_path_buf(),
            reason: format!("addon name '{name}' contains a dependency separator"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, content: &str) {
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn parses_full_descriptor() {
        let content = r#"
[addon]
name = "kimpanel"
general_name = "KDE Input Method Panel"
comment = "Panel over D-Bus"
category = "ui"
enabled = false
library = "addon-kimpanel.so"
type = "shared_library"
dependency = "dbus, xkb"
priority = 100
sub_config = "kimpanel:config"
"#;
        let record = parse_descriptor(content, Path::new("kimpanel.toml")).unwrap();
        assert_eq!(record.name, "kimpanel");
        assert_eq!(record.general_name, "KDE Input Method Panel");
        assert!(record.is_ui());
        assert!(!record.enabled);
        assert_eq!(record.library, "addon-kimpanel.so");
        assert_eq!(record.dependencies(), ["dbus", "xkb"]);
        assert_eq!(record.priority, 100);
        assert_eq!(record.sub_config, "kimpanel:config");
    }

    #[test]
    fn minimal_descriptor_uses_defaults() {
        let record = parse_descriptor("[addon]\nname = \"xkb\"\n", Path::new("xkb.toml")).unwrap();
        assert!(record.enabled);
        assert_eq!(record.category, AddonCategory::Module);
        assert_eq!(record.addon_type, AddonType::SharedLibrary);
        assert_eq!(record.general_name, "xkb");
        assert!(record.dependencies().is_empty());
    }

    #[test]
    fn rejects_empty_name() {
        let err = parse_descriptor("[addon]\nname = \"\"\n", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, AddonError::InvalidDescriptor { .. }));
    }

    #[test]
    fn rejects_unknown_category() {
        let err = parse_descriptor(
            "[addon]\nname = \"x\"\ncategory = \"widget\"\n",
            Path::new("x.toml"),
        )
        .unwrap_err();
        assert!(matches!(err, AddonError::DescriptorParse { .. }));
    }

    #[test]
    fn loads_directory_in_filename_order_and_skips_bad_files() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "20-b.toml", "[addon]\nname = \"b\"\n");
        write(tmp.path(), "10-a.toml", "[addon]\nname = \"a\"\n");
        write(tmp.path(), "30-broken.toml", "[addon\nname = ");
        write(tmp.path(), "notes.txt", "[addon]\nname = \"ignored\"\n");

        let records = load_descriptors(tmp.path()).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn missing_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        let records = load_descriptors(&tmp.path().join("absent")).unwrap();
        assert!(records.is_empty());
    }
}
