//! Plugin manifest (manifest.json)
//!
//! Per-plugin metadata living next to the plugin's entry file in its
//! installed directory. Auto-generated with defaults when a fetched
//! artifact ships without one.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlugmateError, Result};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Plugin manifest document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin name (unique key)
    #[serde(default)]
    pub name: String,
    /// Dotted numeric version string
    #[serde(default)]
    pub version: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Author
    #[serde(default)]
    pub author: String,
    /// Dependency plugin name -> constraint string
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl PluginManifest {
    /// Auto-generated manifest for a plugin without upstream metadata.
    pub fn generated(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            description: format!("Auto-generated manifest for {}", name),
            author: "unknown".to_string(),
            dependencies: BTreeMap::new(),
        }
    }

    /// Load manifest.json from a plugin directory. A missing file yields
    /// the empty default; invalid JSON is a hard error.
    pub fn load(plugin_dir: &Path) -> Result<Self> {
        let path = plugin_dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let manifest: PluginManifest =
            serde_json::from_str(&content).map_err(|e| PlugmateError::MalformedState {
                path: path.clone(),
                message: e.to_string(),
            })?;

        Ok(manifest)
    }

    /// Save manifest.json into a plugin directory.
    pub fn save(&self, plugin_dir: &Path) -> Result<()> {
        fs::create_dir_all(plugin_dir)?;

        let path = plugin_dir.join(MANIFEST_FILE);
        let content =
            serde_json::to_string_pretty(self).map_err(|e| PlugmateError::MalformedState {
                path: path.clone(),
                message: e.to_string(),
            })?;

        fs::write(&path, content)?;
        Ok(())
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| PlugmateError::MalformedState {
            path: MANIFEST_FILE.into(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generated_manifest() {
        let manifest = PluginManifest::generated("ocr", "0.2.0");
        assert_eq!(manifest.name, "ocr");
        assert_eq!(manifest.version, "0.2.0");
        assert_eq!(manifest.author, "unknown");
        assert!(manifest.dependencies.is_empty());
        assert!(manifest.description.contains("ocr"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("ocr");

        let mut manifest = PluginManifest::generated("ocr", "1.0.0");
        manifest
            .dependencies
            .insert("base".to_string(), ">=0.5.0".to_string());
        manifest.save(&dir).unwrap();

        let loaded = PluginManifest::load(&dir).unwrap();
        assert_eq!(loaded.name, "ocr");
        assert_eq!(loaded.dependencies.get("base").unwrap(), ">=0.5.0");
    }

    #[test]
    fn test_load_missing_is_default() {
        let temp = TempDir::new().unwrap();
        let manifest = PluginManifest::load(temp.path()).unwrap();
        assert!(manifest.name.is_empty());
        assert!(manifest.version.is_empty());
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(MANIFEST_FILE), "{not json").unwrap();

        let err = PluginManifest::load(temp.path()).unwrap_err();
        assert!(matches!(err, PlugmateError::MalformedState { .. }));
    }

    #[test]
    fn test_parse_partial_document() {
        let manifest: PluginManifest = serde_json::from_str(r#"{"name": "demo"}"#).unwrap();
        assert_eq!(manifest.name, "demo");
        assert!(manifest.version.is_empty());
        assert!(manifest.dependencies.is_empty());
    }
}
