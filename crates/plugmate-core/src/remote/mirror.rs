//! Legacy shared-folder mirror backend
//!
//! Resolves artifacts under `<root>/plugins/<name>/<version>/` and
//! keeps a directory manifest at `<root>/index.json`. Publishing
//! updates the index entry in the same call: the version list stays
//! sorted descending and `latest` always points at its head.

use std::fs;
use std::path::{Path, PathBuf};

use crate::bundle::{FileBundle, ENTRY_FILE};
use crate::error::{PlugmateError, Result};
use crate::manifest::PluginManifest;
use crate::remote::{IndexEntry, RemoteBackend, RemoteIndex};
use crate::version;

const INDEX_FILE: &str = "index.json";
const PLUGINS_DIR: &str = "plugins";

/// Shared-folder mirror of the plugin registry.
pub struct MirrorBackend {
    root: PathBuf,
}

impl MirrorBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn plugin_dir(&self, name: &str, plugin_version: &str) -> PathBuf {
        self.root.join(PLUGINS_DIR).join(name).join(plugin_version)
    }

    fn load_index(&self) -> Result<RemoteIndex> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(RemoteIndex::new());
        }

        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| PlugmateError::MalformedState {
            path,
            message: e.to_string(),
        })
    }

    fn save_index(&self, index: &RemoteIndex) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        let path = self.index_path();
        let content =
            serde_json::to_string_pretty(index).map_err(|e| PlugmateError::MalformedState {
                path: path.clone(),
                message: e.to_string(),
            })?;

        fs::write(&path, content)?;
        Ok(())
    }
}

impl RemoteBackend for MirrorBackend {
    fn label(&self) -> &'static str {
        "mirror"
    }

    fn list_versions(&self, name: &str) -> Result<Vec<String>> {
        let index = self.load_index()?;
        let entry = index
            .get(name)
            .ok_or_else(|| PlugmateError::PluginNotFound {
                name: name.to_string(),
            })?;

        if entry.versions.is_empty() {
            return Err(PlugmateError::PluginNotFound {
                name: name.to_string(),
            });
        }

        Ok(entry.versions.clone())
    }

    fn fetch(&self, name: &str, plugin_version: &str) -> Result<FileBundle> {
        let dir = self.plugin_dir(name, plugin_version);
        if !dir.join(ENTRY_FILE).is_file() {
            return Err(PlugmateError::PluginNotFound {
                name: format!("{}@{}", name, plugin_version),
            });
        }

        FileBundle::from_dir(&dir)
    }

    fn publish(
        &self,
        name: &str,
        plugin_version: &str,
        manifest: &PluginManifest,
        bundle: &FileBundle,
    ) -> Result<()> {
        let dir = self.plugin_dir(name, plugin_version);

        if !bundle.has_entry_file() {
            return Err(PlugmateError::EntryFileMissing {
                path: dir.join(ENTRY_FILE),
            });
        }

        bundle.write_to_dir(&dir)?;
        manifest.save(&dir)?;

        // Keep the index transactionally consistent with the artifact:
        // versions sorted descending, latest == head.
        let mut index = self.load_index()?;
        let entry = index.entry(name.to_string()).or_insert_with(IndexEntry::default);

        if !entry.versions.iter().any(|v| v == plugin_version) {
            entry.versions.push(plugin_version.to_string());
            entry.versions.sort_by_key(|v| version::sort_key(v));
            entry.versions.reverse();
        }
        entry.latest = entry.versions[0].clone();

        self.save_index(&index)
    }

    fn index(&self) -> Result<RemoteIndex> {
        self.load_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_mirror() -> (MirrorBackend, TempDir) {
        let temp = TempDir::new().unwrap();
        let mirror = MirrorBackend::new(temp.path().join("mirror"));
        (mirror, temp)
    }

    fn publish_stub(mirror: &MirrorBackend, name: &str, plugin_version: &str) {
        let manifest = PluginManifest::generated(name, plugin_version);
        mirror
            .publish(name, plugin_version, &manifest, &FileBundle::stub())
            .unwrap();
    }

    #[test]
    fn test_publish_then_fetch() {
        let (mirror, _temp) = create_test_mirror();
        publish_stub(&mirror, "ocr", "1.0.0");

        let bundle = mirror.fetch("ocr", "1.0.0").unwrap();
        assert!(bundle.has_entry_file());
        assert!(bundle.get("manifest.json").is_some());
    }

    #[test]
    fn test_fetch_missing_fails() {
        let (mirror, _temp) = create_test_mirror();

        let err = mirror.fetch("ghost", "1.0.0").unwrap_err();
        assert!(matches!(err, PlugmateError::PluginNotFound { .. }));
    }

    #[test]
    fn test_publish_requires_entry_file() {
        let (mirror, _temp) = create_test_mirror();
        let manifest = PluginManifest::generated("ocr", "1.0.0");

        let err = mirror
            .publish("ocr", "1.0.0", &manifest, &FileBundle::new())
            .unwrap_err();
        assert!(matches!(err, PlugmateError::EntryFileMissing { .. }));
    }

    #[test]
    fn test_index_sorted_descending_with_latest() {
        let (mirror, _temp) = create_test_mirror();
        publish_stub(&mirror, "ocr", "0.2.0");
        publish_stub(&mirror, "ocr", "0.10.0");
        publish_stub(&mirror, "ocr", "0.1.0");

        let index = mirror.index().unwrap();
        let entry = index.get("ocr").unwrap();
        assert_eq!(entry.versions, vec!["0.10.0", "0.2.0", "0.1.0"]);
        assert_eq!(entry.latest, "0.10.0");
    }

    #[test]
    fn test_republish_same_version_no_duplicate() {
        let (mirror, _temp) = create_test_mirror();
        publish_stub(&mirror, "ocr", "1.0.0");
        publish_stub(&mirror, "ocr", "1.0.0");

        let index = mirror.index().unwrap();
        assert_eq!(index.get("ocr").unwrap().versions.len(), 1);
    }

    #[test]
    fn test_list_versions_unknown_plugin() {
        let (mirror, _temp) = create_test_mirror();

        let err = mirror.list_versions("ghost").unwrap_err();
        assert!(matches!(err, PlugmateError::PluginNotFound { .. }));
    }

    #[test]
    fn test_list_versions_after_publish() {
        let (mirror, _temp) = create_test_mirror();
        publish_stub(&mirror, "ocr", "1.0.0");
        publish_stub(&mirror, "ocr", "1.1.0");

        let versions = mirror.list_versions("ocr").unwrap();
        assert_eq!(versions, vec!["1.1.0", "1.0.0"]);
    }
}
