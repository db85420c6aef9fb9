//! Local State Store
//!
//! Owns the two coupled JSON documents under the data directory: the
//! installed-plugin registry (registry.json) and the lockfile
//! (lock.json). The lockfile is a derived pin of the registry, never
//! independent state; `regenerate_lockfile` is the last step of every
//! mutating lifecycle operation so the two cannot drift past a single
//! interrupted run. Missing files read as empty — first-run state is
//! empty, not an error.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PlugmateError, Result};

const REGISTRY_FILE: &str = "registry.json";
const LOCKFILE_FILE: &str = "lock.json";

/// One installed plugin: name -> { version }
///
/// A registry written by an older tool may omit the version key; such
/// entries read as version "0" so comparisons still work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    #[serde(default = "default_entry_version")]
    pub version: String,
}

fn default_entry_version() -> String {
    "0".to_string()
}

/// Registry document: plugin name -> entry
pub type Registry = BTreeMap<String, RegistryEntry>;

/// Local State Store for registry.json and lock.json
pub struct StateStore {
    data_dir: PathBuf,
}

impl StateStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join(REGISTRY_FILE)
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.data_dir.join(LOCKFILE_FILE)
    }

    pub fn load_registry(&self) -> Result<Registry> {
        read_json(&self.registry_path())
    }

    pub fn load_lockfile(&self) -> Result<Registry> {
        read_json(&self.lockfile_path())
    }

    pub fn save_registry(&self, registry: &Registry) -> Result<()> {
        write_json(&self.registry_path(), registry)
    }

    /// Derive the lockfile from the current registry and persist it.
    pub fn regenerate_lockfile(&self) -> Result<()> {
        let registry = self.load_registry()?;
        let lock: Registry = registry
            .iter()
            .map(|(name, entry)| {
                (
                    name.clone(),
                    RegistryEntry {
                        version: entry.version.clone(),
                    },
                )
            })
            .collect();
        write_json(&self.lockfile_path(), &lock)
    }
}

fn read_json(path: &Path) -> Result<Registry> {
    if !path.exists() {
        return Ok(Registry::new());
    }

    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| PlugmateError::MalformedState {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn write_json(path: &Path, registry: &Registry) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content =
        serde_json::to_string_pretty(registry).map_err(|e| PlugmateError::MalformedState {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    fs::write(path, content)?;
    Ok(())
}
