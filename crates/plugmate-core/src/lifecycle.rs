//! Plugin lifecycle orchestration
//!
//! [`PluginManager`] sequences version resolution, the remote fallback
//! chain, dependency validation, and the local state store to
//! implement install, update, uninstall, publish, and lock.
//!
//! Consistency model is best-effort, not transactional: dependency
//! validation happens strictly before any registry mutation, the
//! registry is always written before the lockfile, and every mutating
//! operation ends by regenerating the lockfile. A crash between the
//! two writes leaves them inconsistent until the next mutating
//! operation or an explicit [`PluginManager::lock`]. Concurrent
//! invocations from two processes are out of scope.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::bundle::{FileBundle, ENTRY_FILE};
use crate::config::Config;
use crate::error::{PlugmateError, Result};
use crate::manifest::{PluginManifest, MANIFEST_FILE};
use crate::remote::api::ApiBackend;
use crate::remote::mirror::MirrorBackend;
use crate::remote::{BackendChain, RemoteIndex};
use crate::store::{RegistryEntry, StateStore};
use crate::validate;
use crate::version;

/// Baseline version used when no backend knows the plugin.
pub const DEFAULT_VERSION: &str = "0.1";

/// Where an installed artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Downloaded from a remote backend.
    Remote,
    /// Synthesized placeholder after every backend failed.
    Stub,
}

#[derive(Debug)]
pub struct InstallReport {
    pub name: String,
    pub version: String,
    pub source: ArtifactSource,
    pub install_path: PathBuf,
}

#[derive(Debug)]
pub enum UpdateReport {
    /// No newer version available (or target equals current); nothing
    /// was fetched or validated.
    AlreadyCurrent { version: String },
    Updated {
        previous: String,
        version: String,
        source: ArtifactSource,
    },
}

#[derive(Debug)]
pub struct UninstallReport {
    pub removed_files: bool,
    pub removed_entry: bool,
}

#[derive(Debug)]
pub struct PublishReport {
    pub name: String,
    pub version: String,
}

/// One row of the installed-plugin listing.
#[derive(Debug)]
pub struct PluginStatus {
    pub name: String,
    pub version: String,
    pub locked: Option<String>,
}

/// Lifecycle orchestrator over the state store, the remote backend
/// chain, and the local plugin install root.
pub struct PluginManager {
    store: StateStore,
    remote: BackendChain,
    install_root: PathBuf,
}

impl PluginManager {
    pub fn new(store: StateStore, remote: BackendChain, install_root: PathBuf) -> Self {
        Self {
            store,
            remote,
            install_root,
        }
    }

    /// Build a manager from configuration: API backend first, legacy
    /// mirror as fallback.
    pub fn from_config(config: &Config, base_dir: &Path) -> Result<Self> {
        let api = ApiBackend::new(&config.remote.api_url)?;
        let mirror = MirrorBackend::new(config.mirror_root(base_dir));
        let remote = BackendChain::new(vec![Box::new(api), Box::new(mirror)]);
        let store = StateStore::new(config.data_dir(base_dir));

        Ok(Self::new(store, remote, config.plugins_dir(base_dir)))
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn plugin_dir(&self, name: &str) -> PathBuf {
        self.install_root.join(name)
    }

    /// Install a plugin, resolving the version from the remote index
    /// when none is given.
    pub fn install(&self, name: &str, requested: Option<&str>) -> Result<InstallReport> {
        let resolved = match requested {
            Some(v) => v.to_string(),
            None => self.resolve_latest(name),
        };

        let (source, install_path) = self.materialize(name, &resolved)?;
        self.register(name, &resolved, &install_path)?;

        info!(name, version = %resolved, "installed plugin");
        Ok(InstallReport {
            name: name.to_string(),
            version: resolved,
            source,
            install_path,
        })
    }

    /// Update an installed plugin to the target or the latest remote
    /// version. Reports `AlreadyCurrent` without fetching when the
    /// candidate is not strictly newer.
    pub fn update(&self, name: &str, target: Option<&str>) -> Result<UpdateReport> {
        let registry = self.store.load_registry()?;
        let current = registry
            .get(name)
            .ok_or_else(|| PlugmateError::PluginNotInstalled {
                name: name.to_string(),
            })?
            .version
            .clone();

        let resolved = match target {
            Some(v) => v.to_string(),
            None => {
                let Some(latest) = self.remote_latest(name) else {
                    return Ok(UpdateReport::AlreadyCurrent { version: current });
                };
                if version::compare_versions(&latest, &current)? != std::cmp::Ordering::Greater {
                    return Ok(UpdateReport::AlreadyCurrent { version: current });
                }
                latest
            }
        };

        if resolved == current {
            return Ok(UpdateReport::AlreadyCurrent { version: current });
        }

        let (source, install_path) = self.materialize(name, &resolved)?;
        self.register(name, &resolved, &install_path)?;

        info!(name, from = %current, to = %resolved, "updated plugin");
        Ok(UpdateReport::Updated {
            previous: current,
            version: resolved,
            source,
        })
    }

    /// Remove a plugin's files and registry entry. Idempotent: missing
    /// pieces are tolerated, and the lockfile is re-synced either way.
    pub fn uninstall(&self, name: &str) -> Result<UninstallReport> {
        let dir = self.plugin_dir(name);
        let removed_files = dir.is_dir();
        if removed_files {
            fs::remove_dir_all(&dir)?;
        }

        let mut registry = self.store.load_registry()?;
        let removed_entry = registry.remove(name).is_some();
        if removed_entry {
            self.store.save_registry(&registry)?;
        }
        self.store.regenerate_lockfile()?;

        Ok(UninstallReport {
            removed_files,
            removed_entry,
        })
    }

    /// Publish a locally installed plugin through the backend chain.
    /// A 1- or 2-component version is zero-filled to 3 components
    /// before any remote call.
    pub fn publish(&self, name: &str, requested: Option<&str>) -> Result<PublishReport> {
        let dir = self.plugin_dir(name);
        if !dir.is_dir() {
            return Err(PlugmateError::PluginNotFound {
                name: name.to_string(),
            });
        }

        let local = PluginManifest::load(&dir)?;
        let raw = match requested {
            Some(v) => v.to_string(),
            None if local.version.is_empty() => DEFAULT_VERSION.to_string(),
            None => local.version.clone(),
        };
        let resolved = version::normalize_version(&raw);

        let bundle = FileBundle::from_dir(&dir)?;
        if !bundle.has_entry_file() {
            return Err(PlugmateError::EntryFileMissing {
                path: dir.join(ENTRY_FILE),
            });
        }

        let manifest = PluginManifest {
            name: name.to_string(),
            version: resolved.clone(),
            description: local.description,
            author: local.author,
            dependencies: local.dependencies,
        };

        self.remote.publish(name, &resolved, &manifest, &bundle)?;

        info!(name, version = %resolved, "published plugin");
        Ok(PublishReport {
            name: name.to_string(),
            version: resolved,
        })
    }

    /// Regenerate the lockfile from the current registry. The manual
    /// recovery path for an interrupted operation.
    pub fn lock(&self) -> Result<()> {
        self.store.regenerate_lockfile()
    }

    /// Remote index through the fallback chain.
    pub fn remote_index(&self) -> Result<RemoteIndex> {
        self.remote.index()
    }

    /// Installed plugins with their locked versions.
    pub fn status(&self) -> Result<Vec<PluginStatus>> {
        let registry = self.store.load_registry()?;
        let lock = self.store.load_lockfile()?;

        Ok(registry
            .into_iter()
            .map(|(name, entry)| {
                let locked = lock.get(&name).map(|e| e.version.clone());
                PluginStatus {
                    name,
                    version: entry.version,
                    locked,
                }
            })
            .collect())
    }

    /// Highest remote version, or the baseline when no backend knows
    /// the plugin.
    fn resolve_latest(&self, name: &str) -> String {
        self.remote_latest(name)
            .unwrap_or_else(|| DEFAULT_VERSION.to_string())
    }

    fn remote_latest(&self, name: &str) -> Option<String> {
        let versions = self.remote.list_versions(name).ok()?;
        version::latest(versions.iter().map(|v| v.as_str())).map(|v| v.to_string())
    }

    /// Install step 2: fetch via the fallback chain and materialize
    /// into the local plugin directory, or synthesize a placeholder
    /// when every backend fails.
    fn materialize(&self, name: &str, resolved: &str) -> Result<(ArtifactSource, PathBuf)> {
        let dir = self.plugin_dir(name);

        let source = match self.remote.fetch(name, resolved) {
            Ok(bundle) => {
                bundle.write_to_dir(&dir)?;
                if bundle.get(MANIFEST_FILE).is_none() {
                    PluginManifest::generated(name, resolved).save(&dir)?;
                }
                ArtifactSource::Remote
            }
            Err(e) => {
                warn!(name, version = %resolved, error = %e,
                    "artifact unavailable from all backends, synthesizing placeholder");
                FileBundle::stub().write_to_dir(&dir)?;
                PluginManifest::generated(name, resolved).save(&dir)?;
                ArtifactSource::Stub
            }
        };

        Ok((source, dir))
    }

    /// Install steps 3–4: validate dependencies against the current
    /// registry, then upsert and re-derive the lockfile. On a
    /// validation failure the materialized directory stays on disk but
    /// neither document is touched.
    fn register(&self, name: &str, resolved: &str, install_path: &Path) -> Result<()> {
        let mut registry = self.store.load_registry()?;
        let manifest = PluginManifest::load(install_path)?;
        validate::check(&manifest, &registry)?;

        registry.insert(
            name.to_string(),
            RegistryEntry {
                version: resolved.to_string(),
            },
        );
        self.store.save_registry(&registry)?;
        self.store.regenerate_lockfile()
    }
}
