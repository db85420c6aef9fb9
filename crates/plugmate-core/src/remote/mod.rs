//! Remote plugin backends
//!
//! Two interchangeable sources of plugin artifacts sit behind the
//! [`RemoteBackend`] trait: the registry API ([`api::ApiBackend`]) and
//! the legacy shared-folder mirror ([`mirror::MirrorBackend`]).
//! [`BackendChain`] applies the fixed fallback policy: try the API
//! first, and on any failure log the reason and retry the same logical
//! operation against the mirror. Each operation falls back
//! independently; a successful list does not imply a successful fetch.

pub mod api;
pub mod mirror;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::bundle::FileBundle;
use crate::error::{PlugmateError, Result};
use crate::manifest::PluginManifest;

/// One plugin's entry in a remote index.
///
/// Invariant: `latest` equals the maximum entry of `versions`, and
/// `versions` is kept sorted descending on write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub latest: String,
}

/// Remote index document: plugin name -> available versions.
pub type RemoteIndex = BTreeMap<String, IndexEntry>;

/// Capability interface over a remote plugin source.
pub trait RemoteBackend {
    /// Short label used in fallback logs ("api", "mirror").
    fn label(&self) -> &'static str;

    /// Available versions for a plugin, unordered.
    fn list_versions(&self, name: &str) -> Result<Vec<String>>;

    /// Fetch the file bundle for name@version.
    fn fetch(&self, name: &str, version: &str) -> Result<FileBundle>;

    /// Publish a file bundle as name@version.
    fn publish(
        &self,
        name: &str,
        version: &str,
        manifest: &PluginManifest,
        bundle: &FileBundle,
    ) -> Result<()>;

    /// Full index of available plugins.
    fn index(&self) -> Result<RemoteIndex>;
}

/// Ordered backend list with try-then-fallback semantics.
pub struct BackendChain {
    backends: Vec<Box<dyn RemoteBackend>>,
}

impl BackendChain {
    pub fn new(backends: Vec<Box<dyn RemoteBackend>>) -> Self {
        Self { backends }
    }

    pub fn list_versions(&self, name: &str) -> Result<Vec<String>> {
        self.attempt("list_versions", |backend| backend.list_versions(name))
    }

    pub fn fetch(&self, name: &str, version: &str) -> Result<FileBundle> {
        self.attempt("fetch", |backend| backend.fetch(name, version))
    }

    pub fn publish(
        &self,
        name: &str,
        version: &str,
        manifest: &PluginManifest,
        bundle: &FileBundle,
    ) -> Result<()> {
        self.attempt("publish", |backend| {
            backend.publish(name, version, manifest, bundle)
        })
    }

    pub fn index(&self) -> Result<RemoteIndex> {
        self.attempt("index", |backend| backend.index())
    }

    /// Run one logical operation down the chain, swallowing every
    /// failure but the last. The final error carries the last-tried
    /// backend's cause.
    fn attempt<T>(
        &self,
        operation: &str,
        f: impl Fn(&dyn RemoteBackend) -> Result<T>,
    ) -> Result<T> {
        let mut last_error: Option<PlugmateError> = None;

        for backend in &self.backends {
            match f(backend.as_ref()) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        backend = backend.label(),
                        operation, error = %e,
                        "remote backend failed, falling back"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(PlugmateError::RemoteUnavailable {
            operation: operation.to_string(),
            detail: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no backends configured".to_string()),
        })
    }
}
