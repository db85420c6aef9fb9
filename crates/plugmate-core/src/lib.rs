pub mod bundle;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod manifest;
pub mod remote;
pub mod runtime;
pub mod store;
pub mod tools;
pub mod validate;
pub mod version;

pub use bundle::{FileBundle, ENTRY_FILE};
pub use config::{default_base_dir, Config, RemoteConfig};
pub use error::{PlugmateError, Result};
pub use lifecycle::{
    ArtifactSource, InstallReport, PluginManager, PluginStatus, PublishReport, UninstallReport,
    UpdateReport, DEFAULT_VERSION,
};
pub use manifest::{PluginManifest, MANIFEST_FILE};
pub use remote::{
    api::ApiBackend, mirror::MirrorBackend, BackendChain, IndexEntry, RemoteBackend, RemoteIndex,
};
pub use runtime::{is_runnable, PluginRuntime};
pub use store::{Registry, RegistryEntry, StateStore};
pub use tools::{Tool, ToolCatalog, TOOLS_FILE};
pub use validate::Violation;
pub use version::{compare_versions, latest, normalize_version, satisfies, sort_key};
