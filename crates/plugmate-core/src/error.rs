use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlugmateError {
    #[error("Plugin not installed: {name}")]
    PluginNotInstalled { name: String },

    #[error("Plugin not found: {name}")]
    PluginNotFound { name: String },

    #[error("Plugin entry file not found: {path}")]
    EntryFileMissing { path: PathBuf },

    #[error("Unresolved dependencies:\n{}", .violations.join("\n"))]
    DependencyViolations { violations: Vec<String> },

    #[error("All remote backends failed for {operation}: {detail}")]
    RemoteUnavailable { operation: String, detail: String },

    #[error("Malformed state file {path}: {message}")]
    MalformedState { path: PathBuf, message: String },

    #[error("Invalid version string: '{version}'")]
    InvalidVersion { version: String },

    #[error("API request failed: {message}")]
    Api { message: String },

    #[error("API returned status {status} for {url}")]
    ApiStatus { status: u16, url: String },

    #[error("Archive error: {message}")]
    Archive { message: String },

    #[error("Config parse error in {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Home directory not found")]
    HomeNotFound,
}

pub type Result<T> = std::result::Result<T, PlugmateError>;

impl From<reqwest::Error> for PlugmateError {
    fn from(e: reqwest::Error) -> Self {
        Self::Api {
            message: e.to_string(),
        }
    }
}

impl PlugmateError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PluginNotInstalled { .. } | Self::PluginNotFound { .. } => 2,
            Self::DependencyViolations { .. } => 3,
            Self::RemoteUnavailable { .. } => 4,
            Self::MalformedState { .. } => 5,
            Self::EntryFileMissing { .. } => 6,
            _ => 1,
        }
    }
}
