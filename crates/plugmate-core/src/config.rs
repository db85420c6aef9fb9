use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PlugmateError, Result};

const CONFIG_FILE: &str = "config.toml";

const DEFAULT_API_URL: &str = "http://localhost:8089/api/v1";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# plugmate configuration file
# Location: ~/.plugmate/config.toml

[remote]
# Base URL of the plugin registry API, tried first for every
# remote operation.
# Default: "http://localhost:8089/api/v1"
api_url = "http://localhost:8089/api/v1"

# Root directory of the legacy shared-folder mirror, used as the
# fallback when the API is unreachable.
# Default: <base-dir>/mirror
# Example: mirror_root = "/mnt/share/plugin-mirror"
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Remote backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Registry API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Legacy mirror root directory (default: <base-dir>/mirror)
    #[serde(default)]
    pub mirror_root: Option<PathBuf>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            mirror_root: None,
        }
    }
}

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| PlugmateError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Registry/lockfile directory
    pub fn data_dir(&self, base_dir: &Path) -> PathBuf {
        base_dir.join("data")
    }

    /// Local plugin install root
    pub fn plugins_dir(&self, base_dir: &Path) -> PathBuf {
        base_dir.join("plugins")
    }

    /// Legacy mirror root, configured or base-relative default
    pub fn mirror_root(&self, base_dir: &Path) -> PathBuf {
        self.remote
            .mirror_root
            .clone()
            .unwrap_or_else(|| base_dir.join("mirror"))
    }
}

/// Default base directory (~/.plugmate)
pub fn default_base_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(PlugmateError::HomeNotFound)?;
    Ok(home.join(".plugmate"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_is_default() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config.remote.api_url, DEFAULT_API_URL);
        assert!(config.remote.mirror_root.is_none());
    }

    #[test]
    fn test_load_overrides() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            r#"
[remote]
api_url = "https://plugins.example.com/api/v1"
mirror_root = "/mnt/share/mirror"
"#,
        )
        .unwrap();

        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config.remote.api_url, "https://plugins.example.com/api/v1");
        assert_eq!(
            config.mirror_root(temp.path()),
            PathBuf::from("/mnt/share/mirror")
        );
    }

    #[test]
    fn test_mirror_root_default_is_base_relative() {
        let temp = TempDir::new().unwrap();
        let config = Config::default();
        assert_eq!(
            config.mirror_root(temp.path()),
            temp.path().join("mirror")
        );
    }

    #[test]
    fn test_init_writes_template_once() {
        let temp = TempDir::new().unwrap();
        let path = Config::init(temp.path()).unwrap();
        assert!(path.exists());

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("api_url"));

        // A second init must not clobber an existing file
        fs::write(&path, "[remote]\napi_url = \"http://other\"\n").unwrap();
        Config::init(temp.path()).unwrap();
        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config.remote.api_url, "http://other");
    }

    #[test]
    fn test_invalid_toml_fails() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "not [valid").unwrap();

        let err = Config::load(temp.path()).unwrap_err();
        assert!(matches!(err, PlugmateError::ConfigParse { .. }));
    }
}
