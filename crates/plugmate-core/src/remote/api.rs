//! Registry API backend
//!
//! Blocking HTTP client for the plugin registry server. Every
//! transport error, non-success status, or malformed payload surfaces
//! as a failure to the caller; the fallback policy lives in
//! [`super::BackendChain`], not here.

use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::bundle::{FileBundle, ENTRY_FILE};
use crate::error::{PlugmateError, Result};
use crate::manifest::{PluginManifest, MANIFEST_FILE};
use crate::remote::{RemoteBackend, RemoteIndex};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("plugmate/", env!("CARGO_PKG_VERSION"));

/// Plugin detail payload from `GET /plugins/{name}`.
#[derive(Debug, Deserialize)]
struct PluginDetail {
    #[serde(default)]
    versions: Vec<String>,
}

/// HTTP client for the registry API.
pub struct ApiBackend {
    base_url: String,
    client: Client,
}

impl ApiBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn get_checked(&self, endpoint: &str) -> Result<reqwest::blocking::Response> {
        let url = self.url(endpoint);
        let response = self.client.get(&url).send()?;

        if !response.status().is_success() {
            return Err(PlugmateError::ApiStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        Ok(response)
    }
}

impl RemoteBackend for ApiBackend {
    fn label(&self) -> &'static str {
        "api"
    }

    fn list_versions(&self, name: &str) -> Result<Vec<String>> {
        let response = self.get_checked(&format!("/plugins/{}", name))?;
        let detail: PluginDetail = response.json()?;

        if detail.versions.is_empty() {
            return Err(PlugmateError::PluginNotFound {
                name: name.to_string(),
            });
        }

        Ok(detail.versions)
    }

    fn fetch(&self, name: &str, version: &str) -> Result<FileBundle> {
        let response =
            self.get_checked(&format!("/plugins/{}/versions/{}/download", name, version))?;
        let data = response.bytes()?;
        FileBundle::from_tar_gz(&data)
    }

    fn publish(
        &self,
        name: &str,
        version: &str,
        manifest: &PluginManifest,
        bundle: &FileBundle,
    ) -> Result<()> {
        let entry = bundle
            .get(ENTRY_FILE)
            .ok_or_else(|| PlugmateError::EntryFileMissing {
                path: ENTRY_FILE.into(),
            })?;

        let mut form = Form::new()
            .text("name", name.to_string())
            .text("version", version.to_string())
            .text("description", manifest.description.clone())
            .text("author", manifest.author.clone())
            .part(
                "plugin_file",
                Part::bytes(entry.to_vec()).file_name(ENTRY_FILE),
            )
            .part(
                "manifest_file",
                Part::bytes(manifest.to_json_bytes()?).file_name(MANIFEST_FILE),
            );

        for (file_name, content) in bundle.extra_files() {
            form = form.part(
                "additional_files",
                Part::bytes(content.to_vec()).file_name(file_name.to_string()),
            );
        }

        let url = self.url("/plugins");
        let response = self.client.post(&url).multipart(form).send()?;

        if !response.status().is_success() {
            return Err(PlugmateError::ApiStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        Ok(())
    }

    fn index(&self) -> Result<RemoteIndex> {
        let response = self.get_checked("/plugins/index")?;
        Ok(response.json()?)
    }
}
