//! Plugin file bundles
//!
//! A [`FileBundle`] is the in-memory file set a remote backend trades
//! in: the required `run` entry file, an optional manifest.json, and
//! any extra files. Bundles can be read from a plugin directory,
//! extracted from a gzip-compressed tarball (as served by the registry
//! API), or synthesized as a placeholder stub.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Component, Path};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::{PlugmateError, Result};

/// Name of the executable entry file every plugin ships.
pub const ENTRY_FILE: &str = "run";

/// Placeholder entry script used when no backend can provide the plugin.
const STUB_SCRIPT: &str = "#!/bin/sh\necho \"hello from $*\"\n";

/// Maximum number of entries accepted from a remote archive.
const MAX_ENTRY_COUNT: usize = 1_000;

/// In-memory plugin file set, keyed by relative path.
#[derive(Debug, Clone, Default)]
pub struct FileBundle {
    files: BTreeMap<String, Vec<u8>>,
}

impl FileBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, content: Vec<u8>) {
        self.files.insert(name.to_string(), content);
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(|v| v.as_slice())
    }

    pub fn has_entry_file(&self) -> bool {
        self.files.contains_key(ENTRY_FILE)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over (path, content) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Extra files: everything except the entry file and the manifest.
    pub fn extra_files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.iter()
            .filter(|(name, _)| *name != ENTRY_FILE && *name != crate::manifest::MANIFEST_FILE)
    }

    /// Minimal runnable placeholder bundle (entry script only).
    pub fn stub() -> Self {
        let mut bundle = Self::new();
        bundle.insert(ENTRY_FILE, STUB_SCRIPT.as_bytes().to_vec());
        bundle
    }

    /// Read the top-level files of a plugin directory into a bundle.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut bundle = Self::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() {
                let name = entry.file_name().to_string_lossy().to_string();
                bundle.insert(&name, fs::read(&path)?);
            }
        }

        Ok(bundle)
    }

    /// Materialize the bundle into a plugin directory, marking the entry
    /// file executable.
    pub fn write_to_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;

        for (name, content) in &self.files {
            let target = dir.join(name);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, content)?;

            #[cfg(unix)]
            if name == ENTRY_FILE {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&target, fs::Permissions::from_mode(0o755))?;
            }
        }

        Ok(())
    }

    /// Extract a gzip-compressed tarball into a bundle.
    ///
    /// Entry paths are validated: absolute paths, `..` components, and
    /// non-regular entries are rejected before anything touches disk.
    pub fn from_tar_gz(data: &[u8]) -> Result<Self> {
        let decoder = GzDecoder::new(data);
        let mut archive = Archive::new(decoder);
        let mut bundle = Self::new();

        for entry in archive.entries().map_err(archive_err)? {
            let mut entry = entry.map_err(archive_err)?;

            if bundle.files.len() >= MAX_ENTRY_COUNT {
                return Err(PlugmateError::Archive {
                    message: format!("archive exceeds maximum entry count ({MAX_ENTRY_COUNT})"),
                });
            }

            if entry.header().entry_type().is_dir() {
                continue;
            }
            if !entry.header().entry_type().is_file() {
                return Err(PlugmateError::Archive {
                    message: format!(
                        "unsupported archive entry type: {:?}",
                        entry.header().entry_type()
                    ),
                });
            }

            let path = entry.path().map_err(archive_err)?.into_owned();
            validate_entry_path(&path)?;

            let mut content = Vec::new();
            entry.read_to_end(&mut content)?;
            bundle.insert(&path.to_string_lossy(), content);
        }

        if bundle.is_empty() {
            return Err(PlugmateError::Archive {
                message: "archive is empty".to_string(),
            });
        }

        Ok(bundle)
    }
}

fn archive_err(e: std::io::Error) -> PlugmateError {
    PlugmateError::Archive {
        message: e.to_string(),
    }
}

fn validate_entry_path(path: &Path) -> Result<()> {
    if path.is_absolute() {
        return Err(PlugmateError::Archive {
            message: format!("absolute path in archive: {}", path.display()),
        });
    }

    for component in path.components() {
        if matches!(
            component,
            Component::ParentDir | Component::Prefix(_) | Component::RootDir
        ) {
            return Err(PlugmateError::Archive {
                message: format!("path traversal in archive: {}", path.display()),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_tarball(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for &(path, data) in entries {
            let mut header = tar::Header::new_gnu();
            if header.set_path(path).is_err() {
                // set_path refuses `..` components; write the raw name
                // bytes so traversal paths can be exercised in tests.
                header.as_old_mut().name[..path.len()].copy_from_slice(path.as_bytes());
            }
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, data).unwrap();
        }
        let tar_data = builder.into_inner().unwrap();

        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
        encoder.write_all(&tar_data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_stub_has_entry_file() {
        let bundle = FileBundle::stub();
        assert!(bundle.has_entry_file());
        assert!(bundle.get(ENTRY_FILE).unwrap().starts_with(b"#!/bin/sh"));
    }

    #[test]
    fn test_dir_roundtrip() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("ocr");

        let mut bundle = FileBundle::stub();
        bundle.insert("README.md", b"docs".to_vec());
        bundle.write_to_dir(&dir).unwrap();

        let reloaded = FileBundle::from_dir(&dir).unwrap();
        assert!(reloaded.has_entry_file());
        assert_eq!(reloaded.get("README.md").unwrap(), b"docs");
    }

    #[cfg(unix)]
    #[test]
    fn test_entry_file_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("ocr");
        FileBundle::stub().write_to_dir(&dir).unwrap();

        let mode = fs::metadata(dir.join(ENTRY_FILE)).unwrap().permissions();
        assert_ne!(mode.mode() & 0o111, 0);
    }

    #[test]
    fn test_extra_files_excludes_entry_and_manifest() {
        let mut bundle = FileBundle::stub();
        bundle.insert("manifest.json", b"{}".to_vec());
        bundle.insert("data.txt", b"x".to_vec());

        let extras: Vec<&str> = bundle.extra_files().map(|(name, _)| name).collect();
        assert_eq!(extras, vec!["data.txt"]);
    }

    #[test]
    fn test_from_tar_gz() {
        let tgz = create_tarball(&[("run", b"#!/bin/sh\n" as &[u8]), ("manifest.json", b"{}")]);

        let bundle = FileBundle::from_tar_gz(&tgz).unwrap();
        assert!(bundle.has_entry_file());
        assert_eq!(bundle.get("manifest.json").unwrap(), b"{}");
    }

    #[test]
    fn test_from_tar_gz_rejects_traversal() {
        let tgz = create_tarball(&[("nested/../../escape", b"x" as &[u8])]);

        let err = FileBundle::from_tar_gz(&tgz).unwrap_err();
        assert!(matches!(err, PlugmateError::Archive { .. }));
    }

    #[test]
    fn test_from_tar_gz_rejects_empty() {
        let tgz = create_tarball(&[]);
        let err = FileBundle::from_tar_gz(&tgz).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
