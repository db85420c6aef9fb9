//! Plugin execution
//!
//! Installed plugins are executed as subprocesses: each plugin
//! directory carries an executable entry file that receives the
//! caller's arguments verbatim and inherits stdio.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::bundle::ENTRY_FILE;
use crate::error::{PlugmateError, Result};

/// Runs installed plugins out of the local install root.
pub struct PluginRuntime {
    install_root: PathBuf,
}

impl PluginRuntime {
    pub fn new(install_root: PathBuf) -> Self {
        Self { install_root }
    }

    /// Path to a plugin's entry file.
    pub fn entry_path(&self, name: &str) -> PathBuf {
        self.install_root.join(name).join(ENTRY_FILE)
    }

    /// Run a plugin's entry file with the given arguments and wait for
    /// it to exit. Returns the process exit code; a signal-terminated
    /// plugin reports as 1.
    pub fn run<I, S>(&self, name: &str, args: I) -> Result<i32>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let entry = self.entry_path(name);
        if !entry.is_file() {
            return Err(PlugmateError::EntryFileMissing { path: entry });
        }

        debug!(name, entry = %entry.display(), "running plugin");

        let status = Command::new(&entry)
            .args(args)
            .current_dir(self.plugin_dir(name))
            .status()?;

        Ok(status.code().unwrap_or(1))
    }

    fn plugin_dir(&self, name: &str) -> PathBuf {
        self.install_root.join(name)
    }
}

/// True when a plugin has an entry file under the install root.
pub fn is_runnable(install_root: &Path, name: &str) -> bool {
    install_root.join(name).join(ENTRY_FILE).is_file()
}
