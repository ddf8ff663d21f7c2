// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Installed versions and the active link
//!
//! File names are the only record of what is installed: a version is
//! installed when `<vrs_path>/<tool>/<tool>-<version>` exists, and active when
//! `<bin_path>/<tool>` resolves to that file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::version::{ToolVersion, version_from_file_name};

/// Read-side view of the versions and bin directories
#[derive(Debug, Clone)]
pub struct Store {
    vrs_path: PathBuf,
    bin_path: PathBuf,
}

impl Store {
    pub fn new(vrs_path: impl Into<PathBuf>, bin_path: impl Into<PathBuf>) -> Self {
        Self {
            vrs_path: vrs_path.into(),
            bin_path: bin_path.into(),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.vrs_path, &settings.bin_path)
    }

    #[must_use]
    pub fn bin_path(&self) -> &Path {
        &self.bin_path
    }

    /// Directory holding every installed version of `tool`
    #[must_use]
    pub fn tool_dir(&self, tool: &str) -> PathBuf {
        self.vrs_path.join(tool)
    }

    /// Path of the installed binary for `version`
    #[must_use]
    pub fn version_path(&self, tool: &str, version: &str) -> PathBuf {
        self.tool_dir(tool).join(format!("{tool}-{version}"))
    }

    /// Path of the active link for `tool`
    #[must_use]
    pub fn link_path(&self, tool: &str) -> PathBuf {
        self.bin_path.join(tool)
    }

    /// List installed versions of `tool`, ascending
    ///
    /// Directories, unrelated files and names that do not parse as
    /// `<tool>-<version>` are skipped. A missing directory means nothing is
    /// installed.
    ///
    /// # Errors
    /// Returns error if the tool directory exists but cannot be read
    pub fn list_installed(&self, tool: &str) -> Result<Vec<ToolVersion>> {
        let dir = self.tool_dir(tool);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io_at("read", &dir, e)),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io_at("read", &dir, e))?;
            if !entry.file_type().is_ok_and(|kind| kind.is_file()) {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            match version_from_file_name(tool, name).and_then(ToolVersion::parse) {
                Some(version) => versions.push(version),
                None => debug!(file = name, "skipping unrecognised file"),
            }
        }

        versions.sort();
        Ok(versions)
    }

    /// Version the active link points at
    ///
    /// # Returns
    /// `None` when there is no link, when it dangles, or when its target is not
    /// a `<tool>-<version>` file
    ///
    /// # Errors
    /// Returns error if the link exists but cannot be resolved
    pub fn active_version(&self, tool: &str) -> Result<Option<String>> {
        let link = self.link_path(tool);
        let target = match fs::canonicalize(&link) {
            Ok(target) => target,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io_at("resolve", &link, e)),
        };

        Ok(target
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| version_from_file_name(tool, name))
            .map(str::to_string))
    }

    /// Whether `version` of `tool` is on disk
    #[must_use]
    pub fn is_installed(&self, tool: &str, version: &str) -> bool {
        self.version_path(tool, version).is_file()
    }

    /// Whether `version` of `tool` is the active one
    ///
    /// Resolution failures count as "not active".
    #[must_use]
    pub fn is_active(&self, tool: &str, version: &str) -> bool {
        matches!(self.active_version(tool), Ok(Some(active)) if active == version)
    }
}
