// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Switching the active version
//!
//! The active version of a tool is a symlink `<bin_path>/<tool>` pointing at
//! the installed binary. It is replaced by creating the new link under a
//! staging name and renaming it over the old one, so the slot is never
//! observed empty.
//!
//! The controller also couples install and activate: `install` can activate
//! the new version afterwards and `activate` can install a missing version
//! first, both through the injected [`Acquire`] collaborator.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::acquire::Acquire;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::tool::ToolConfig;

/// Options for [`Controller::activate`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivateOptions {
    /// Download the version first when it is not installed
    pub install_missing: bool,
}

/// Options for [`Controller::install`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Make the version active once it is installed
    pub use_on_install: bool,
}

/// What [`Controller::activate`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivateOutcome {
    /// The version was already active; nothing changed
    AlreadyActive,
    /// The link now points at the version
    Activated,
    /// The version was downloaded and the link now points at it
    InstalledAndActivated,
}

/// What [`Controller::install`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The version is installed and active; nothing changed
    AlreadyActive,
    /// The version was already installed and activation was not requested
    AlreadyInstalled,
    /// The version was downloaded
    Installed,
    /// The version is now active; `fresh` tells whether it was downloaded
    Activated { fresh: bool },
    /// The version is installed but switching to it failed
    ActivationFailed { fresh: bool, reason: String },
}

/// Owner of every mutation of the active links
pub struct Controller<'a> {
    store: &'a Store,
    acquirer: &'a dyn Acquire,
}

impl<'a> Controller<'a> {
    pub fn new(store: &'a Store, acquirer: &'a dyn Acquire) -> Self {
        Self { store, acquirer }
    }

    /// Make `version` the active version of `tool`
    ///
    /// # Errors
    /// Returns [`Error::NotInstalled`] when the version is missing and
    /// `install_missing` is off, the acquisition error when installing it
    /// fails, or an I/O error when the link cannot be replaced. The previous
    /// link is left untouched in every case.
    pub fn activate(
        &self,
        tool: &ToolConfig,
        version: &str,
        options: ActivateOptions,
    ) -> Result<ActivateOutcome> {
        if self.store.is_active(tool.name, version) {
            return Ok(ActivateOutcome::AlreadyActive);
        }

        let mut fresh = false;
        if !self.store.is_installed(tool.name, version) {
            if !options.install_missing {
                return Err(Error::NotInstalled {
                    tool: tool.name.to_string(),
                    version: version.to_string(),
                });
            }
            debug!(tool = tool.name, version, "installing before activation");
            self.acquirer.acquire(tool, version)?;
            fresh = true;
        }

        // Relative targets would resolve against the bin directory
        let target = self.store.version_path(tool.name, version);
        let target = std::path::absolute(&target).unwrap_or(target);
        replace_link(&target, &self.store.link_path(tool.name))?;

        Ok(if fresh {
            ActivateOutcome::InstalledAndActivated
        } else {
            ActivateOutcome::Activated
        })
    }

    /// Install `version` of `tool`
    ///
    /// Already satisfied requests return without touching the network. A
    /// failed activation after a successful install is reported as
    /// [`InstallOutcome::ActivationFailed`] rather than as an error.
    ///
    /// # Errors
    /// Returns error if the download or install fails
    pub fn install(
        &self,
        tool: &ToolConfig,
        version: &str,
        options: InstallOptions,
    ) -> Result<InstallOutcome> {
        if self.store.is_active(tool.name, version) {
            return Ok(InstallOutcome::AlreadyActive);
        }

        let fresh = if self.store.is_installed(tool.name, version) {
            if !options.use_on_install {
                return Ok(InstallOutcome::AlreadyInstalled);
            }
            false
        } else {
            self.acquirer.acquire(tool, version)?;
            true
        };

        if !options.use_on_install {
            return Ok(InstallOutcome::Installed);
        }

        match self.activate(tool, version, ActivateOptions::default()) {
            Ok(_) => Ok(InstallOutcome::Activated { fresh }),
            Err(e) => {
                warn!(tool = tool.name, version, "activation after install failed: {e}");
                Ok(InstallOutcome::ActivationFailed {
                    fresh,
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Point `link` at `target`, replacing whatever occupies `link`
///
/// # Errors
/// Returns error if the bin directory, the staging link or the rename fails
pub fn replace_link(target: &Path, link: &Path) -> Result<()> {
    let dir = link
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| Error::io_at("create", dir, e))?;

    let name = link
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("link");
    let staging = dir.join(format!(".{name}.{}.tmp", std::process::id()));

    remove_if_exists(&staging)?;
    create_symlink(target, &staging)?;
    if let Err(e) = fs::rename(&staging, link) {
        let _ = fs::remove_file(&staging);
        return Err(Error::io(
            format!(
                "failed to replace {} with a link to {}",
                link.display(),
                target.display()
            ),
            e,
        ));
    }

    debug!(link = %link.display(), target = %target.display(), "link replaced");
    Ok(())
}

/// Remove a file or symlink if it exists
fn remove_if_exists(path: &Path) -> Result<()> {
    // is_symlink catches broken links that exists() reports as missing
    if path.exists() || path.is_symlink() {
        fs::remove_file(path).map_err(|e| Error::io_at("remove", path, e))?;
    }
    Ok(())
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link).map_err(|e| {
        Error::io(
            format!(
                "failed to create symlink {} -> {}",
                link.display(),
                target.display()
            ),
            e,
        )
    })
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::windows::fs::symlink_file(target, link).map_err(|e| {
        Error::io(
            format!(
                "failed to create symlink {} -> {}",
                link.display(),
                target.display()
            ),
            e,
        )
    })
}
