// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Filesystem locations and persistent defaults
//!
//! Defaults come from an optional `config.yaml`, looked up in the current
//! directory and then in `~/.vrsr`. Every key can be overridden from the
//! environment with the `VRSR_` prefix, nested keys joined by `_` and dashes
//! turned into `_` (`kind.list-remote.devel` is `VRSR_KIND_LIST_REMOTE_DEVEL`).
//! Command-line flags take precedence over both.
//!
//! ```yaml
//! bin-path: /opt/vrsr/bin
//! kind:
//!   list-remote:
//!     devel: true
//!     limit: 20
//! helm:
//!   install:
//!     use: true
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::activate::{ActivateOptions, InstallOptions};
use crate::catalog::FetchOptions;
use crate::error::{Error, Result};
use crate::tool::TOOLS;

/// Directory under the user's home holding all vrsr state
pub const VRSR_DIR: &str = ".vrsr";

/// Name of the configuration file
pub const CONFIG_FILE: &str = "config.yaml";

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "VRSR";

/// Where binaries, active links and caches live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root of the installed versions (`<vrs_path>/<tool>/<tool>-<version>`)
    pub vrs_path: PathBuf,
    /// Directory holding the active links; should be on `$PATH`
    pub bin_path: PathBuf,
    /// Directory holding the `<tool>-releases.json` caches
    pub cache_dir: PathBuf,
}

impl Settings {
    /// Default layout below `home`
    #[must_use]
    pub fn from_home(home: &Path) -> Self {
        let root = home.join(VRSR_DIR);
        Self {
            vrs_path: root.join("versions"),
            bin_path: root.join("bin"),
            cache_dir: root,
        }
    }

    /// Default layout below the current user's home directory
    ///
    /// # Errors
    /// Returns error if the home directory cannot be determined
    pub fn detect() -> Result<Self> {
        Ok(Self::from_home(&home_dir()?))
    }

    /// Replace the versions and bin directories when given
    #[must_use]
    pub fn with_overrides(mut self, vrs_path: Option<PathBuf>, bin_path: Option<PathBuf>) -> Self {
        if let Some(path) = vrs_path {
            self.vrs_path = path;
        }
        if let Some(path) = bin_path {
            self.bin_path = path;
        }
        self
    }
}

/// The current user's home directory
///
/// # Errors
/// Returns [`Error::NoHome`] if it cannot be determined
pub fn home_dir() -> Result<PathBuf> {
    home::home_dir().ok_or(Error::NoHome)
}

/// Contents of `config.yaml`, with environment overrides applied
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    pub bin_path: Option<PathBuf>,
    pub vrs_path: Option<PathBuf>,
    /// Root of the GitHub REST API, for GitHub Enterprise installations
    pub github_api: Option<String>,
    /// Per-tool defaults, keyed by tool name
    #[serde(flatten)]
    pub tools: BTreeMap<String, ToolDefaults>,
}

/// Defaults for the actions of one tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ToolDefaults {
    pub list_remote: ListRemoteDefaults,
    pub install: InstallDefaults,
    #[serde(rename = "use")]
    pub activate: UseDefaults,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListRemoteDefaults {
    pub devel: Option<bool>,
    pub limit: Option<usize>,
    pub force: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InstallDefaults {
    #[serde(rename = "use")]
    pub use_on_install: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UseDefaults {
    #[serde(rename = "install")]
    pub install_missing: Option<bool>,
}

impl FileConfig {
    /// Places searched for `config.yaml`, in order
    #[must_use]
    pub fn candidates(cwd: &Path, home: &Path) -> [PathBuf; 2] {
        [cwd.join(CONFIG_FILE), home.join(VRSR_DIR).join(CONFIG_FILE)]
    }

    /// Load the configuration file
    ///
    /// An explicit path must exist; otherwise the first existing candidate is
    /// used, and no file at all means empty defaults.
    ///
    /// # Returns
    /// The configuration and the path it was read from
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn discover(
        explicit: Option<&Path>,
        cwd: &Path,
        home: &Path,
    ) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        for path in Self::candidates(cwd, home) {
            match fs::read_to_string(&path) {
                Ok(text) => {
                    debug!(path = %path.display(), "using configuration file");
                    return Ok((Self::parse(&text, &path)?, Some(path)));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(Error::io_at("read", &path, e)),
            }
        }
        Ok((Self::default(), None))
    }

    /// Read and parse a configuration file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io_at("read", path, e))?;
        Self::parse(&text, path)
    }

    /// Parse configuration text; `origin` names it in errors
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the text does not match the expected layout
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| Error::Config {
            path: origin.display().to_string(),
            source,
        })
    }

    /// Overlay environment overrides read through `lookup`
    ///
    /// Only keys of known tools are consulted.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSetting`] for values of the wrong type
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(value) = lookup(&env_key(&["github-api"])) {
            self.github_api = Some(value);
        }

        for tool in &TOOLS {
            let defaults = self.tools.entry(tool.name.to_string()).or_default();
            let key = |path: &[&str]| {
                let mut full = vec![tool.name];
                full.extend_from_slice(path);
                env_key(&full)
            };

            let list_remote = &mut defaults.list_remote;
            override_bool(&lookup, &key(&["list-remote", "devel"]), &mut list_remote.devel)?;
            override_bool(&lookup, &key(&["list-remote", "force"]), &mut list_remote.force)?;
            let limit_key = key(&["list-remote", "limit"]);
            if let Some(value) = lookup(&limit_key) {
                let limit = value.trim().parse().map_err(|_| Error::InvalidSetting {
                    key: limit_key,
                    value,
                })?;
                list_remote.limit = Some(limit);
            }
            override_bool(&lookup, &key(&["install", "use"]), &mut defaults.install.use_on_install)?;
            override_bool(&lookup, &key(&["use", "install"]), &mut defaults.activate.install_missing)?;
        }
        Ok(self)
    }

    /// Overlay the process environment
    ///
    /// # Errors
    /// Returns [`Error::InvalidSetting`] for values of the wrong type
    pub fn with_process_env(self) -> Result<Self> {
        self.with_env(|key| std::env::var(key).ok())
    }

    /// Defaults for `tool`, empty when the file does not mention it
    #[must_use]
    pub fn tool(&self, name: &str) -> ToolDefaults {
        self.tools.get(name).cloned().unwrap_or_default()
    }
}

impl ToolDefaults {
    /// Options for `list-remote`; flags that were given win over defaults
    #[must_use]
    pub fn fetch_options(&self, devel: bool, limit: Option<usize>, force: bool) -> FetchOptions {
        FetchOptions {
            include_devel: devel || self.list_remote.devel.unwrap_or(false),
            limit: limit.or(self.list_remote.limit).unwrap_or(0),
            force: force || self.list_remote.force.unwrap_or(false),
        }
    }

    /// Options for `install`
    #[must_use]
    pub fn install_options(&self, use_after: bool) -> InstallOptions {
        InstallOptions {
            use_on_install: use_after || self.install.use_on_install.unwrap_or(false),
        }
    }

    /// Options for `use`
    #[must_use]
    pub fn activate_options(&self, install: bool) -> ActivateOptions {
        ActivateOptions {
            install_missing: install || self.activate.install_missing.unwrap_or(false),
        }
    }
}

/// Environment variable name for a configuration key path
///
/// # Examples
/// ```
/// use vrsr::config::env_key;
///
/// assert_eq!(env_key(&["kind", "list-remote", "devel"]), "VRSR_KIND_LIST_REMOTE_DEVEL");
/// ```
#[must_use]
pub fn env_key(path: &[&str]) -> String {
    let mut key = ENV_PREFIX.to_string();
    for part in path {
        key.push('_');
        key.push_str(&part.replace('-', "_").to_uppercase());
    }
    key
}

fn override_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut Option<bool>,
) -> Result<()> {
    if let Some(value) = lookup(key) {
        let parsed = parse_bool(&value).ok_or_else(|| Error::InvalidSetting {
            key: key.to_string(),
            value: value.clone(),
        })?;
        *slot = Some(parsed);
    }
    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" | "" => Some(false),
        _ => None,
    }
}
