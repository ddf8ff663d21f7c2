// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Error types shared by every vrsr operation

use std::io;
use std::path::Path;

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
///
/// "Already satisfied" situations are not errors; they are reported through the
/// outcome enums of the activation module instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Requested version, release, asset or archive entry does not exist
    NotFound,
    /// API or network failure while listing or downloading
    Remote,
    /// Local filesystem failure
    Io,
}

/// Errors produced by the catalog, store, acquirer and activation controller
#[derive(Debug, Error)]
pub enum Error {
    /// The version file is not present in the versions directory
    #[error("{tool} version {version} is not installed")]
    NotInstalled { tool: String, version: String },

    /// The repository has no release with the requested tag
    #[error("release {tag} not found in {repository}")]
    ReleaseNotFound { repository: String, tag: String },

    /// The release has no asset for the current platform
    #[error("release {tag} has no asset matching {prefix}")]
    AssetNotFound { tag: String, prefix: String },

    /// The downloaded archive does not contain the expected binary
    #[error("binary '{entry}' not found inside the archive")]
    ArchiveEntryNotFound { entry: String },

    /// The server answered with a non-success status
    #[error("request to {url} failed: HTTP {status}")]
    Status { url: String, status: u16 },

    /// The connection failed while the body of a download was being read
    #[error("{context}: {source}")]
    Transfer {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] attohttpc::Error),

    /// The server answered with a payload that could not be decoded
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem failure with a description of what was being done
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The release cache could not be encoded or decoded
    #[error("invalid release cache {path}: {source}")]
    Cache {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configuration file is not valid YAML for the expected layout
    #[error("invalid configuration file {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A setting from the environment has a value of the wrong type
    #[error("invalid value '{value}' for {key}")]
    InvalidSetting { key: String, value: String },

    /// No home directory to derive default paths from
    #[error("could not determine the home directory")]
    NoHome,
}

impl Error {
    /// Wrap an I/O error with a description of the failed operation
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wrap an I/O error that happened on `path`
    pub fn io_at(action: &str, path: &Path, source: io::Error) -> Self {
        Self::io(format!("failed to {action} {}", path.display()), source)
    }

    /// Classify the error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInstalled { .. }
            | Self::ReleaseNotFound { .. }
            | Self::AssetNotFound { .. }
            | Self::ArchiveEntryNotFound { .. } => ErrorKind::NotFound,
            Self::Status { .. } | Self::Transfer { .. } | Self::Http(_) | Self::Decode { .. } => {
                ErrorKind::Remote
            }
            Self::Io { .. }
            | Self::Cache { .. }
            | Self::Config { .. }
            | Self::InvalidSetting { .. }
            | Self::NoHome => ErrorKind::Io,
        }
    }

    /// Shorthand for `kind() == ErrorKind::NotFound`
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
