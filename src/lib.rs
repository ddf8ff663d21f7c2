// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Versions manager library
//!
//! This library discovers the released versions of a fixed set of tools,
//! downloads the binary matching the current platform, and switches which
//! installed version is active through a symlink in the bin directory.

pub mod acquire;
pub mod activate;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod github;
pub mod http;
pub mod listing;
pub mod platform;
pub mod progress;
pub mod store;
pub mod tool;
pub mod version;

// Re-export commonly used items at the crate root for convenience
pub use acquire::{Acquire, Acquirer, install_atomic, select_asset};
pub use activate::{ActivateOptions, ActivateOutcome, Controller, InstallOptions, InstallOutcome};
pub use catalog::{Catalog, FetchOptions, fetch_releases};
pub use config::Settings;
pub use error::{Error, ErrorKind, Result};
pub use github::{Asset, GitHubClient, Release, ReleasePage, ReleaseSource};
pub use http::{Download, HttpClient, HttpGet};
pub use platform::Platform;
pub use store::Store;
pub use tool::{TOOLS, ToolConfig};
pub use version::ToolVersion;
