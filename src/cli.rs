// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
// CLI argument definitions for vrsr
//
// Separated from main.rs so that build.rs can include this file
// to generate the man page via clap_mangen.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI argument parser
#[derive(Parser)]
#[command(
    name = "vrsr",
    version,
    about = "(Almost) universal tools versions manager",
    long_about = "A tool to easily install and use multiple versions of several tools."
)]
pub struct Cli {
    /// Absolute path to folder storing in-use tools binaries
    #[arg(short = 'b', long = "bin-path", env = "VRSR_BIN_PATH", global = true, value_name = "DIR")]
    pub bin_path: Option<PathBuf>,

    /// Absolute path to folder storing downloaded tools binary versions
    #[arg(short = 'd', long = "vrs-path", env = "VRSR_VRS_PATH", global = true, value_name = "DIR")]
    pub vrs_path: Option<PathBuf>,

    /// Configuration file (default: ./config.yaml, then ~/.vrsr/config.yaml)
    #[arg(long = "config", env = "VRSR_CONFIG", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Make the operation more talkative
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Managed tools
#[derive(Subcommand)]
pub enum Command {
    /// Manage helm versions
    Helm {
        #[command(subcommand)]
        action: Action,
    },
    /// Manage kind versions
    Kind {
        #[command(subcommand)]
        action: Action,
    },
    /// Manage kubectl versions
    Kubectl {
        #[command(subcommand)]
        action: Action,
    },
    /// Manage talosctl versions
    Talosctl {
        #[command(subcommand)]
        action: Action,
    },
    /// Show the vrsr version
    Version,
}

impl Command {
    /// Split into the tool name and the requested action
    ///
    /// Returns `None` for commands that are not about a tool.
    pub fn into_parts(self) -> Option<(&'static str, Action)> {
        match self {
            Self::Helm { action } => Some(("helm", action)),
            Self::Kind { action } => Some(("kind", action)),
            Self::Kubectl { action } => Some(("kubectl", action)),
            Self::Talosctl { action } => Some(("talosctl", action)),
            Self::Version => None,
        }
    }
}

/// Operations available for every tool
#[derive(Subcommand)]
pub enum Action {
    /// List all installed versions
    List,

    /// List all remote versions from GitHub (sorted by semver)
    ///
    /// Installed versions are marked with '+', the version in use with '*'.
    /// Pre-release versions (alpha, beta, rc) are hidden unless --devel is given.
    /// Defaults are read from `<tool>.list-remote.*` in the configuration file.
    #[command(name = "list-remote")]
    ListRemote {
        /// Include pre-release versions (alpha, beta, rc)
        #[arg(long)]
        devel: bool,

        /// Limit number of versions displayed (0 for all)
        #[arg(short, long, value_name = "N")]
        limit: Option<usize>,

        /// Force refresh of remote versions cache
        #[arg(short, long)]
        force: bool,
    },

    /// Download and install a version for the current OS/ARCH
    ///
    /// The binary is saved below the versions path, named "<tool>-<version>".
    Install {
        /// Version to install, as tagged upstream (e.g. v1.35.0)
        #[arg(value_name = "VERSION")]
        version: String,

        /// Switch to the version once installed
        #[arg(short = 'u', long = "use")]
        use_after: bool,
    },

    /// Set the specified version as the active one
    ///
    /// Creates a symlink named after the tool in the bin path; make sure the
    /// bin path is included in $PATH.
    Use {
        /// Installed version to activate
        #[arg(value_name = "VERSION")]
        version: String,

        /// Install the version first if it is missing
        #[arg(short = 'i', long = "install")]
        install: bool,
    },
}
