// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
#![allow(clippy::multiple_crate_versions)]
//! vrsr - Main Application
//!
//! Entry point for the vrsr CLI, which installs and switches between versions
//! of several tools:
//! - Listing installed versions and marking the active one
//! - Listing remote versions from GitHub releases, cached locally
//! - Downloading the binary for the current platform
//! - Activating a version through a symlink in the bin path

mod cli;

use std::error::Error;
use std::process::exit;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vrsr::cache::{format_cache_age, is_stale};
use vrsr::config::{FileConfig, home_dir};
use vrsr::listing::{installed_lines, remote_lines};
use vrsr::progress::Bar;
use vrsr::{
    ActivateOptions, ActivateOutcome, Acquirer, Controller, FetchOptions, GitHubClient,
    HttpClient, InstallOptions, InstallOutcome, Settings, Store, ToolConfig, fetch_releases,
};

use cli::{Action, Cli};

/// Main application entry point
///
/// Parses command line arguments, sets up logging and dispatches to the
/// command handlers. Errors are printed to stderr with a non-zero exit status.
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        exit(1);
    }
}

/// Log to stderr; `VRSR_LOG` overrides the level picked from `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "vrsr=debug" } else { "vrsr=warn" };
    let filter = EnvFilter::try_from_env("VRSR_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let verbose = cli.verbose;
    let Some((name, action)) = cli.command.into_parts() else {
        println!("vrsr version v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    };
    let tool = ToolConfig::find(name).ok_or_else(|| format!("unknown tool: {name}"))?;

    let home = home_dir()?;
    let cwd = std::env::current_dir()?;
    let (config, config_path) = FileConfig::discover(cli.config.as_deref(), &cwd, &home)?;
    if verbose && let Some(path) = &config_path {
        eprintln!("Using configuration file {}", path.display());
    }
    let config = config.with_process_env()?;

    // Flags (and their environment variables) win over the configuration file
    let settings = Settings::from_home(&home)
        .with_overrides(config.vrs_path.clone(), config.bin_path.clone())
        .with_overrides(cli.vrs_path, cli.bin_path);
    let store = Store::from_settings(&settings);
    let defaults = config.tool(name);
    let github = match &config.github_api {
        Some(api) => GitHubClient::new().with_api_base(api.as_str()),
        None => GitHubClient::new(),
    };

    match action {
        Action::List => cmd_list(&store, tool),
        Action::ListRemote {
            devel,
            limit,
            force,
        } => cmd_list_remote(
            &settings,
            &store,
            &github,
            tool,
            defaults.fetch_options(devel, limit, force),
        ),
        Action::Install { version, use_after } => cmd_install(
            &store,
            &github,
            tool,
            &version,
            defaults.install_options(use_after),
            verbose,
        ),
        Action::Use { version, install } => cmd_use(
            &store,
            &github,
            tool,
            &version,
            defaults.activate_options(install),
            verbose,
        ),
    }
}

// =============================================================================
// Command Implementation Functions
// =============================================================================

/// List installed versions, marking the active one with '*'
fn cmd_list(store: &Store, tool: &ToolConfig) -> Result<(), Box<dyn Error>> {
    let versions = store.list_installed(tool.name)?;
    if versions.is_empty() {
        println!("No {} versions installed.", tool.name);
        return Ok(());
    }

    // Not being able to tell the active version is not worth failing over
    let active = store.active_version(tool.name).unwrap_or_else(|e| {
        eprintln!("Error getting current version: {e}");
        None
    });

    println!("Available {} versions:", tool.name);
    for line in installed_lines(&versions, active.as_deref()) {
        println!("{line}");
    }
    Ok(())
}

/// List remote versions, marking installed ('+') and active ('*') ones
fn cmd_list_remote(
    settings: &Settings,
    store: &Store,
    github: &GitHubClient,
    tool: &ToolConfig,
    options: FetchOptions,
) -> Result<(), Box<dyn Error>> {
    let progress = Bar::new();
    let catalog = fetch_releases(github, &settings.cache_dir, tool, options, &progress)?;

    let active = store.active_version(tool.name).unwrap_or_else(|e| {
        eprintln!("Error getting current version: {e}");
        None
    });
    let installed = store.list_installed(tool.name).unwrap_or_else(|e| {
        eprintln!("Error listing available binaries: {e}");
        Vec::new()
    });

    println!("Available versions to download:");
    for line in remote_lines(&catalog.versions, &installed, active.as_deref()) {
        println!("{line}");
    }

    if !options.include_devel {
        println!(
            "\nNote: Pre-release versions (alpha, beta, rc) are hidden. Use '--devel' to include them."
        );
    }
    if catalog.from_cache && is_stale(&catalog.timestamp) {
        println!(
            "\nNote: The results shown above were cached {}. You can use the '-f' flag to force a refresh of the list.",
            format_cache_age(&catalog.timestamp)
        );
    }
    Ok(())
}

/// Download and install a version, optionally switching to it
fn cmd_install(
    store: &Store,
    github: &GitHubClient,
    tool: &ToolConfig,
    version: &str,
    options: InstallOptions,
    verbose: bool,
) -> Result<(), Box<dyn Error>> {
    let http = HttpClient::new();
    let progress = Bar::new();
    let acquirer = Acquirer::new(github, &http, store, &progress);
    let controller = Controller::new(store, &acquirer);

    let name = tool.name;
    match controller.install(tool, version, options)? {
        InstallOutcome::AlreadyActive => {
            println!("{name} version {version} is already in use. Nothing to do");
        }
        InstallOutcome::AlreadyInstalled => {
            println!("{name} version {version} is already installed.");
            print_use_hint(name, version);
        }
        InstallOutcome::Installed => {
            println!("{name} version {version} successfully installed");
            print_use_hint(name, version);
        }
        InstallOutcome::Activated { fresh } => {
            if fresh {
                println!("{name} version {version} successfully installed");
            }
            println!("Now using {name} version {version}");
            if verbose {
                check_path_warnings(store, tool);
            }
        }
        InstallOutcome::ActivationFailed { fresh, reason } => {
            if fresh {
                println!("{name} version {version} successfully installed");
            }
            eprintln!("Warning: could not switch to {name} version {version}: {reason}");
            print_use_hint(name, version);
        }
    }
    Ok(())
}

/// Make a version the active one, optionally installing it first
fn cmd_use(
    store: &Store,
    github: &GitHubClient,
    tool: &ToolConfig,
    version: &str,
    options: ActivateOptions,
    verbose: bool,
) -> Result<(), Box<dyn Error>> {
    let http = HttpClient::new();
    let progress = Bar::new();
    let acquirer = Acquirer::new(github, &http, store, &progress);
    let controller = Controller::new(store, &acquirer);

    let name = tool.name;
    let outcome = match controller.activate(tool, version, options) {
        Ok(outcome) => outcome,
        Err(vrsr::Error::NotInstalled { .. }) => {
            return Err(format!(
                "specified version is not installed. Please install it first using `vrsr {name} install <version>`"
            )
            .into());
        }
        // The installation was attempted on the user's behalf
        Err(e) if options.install_missing => {
            return Err(format!(
                "{e}\nInstall it manually with `vrsr {name} install {version}`, then run `vrsr {name} use {version}`"
            )
            .into());
        }
        Err(e) => return Err(e.into()),
    };

    match outcome {
        ActivateOutcome::AlreadyActive => {
            println!("{name} version {version} is already in use. Nothing to do");
        }
        ActivateOutcome::Activated => println!("Now using {name} version {version}"),
        ActivateOutcome::InstalledAndActivated => {
            println!("{name} version {version} successfully installed");
            println!("Now using {name} version {version}");
        }
    }

    if verbose {
        check_path_warnings(store, tool);
    }
    Ok(())
}

fn print_use_hint(name: &str, version: &str) {
    println!("To switch to that version run `vrsr {name} use {version}`");
}

/// Warn when the active link is not what the shell will run
///
/// Either the bin path is missing from `$PATH`, or another binary with the
/// same name comes first.
fn check_path_warnings(store: &Store, tool: &ToolConfig) {
    let bin_path = store.bin_path();
    match which::which(tool.name) {
        Ok(found) if found.parent() == Some(bin_path) => {}
        Ok(found) => eprintln!(
            "Warning: {} resolves to {}, which shadows {}",
            tool.name,
            found.display(),
            store.link_path(tool.name).display()
        ),
        Err(_) => eprintln!(
            "Warning: {} is not in your ${{PATH}}",
            bin_path.display()
        ),
    }
}
