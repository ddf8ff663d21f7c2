// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Downloading and installing tool binaries
//!
//! Two strategies are supported, picked by the tool's configuration:
//! standalone binaries attached to a GitHub release, and direct downloads
//! from a URL template, optionally packaged as a `.tar.gz` archive. Both end
//! in [`install_atomic`], which guarantees that the final
//! `<tool>-<version>` path is either absent or complete.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tempfile::Builder;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::github::{Asset, ReleaseSource};
use crate::http::{Download, HttpGet};
use crate::platform::Platform;
use crate::progress::{Progress, ProgressReader, Unit};
use crate::store::Store;
use crate::tool::{ARCHIVE_SUFFIX, Strategy, ToolConfig};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Something that can put a version of a tool on disk
pub trait Acquire {
    /// Download and install `version` of `tool`
    ///
    /// # Returns
    /// Path of the installed binary
    fn acquire(&self, tool: &ToolConfig, version: &str) -> Result<PathBuf>;
}

/// Pick the release asset holding the binary for `platform`
///
/// When several assets qualify the last one listed wins; a warning names all
/// of them since the choice is then arbitrary.
#[must_use]
pub fn select_asset<'a>(assets: &'a [Asset], tool: &str, platform: &Platform) -> Option<&'a Asset> {
    let candidates: Vec<&Asset> = assets
        .iter()
        .filter(|asset| platform.matches_asset(tool, &asset.name))
        .collect();

    if candidates.len() > 1 {
        let names: Vec<&str> = candidates.iter().map(|asset| asset.name.as_str()).collect();
        warn!(
            "several assets match {}: {}; using {}",
            platform.asset_prefix(tool),
            names.join(", "),
            names[names.len() - 1]
        );
    }
    candidates.last().copied()
}

/// Write `reader` to the install path of `version` atomically
///
/// The content goes to a `<tool>-download-*` temporary file inside the tool
/// directory, which is then renamed over the final path and made executable.
/// On failure the temporary file is removed.
///
/// # Errors
/// Returns error if reading the content or any filesystem step fails
pub fn install_atomic<R: Read + ?Sized>(
    store: &Store,
    tool: &str,
    version: &str,
    reader: &mut R,
) -> Result<PathBuf> {
    let dir = store.tool_dir(tool);
    fs::create_dir_all(&dir).map_err(|e| Error::io_at("create", &dir, e))?;

    let mut tmp = Builder::new()
        .prefix(&format!("{tool}-download-"))
        .tempfile_in(&dir)
        .map_err(|e| Error::io_at("create temp file in", &dir, e))?;
    copy_download(reader, tmp.as_file_mut(), tool, version)?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::io_at("flush", tmp.path(), e))?;

    let dest = store.version_path(tool, version);
    tmp.persist(&dest)
        .map_err(|e| Error::io_at("move download to", &dest, e.error))?;
    set_executable(&dest)?;

    debug!(path = %dest.display(), "installed");
    Ok(dest)
}

/// Copy a download into a local file
///
/// Read failures come from the remote side (dropped connection, corrupt
/// archive) and are reported as [`Error::Transfer`]; write failures are local.
fn copy_download<R: Read + ?Sized, W: Write>(
    reader: &mut R,
    writer: &mut W,
    tool: &str,
    version: &str,
) -> Result<u64> {
    let mut buffer = vec![0; COPY_BUFFER_SIZE];
    let mut copied = 0;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => return Ok(copied),
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(Error::Transfer {
                    context: format!("failed to download {tool} {version}"),
                    source: e,
                });
            }
        };
        writer
            .write_all(&buffer[..read])
            .map_err(|e| Error::io(format!("failed to save download of {tool} {version}"), e))?;
        copied += read as u64;
    }
}

/// Set executable permissions on a file
#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| Error::io_at("set executable permission on", path, e))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Default [`Acquire`] implementation
pub struct Acquirer<'a> {
    source: &'a dyn ReleaseSource,
    http: &'a dyn HttpGet,
    store: &'a Store,
    progress: &'a dyn Progress,
    platform: Platform,
}

impl<'a> Acquirer<'a> {
    pub fn new(
        source: &'a dyn ReleaseSource,
        http: &'a dyn HttpGet,
        store: &'a Store,
        progress: &'a dyn Progress,
    ) -> Self {
        Self {
            source,
            http,
            store,
            progress,
            platform: Platform::detect(),
        }
    }

    /// Acquire binaries for another platform than the running one
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    fn from_release_asset(&self, tool: &ToolConfig, version: &str) -> Result<PathBuf> {
        self.progress
            .begin("Downloading release metadata...", None, Unit::Bytes);
        let release = match self.source.release_by_tag(tool, version) {
            Ok(release) => release,
            Err(e) => {
                self.progress.finish();
                return Err(e);
            }
        };

        let Some(asset) = select_asset(&release.assets, tool.name, &self.platform) else {
            self.progress.finish();
            return Err(Error::AssetNotFound {
                tag: release.tag_name,
                prefix: self.platform.asset_prefix(tool.name),
            });
        };
        info!(asset = %asset.name, "downloading release asset");

        let download = match self.source.download_asset(tool, asset.id) {
            Ok(download) => download,
            Err(e) => {
                self.progress.finish();
                return Err(e);
            }
        };
        let total = download.content_length.or(Some(asset.size).filter(|size| *size > 0));
        self.install_stream(tool, version, download, total, "Downloading...")
    }

    fn from_direct_download(
        &self,
        tool: &ToolConfig,
        version: &str,
        template: &str,
        archived: bool,
    ) -> Result<PathBuf> {
        let mut url = self.platform.expand_template(template, version);
        if archived {
            url.push_str(ARCHIVE_SUFFIX);
        }
        info!(%url, "downloading");

        let download = self.http.get(&url)?;
        let total = download.content_length;
        if archived {
            self.install_from_archive(tool, version, download, total)
        } else {
            self.install_stream(tool, version, download, total, "Downloading...")
        }
    }

    fn install_stream(
        &self,
        tool: &ToolConfig,
        version: &str,
        download: Download,
        total: Option<u64>,
        message: &str,
    ) -> Result<PathBuf> {
        self.progress.begin(message, total, Unit::Bytes);
        let mut reader = ProgressReader::new(download.body, self.progress);
        let result = install_atomic(self.store, tool.name, version, &mut reader);
        self.progress.finish();
        result
    }

    /// Install the single `<os>-<arch>/<tool>` entry of a gzip'd tarball
    ///
    /// Progress is measured on the compressed stream, which is what the
    /// announced content length describes.
    fn install_from_archive(
        &self,
        tool: &ToolConfig,
        version: &str,
        download: Download,
        total: Option<u64>,
    ) -> Result<PathBuf> {
        self.progress
            .begin("Downloading & Extracting...", total, Unit::Bytes);
        let reader = ProgressReader::new(download.body, self.progress);
        let result = self.extract_entry(tool, version, reader);
        self.progress.finish();
        result
    }

    fn extract_entry<R: Read>(&self, tool: &ToolConfig, version: &str, reader: R) -> Result<PathBuf> {
        let expected = self.platform.archive_entry(tool.name);
        let mut archive = Archive::new(GzDecoder::new(reader));
        let transfer = |source| Error::Transfer {
            context: format!("failed to read {} {version} archive", tool.name),
            source,
        };
        let entries = archive.entries().map_err(transfer)?;

        for entry in entries {
            let mut entry = entry.map_err(transfer)?;
            let matches = {
                let path = entry.path().map_err(transfer)?;
                let full: &Path = &path;
                full.strip_prefix(".").unwrap_or(full) == Path::new(&expected)
            };
            if matches {
                return install_atomic(self.store, tool.name, version, &mut entry);
            }
        }

        Err(Error::ArchiveEntryNotFound { entry: expected })
    }
}

impl Acquire for Acquirer<'_> {
    fn acquire(&self, tool: &ToolConfig, version: &str) -> Result<PathBuf> {
        match tool.strategy() {
            Strategy::ReleaseAsset => self.from_release_asset(tool, version),
            Strategy::DirectDownload { template, archived } => {
                self.from_direct_download(tool, version, template, archived)
            }
        }
    }
}
