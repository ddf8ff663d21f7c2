// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Release cache
//!
//! Each tool has one cache file, `<cache_dir>/<tool>-releases.json`, holding the
//! releases from the last live fetch together with the time of that fetch.
//! The file never expires; it is replaced wholesale whenever a live fetch
//! succeeds, and its age is shown to the user so they can force a refresh.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::github::Release;

/// Age in minutes after which cached results are flagged as possibly outdated
pub const STALE_AFTER_MINUTES: i64 = 5;

/// Snapshot of a tool's releases at fetch time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseCache {
    /// When the releases were fetched
    pub timestamp: DateTime<Utc>,
    /// Releases in the order the API returned them
    pub releases: Vec<Release>,
}

impl ReleaseCache {
    /// Create a snapshot stamped with the current time
    #[must_use]
    pub fn new(releases: Vec<Release>) -> Self {
        Self {
            timestamp: Utc::now(),
            releases,
        }
    }
}

/// Path of the cache file for `tool`
#[must_use]
pub fn cache_file_path(cache_dir: &Path, tool: &str) -> PathBuf {
    cache_dir.join(format!("{tool}-releases.json"))
}

/// Replace the cache for `tool` with `releases`
///
/// The file is written next to its destination and renamed into place, so a
/// reader never sees a half-written cache.
///
/// # Returns
/// The snapshot that was written
///
/// # Errors
/// Returns error if the cache directory or file cannot be written
pub fn save_to_cache(cache_dir: &Path, tool: &str, releases: &[Release]) -> Result<ReleaseCache> {
    let cache = ReleaseCache::new(releases.to_vec());
    let path = cache_file_path(cache_dir, tool);
    let content = serde_json::to_vec(&cache).map_err(|source| Error::Cache {
        path: path.display().to_string(),
        source,
    })?;

    fs::create_dir_all(cache_dir).map_err(|e| Error::io_at("create", cache_dir, e))?;
    let mut tmp = NamedTempFile::new_in(cache_dir)
        .map_err(|e| Error::io_at("create temp file in", cache_dir, e))?;
    tmp.write_all(&content)
        .map_err(|e| Error::io_at("write", tmp.path(), e))?;
    tmp.persist(&path)
        .map_err(|e| Error::io_at("replace", &path, e.error))?;

    Ok(cache)
}

/// Load the cache for `tool`
///
/// A positive `limit` keeps only the first `limit` releases in stored order.
///
/// # Returns
/// `None` if no cache file exists
///
/// # Errors
/// Returns error if the file exists but cannot be read or decoded
pub fn read_from_cache(cache_dir: &Path, tool: &str, limit: usize) -> Result<Option<ReleaseCache>> {
    let path = cache_file_path(cache_dir, tool);
    let content = match fs::read(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io_at("read", &path, e)),
    };

    let mut cache: ReleaseCache =
        serde_json::from_slice(&content).map_err(|source| Error::Cache {
            path: path.display().to_string(),
            source,
        })?;
    if limit > 0 {
        cache.releases.truncate(limit);
    }
    Ok(Some(cache))
}

/// Format cache age in human-readable format
///
/// # Returns
/// Human-readable age (e.g. "3d ago", "2h ago" or "30m ago")
#[must_use]
pub fn format_cache_age(timestamp: &DateTime<Utc>) -> String {
    let age = Utc::now().signed_duration_since(*timestamp);

    if age.num_days() > 0 {
        format!("{}d ago", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{}h ago", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{}m ago", age.num_minutes())
    } else {
        format!("{}s ago", age.num_seconds().max(0))
    }
}

/// Whether a snapshot taken at `timestamp` should be flagged as outdated
#[must_use]
pub fn is_stale(timestamp: &DateTime<Utc>) -> bool {
    Utc::now().signed_duration_since(*timestamp) > TimeDelta::minutes(STALE_AFTER_MINUTES)
}
