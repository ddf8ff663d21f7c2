// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Remote version catalog
//!
//! Answers "which versions of this tool exist?" from the release cache when
//! possible and from the release listing API otherwise.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::ToolConfig;
use crate::cache::{read_from_cache, save_to_cache};
use crate::error::Result;
use crate::github::{Release, ReleaseSource};
use crate::progress::{Progress, Unit};
use crate::version::{ToolVersion, versions_from_releases};

/// Largest page size the listing endpoint accepts
pub const MAX_PAGE_SIZE: u32 = 100;

/// Options for a catalog lookup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Keep pre-release versions
    pub include_devel: bool,
    /// Maximum number of versions to return, 0 for no limit
    pub limit: usize,
    /// Skip the cache and always ask the API
    pub force: bool,
}

/// Result of a catalog lookup
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Available versions, ascending
    pub versions: Vec<ToolVersion>,
    /// When the underlying release list was fetched
    pub timestamp: DateTime<Utc>,
    /// Whether the list came from the cache
    pub from_cache: bool,
}

/// Page size for a given limit
///
/// Uses the largest page allowed so that unlimited listings need as few
/// requests as possible.
#[must_use]
pub fn page_size(limit: usize) -> u32 {
    match u32::try_from(limit) {
        Ok(limit) if limit > 0 && limit < MAX_PAGE_SIZE => limit,
        _ => MAX_PAGE_SIZE,
    }
}

/// List available versions of `tool`
///
/// Unless `force` is set, a non-empty cache is returned without touching the
/// network; a missing or corrupt cache falls through to a live fetch. A live
/// fetch replaces the cache with everything it retrieved.
///
/// The returned versions have the devel filter applied, are sorted
/// ascending, and are cut down to the `limit` most recent ones.
///
/// # Errors
/// Returns error if the live fetch fails
pub fn fetch_releases(
    source: &dyn ReleaseSource,
    cache_dir: &Path,
    tool: &ToolConfig,
    options: FetchOptions,
    progress: &dyn Progress,
) -> Result<Catalog> {
    let cached = if options.force {
        None
    } else {
        match read_from_cache(cache_dir, tool.name, options.limit) {
            Ok(Some(cache)) if !cache.releases.is_empty() => Some(cache),
            Ok(_) => None,
            Err(e) => {
                warn!("ignoring unreadable release cache: {e}");
                None
            }
        }
    };

    let (releases, timestamp, from_cache) = match cached {
        Some(cache) => {
            debug!(tool = tool.name, count = cache.releases.len(), "using cached releases");
            (cache.releases, cache.timestamp, true)
        }
        None => {
            let releases = fetch_live(source, tool, options.limit, progress)?;
            let timestamp = match save_to_cache(cache_dir, tool.name, &releases) {
                Ok(cache) => cache.timestamp,
                Err(e) => {
                    warn!("failed to cache releases: {e}");
                    Utc::now()
                }
            };
            (releases, timestamp, false)
        }
    };

    let mut versions = versions_from_releases(&releases, options.include_devel);
    if options.limit > 0 && versions.len() > options.limit {
        versions.drain(..versions.len() - options.limit);
    }

    Ok(Catalog {
        versions,
        timestamp,
        from_cache,
    })
}

fn fetch_live(
    source: &dyn ReleaseSource,
    tool: &ToolConfig,
    limit: usize,
    progress: &dyn Progress,
) -> Result<Vec<Release>> {
    progress.begin("Downloading releases metadata...", Some(1), Unit::Pages);
    let result = fetch_pages(source, tool, limit, progress);
    progress.finish();
    result
}

fn fetch_pages(
    source: &dyn ReleaseSource,
    tool: &ToolConfig,
    limit: usize,
    progress: &dyn Progress,
) -> Result<Vec<Release>> {
    let per_page = page_size(limit);
    let mut releases = Vec::new();
    let mut page = 1;

    loop {
        let batch = source.list_releases(tool, page, per_page)?;
        if let Some(last) = batch.last_page {
            progress.set_total(u64::from(last));
        }
        progress.advance(1);

        for release in batch.releases {
            if limit > 0 && releases.len() >= limit {
                break;
            }
            releases.push(release);
        }
        if limit > 0 && releases.len() >= limit {
            break;
        }

        match batch.next_page {
            Some(next) if next > page => page = next,
            _ => break,
        }
    }

    debug!(tool = tool.name, count = releases.len(), pages = page, "fetched releases");
    Ok(releases)
}
