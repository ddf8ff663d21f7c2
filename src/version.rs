// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Semantic versions for tool releases
//!
//! Release tags are not always strict semver (`v1.35.0`, `0.20`), so parsing is
//! lenient and the original spelling is kept next to the parsed value. The
//! original text is what ends up in file names and user-facing listings.

use std::cmp::Ordering;
use std::fmt;

use semver::Version;

use crate::github::Release;

/// A parsed version that remembers how it was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolVersion {
    original: String,
    version: Version,
}

impl ToolVersion {
    /// Parse a release tag or file-name suffix
    ///
    /// Accepts an optional leading `v` and fills missing minor/patch
    /// components with zero.
    ///
    /// # Examples
    /// ```
    /// use vrsr::version::ToolVersion;
    ///
    /// let v = ToolVersion::parse("v1.35").unwrap();
    /// assert_eq!(v.as_str(), "v1.35");
    /// assert_eq!(v.semver().to_string(), "1.35.0");
    /// assert!(ToolVersion::parse("latest").is_none());
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let version = coerce(text)?;
        Some(Self {
            original: text.to_string(),
            version,
        })
    }

    /// The version exactly as written
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// The parsed semantic version
    #[must_use]
    pub fn semver(&self) -> &Version {
        &self.version
    }

    /// Whether the version carries a pre-release component (alpha, beta, rc...)
    #[must_use]
    pub fn is_devel(&self) -> bool {
        !self.version.pre.is_empty()
    }
}

impl Ord for ToolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version
            .cmp(&other.version)
            .then_with(|| self.original.cmp(&other.original))
    }
}

impl PartialOrd for ToolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

fn coerce(text: &str) -> Option<Version> {
    let stripped = text
        .strip_prefix('v')
        .or_else(|| text.strip_prefix('V'))
        .unwrap_or(text);

    let split = stripped.find(['-', '+']).unwrap_or(stripped.len());
    let (core, rest) = stripped.split_at(split);
    let padded = match core.matches('.').count() {
        0 => format!("{core}.0.0{rest}"),
        1 => format!("{core}.0{rest}"),
        _ => stripped.to_string(),
    };
    Version::parse(&padded).ok()
}

/// Parse release tags into sorted versions
///
/// Tags that are not versions are dropped. Pre-releases are dropped unless
/// `include_devel` is set. The result is ascending by semver precedence.
#[must_use]
pub fn versions_from_releases(releases: &[Release], include_devel: bool) -> Vec<ToolVersion> {
    let mut versions: Vec<ToolVersion> = releases
        .iter()
        .filter_map(|release| ToolVersion::parse(&release.tag_name))
        .filter(|version| include_devel || !version.is_devel())
        .collect();
    versions.sort();
    versions
}

/// Extract the version suffix from an installed file name
///
/// Installed binaries are named `<tool>-<version>`; names with any other
/// number of hyphen-separated parts are not ours.
///
/// # Examples
/// ```
/// use vrsr::version::version_from_file_name;
///
/// assert_eq!(version_from_file_name("kind", "kind-v0.20.0"), Some("v0.20.0"));
/// assert_eq!(version_from_file_name("kind", "kind-v0.20.0-rc.1"), None);
/// assert_eq!(version_from_file_name("kind", "helm-v3.0.0"), None);
/// ```
#[must_use]
pub fn version_from_file_name<'a>(tool: &str, file_name: &'a str) -> Option<&'a str> {
    let mut parts = file_name.split('-');
    let (name, version) = (parts.next()?, parts.next()?);
    if parts.next().is_some() || name != tool || version.is_empty() {
        return None;
    }
    Some(version)
}
