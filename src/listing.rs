// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Rendering of version listings

use crate::version::ToolVersion;

/// Marker appended to the active version
pub const ACTIVE_MARKER: &str = "*";

/// Marker appended to installed, inactive versions in remote listings
pub const INSTALLED_MARKER: &str = "+";

/// One line per installed version, the active one marked with `*`
#[must_use]
pub fn installed_lines(versions: &[ToolVersion], active: Option<&str>) -> Vec<String> {
    versions
        .iter()
        .map(|version| {
            if Some(version.as_str()) == active {
                format!("{version} {ACTIVE_MARKER}")
            } else {
                version.to_string()
            }
        })
        .collect()
}

/// One line per remote version
///
/// The active version is marked with `*`, other installed versions with `+`.
/// Installed versions are matched by semver equality, so `v1.2.0` on disk
/// marks a `1.2.0` release.
#[must_use]
pub fn remote_lines(
    versions: &[ToolVersion],
    installed: &[ToolVersion],
    active: Option<&str>,
) -> Vec<String> {
    versions
        .iter()
        .map(|version| {
            if Some(version.as_str()) == active {
                format!("{version} {ACTIVE_MARKER}")
            } else if installed.iter().any(|local| local.semver() == version.semver()) {
                format!("{version} {INSTALLED_MARKER}")
            } else {
                version.to_string()
            }
        })
        .collect()
}
