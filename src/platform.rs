// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Platform detection and artifact naming
//!
//! Release assets and download URLs name platforms with the `<os>-<arch>` vocabulary
//! used by most Go-built tools (`linux-amd64`, `darwin-arm64`, ...). This module
//! maps the running target onto that vocabulary and derives every platform
//! dependent name from it.

/// Represents a target platform for tool binaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Operating system alias (e.g. "linux")
    pub os: &'static str,
    /// Architecture alias (e.g. "amd64")
    pub arch: &'static str,
}

impl Platform {
    /// Linux x86_64
    pub const LINUX_AMD64: Platform = Platform {
        os: "linux",
        arch: "amd64",
    };

    /// Linux ARM64
    pub const LINUX_ARM64: Platform = Platform {
        os: "linux",
        arch: "arm64",
    };

    /// macOS x86_64
    pub const DARWIN_AMD64: Platform = Platform {
        os: "darwin",
        arch: "amd64",
    };

    /// macOS ARM64
    pub const DARWIN_ARM64: Platform = Platform {
        os: "darwin",
        arch: "arm64",
    };

    /// Windows x86_64
    pub const WINDOWS_AMD64: Platform = Platform {
        os: "windows",
        arch: "amd64",
    };

    /// Detect the current platform from the compile target
    ///
    /// Unknown operating systems and architectures keep Rust's own spelling.
    #[must_use]
    pub fn detect() -> Platform {
        Self::from_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map a Rust target OS/arch pair onto the release vocabulary
    #[must_use]
    pub fn from_target(os: &'static str, arch: &'static str) -> Platform {
        let os = match os {
            "macos" => "darwin",
            other => other,
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            other => other,
        };
        Platform { os, arch }
    }

    /// Human-readable name (e.g. "linux-amd64")
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }

    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    /// Prefix every release asset for `tool` on this platform starts with
    #[must_use]
    pub fn asset_prefix(&self, tool: &str) -> String {
        format!("{tool}-{}-{}", self.os, self.arch).to_lowercase()
    }

    /// Whether a release asset name is the standalone binary for `tool`
    ///
    /// Windows binaries must carry the `.exe` suffix; anywhere else the asset
    /// must have no dotted extension at all, which rules out archives and
    /// checksum files.
    #[must_use]
    pub fn matches_asset(&self, tool: &str, asset_name: &str) -> bool {
        let name = asset_name.to_lowercase();
        if !name.starts_with(&self.asset_prefix(tool)) {
            return false;
        }
        if self.is_windows() {
            name.ends_with(".exe")
        } else {
            !name.contains('.')
        }
    }

    /// Path of the binary inside a platform archive (e.g. "linux-amd64/helm")
    #[must_use]
    pub fn archive_entry(&self, tool: &str) -> String {
        format!("{}-{}/{tool}", self.os, self.arch)
    }

    /// Substitute `{version}`, `{os}` and `{arch}` in a download URL template
    #[must_use]
    pub fn expand_template(&self, template: &str, version: &str) -> String {
        template
            .replace("{version}", version)
            .replace("{os}", self.os)
            .replace("{arch}", self.arch)
    }
}
