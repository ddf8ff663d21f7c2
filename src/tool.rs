// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Managed tool descriptors
//!
//! Each tool is published either as standalone binaries attached to GitHub
//! releases, or through a direct download URL template. The release list is
//! always read from GitHub.

/// Immutable description of a managed tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolConfig {
    /// Binary name, also used for installed file names and the active link
    pub name: &'static str,
    /// GitHub organization owning the repository
    pub org: &'static str,
    /// GitHub repository publishing the releases
    pub repo: &'static str,
    /// Direct download template with `{version}`, `{os}` and `{arch}` placeholders
    pub download_url: Option<&'static str>,
    /// Whether the direct download is a `.tar.gz` archive
    pub archived: bool,
}

/// How a tool's binary is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Standalone binary attached to the GitHub release
    ReleaseAsset,
    /// HTTP GET against the expanded download template
    DirectDownload {
        template: &'static str,
        archived: bool,
    },
}

/// Suffix appended to archived download URLs
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

impl ToolConfig {
    /// kubectl, downloaded from the Kubernetes release bucket
    pub const KUBECTL: ToolConfig = ToolConfig {
        name: "kubectl",
        org: "kubernetes",
        repo: "kubernetes",
        download_url: Some("https://dl.k8s.io/release/{version}/bin/{os}/{arch}/kubectl"),
        archived: false,
    };

    /// helm, downloaded as a tarball from get.helm.sh
    pub const HELM: ToolConfig = ToolConfig {
        name: "helm",
        org: "helm",
        repo: "helm",
        download_url: Some("https://get.helm.sh/helm-{version}-{os}-{arch}"),
        archived: true,
    };

    /// kind, published as release assets
    pub const KIND: ToolConfig = ToolConfig {
        name: "kind",
        org: "kubernetes-sigs",
        repo: "kind",
        download_url: None,
        archived: false,
    };

    /// talosctl, published as release assets of siderolabs/talos
    pub const TALOSCTL: ToolConfig = ToolConfig {
        name: "talosctl",
        org: "siderolabs",
        repo: "talos",
        download_url: None,
        archived: false,
    };

    /// Look up a built-in tool by name
    #[must_use]
    pub fn find(name: &str) -> Option<&'static ToolConfig> {
        TOOLS.iter().find(|tool| tool.name == name)
    }

    /// "org/repo"
    #[must_use]
    pub fn repository(&self) -> String {
        format!("{}/{}", self.org, self.repo)
    }

    #[must_use]
    pub fn strategy(&self) -> Strategy {
        match self.download_url {
            Some(template) => Strategy::DirectDownload {
                template,
                archived: self.archived,
            },
            None => Strategy::ReleaseAsset,
        }
    }
}

/// Every tool vrsr knows how to manage
pub static TOOLS: [ToolConfig; 4] = [
    ToolConfig::HELM,
    ToolConfig::KIND,
    ToolConfig::KUBECTL,
    ToolConfig::TALOSCTL,
];
