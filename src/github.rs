// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! GitHub releases API
//!
//! Lists releases page by page, resolves a release by tag and streams release
//! assets. Set `GITHUB_TOKEN` (or `GH_TOKEN`) to lift the anonymous rate limit
//! of 60 requests per hour.

use attohttpc::header::{ACCEPT, AUTHORIZATION, LINK, LOCATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ToolConfig;
use crate::error::{Error, Result};
use crate::http::{Download, user_agent};

/// Base URL of the public GitHub REST API
pub const GITHUB_API: &str = "https://api.github.com";

/// A published release, as returned by the API and stored in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Git tag the release was cut from (e.g. "v0.20.0")
    pub tag_name: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Whether GitHub flags the release as a pre-release
    #[serde(default)]
    pub prerelease: bool,
    /// Downloadable artifacts
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A downloadable artifact attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Opaque asset identifier used by the download endpoint
    pub id: u64,
    /// File name (e.g. "kind-linux-amd64")
    pub name: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
}

/// One page of the release listing
#[derive(Debug, Clone, Default)]
pub struct ReleasePage {
    pub releases: Vec<Release>,
    /// Number of the following page, `None` on the last page
    pub next_page: Option<u32>,
    /// Number of the last page, when the server announces it
    pub last_page: Option<u32>,
}

/// Remote side of the repository-asset protocol
pub trait ReleaseSource {
    /// Fetch page `page` (1-based) of the tool's releases
    fn list_releases(&self, tool: &ToolConfig, page: u32, per_page: u32) -> Result<ReleasePage>;

    /// Fetch the release tagged `tag`
    fn release_by_tag(&self, tool: &ToolConfig, tag: &str) -> Result<Release>;

    /// Open the binary content of an asset
    fn download_asset(&self, tool: &ToolConfig, asset_id: u64) -> Result<Download>;
}

/// Page numbers extracted from a `Link` header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub next: Option<u32>,
    pub last: Option<u32>,
}

/// Parse the pagination `Link` header
///
/// # Examples
/// ```
/// use vrsr::github::parse_link_header;
///
/// let links = parse_link_header(
///     r#"<https://api.github.com/repositories/1/releases?per_page=100&page=2>; rel="next", <https://api.github.com/repositories/1/releases?per_page=100&page=4>; rel="last""#,
/// );
/// assert_eq!(links.next, Some(2));
/// assert_eq!(links.last, Some(4));
/// ```
#[must_use]
pub fn parse_link_header(value: &str) -> PageLinks {
    let mut links = PageLinks::default();
    for part in value.split(',') {
        let mut fields = part.split(';');
        let Some(target) = fields.next() else {
            continue;
        };
        let url = target.trim().trim_start_matches('<').trim_end_matches('>');
        let page = url
            .split(['?', '&'])
            .find_map(|pair| pair.strip_prefix("page="))
            .and_then(|page| page.parse().ok());
        for field in fields {
            match field.trim() {
                r#"rel="next""# => links.next = page,
                r#"rel="last""# => links.last = page,
                _ => {}
            }
        }
    }
    links
}

/// [`ReleaseSource`] backed by the GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    api_base: String,
    token: Option<String>,
    user_agent: String,
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubClient {
    /// Client for api.github.com using the token from the environment, if any
    #[must_use]
    pub fn new() -> Self {
        let token = std::env::var("GITHUB_TOKEN")
            .or_else(|_| std::env::var("GH_TOKEN"))
            .ok()
            .filter(|token| !token.is_empty());
        Self {
            api_base: GITHUB_API.to_string(),
            token,
            user_agent: user_agent(),
        }
    }

    /// Point the client at another API root (GitHub Enterprise, test servers)
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn repo_url(&self, tool: &ToolConfig, path: &str) -> String {
        format!("{}/repos/{}/{}/{path}", self.api_base, tool.org, tool.repo)
    }

    fn request(&self, url: &str, accept: &str) -> attohttpc::RequestBuilder {
        let request = attohttpc::get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .header(ACCEPT, accept);
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(url: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| Error::Decode {
        url: url.to_string(),
        source,
    })
}

impl ReleaseSource for GitHubClient {
    fn list_releases(&self, tool: &ToolConfig, page: u32, per_page: u32) -> Result<ReleasePage> {
        let url = self.repo_url(tool, "releases");
        debug!(%url, page, per_page, "listing releases");

        let response = self
            .request(&url, "application/vnd.github+json")
            .param("page", page)
            .param("per_page", per_page)
            .send()?;
        if !response.is_success() {
            return Err(Error::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let links = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .map(parse_link_header)
            .unwrap_or_default();
        let releases: Vec<Release> = decode(&url, &response.text()?)?;

        Ok(ReleasePage {
            releases,
            next_page: links.next,
            last_page: links.last,
        })
    }

    fn release_by_tag(&self, tool: &ToolConfig, tag: &str) -> Result<Release> {
        let url = self.repo_url(tool, &format!("releases/tags/{tag}"));
        debug!(%url, "fetching release");

        let response = self.request(&url, "application/vnd.github+json").send()?;
        if response.status().as_u16() == 404 {
            return Err(Error::ReleaseNotFound {
                repository: tool.repository(),
                tag: tag.to_string(),
            });
        }
        if !response.is_success() {
            return Err(Error::Status {
                url,
                status: response.status().as_u16(),
            });
        }
        decode(&url, &response.text()?)
    }

    fn download_asset(&self, tool: &ToolConfig, asset_id: u64) -> Result<Download> {
        let url = self.repo_url(tool, &format!("releases/assets/{asset_id}"));
        debug!(%url, "downloading asset");

        // The API redirects to a pre-signed storage URL that rejects our token.
        let response = self
            .request(&url, "application/octet-stream")
            .follow_redirects(false)
            .send()?;

        let response = if response.status().is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| Error::Status {
                    url: url.clone(),
                    status: response.status().as_u16(),
                })?;
            debug!(%location, "following asset redirect");
            attohttpc::get(&location)
                .header(USER_AGENT, self.user_agent.as_str())
                .send()?
        } else {
            response
        };

        if !response.is_success() {
            return Err(Error::Status {
                url,
                status: response.status().as_u16(),
            });
        }
        Ok(Download::from_response(response))
    }
}
