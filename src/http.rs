// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Blocking HTTP downloads

use std::io::Read;

use attohttpc::header::{CONTENT_LENGTH, HeaderMap, USER_AGENT};
use tracing::debug;

use crate::error::{Error, Result};

/// Value of the User-Agent header sent with every request
#[must_use]
pub fn user_agent() -> String {
    format!("vrsr/{}", env!("CARGO_PKG_VERSION"))
}

/// An open response body
pub struct Download {
    /// Size announced by the server, if any
    pub content_length: Option<u64>,
    /// Streaming body
    pub body: Box<dyn Read>,
}

impl Download {
    /// Wrap an in-memory payload
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            content_length: Some(bytes.len() as u64),
            body: Box::new(std::io::Cursor::new(bytes)),
        }
    }

    /// Turn a successful attohttpc response into a streaming download
    pub(crate) fn from_response(response: attohttpc::Response) -> Self {
        let (_, headers, reader) = response.split();
        Self {
            content_length: content_length(&headers),
            body: Box::new(reader),
        }
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

/// Plain GET of a URL
pub trait HttpGet {
    /// Fetch `url`; any non-success status is an error
    fn get(&self, url: &str) -> Result<Download>;
}

/// attohttpc-backed [`HttpGet`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    user_agent: String,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            user_agent: user_agent(),
        }
    }
}

impl HttpGet for HttpClient {
    fn get(&self, url: &str) -> Result<Download> {
        debug!(%url, "GET");
        let response = attohttpc::get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .send()?;
        if !response.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(Download::from_response(response))
    }
}
