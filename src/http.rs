//! Network boundary: the release redirect lookup and the asset download.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, LOCATION, USER_AGENT};
use std::io::Read;
use std::time::Duration;
use tracing::debug;

use crate::errors::{Result, TailwindCliError};

/// Release host used when no other base URL is configured
pub const GITHUB_URL: &str = "https://github.com";

const LATEST_TIMEOUT_SECS: u64 = 2;
const DOWNLOAD_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT_STRING: &str = concat!("tailwind-cli-manager/", env!("CARGO_PKG_VERSION"));

/// Streamed release asset
pub struct Download {
    /// Declared size, if the server sent one
    pub content_length: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

/// Source of Tailwind CSS CLI releases.
pub trait ReleaseClient {
    /// Base URL of the release host, e.g. `https://github.com`
    fn base_url(&self) -> &str;

    /// `Location` of the latest-release redirect for `repo`, or `None` when
    /// the server answered without redirecting.
    fn latest_release_location(&self, repo: &str) -> Result<Option<String>>;

    /// Start downloading `url`. Non-2xx responses are errors.
    fn download(&self, url: &str) -> Result<Download>;
}

/// Download URL of a release asset:
/// `<base>/<repo>/releases/download/<tag>/<asset>-<platform token>`
pub fn release_asset_url(base_url: &str, repo: &str, tag: &str, asset_file: &str) -> String {
    format!(
        "{}/{}/releases/download/{}/{}",
        base_url.trim_end_matches('/'),
        repo,
        tag,
        asset_file
    )
}

/// Latest-release redirect endpoint: `<base>/<repo>/releases/latest`
pub fn latest_release_url(base_url: &str, repo: &str) -> String {
    format!("{}/{}/releases/latest", base_url.trim_end_matches('/'), repo)
}

/// [`ReleaseClient`] for GitHub Releases over blocking HTTP
pub struct GithubReleases {
    base_url: String,
    /// Short timeout and no redirects, used for the `latest` lookup
    index_client: Client,
    download_client: Client,
}

impl GithubReleases {
    pub fn new() -> Result<Self> {
        Self::with_base_url(GITHUB_URL)
    }

    /// Point the client at another release host
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let index_client = Client::builder()
            .timeout(Duration::from_secs(LATEST_TIMEOUT_SECS))
            .default_headers(default_headers())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| build_error(&e))?;

        let download_client = Client::builder()
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .default_headers(default_headers())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| build_error(&e))?;

        Ok(Self {
            base_url: base_url.into(),
            index_client,
            download_client,
        })
    }
}

impl ReleaseClient for GithubReleases {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn latest_release_location(&self, repo: &str) -> Result<Option<String>> {
        let url = latest_release_url(&self.base_url, repo);
        debug!(%url, "Looking up latest release");

        let response = self.index_client.get(&url).send().map_err(|e| http_error(&url, &e))?;
        let status = response.status();
        debug!(%url, %status, "Release index answered");

        if !status.is_redirection() {
            return Ok(None);
        }

        Ok(response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string))
    }

    fn download(&self, url: &str) -> Result<Download> {
        debug!(%url, "Downloading release asset");

        let response = self.download_client.get(url).send().map_err(|e| http_error(url, &e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TailwindCliError::Http {
                url: url.to_string(),
                message: format!("unexpected HTTP status {}", status),
            });
        }

        Ok(Download {
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers
}

fn http_error(url: &str, e: &reqwest::Error) -> TailwindCliError {
    let message = if e.is_timeout() {
        format!("request timed out ({})", e)
    } else {
        e.to_string()
    };
    TailwindCliError::Http {
        url: url.to_string(),
        message,
    }
}

fn build_error(e: &reqwest::Error) -> TailwindCliError {
    TailwindCliError::Http {
        url: String::new(),
        message: format!("failed to build HTTP client: {}", e),
    }
}
