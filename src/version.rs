//! Version resolution for the Tailwind CSS CLI.
//!
//! A pinned version is returned as-is without touching the network. `latest`
//! is looked up once through the release redirect of the source repository;
//! every failure on that path degrades to [`FALLBACK_VERSION`] with a warning.

use regex::Regex;
use semver::Version;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::{Result, TailwindCliError};
use crate::http::ReleaseClient;

/// Sentinel selecting the newest published release
pub const LATEST: &str = "latest";

/// Known-good release used when `latest` cannot be resolved
pub const FALLBACK_VERSION: &str = "4.0.6";

/// [`FALLBACK_VERSION`] as a parsed version
pub fn fallback_version() -> Version {
    Version::new(4, 0, 6)
}

/// Requested version, as configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Latest,
    Pinned(Version),
}

impl FromStr for VersionSpec {
    type Err = TailwindCliError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(LATEST) {
            return Ok(Self::Latest);
        }
        let literal = s.strip_prefix('v').unwrap_or(s);
        Version::parse(literal).map(Self::Pinned).map_err(|e| {
            TailwindCliError::config(format!(
                "Invalid Tailwind CSS version '{}': expected 'latest' or a semantic version ({})",
                s, e
            ))
        })
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str(LATEST),
            Self::Pinned(version) => write!(f, "{}", version),
        }
    }
}

/// How a [`ResolvedVersion`] was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOrigin {
    Pinned,
    Resolved,
    Fallback,
    /// `latest` was not looked up because a pre-installed binary is used
    Assumed,
}

/// Concrete version used for one command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: Version,
    pub origin: VersionOrigin,
    /// Set when `latest` could not be resolved
    pub warning: Option<String>,
}

impl ResolvedVersion {
    pub fn pinned(version: Version) -> Self {
        Self {
            version,
            origin: VersionOrigin::Pinned,
            warning: None,
        }
    }

    fn resolved(version: Version) -> Self {
        Self {
            version,
            origin: VersionOrigin::Resolved,
            warning: None,
        }
    }

    fn fallback(reason: String) -> Self {
        Self {
            version: fallback_version(),
            origin: VersionOrigin::Fallback,
            warning: Some(format!(
                "Could not resolve the latest Tailwind CSS version ({}); using {}",
                reason, FALLBACK_VERSION
            )),
        }
    }

    /// Stand-in for `latest` when the binary is pre-installed. Only the
    /// major version matters then, for the stylesheet layout.
    pub fn assumed() -> Self {
        Self {
            version: fallback_version(),
            origin: VersionOrigin::Assumed,
            warning: None,
        }
    }

    /// Version resolution fell back to the hardcoded release
    pub fn is_degraded(&self) -> bool {
        self.origin == VersionOrigin::Fallback
    }

    /// Release tag, e.g. `v4.1.3`
    pub fn tag(&self) -> String {
        format!("v{}", self.version)
    }

    pub fn major(&self) -> u64 {
        self.version.major
    }
}

impl fmt::Display for ResolvedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}

/// Determine the version to use for this invocation.
///
/// Never fails: a pinned version is returned without any network call, and
/// `latest` falls back to [`FALLBACK_VERSION`] on any lookup problem.
pub fn resolve(config: &Config, client: &dyn ReleaseClient) -> ResolvedVersion {
    match &config.version {
        VersionSpec::Pinned(version) => {
            debug!(%version, "Using pinned Tailwind CSS version");
            ResolvedVersion::pinned(version.clone())
        }
        VersionSpec::Latest => resolve_latest(&config.src_repo, client),
    }
}

fn resolve_latest(repo: &str, client: &dyn ReleaseClient) -> ResolvedVersion {
    let resolved = match client.latest_release_location(repo) {
        Ok(Some(location)) => match parse_release_location(&location) {
            Some(version) => ResolvedVersion::resolved(version),
            None => ResolvedVersion::fallback(format!("unexpected redirect target '{}'", location)),
        },
        Ok(None) => ResolvedVersion::fallback("release index did not redirect".to_string()),
        Err(e) => ResolvedVersion::fallback(e.to_string()),
    };

    match &resolved.warning {
        Some(warning) => warn!(repo, "{}", warning),
        None => debug!(repo, version = %resolved.version, "Resolved latest Tailwind CSS version"),
    }

    resolved
}

/// Extract the version from a release redirect target such as
/// `https://github.com/tailwindlabs/tailwindcss/releases/tag/v4.0.10`.
pub fn parse_release_location(location: &str) -> Option<Version> {
    let tag = location.trim().trim_end_matches('/').rsplit('/').next()?;
    let pattern = Regex::new(r"^v?(\d+\.\d+\.\d+(?:[-+][0-9A-Za-z.+-]+)?)$").ok()?;
    let literal = pattern.captures(tag)?.get(1)?.as_str();
    Version::parse(literal).ok()
}
