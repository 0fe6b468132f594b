//! Release-tag discovery and version comparison.
//!
//! Tags shaped like `v<major>.<minor>[.<patch>]` are parsed into ordered
//! tuples; everything else is dropped silently. Unlike the best-effort
//! lookups in the reporter, the tag fetch propagates every failure: a
//! version check that cannot reach the repository has no useful answer.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, ReporterConfig};
use crate::http::{ApiClient, ApiError};

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v(\d+)\.(\d+)(?:\.(\d+))?$").unwrap());
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?$").unwrap());

/// Failures of the version-check paths.
#[derive(Debug, Error)]
pub enum VersionError {
    /// Tag listing could not be fetched.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The tag listing was not the JSON array we expected.
    #[error("malformed tag list: {0}")]
    TagList(#[from] serde_json::Error),

    /// No tag in the repository matched the version pattern.
    #[error("no version tags found")]
    NoVersionTags,

    /// The supplied current-version string could not be parsed.
    #[error("invalid version string: {0:?}")]
    InvalidVersion(String),
}

/// A repository tag as returned by the tracker API.
#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// Parsed version tuple with ordering matching the tag history:
/// components compare left to right and a missing patch sorts before an
/// explicit `.0` (so `v2.0` and `v2.0.0` are distinct versions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionTag {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl VersionTag {
    /// Parses a tag name of the form `v<major>.<minor>[.<patch>]`.
    /// Returns `None` for anything else.
    pub fn from_tag_name(name: &str) -> Option<Self> {
        Self::from_captures(TAG_RE.captures(name)?)
    }

    /// Parses a current-version string, tolerating a leading `v`.
    /// Unlike tag filtering, a malformed input here is an error.
    pub fn from_version_str(s: &str) -> Result<Self, VersionError> {
        let bare = s.strip_prefix('v').unwrap_or(s);
        VERSION_RE
            .captures(bare)
            .and_then(Self::from_captures)
            .ok_or_else(|| VersionError::InvalidVersion(s.to_string()))
    }

    fn from_captures(caps: regex::Captures<'_>) -> Option<Self> {
        Some(Self {
            major: caps[1].parse().ok()?,
            minor: caps[2].parse().ok()?,
            patch: match caps.get(3) {
                Some(m) => Some(m.as_str().parse().ok()?),
                None => None,
            },
        })
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "v{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "v{}.{}", self.major, self.minor),
        }
    }
}

/// Checks the installed addon version against the repository's tags.
pub struct VersionChecker {
    config: ReporterConfig,
    api: ApiClient,
}

impl VersionChecker {
    /// Validates the configuration and builds the API client.
    pub fn new(config: ReporterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let api = ApiClient::new(&config)?;
        Ok(Self { config, api })
    }

    /// Fetches the repository's tag listing.
    pub fn fetch_tags(&self) -> Result<Vec<Tag>, VersionError> {
        let url = format!("{}/tags", self.config.api_base_url);
        let value = self.api.get_json(&url)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Version tuples for every tag matching the version pattern.
    /// Non-matching tag names are dropped silently.
    pub fn get_versions(&self) -> Result<Vec<VersionTag>, VersionError> {
        let tags = self.fetch_tags()?;
        debug!("found {} tags", tags.len());
        Ok(tags
            .iter()
            .filter_map(|tag| VersionTag::from_tag_name(&tag.name))
            .collect())
    }

    /// Highest version among the repository's tags.
    pub fn get_latest_version(&self) -> Result<VersionTag, VersionError> {
        self.get_versions()?
            .into_iter()
            .max()
            .ok_or(VersionError::NoVersionTags)
    }

    /// True iff `current` equals the latest tag exactly, component-wise.
    pub fn is_latest_version(&self, current: &str) -> Result<bool, VersionError> {
        let current = VersionTag::from_version_str(current)?;
        let latest = self.get_latest_version()?;
        info!("latest version: {latest}, current version: {current}");
        Ok(current == latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(major: u32, minor: u32, patch: Option<u32>) -> VersionTag {
        VersionTag {
            major,
            minor,
            patch,
        }
    }

    #[test]
    fn parses_three_component_tag() {
        assert_eq!(VersionTag::from_tag_name("v1.2.3"), Some(v(1, 2, Some(3))));
    }

    #[test]
    fn parses_two_component_tag() {
        assert_eq!(VersionTag::from_tag_name("v2.0"), Some(v(2, 0, None)));
    }

    #[test]
    fn rejects_non_version_tags() {
        assert_eq!(VersionTag::from_tag_name("release-1.2"), None);
        assert_eq!(VersionTag::from_tag_name("1.2.3"), None);
        assert_eq!(VersionTag::from_tag_name("v1"), None);
        assert_eq!(VersionTag::from_tag_name("v1.2.3-rc1"), None);
    }

    #[test]
    fn version_str_tolerates_leading_v() {
        assert_eq!(
            VersionTag::from_version_str("v1.2.0").unwrap(),
            v(1, 2, Some(0))
        );
        assert_eq!(
            VersionTag::from_version_str("1.2.0").unwrap(),
            v(1, 2, Some(0))
        );
    }

    #[test]
    fn malformed_version_str_is_an_error() {
        assert!(matches!(
            VersionTag::from_version_str("latest"),
            Err(VersionError::InvalidVersion(_))
        ));
    }

    #[test]
    fn ordering_is_component_wise() {
        assert!(v(1, 2, Some(0)) > v(1, 1, Some(5)));
        assert!(v(2, 0, None) < v(2, 0, Some(0)));
        assert!(v(10, 0, Some(0)) > v(9, 9, Some(9)));
    }

    #[test]
    fn missing_patch_is_not_equal_to_zero_patch() {
        assert_ne!(v(2, 0, None), v(2, 0, Some(0)));
    }

    #[test]
    fn display_round_trips() {
        assert_eq!(v(1, 2, Some(3)).to_string(), "v1.2.3");
        assert_eq!(v(2, 0, None).to_string(), "v2.0");
    }
}
