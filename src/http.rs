//! Authenticated HTTP plumbing shared by the uploader, submitter and
//! version checker.
//!
//! Every request is a single blocking round trip with no internal retry.
//! POST outcomes are classified rather than raised: the caller receives a
//! [`PostResult`] and decides what a failure means for the user. GET (tag
//! listing) is the one path that propagates failures as [`ApiError`].

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use crate::config::{ConfigError, ReporterConfig};

/// Outcome of a classified API POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostResult {
    /// The resource was created and the response carried its public URL.
    Created(String),
    /// The server accepted the request but the response body had no
    /// usable `html_url` field.
    Unparsed,
    /// The server answered with a non-success status.
    HttpError(u16),
    /// No response was obtained at all.
    Transport(String),
}

impl PostResult {
    /// Public URL of the created resource, when one was parsed.
    pub fn url(&self) -> Option<&str> {
        match self {
            PostResult::Created(url) => Some(url),
            _ => None,
        }
    }

    /// True for the two hard-failure outcomes the caller should surface
    /// to the end user.
    pub fn is_failure(&self) -> bool {
        matches!(self, PostResult::HttpError(_) | PostResult::Transport(_))
    }
}

/// Errors propagated by the non-degrading GET path.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure: no response reached us.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("request failed with HTTP {0}")]
    Status(u16),

    /// The response body was not the JSON we expected.
    #[error("malformed API response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Blocking client carrying the tracker's auth and identification headers.
pub struct ApiClient {
    http: Client,
    credential: String,
}

impl ApiClient {
    /// Builds a client from the configuration. The User-Agent is fixed at
    /// construction; the Basic credential is attached per request.
    pub fn new(config: &ReporterConfig) -> Result<Self, ConfigError> {
        let http = Client::builder().user_agent(config.user_agent()).build()?;
        Ok(Self {
            http,
            credential: config.credential.clone(),
        })
    }

    /// POSTs a JSON body and classifies the outcome. Failures are logged
    /// here, once, with `what` naming the operation.
    pub fn post_json(&self, what: &str, url: &str, body: &Value) -> PostResult {
        let response = match self
            .http
            .post(url)
            .header(AUTHORIZATION, format!("Basic {}", self.credential))
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
        {
            Ok(response) => response,
            Err(e) => {
                error!("failed to {what}: transport error: {e}");
                return PostResult::Transport(e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!("failed to {what}: HTTP {}", status.as_u16());
            return PostResult::HttpError(status.as_u16());
        }

        let raw = match response.text() {
            Ok(raw) => raw,
            Err(e) => {
                error!("failed to read {what} response: {e}");
                return PostResult::Unparsed;
            }
        };
        match serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|v| v.get("html_url").and_then(Value::as_str).map(String::from))
        {
            Some(url) => PostResult::Created(url),
            None => {
                error!("failed to parse {what} response: {raw}");
                PostResult::Unparsed
            }
        }
    }

    /// GETs a JSON document, propagating transport, status and parse
    /// failures to the caller.
    pub fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Basic {}", self.credential))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let raw = response.text()?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_exposes_url() {
        let result = PostResult::Created("https://example.com/issues/1".into());

        assert_eq!(result.url(), Some("https://example.com/issues/1"));
        assert!(!result.is_failure());
    }

    #[test]
    fn http_and_transport_errors_are_failures() {
        assert!(PostResult::HttpError(404).is_failure());
        assert!(PostResult::Transport("connection refused".into()).is_failure());
        assert!(!PostResult::Unparsed.is_failure());
    }

    #[test]
    fn unparsed_has_no_url() {
        assert_eq!(PostResult::Unparsed.url(), None);
        assert_eq!(PostResult::HttpError(500).url(), None);
    }
}
