//! Reporter configuration and host-application collaborator inputs.
//!
//! The configuration follows an explicit-defaults model: the shared paste
//! endpoint and bot credential ship as overridable defaults rather than
//! module-level globals. Only the tracker API base URL is mandatory.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

/// Default paste endpoint for log uploads (GitHub gists).
pub const DEFAULT_PASTE_URL: &str = "https://api.github.com/gists";

/// Default shared-bot Basic credential used when no project-specific
/// credential is configured.
pub const DEFAULT_CREDENTIAL: &str =
    "eGJtY2JvdDo1OTQxNTJjMTBhZGFiNGRlN2M0YWZkZDYwZGQ5NDFkNWY4YmIzOGFj";

/// Default endpoint used to discover the reporter's public IP address.
pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ipecho.net/plain";

/// Default endpoint used to discover the reporter's ISP.
pub const DEFAULT_ISP_LOOKUP_URL: &str = "http://www.whoismyisp.org";

/// Errors raised while constructing reporter components.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The tracker API base URL was left empty.
    #[error("tracker API base URL must be set in the reporter configuration")]
    MissingApiBaseUrl,

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration for the issue reporter and version checker.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Base URL of the tracker API for the target repository,
    /// e.g. `https://api.github.com/repos/owner/project`. Required.
    pub api_base_url: String,
    /// Endpoint for creating log pastes.
    pub paste_url: String,
    /// Base64-encoded `user:token` pair sent as a Basic auth header.
    pub credential: String,
    /// Addon identifier, e.g. `plugin.video.example`.
    pub addon_id: String,
    /// Human-readable addon name.
    pub addon_name: String,
    /// Installed addon version string.
    pub addon_version: String,
    /// Public-IP discovery endpoint (overridable for testing).
    pub ip_lookup_url: String,
    /// ISP discovery endpoint (overridable for testing).
    pub isp_lookup_url: String,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            paste_url: DEFAULT_PASTE_URL.into(),
            credential: DEFAULT_CREDENTIAL.into(),
            addon_id: String::new(),
            addon_name: String::new(),
            addon_version: "0.0.0".into(),
            ip_lookup_url: DEFAULT_IP_LOOKUP_URL.into(),
            isp_lookup_url: DEFAULT_ISP_LOOKUP_URL.into(),
        }
    }
}

impl ReporterConfig {
    /// Creates a configuration for the given tracker API base URL,
    /// leaving every other field at its default.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    /// Checks the mandatory fields. Called by every component constructor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::MissingApiBaseUrl);
        }
        Ok(())
    }

    /// User-Agent string sent with every API request:
    /// `<addon_id>/<addon_version> <module>/<module_version>`.
    pub fn user_agent(&self) -> String {
        format!(
            "{}/{} {}/{}",
            self.addon_id,
            self.addon_version,
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
        )
    }
}

/// Builds a Basic-auth credential from a plain `user` / `token` pair.
pub fn basic_credential(user: &str, token: &str) -> String {
    STANDARD.encode(format!("{user}:{token}"))
}

/// Paths and version strings supplied by the surrounding application
/// runtime. The reporter only consumes these; it never derives them.
#[derive(Debug, Clone)]
pub struct HostRuntime {
    /// Path to the application's runtime log file.
    pub log_path: PathBuf,
    /// Host application build-version string.
    pub build_version: String,
    /// Version string of the language runtime the addon executes under.
    pub runtime_version: String,
    /// Application temp directory; the sentinel file lives beneath it.
    pub temp_dir: PathBuf,
}
