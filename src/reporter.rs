//! Issue formatting and submission.
//!
//! `IssueReporter` turns a traceback into a Markdown bug report: a block
//! of environment facts, the traceback itself, and, when the log upload
//! yields a URL, a final link to the full redacted log. The two POSTs
//! (paste, issue) are essential and inherit the transport's default
//! timeout; the IP and ISP lookups are enrichment only, run under a 5 s
//! timeout and degrade to labeled placeholders instead of failing.

use std::env;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use reqwest::blocking::Client;
use serde_json::json;
use tracing::{debug, error, warn};

use crate::config::{ConfigError, HostRuntime, ReporterConfig};
use crate::http::{ApiClient, PostResult};
use crate::redact;

/// Title used for every filed report.
pub const ISSUE_TITLE: &str = "End-user bug report";

const LOOKUP_FAILURE: &str = "Unknown (lookup failure)";
const PARSE_FAILURE: &str = "Unknown (parse failure)";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

static IP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+\.\d+").unwrap());
static ISP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<h1>(.*)</h1>").unwrap());

/// Files end-user bug reports against the configured tracker.
pub struct IssueReporter {
    config: ReporterConfig,
    host: HostRuntime,
    api: ApiClient,
    /// Unauthenticated client for the best-effort IP/ISP lookups.
    lookup: Client,
}

impl IssueReporter {
    /// Validates the configuration and builds the HTTP clients.
    pub fn new(config: ReporterConfig, host: HostRuntime) -> Result<Self, ConfigError> {
        config.validate()?;
        let api = ApiClient::new(&config)?;
        let lookup = Client::builder()
            .user_agent(config.user_agent())
            .timeout(LOOKUP_TIMEOUT)
            .build()?;
        Ok(Self {
            config,
            host,
            api,
            lookup,
        })
    }

    /// File name of the host log, used as the paste file key and in the
    /// trailing link label.
    fn log_name(&self) -> String {
        self.host
            .log_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "application.log".into())
    }

    /// Current UTC time as `YYYY-MM-DD HH:MM:SS (UTC)`.
    fn system_time() -> String {
        Utc::now().format("%Y-%m-%d %H:%M:%S (UTC)").to_string()
    }

    fn os_description() -> String {
        format!(
            "[{}] {} {}",
            env::consts::OS,
            env::consts::ARCH,
            env::consts::FAMILY
        )
    }

    /// Executable search path, one entry per line.
    fn search_paths() -> String {
        env::var_os("PATH")
            .map(|path| {
                env::split_paths(&path)
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default()
    }

    /// Public IP of the reporter, or a labeled placeholder. Never fails.
    fn public_ip(&self) -> String {
        let body = match self
            .lookup
            .get(&self.config.ip_lookup_url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
        {
            Ok(body) => body,
            Err(e) => {
                warn!("public IP lookup failed: {e}");
                return LOOKUP_FAILURE.into();
            }
        };
        match IP_RE.find(&body) {
            Some(ip) => ip.as_str().to_string(),
            None => {
                warn!("no IP address in lookup response");
                PARSE_FAILURE.into()
            }
        }
    }

    /// ISP of the reporter, or a labeled placeholder. Never fails.
    fn isp(&self) -> String {
        let body = match self
            .lookup
            .get(&self.config.isp_lookup_url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
        {
            Ok(body) => body,
            Err(e) => {
                warn!("ISP lookup failed: {e}");
                return LOOKUP_FAILURE.into();
            }
        };
        match ISP_RE.captures(&body) {
            Some(caps) => caps[1].to_string(),
            None => {
                warn!("no ISP name in lookup response");
                PARSE_FAILURE.into()
            }
        }
    }

    /// Uploads the redacted host log as a paste.
    ///
    /// Returns `None` when the log cannot be read (nothing to upload),
    /// otherwise the classified outcome of the POST.
    pub fn upload_log(&self) -> Option<PostResult> {
        let content = match redact::read_log(&self.host.log_path) {
            Ok(content) => content,
            Err(e) => {
                error!("failed to read log: {e}");
                return None;
            }
        };

        debug!("uploading {}", self.log_name());
        let mut files = serde_json::Map::new();
        files.insert(self.log_name(), json!({ "content": content }));
        let body = json!({ "files": files });
        Some(self.api.post_json("save log", &self.config.paste_url, &body))
    }

    /// Builds the Markdown issue body for `trace`.
    ///
    /// As a side effect this uploads the host log; when the upload yields
    /// a URL, a link to it becomes the final line of the body.
    pub fn format_issue(&self, trace: &str) -> String {
        let mut content = vec![
            "*Automatic bug report from end-user.*\n## Environment\n".to_string(),
            format!("**Plugin Name:** {}", self.config.addon_name),
            format!("**Plugin ID:** {}", self.config.addon_id),
            format!("**Plugin Version:** {}", self.config.addon_version),
            format!("**Application Version:** {}", self.host.build_version),
            format!("**Reporter Version:** {}", env!("CARGO_PKG_VERSION")),
            format!("**Runtime Version:** {}", self.host.runtime_version),
            format!("**Operating System:** {}", Self::os_description()),
            format!("**System Time:** {}", Self::system_time()),
            format!("**IP Address:** {}", self.public_ip()),
            format!("**ISP:** {}", self.isp()),
            format!("**Search Path:**\n```\n{}\n```", Self::search_paths()),
            format!("\n## Traceback\n```\n{}\n```", trace),
        ];

        if let Some(upload) = self.upload_log() {
            if let Some(url) = upload.url() {
                content.push(format!("\n[Full {}]({})", self.log_name(), url));
            }
        }

        content.join("\n")
    }

    /// Formats and files an issue for `trace`.
    ///
    /// Callers decide beforehand, via [`ReportGuard::can_send`], whether a
    /// report should go out at all, and record a [`PostResult::Created`]
    /// outcome with [`ReportGuard::record_sent`] afterwards.
    ///
    /// [`ReportGuard::can_send`]: crate::guard::ReportGuard::can_send
    /// [`ReportGuard::record_sent`]: crate::guard::ReportGuard::record_sent
    pub fn report_issue(&self, trace: &str) -> PostResult {
        let body = self.format_issue(trace);
        debug!("issue body: {body}");

        let payload = json!({ "title": ISSUE_TITLE, "body": body });
        let url = format!("{}/issues", self.config.api_base_url);
        self.api.post_json("report issue", &url, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn host(log_path: PathBuf) -> HostRuntime {
        HostRuntime {
            log_path,
            build_version: "21.0 Git:2024".into(),
            runtime_version: "1.75.0".into(),
            temp_dir: std::env::temp_dir(),
        }
    }

    fn reporter(log_path: PathBuf) -> IssueReporter {
        let mut config = ReporterConfig::new("https://api.example.com/repos/o/p");
        config.addon_id = "plugin.video.example".into();
        config.addon_name = "Example".into();
        config.addon_version = "1.0.0".into();
        IssueReporter::new(config, host(log_path)).unwrap()
    }

    #[test]
    fn construction_rejects_missing_api_url() {
        let config = ReporterConfig::default();

        let result = IssueReporter::new(config, host(PathBuf::from("/tmp/app.log")));

        assert!(matches!(result, Err(ConfigError::MissingApiBaseUrl)));
    }

    #[test]
    fn log_name_comes_from_log_path() {
        let reporter = reporter(PathBuf::from("/var/log/kodi/kodi.log"));

        assert_eq!(reporter.log_name(), "kodi.log");
    }

    #[test]
    fn log_name_falls_back_for_pathless_input() {
        let reporter = reporter(PathBuf::from("/"));

        assert_eq!(reporter.log_name(), "application.log");
    }

    #[test]
    fn system_time_has_expected_shape() {
        let stamp = IssueReporter::system_time();

        let re = Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} \(UTC\)$").unwrap();
        assert!(re.is_match(&stamp), "unexpected stamp: {stamp}");
    }

    #[test]
    fn upload_log_is_none_when_log_unreadable() {
        let reporter = reporter(PathBuf::from("/nonexistent/app.log"));

        assert!(reporter.upload_log().is_none());
    }
}
