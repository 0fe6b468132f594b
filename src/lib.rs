//! Bugpost - end-user bug reporting for media-center addons.
//!
//! Captures a crash traceback plus the host application's runtime log and
//! files a bug report against a source-hosting issue tracker, attaching
//! the redacted log as a paste. A separate checker compares the installed
//! addon version against the repository's release tags.
//!
//! # Features
//!
//! - Markdown issue bodies assembled from environment facts
//! - Log upload as a paste, with credentials redacted first
//! - Duplicate suppression via a last-report sentinel file
//! - Release-tag version checking
//!
//! # Example
//!
//! ```rust,no_run
//! use bugpost::{HostRuntime, IssueReporter, ReportGuard, ReporterConfig, try_report};
//!
//! fn main() -> Result<(), bugpost::ConfigError> {
//!     let mut config = ReporterConfig::new("https://api.github.com/repos/owner/addon");
//!     config.addon_id = "plugin.video.example".into();
//!     config.addon_name = "Example".into();
//!     config.addon_version = "1.4.0".into();
//!
//!     let host = HostRuntime {
//!         log_path: "/home/user/.kodi/temp/kodi.log".into(),
//!         build_version: "21.0".into(),
//!         runtime_version: "1.75.0".into(),
//!         temp_dir: "/home/user/.kodi/temp".into(),
//!     };
//!
//!     let guard = ReportGuard::new(&host.temp_dir, &config.addon_id);
//!     let reporter = IssueReporter::new(config, host)?;
//!
//!     if let Some(url) = try_report(&reporter, &guard, "Traceback: boom") {
//!         println!("reported: {url}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod guard;
pub mod http;
pub mod redact;
pub mod reporter;
pub mod version;

pub use config::{basic_credential, ConfigError, HostRuntime, ReporterConfig};
pub use guard::ReportGuard;
pub use http::{ApiError, PostResult};
pub use redact::{redact, LogReadError};
pub use reporter::IssueReporter;
pub use version::{VersionChecker, VersionError, VersionTag};

use tracing::info;

/// Files a report for `trace` unless it duplicates the last one sent.
///
/// This is the integration point for the host application: it consults
/// the guard, submits through the reporter, and records the traceback
/// once the tracker returns an issue URL. Returns that URL, or `None`
/// when the report was suppressed or the submission failed.
pub fn try_report(reporter: &IssueReporter, guard: &ReportGuard, trace: &str) -> Option<String> {
    if !guard.can_send(trace) {
        info!("suppressing report, identical to the last one sent");
        return None;
    }
    match reporter.report_issue(trace) {
        PostResult::Created(url) => {
            guard.record_sent(trace);
            Some(url)
        }
        _ => None,
    }
}
