//! Duplicate-report suppression.
//!
//! A single sentinel file per addon installation stores the last traceback
//! that was actually submitted. An incoming traceback may be sent only if
//! it differs byte-for-byte from that record. When the check itself fails
//! the guard suppresses sending: an unreliable check must not let
//! duplicate spam through.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

const SENTINEL_FILE: &str = "last_reported_error.txt";

/// Gatekeeper consulted before and after issue submission.
#[derive(Debug)]
pub struct ReportGuard {
    sentinel: PathBuf,
}

impl ReportGuard {
    /// Places the sentinel at `<temp_dir>/<addon_id>/last_reported_error.txt`.
    /// Nothing is created until [`record_sent`](Self::record_sent) runs.
    pub fn new(temp_dir: &Path, addon_id: &str) -> Self {
        Self {
            sentinel: temp_dir.join(addon_id).join(SENTINEL_FILE),
        }
    }

    /// Location of the sentinel file.
    pub fn sentinel_path(&self) -> &Path {
        &self.sentinel
    }

    /// Returns true when `trace` differs from the last submitted report,
    /// or when no report was ever submitted. Returns false when they are
    /// identical, and on any read failure.
    pub fn can_send(&self, trace: &str) -> bool {
        if !self.sentinel.is_file() {
            info!("no previous error report found");
            return true;
        }
        debug!("reading previous error report from {:?}", self.sentinel);
        match fs::read_to_string(&self.sentinel) {
            Ok(last) if last != trace => {
                debug!("allowing error report, last report does not match this one");
                true
            }
            Ok(_) => {
                debug!("suppressing error report, last report matches this one");
                false
            }
            Err(e) => {
                error!("error checking last error report: {e}");
                false
            }
        }
    }

    /// Overwrites the sentinel with `trace`, creating the addon directory
    /// if needed. Best effort: failures are logged, never raised.
    pub fn record_sent(&self, trace: &str) {
        debug!("saving error report to {:?}", self.sentinel);
        let result = match self.sentinel.parent() {
            Some(dir) => {
                fs::create_dir_all(dir).and_then(|_| fs::write(&self.sentinel, trace))
            }
            None => fs::write(&self.sentinel, trace),
        };
        if let Err(e) = result {
            error!("error writing last error report: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> (tempfile::TempDir, ReportGuard) {
        let dir = tempfile::tempdir().unwrap();
        let guard = ReportGuard::new(dir.path(), "plugin.video.example");
        (dir, guard)
    }

    #[test]
    fn fresh_environment_allows_sending() {
        let (_dir, guard) = guard();

        assert!(guard.can_send("Traceback: boom"));
    }

    #[test]
    fn identical_trace_is_suppressed_after_record() {
        let (_dir, guard) = guard();

        guard.record_sent("Traceback: boom");

        assert!(!guard.can_send("Traceback: boom"));
    }

    #[test]
    fn different_trace_is_allowed_after_record() {
        let (_dir, guard) = guard();

        guard.record_sent("Traceback: boom");

        assert!(guard.can_send("Traceback: other boom"));
    }

    #[test]
    fn record_sent_overwrites_previous_report() {
        let (_dir, guard) = guard();

        guard.record_sent("first");
        guard.record_sent("second");

        assert!(guard.can_send("first"));
        assert!(!guard.can_send("second"));
    }

    #[test]
    fn sentinel_lives_under_addon_directory() {
        let (dir, guard) = guard();

        let expected = dir
            .path()
            .join("plugin.video.example")
            .join("last_reported_error.txt");
        assert_eq!(guard.sentinel_path(), expected.as_path());
    }

    #[test]
    fn record_sent_creates_addon_directory() {
        let (_dir, guard) = guard();

        guard.record_sent("boom");

        assert!(guard.sentinel_path().is_file());
    }

    #[test]
    fn unreadable_previous_report_suppresses_sending() {
        // A sentinel holding invalid UTF-8 makes the read fail; the guard
        // must suppress rather than risk a duplicate report.
        let (_dir, guard) = guard();
        std::fs::create_dir_all(guard.sentinel_path().parent().unwrap()).unwrap();
        std::fs::write(guard.sentinel_path(), b"\xff\xfe").unwrap();

        assert!(!guard.can_send("Traceback: boom"));
    }

    #[test]
    fn record_sent_failure_does_not_panic() {
        // Parent of the sentinel is an existing *file*, so the directory
        // cannot be created and the write must fail quietly.
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("occupied"), "x").unwrap();
        let guard = ReportGuard::new(dir.path(), "occupied");

        guard.record_sent("boom");

        assert!(guard.can_send("boom"));
    }
}
