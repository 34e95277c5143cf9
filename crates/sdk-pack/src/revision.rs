//! Revision stamped into the SDK

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Revision supplied by the build bot
pub const REVISION_VAR: &str = "BUILDBOT_REVISION";

lazy_static! {
    static ref LAST_CHANGED_REV: Regex = Regex::new(r"(?m)^Last Changed Rev: (\d+)").unwrap();
}

/// `Last Changed Rev` from `svn info` output
pub fn parse_svn_info(output: &str) -> Option<String> {
    LAST_CHANGED_REV.captures(output).map(|caps| caps[1].to_string())
}

/// Revision of the checkout at `home`
///
/// An explicit revision wins, then `BUILDBOT_REVISION`, then `svn info`.
/// `None` when none of them knows.
pub fn detect_revision(home: &Path, explicit: Option<String>) -> Option<String> {
    if let Some(revision) = explicit.filter(|r| !r.is_empty()) {
        return Some(revision);
    }
    if let Some(revision) = std::env::var(REVISION_VAR).ok().filter(|r| !r.is_empty()) {
        return Some(revision);
    }
    let output = Command::new("svn").arg("info").current_dir(home).output();
    match output {
        Ok(output) if output.status.success() => parse_svn_info(&String::from_utf8_lossy(&output.stdout)),
        Ok(output) => {
            debug!(status = %output.status, "svn info failed");
            None
        }
        Err(e) => {
            debug!(error = %e, "svn not available");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_svn_info() {
        let info = "Path: .\nURL: http://dart.googlecode.com/svn/branches/bleeding_edge/dart\n\
                    Revision: 14000\nLast Changed Author: dev@example.com\nLast Changed Rev: 13987\n";
        assert_eq!(parse_svn_info(info).as_deref(), Some("13987"));
        assert_eq!(parse_svn_info("svn: E155007: '.' is not a working copy"), None);
    }

    #[test]
    fn test_explicit_revision_wins() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(detect_revision(dir.path(), Some("77".into())).as_deref(), Some("77"));
    }
}
