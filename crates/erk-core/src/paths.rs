use crate::error::{ErkError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const ERK_DIR: &str = ".erk";
pub const CONFIG_FILE: &str = ".erk/config.yaml";
pub const DEFAULT_ISSUES_DIR: &str = ".erk/issues";

pub const ISSUE_BODY_EXT: &str = "md";
pub const COMMENTS_SUFFIX: &str = ".comments.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn erk_dir(root: &Path) -> PathBuf {
    root.join(ERK_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn issue_body_path(issues_dir: &Path, issue: u64) -> PathBuf {
    issues_dir.join(format!("{issue}.{ISSUE_BODY_EXT}"))
}

pub fn issue_comments_path(issues_dir: &Path, issue: u64) -> PathBuf {
    issues_dir.join(format!("{issue}{COMMENTS_SUFFIX}"))
}

// ---------------------------------------------------------------------------
// Issue references
// ---------------------------------------------------------------------------

static ISSUE_REF_RE: OnceLock<Regex> = OnceLock::new();

fn issue_ref_re() -> &'static Regex {
    ISSUE_REF_RE.get_or_init(|| {
        Regex::new(r"^(?:#?(\d+)|https?://[^\s]+/issues/(\d+)/?)$").unwrap()
    })
}

/// Accepts `123`, `#123`, or an issue URL ending in `/issues/123`.
pub fn parse_issue_ref(s: &str) -> Result<u64> {
    let trimmed = s.trim();
    let caps = issue_ref_re()
        .captures(trimmed)
        .ok_or_else(|| ErkError::InvalidIssueRef(s.to_string()))?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .ok_or_else(|| ErkError::InvalidIssueRef(s.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_issue_refs() {
        assert_eq!(parse_issue_ref("42").unwrap(), 42);
        assert_eq!(parse_issue_ref("#42").unwrap(), 42);
        assert_eq!(parse_issue_ref(" 7 ").unwrap(), 7);
        assert_eq!(
            parse_issue_ref("https://github.com/acme/widgets/issues/1234").unwrap(),
            1234
        );
    }

    #[test]
    fn invalid_issue_refs() {
        for s in ["", "#", "abc", "plan #4", "https://github.com/acme/widgets/pull/3"] {
            assert!(parse_issue_ref(s).is_err(), "expected invalid: {s}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.erk/config.yaml")
        );
        let issues = root.join(DEFAULT_ISSUES_DIR);
        assert_eq!(
            issue_body_path(&issues, 9),
            PathBuf::from("/tmp/proj/.erk/issues/9.md")
        );
        assert_eq!(
            issue_comments_path(&issues, 9),
            PathBuf::from("/tmp/proj/.erk/issues/9.comments.yaml")
        );
    }
}
