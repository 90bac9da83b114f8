use crate::types::StepStatus;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

static PR_REF_RE: OnceLock<Regex> = OnceLock::new();
static PLAN_REF_RE: OnceLock<Regex> = OnceLock::new();

fn pr_ref_re() -> &'static Regex {
    PR_REF_RE.get_or_init(|| Regex::new(r"^#\d+$").unwrap())
}

fn plan_ref_re() -> &'static Regex {
    PLAN_REF_RE.get_or_init(|| Regex::new(r"^plan #\d+$").unwrap())
}

// ---------------------------------------------------------------------------
// ReferenceKind
// ---------------------------------------------------------------------------

/// What a reference cell points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// `#123`: a landed pull request.
    Pr,
    /// `plan #456`: a plan issue that is being worked.
    Plan,
    Empty,
    /// Anything else. Carries no status meaning.
    Other,
}

impl ReferenceKind {
    pub fn classify(pr_ref: &str) -> ReferenceKind {
        if pr_ref.is_empty() {
            ReferenceKind::Empty
        } else if pr_ref_re().is_match(pr_ref) {
            ReferenceKind::Pr
        } else if plan_ref_re().is_match(pr_ref) {
            ReferenceKind::Plan
        } else {
            ReferenceKind::Other
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Compute a step's status from its reference cell.
///
/// An explicit literal status always wins. Without one, `#N` means done,
/// `plan #N` means in progress, and anything else (including an empty cell
/// or an unrecognized format) means pending.
///
/// The parser calls this with the literal cell; the mutator calls it with
/// `None` so that writing a reference always re-derives the status.
pub fn resolve_status(pr_ref: &str, literal: Option<StepStatus>) -> StepStatus {
    if let Some(status) = literal {
        return status;
    }
    match ReferenceKind::classify(pr_ref) {
        ReferenceKind::Pr => StepStatus::Done,
        ReferenceKind::Plan => StepStatus::InProgress,
        ReferenceKind::Empty | ReferenceKind::Other => StepStatus::Pending,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_reference_formats() {
        assert_eq!(ReferenceKind::classify("#123"), ReferenceKind::Pr);
        assert_eq!(ReferenceKind::classify("plan #456"), ReferenceKind::Plan);
        assert_eq!(ReferenceKind::classify(""), ReferenceKind::Empty);
        assert_eq!(ReferenceKind::classify("#abc"), ReferenceKind::Other);
        assert_eq!(ReferenceKind::classify("PR #12"), ReferenceKind::Other);
        assert_eq!(ReferenceKind::classify("plan#4"), ReferenceKind::Other);
    }

    #[test]
    fn inference_without_literal() {
        assert_eq!(resolve_status("#99", None), StepStatus::Done);
        assert_eq!(resolve_status("plan #10", None), StepStatus::InProgress);
        assert_eq!(resolve_status("", None), StepStatus::Pending);
        assert_eq!(resolve_status("see notes", None), StepStatus::Pending);
    }

    #[test]
    fn explicit_literal_is_never_inferred_away() {
        assert_eq!(
            resolve_status("#99", Some(StepStatus::Blocked)),
            StepStatus::Blocked
        );
        assert_eq!(
            resolve_status("", Some(StepStatus::Skipped)),
            StepStatus::Skipped
        );
    }

    #[test]
    fn resolution_is_repeatable() {
        let inputs = ["", "#1", "plan #2", "junk"];
        let literals = [None, Some(StepStatus::Blocked), Some(StepStatus::Done)];
        for pr_ref in inputs {
            for literal in literals {
                assert_eq!(
                    resolve_status(pr_ref, literal),
                    resolve_status(pr_ref, literal)
                );
            }
        }
    }
}
