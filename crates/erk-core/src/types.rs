use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// StepStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Done,
    Skipped,
    Blocked,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::Done => "done",
            StepStatus::Skipped => "skipped",
            StepStatus::Blocked => "blocked",
        }
    }

    /// Read a literal status cell. Blank cells, the `-` sentinel, and words
    /// that are not a known status all count as unset.
    pub fn from_cell(cell: &str) -> Option<StepStatus> {
        match cell.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(StepStatus::Pending),
            "in_progress" | "in-progress" => Some(StepStatus::InProgress),
            "done" => Some(StepStatus::Done),
            "skipped" => Some(StepStatus::Skipped),
            "blocked" => Some(StepStatus::Blocked),
            _ => None,
        }
    }

    /// Done or skipped: nothing left to do for the step.
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Done | StepStatus::Skipped)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cell_accepts_canonical_names() {
        for status in [
            StepStatus::Pending,
            StepStatus::InProgress,
            StepStatus::Done,
            StepStatus::Skipped,
            StepStatus::Blocked,
        ] {
            assert_eq!(StepStatus::from_cell(status.as_str()), Some(status));
        }
    }

    #[test]
    fn from_cell_accepts_hyphenated_in_progress() {
        assert_eq!(
            StepStatus::from_cell("in-progress"),
            Some(StepStatus::InProgress)
        );
        assert_eq!(StepStatus::from_cell(" Done "), Some(StepStatus::Done));
    }

    #[test]
    fn from_cell_treats_sentinel_and_unknown_as_unset() {
        assert_eq!(StepStatus::from_cell(""), None);
        assert_eq!(StepStatus::from_cell("-"), None);
        assert_eq!(StepStatus::from_cell("wip"), None);
    }

    #[test]
    fn terminal_statuses() {
        assert!(StepStatus::Done.is_terminal());
        assert!(StepStatus::Skipped.is_terminal());
        assert!(!StepStatus::Blocked.is_terminal());
        assert!(!StepStatus::Pending.is_terminal());
    }
}
