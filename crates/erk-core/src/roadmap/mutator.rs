use super::parser::parse_roadmap;
use super::status::resolve_status;
use super::table::{self, ScannedRow};
use super::RoadmapError;
use crate::types::StepStatus;
use serde::Serialize;
use std::ops::Range;

const COL_STEP: usize = 0;
const COL_STATUS: usize = 2;
const COL_PR: usize = 3;

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// Point `step_id` at a new reference (`#N`, `plan #N`, or empty to clear).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepUpdate {
    pub step_id: String,
    pub new_pr_ref: String,
}

impl StepUpdate {
    pub fn new(step_id: impl Into<String>, new_pr_ref: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            new_pr_ref: new_pr_ref.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedUpdate {
    pub step_id: String,
    pub previous_pr_ref: String,
    pub new_pr_ref: String,
    pub new_status: StepStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateError {
    StepNotFound,
}

impl UpdateError {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateError::StepNotFound => "step_not_found",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUpdate {
    pub step_id: String,
    pub error: UpdateError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationResult {
    Success {
        new_text: String,
        applied: Vec<AppliedUpdate>,
    },
    /// The batch was rejected. `new_text` is `None` whenever nothing was
    /// written, which for an all-or-nothing batch is always the case.
    PartialFailure {
        new_text: Option<String>,
        applied: Vec<AppliedUpdate>,
        failed: Vec<FailedUpdate>,
    },
}

// ---------------------------------------------------------------------------
// update_steps
// ---------------------------------------------------------------------------

/// Rewrite the status and pr cells of each target row in `doc`.
///
/// Every step id is checked against the parsed roadmap before any text is
/// touched; one unknown id rejects the whole batch. Updates apply in order,
/// so a repeated step id ends with its last reference. The status written is
/// always inferred from the new reference, replacing any explicit status.
/// Bytes outside the two rewritten cells are left as they were.
pub fn update_steps(doc: &str, updates: &[StepUpdate]) -> Result<MutationResult, RoadmapError> {
    if updates.is_empty() {
        return Ok(MutationResult::Success {
            new_text: doc.to_string(),
            applied: Vec::new(),
        });
    }

    let roadmap = parse_roadmap(doc)?;

    let failed: Vec<FailedUpdate> = updates
        .iter()
        .filter(|u| roadmap.find_step(&u.step_id).is_none())
        .map(|u| FailedUpdate {
            step_id: u.step_id.clone(),
            error: UpdateError::StepNotFound,
        })
        .collect();
    if !failed.is_empty() {
        tracing::warn!(
            missing = ?failed.iter().map(|f| f.step_id.as_str()).collect::<Vec<_>>(),
            "roadmap batch rejected"
        );
        return Ok(MutationResult::PartialFailure {
            new_text: None,
            applied: Vec::new(),
            failed,
        });
    }

    let mut text = doc.to_string();
    let mut applied = Vec::with_capacity(updates.len());
    for update in updates {
        let (next, record) = apply_one(&text, update)?;
        tracing::debug!(
            step_id = %record.step_id,
            from = %record.previous_pr_ref,
            to = %record.new_pr_ref,
            status = %record.new_status,
            "updated roadmap step"
        );
        text = next;
        applied.push(record);
    }

    Ok(MutationResult::Success {
        new_text: text,
        applied,
    })
}

fn apply_one(doc: &str, update: &StepUpdate) -> Result<(String, AppliedUpdate), RoadmapError> {
    let replacement_failed = || RoadmapError::ReplacementFailed {
        step_id: update.step_id.clone(),
    };

    let phases = table::scan(doc);
    let row = phases
        .iter()
        .flat_map(|p| p.rows.iter())
        .find(|r| r.is_well_formed() && r.cell_text(COL_STEP) == update.step_id)
        .ok_or_else(replacement_failed)?;

    let previous_pr_ref = row.cell_text(COL_PR);
    let new_pr_ref = update.new_pr_ref.trim().to_string();
    let new_status = resolve_status(&new_pr_ref, None);

    let status_edit =
        cell_edit(row, COL_STATUS, new_status.as_str()).ok_or_else(replacement_failed)?;
    let pr_edit =
        cell_edit(row, COL_PR, &escape_cell(&new_pr_ref)).ok_or_else(replacement_failed)?;

    // The pr cell sits right of the status cell; splice it first so the
    // status span is still valid.
    let mut text = doc.to_string();
    for (span, value) in [pr_edit, status_edit] {
        text.replace_range(span, &value);
    }

    Ok((
        text,
        AppliedUpdate {
            step_id: update.step_id.clone(),
            previous_pr_ref,
            new_pr_ref,
            new_status,
        },
    ))
}

/// Document-absolute span to replace and the text to put there.
///
/// Only the trimmed content is replaced, so padding on either side stays
/// put. A blank cell has no content to anchor on and is rewritten whole as
/// ` value `.
fn cell_edit(row: &ScannedRow<'_>, col: usize, value: &str) -> Option<(Range<usize>, String)> {
    let cell = row.cells.get(col)?;
    let line = row.line.text;
    let base = row.line.offset;
    let content = cell.content_span(line);

    if content.is_empty() {
        if value.is_empty() {
            return Some((base + content.start..base + content.start, String::new()));
        }
        let whole = base + cell.span.start..base + cell.span.end;
        return Some((whole, format!(" {value} ")));
    }
    Some((base + content.start..base + content.end, value.to_string()))
}

fn escape_cell(value: &str) -> String {
    value.replace('\n', " ").replace('|', "\\|")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
# Objective

Intro prose stays put.

### Phase 1: Foundation

| step_id | description | status | pr |
|---------|-------------|--------|----|
| 1.1     | task        | -      |    |
| 1.2     | task2       | -      | plan #10 |

### Phase 2: Polish

| step_id | description | status | pr |
|---------|-------------|--------|----|
| 2.1 | docs | blocked | |

Trailing notes.
";

    fn row_of<'a>(text: &'a str, step_id: &str) -> &'a str {
        let prefix = format!("| {step_id} ");
        text.lines().find(|l| l.starts_with(&prefix)).unwrap()
    }

    fn success(result: MutationResult) -> (String, Vec<AppliedUpdate>) {
        match result {
            MutationResult::Success { new_text, applied } => (new_text, applied),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn empty_batch_is_byte_identical() {
        let (text, applied) = success(update_steps(DOC, &[]).unwrap());
        assert_eq!(text, DOC);
        assert!(applied.is_empty());
    }

    #[test]
    fn empty_batch_on_document_without_roadmap_is_a_no_op() {
        let doc = "# Objective\n\nNo table yet.\n";
        let (text, applied) = success(update_steps(doc, &[]).unwrap());
        assert_eq!(text, doc);
        assert!(applied.is_empty());
    }

    #[test]
    fn writes_pr_and_status_cells() {
        let (text, applied) =
            success(update_steps(DOC, &[StepUpdate::new("1.1", "#99")]).unwrap());
        assert_eq!(row_of(&text, "1.1"), "| 1.1     | task        | done      | #99 |");
        assert_eq!(row_of(&text, "1.2"), row_of(DOC, "1.2"));
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].previous_pr_ref, "");
        assert_eq!(applied[0].new_status, StepStatus::Done);
    }

    #[test]
    fn everything_else_is_untouched() {
        let (text, _) = success(update_steps(DOC, &[StepUpdate::new("1.2", "#5")]).unwrap());
        let before: Vec<_> = DOC.lines().collect();
        let after: Vec<_> = text.lines().collect();
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            if b.starts_with("| 1.2 ") {
                assert_eq!(*a, "| 1.2     | task2       | done      | #5 |");
            } else {
                assert_eq!(b, a);
            }
        }
    }

    #[test]
    fn reparse_after_write_resolves_done() {
        let (text, _) = success(update_steps(DOC, &[StepUpdate::new("1.1", "#500")]).unwrap());
        let roadmap = parse_roadmap(&text).unwrap();
        assert_eq!(
            roadmap.find_step("1.1").unwrap().resolved_status,
            StepStatus::Done
        );
    }

    #[test]
    fn writing_overrides_explicit_status() {
        let (text, _) = success(update_steps(DOC, &[StepUpdate::new("2.1", "plan #8")]).unwrap());
        assert_eq!(row_of(&text, "2.1"), "| 2.1 | docs | in_progress | plan #8 |");
        let roadmap = parse_roadmap(&text).unwrap();
        assert_eq!(
            roadmap.find_step("2.1").unwrap().resolved_status,
            StepStatus::InProgress
        );
    }

    #[test]
    fn clearing_reference_resets_to_pending() {
        let (text, applied) = success(update_steps(DOC, &[StepUpdate::new("1.2", "")]).unwrap());
        assert_eq!(applied[0].previous_pr_ref, "plan #10");
        assert_eq!(applied[0].new_status, StepStatus::Pending);
        let roadmap = parse_roadmap(&text).unwrap();
        let step = roadmap.find_step("1.2").unwrap();
        assert_eq!(step.pr_ref, "");
        assert_eq!(step.resolved_status, StepStatus::Pending);
    }

    #[test]
    fn missing_step_rejects_whole_batch() {
        let result = update_steps(
            DOC,
            &[StepUpdate::new("1.1", "#99"), StepUpdate::new("9.9", "#1")],
        )
        .unwrap();
        match result {
            MutationResult::PartialFailure {
                new_text,
                applied,
                failed,
            } => {
                assert!(new_text.is_none());
                assert!(applied.is_empty());
                assert_eq!(
                    failed,
                    vec![FailedUpdate {
                        step_id: "9.9".into(),
                        error: UpdateError::StepNotFound,
                    }]
                );
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn repeated_step_last_write_wins() {
        let (text, applied) = success(
            update_steps(
                DOC,
                &[StepUpdate::new("1.1", "plan #3"), StepUpdate::new("1.1", "#4")],
            )
            .unwrap(),
        );
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[1].previous_pr_ref, "plan #3");
        let roadmap = parse_roadmap(&text).unwrap();
        let step = roadmap.find_step("1.1").unwrap();
        assert_eq!(step.pr_ref, "#4");
        assert_eq!(step.resolved_status, StepStatus::Done);
    }

    #[test]
    fn multi_step_batch_applies_all() {
        let (text, applied) = success(
            update_steps(
                DOC,
                &[StepUpdate::new("1.1", "#1"), StepUpdate::new("2.1", "#2")],
            )
            .unwrap(),
        );
        assert_eq!(applied.len(), 2);
        let roadmap = parse_roadmap(&text).unwrap();
        assert!(roadmap
            .all_steps()
            .filter(|s| s.step_id != "1.2")
            .all(|s| s.resolved_status == StepStatus::Done));
    }

    #[test]
    fn no_roadmap_is_an_error() {
        assert_eq!(
            update_steps("nothing here", &[StepUpdate::new("1.1", "#1")]),
            Err(RoadmapError::NoRoadmap)
        );
    }

    #[test]
    fn crlf_documents_keep_their_terminators() {
        let doc = "### Phase 1: A\r\n\r\n\
                   | Step | Description | Status | PR |\r\n\
                   |---|---|---|---|\r\n\
                   | 1.1 | x | - | |\r\n";
        let (text, _) = success(update_steps(doc, &[StepUpdate::new("1.1", "#9")]).unwrap());
        assert_eq!(
            text,
            "### Phase 1: A\r\n\r\n\
             | Step | Description | Status | PR |\r\n\
             |---|---|---|---|\r\n\
             | 1.1 | x | done | #9 |\r\n"
        );
    }

    #[test]
    fn pipes_in_reference_are_escaped() {
        let (text, _) = success(update_steps(DOC, &[StepUpdate::new("1.1", "a|b")]).unwrap());
        let roadmap = parse_roadmap(&text).unwrap();
        let step = roadmap.find_step("1.1").unwrap();
        assert_eq!(step.pr_ref, "a|b");
        assert_eq!(step.resolved_status, StepStatus::Pending);
    }
}
