//! Objective-level operations: fetch an issue body, run the roadmap engine
//! over it, and write the result back as one logical step.

use crate::error::Result;
use crate::issue_store::IssueStore;
use crate::roadmap::{
    self, AppliedUpdate, MutationResult, Roadmap, RoadmapSummary, StepUpdate, ValidationCheck,
};
use crate::types::StepStatus;
use serde::Serialize;

// ---------------------------------------------------------------------------
// update_roadmap_steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Leave an action-log comment on the issue after a successful write.
    pub post_comment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub step_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_pr_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<StepStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub success: bool,
    pub issue: u64,
    pub pr_ref: String,
    pub steps: Vec<StepResult>,
    /// Only known after a successful write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
    /// Set when the body was written but the action-log comment was not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateReport {
    fn failed(
        issue: u64,
        pr_ref: &str,
        steps: Vec<StepResult>,
        kind: &str,
        error: String,
    ) -> Self {
        Self {
            success: false,
            issue,
            pr_ref: pr_ref.to_string(),
            steps,
            all_done: None,
            comment_id: None,
            comment_error: None,
            error_type: Some(kind.to_string()),
            error: Some(error),
        }
    }
}

/// Point every step in `step_ids` at `pr_ref` in the roadmap of `issue`.
///
/// The body is written at most once, and only when every step exists.
/// Roadmap-level failures come back as an unsuccessful report; errors from
/// fetching or writing the body are returned as `Err`. Once the body is
/// written the update has happened, so a failed comment only sets
/// `comment_error`.
pub fn update_roadmap_steps(
    store: &dyn IssueStore,
    issue: u64,
    step_ids: &[String],
    pr_ref: &str,
    opts: &UpdateOptions,
) -> Result<UpdateReport> {
    let body = store.get_issue_body(issue)?;
    let updates: Vec<StepUpdate> = step_ids
        .iter()
        .map(|id| StepUpdate::new(id.as_str(), pr_ref))
        .collect();

    let (new_text, applied) = match roadmap::update_steps(&body, &updates) {
        Err(e) => {
            tracing::warn!(issue, error = %e, "roadmap update failed");
            return Ok(UpdateReport::failed(
                issue,
                pr_ref,
                Vec::new(),
                e.kind(),
                format!("issue #{issue}: {e}"),
            ));
        }
        Ok(MutationResult::PartialFailure { failed, .. }) => {
            let steps = step_ids
                .iter()
                .map(|id| StepResult {
                    step_id: id.clone(),
                    success: false,
                    previous_pr_ref: None,
                    new_status: None,
                    error: failed
                        .iter()
                        .find(|f| &f.step_id == id)
                        .map(|f| f.error.as_str().to_string()),
                })
                .collect();
            return Ok(UpdateReport::failed(
                issue,
                pr_ref,
                steps,
                "step_not_found",
                format!(
                    "issue #{issue}: {} step(s) not found in roadmap; nothing was written",
                    failed.len()
                ),
            ));
        }
        Ok(MutationResult::Success { new_text, applied }) => (new_text, applied),
    };

    if new_text != body {
        store.update_issue_body(issue, &new_text)?;
    }

    // Re-read from the text we just produced so all_done reflects what was
    // actually written.
    let all_done = roadmap::parse_roadmap(&new_text)
        .ok()
        .map(|r| roadmap::summarize(&r).all_done);

    let (comment_id, comment_error) = if opts.post_comment && !applied.is_empty() {
        match store.add_comment(issue, &action_log(&applied, pr_ref)) {
            Ok(id) => (Some(id), None),
            Err(e) => {
                tracing::warn!(issue, error = %e, "roadmap written but comment failed");
                (None, Some(e.to_string()))
            }
        }
    } else {
        (None, None)
    };

    let steps = applied
        .into_iter()
        .map(|a| StepResult {
            step_id: a.step_id,
            success: true,
            previous_pr_ref: Some(a.previous_pr_ref),
            new_status: Some(a.new_status),
            error: None,
        })
        .collect();

    Ok(UpdateReport {
        success: true,
        issue,
        pr_ref: pr_ref.to_string(),
        steps,
        all_done,
        comment_id,
        comment_error,
        error_type: None,
        error: None,
    })
}

fn action_log(applied: &[AppliedUpdate], pr_ref: &str) -> String {
    let mut ids: Vec<&str> = Vec::new();
    for a in applied {
        if !ids.contains(&a.step_id.as_str()) {
            ids.push(a.step_id.as_str());
        }
    }
    let status = applied
        .last()
        .map(|a| a.new_status)
        .unwrap_or(StepStatus::Pending);
    let target = if pr_ref.is_empty() {
        "cleared reference".to_string()
    } else {
        format!("`{pr_ref}`")
    };
    format!(
        "**Roadmap updated**: step {} -> {} ({})",
        ids.join(", "),
        target,
        status
    )
}

// ---------------------------------------------------------------------------
// check / load
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub issue: u64,
    pub passed: bool,
    pub checks: Vec<ValidationCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RoadmapSummary>,
}

/// Validate the roadmap of `issue`. A body without a roadmap yields a
/// failing report rather than an error.
pub fn check(store: &dyn IssueStore, issue: u64) -> Result<CheckReport> {
    let body = store.get_issue_body(issue)?;
    let roadmap = match roadmap::parse_roadmap(&body) {
        Ok(r) => r,
        Err(e) => {
            return Ok(CheckReport {
                issue,
                passed: false,
                checks: vec![ValidationCheck::fail(format!("Roadmap parses: {e}"))],
                summary: None,
            });
        }
    };

    let report = roadmap::validate(&roadmap);
    let mut checks = vec![ValidationCheck::pass(format!(
        "Roadmap parses ({} phases, {} steps)",
        roadmap.phases.len(),
        roadmap.step_count()
    ))];
    checks.extend(report.checks);

    Ok(CheckReport {
        issue,
        passed: report.passed,
        checks,
        summary: Some(roadmap::summarize(&roadmap)),
    })
}

/// Fetch and parse. `NoRoadmap` surfaces as an error here.
pub fn load_roadmap(store: &dyn IssueStore, issue: u64) -> Result<Roadmap> {
    let body = store.get_issue_body(issue)?;
    Ok(roadmap::parse_roadmap(&body)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
