use super::status::ReferenceKind;
use super::Roadmap;
use crate::types::StepStatus;
use serde::Serialize;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationCheck {
    pub passed: bool,
    pub message: String,
}

impl ValidationCheck {
    pub(crate) fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    pub(crate) fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub checks: Vec<ValidationCheck>,
}

impl ValidationReport {
    pub fn from_checks(checks: Vec<ValidationCheck>) -> Self {
        Self {
            passed: checks.iter().all(|c| c.passed),
            checks,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

/// Run every structural check against a parsed roadmap.
///
/// Checks never short-circuit. A clean check adds one passing entry; each
/// violation adds its own failing entry.
pub fn validate(roadmap: &Roadmap) -> ValidationReport {
    let mut checks = Vec::new();
    checks.extend(check_phase_order(roadmap));
    checks.extend(check_reference_consistency(roadmap));
    checks.extend(check_orphaned_done(roadmap));
    checks.extend(check_unique_step_ids(roadmap));
    ValidationReport::from_checks(checks)
}

fn check_phase_order(roadmap: &Roadmap) -> Vec<ValidationCheck> {
    let failures: Vec<_> = roadmap
        .phases
        .windows(2)
        .filter(|pair| pair[0].cmp_order(&pair[1]).is_gt())
        .map(|pair| {
            ValidationCheck::fail(format!(
                "Phase {} appears after phase {}; phases must be in ascending order",
                pair[1].label(),
                pair[0].label()
            ))
        })
        .collect();
    or_pass(failures, "Phase numbering is in order")
}

fn check_reference_consistency(roadmap: &Roadmap) -> Vec<ValidationCheck> {
    let mut failures = Vec::new();
    for step in roadmap.all_steps() {
        let status = step.resolved_status;
        let consistent = match ReferenceKind::classify(&step.pr_ref) {
            ReferenceKind::Pr => matches!(status, StepStatus::Done | StepStatus::Skipped),
            ReferenceKind::Plan => matches!(status, StepStatus::InProgress | StepStatus::Skipped),
            ReferenceKind::Empty | ReferenceKind::Other => true,
        };
        if !consistent {
            failures.push(ValidationCheck::fail(format!(
                "Step {} references '{}' but has status '{}'",
                step.step_id, step.pr_ref, status
            )));
        }
    }
    or_pass(failures, "Step statuses agree with their references")
}

fn check_orphaned_done(roadmap: &Roadmap) -> Vec<ValidationCheck> {
    let failures: Vec<_> = roadmap
        .all_steps()
        .filter(|s| s.resolved_status == StepStatus::Done && s.pr_ref.is_empty())
        .map(|s| {
            ValidationCheck::fail(format!(
                "Step {} has orphaned done status: no PR reference",
                s.step_id
            ))
        })
        .collect();
    or_pass(failures, "Every done step has a PR reference")
}

fn check_unique_step_ids(roadmap: &Roadmap) -> Vec<ValidationCheck> {
    let mut seen: HashMap<&str, Vec<String>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for phase in &roadmap.phases {
        for step in &phase.steps {
            let phases = seen.entry(step.step_id.as_str()).or_default();
            if phases.is_empty() {
                order.push(step.step_id.as_str());
            }
            phases.push(phase.label());
        }
    }

    let failures: Vec<_> = order
        .into_iter()
        .filter_map(|id| {
            let phases = &seen[id];
            (phases.len() > 1).then(|| {
                ValidationCheck::fail(format!(
                    "Step {} appears {} times (phases {})",
                    id,
                    phases.len(),
                    phases.join(", ")
                ))
            })
        })
        .collect();
    or_pass(failures, "Step IDs are unique")
}

fn or_pass(failures: Vec<ValidationCheck>, message: &str) -> Vec<ValidationCheck> {
    if failures.is_empty() {
        vec![ValidationCheck::pass(message)]
    } else {
        failures
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roadmap::parse_roadmap;

    fn phase_doc(labels: &[&str]) -> String {
        let mut doc = String::new();
        for (i, label) in labels.iter().enumerate() {
            doc.push_str(&format!(
                "### Phase {label}: P{i}\n\n\
                 | Step | Description | Status | PR |\n\
                 |------|-------------|--------|----|\n\
                 | {label}.1 | work | - | |\n\n"
            ));
        }
        doc
    }

    fn report_for(doc: &str) -> ValidationReport {
        validate(&parse_roadmap(doc).unwrap())
    }

    #[test]
    fn clean_roadmap_passes_every_check() {
        let report = report_for(&phase_doc(&["1", "2", "3"]));
        assert!(report.passed);
        assert_eq!(report.checks.len(), 4);
        assert!(report.checks.iter().all(|c| c.passed));
    }

    #[test]
    fn sub_phases_in_order_pass() {
        let report = report_for(&phase_doc(&["1A", "1B", "1C", "2"]));
        assert!(report.passed, "{report:?}");
    }

    #[test]
    fn sub_phases_out_of_order_fail() {
        let report = report_for(&phase_doc(&["1A", "1C", "1B"]));
        assert!(!report.passed);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("1B"));
    }

    #[test]
    fn numeric_phase_order_is_not_lexicographic() {
        assert!(report_for(&phase_doc(&["2", "10"])).passed);
        assert!(!report_for(&phase_doc(&["1", "3", "2"])).passed);
    }

    #[test]
    fn orphaned_done_is_reported() {
        let doc = "\
### Phase 2: Ship

| Step | Description | Status | PR |
|------|-------------|--------|----|
| 2.1 | claimed | done | |
| 2.2 | real | done | #4 |
";
        let report = report_for(doc);
        assert!(!report.passed);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("2.1"));
        assert!(failures[0].message.contains("orphaned done status"));
    }

    #[test]
    fn reference_status_mismatch_is_reported() {
        let doc = "\
### Phase 1: Mixed

| Step | Description | Status | PR |
|------|-------------|--------|----|
| 1.1 | landed but blocked | blocked | #9 |
| 1.2 | planned but pending | pending | plan #3 |
| 1.3 | skipped with pr | skipped | #5 |
| 1.4 | skipped with plan | skipped | plan #6 |
";
        let report = report_for(doc);
        let failures: Vec<_> = report.failures().map(|c| c.message.as_str()).collect();
        assert_eq!(failures.len(), 2);
        assert!(failures[0].contains("1.1"));
        assert!(failures[1].contains("1.2"));
    }

    #[test]
    fn duplicate_step_ids_across_phases() {
        let doc = "\
### Phase 1: A

| Step | Description | Status | PR |
|------|-------------|--------|----|
| 1.1 | first | - | |

### Phase 2: B

| Step | Description | Status | PR |
|------|-------------|--------|----|
| 1.1 | again | - | |
";
        let report = report_for(doc);
        assert!(!report.passed);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("Step 1.1 appears 2 times"));
        assert!(failures[0].message.contains("phases 1, 2"));
    }

    #[test]
    fn failures_do_not_short_circuit() {
        let doc = "\
### Phase 2: Late

| Step | Description | Status | PR |
|------|-------------|--------|----|
| 2.1 | orphan | done | |

### Phase 1: Early

| Step | Description | Status | PR |
|------|-------------|--------|----|
| 2.1 | dup | blocked | #1 |
";
        let report = report_for(doc);
        assert!(!report.passed);
        assert_eq!(report.failures().count(), 4);
    }
}
