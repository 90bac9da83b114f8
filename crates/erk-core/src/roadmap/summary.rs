use super::Roadmap;
use crate::types::StepStatus;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextStep {
    pub step_id: String,
    pub description: String,
    pub phase: String,
    pub phase_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoadmapSummary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
    pub skipped: usize,
    pub blocked: usize,
    /// Every step is done or skipped. Callers use this to decide whether the
    /// objective can be closed.
    pub all_done: bool,
    pub next_step: Option<NextStep>,
}

/// Count steps by resolved status and pick the first pending step.
pub fn summarize(roadmap: &Roadmap) -> RoadmapSummary {
    let count = |status: StepStatus| {
        roadmap
            .all_steps()
            .filter(|s| s.resolved_status == status)
            .count()
    };

    let next_step = roadmap.phases.iter().find_map(|phase| {
        phase
            .steps
            .iter()
            .find(|s| s.resolved_status == StepStatus::Pending)
            .map(|s| NextStep {
                step_id: s.step_id.clone(),
                description: s.description.clone(),
                phase: phase.label(),
                phase_name: phase.name.clone(),
            })
    });

    RoadmapSummary {
        total: roadmap.step_count(),
        pending: count(StepStatus::Pending),
        in_progress: count(StepStatus::InProgress),
        done: count(StepStatus::Done),
        skipped: count(StepStatus::Skipped),
        blocked: count(StepStatus::Blocked),
        all_done: roadmap.all_steps().all(|s| s.resolved_status.is_terminal()),
        next_step,
    }
}
