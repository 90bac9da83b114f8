use super::status::resolve_status;
use super::table::{self, ScannedPhase};
use super::{Roadmap, RoadmapError, RoadmapPhase, RoadmapStep};
use crate::types::StepStatus;

const COL_STEP: usize = 0;
const COL_DESCRIPTION: usize = 1;
const COL_STATUS: usize = 2;
const COL_PR: usize = 3;

/// Parse every roadmap table in `doc`.
///
/// Rows with the wrong number of cells are skipped; the rest of the table
/// still parses. Fails only when no phase heading owns a four-column table.
pub fn parse_roadmap(doc: &str) -> Result<Roadmap, RoadmapError> {
    let scanned = table::scan(doc);
    if scanned.iter().all(|p| p.tables == 0) {
        return Err(RoadmapError::NoRoadmap);
    }

    let phases = scanned
        .into_iter()
        .filter(|p| p.tables > 0)
        .map(build_phase)
        .collect();
    Ok(Roadmap { phases })
}

fn build_phase(scanned: ScannedPhase<'_>) -> RoadmapPhase {
    let mut steps = Vec::with_capacity(scanned.rows.len());
    for row in &scanned.rows {
        if !row.is_well_formed() {
            tracing::debug!(
                line = row.line.index + 1,
                cells = row.cells.len(),
                "skipping malformed roadmap row"
            );
            continue;
        }
        let step_id = row.cell_text(COL_STEP);
        if step_id.is_empty() {
            tracing::debug!(line = row.line.index + 1, "skipping row without step id");
            continue;
        }
        let pr_ref = row.cell_text(COL_PR);
        let status = StepStatus::from_cell(&row.cell_text(COL_STATUS));
        steps.push(RoadmapStep {
            resolved_status: resolve_status(&pr_ref, status),
            step_id,
            description: row.cell_text(COL_DESCRIPTION),
            status,
            pr_ref,
            line: row.line.index,
        });
    }

    RoadmapPhase {
        phase_number: scanned.heading.number,
        phase_suffix: scanned.heading.suffix,
        name: scanned.heading.name,
        steps,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
