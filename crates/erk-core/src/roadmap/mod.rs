//! Objective roadmaps: phase/step tables embedded in an issue body.
//!
//! The markdown text is the source of truth. A [`Roadmap`] is parsed fresh
//! on every read, and mutations produce new text instead of re-serializing
//! the parsed structure.

mod mutator;
mod parser;
mod status;
mod summary;
mod table;
mod validator;

pub use mutator::{
    update_steps, AppliedUpdate, FailedUpdate, MutationResult, StepUpdate, UpdateError,
};
pub use parser::parse_roadmap;
pub use status::{resolve_status, ReferenceKind};
pub use summary::{summarize, NextStep, RoadmapSummary};
pub use validator::{validate, ValidationCheck, ValidationReport};

use crate::types::StepStatus;
use serde::Serialize;
use std::cmp::Ordering;
use thiserror::Error;

// ---------------------------------------------------------------------------
// RoadmapError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoadmapError {
    #[error("no roadmap table found under a phase heading")]
    NoRoadmap,

    #[error("could not locate the table row for step '{step_id}'")]
    ReplacementFailed { step_id: String },
}

impl RoadmapError {
    /// Stable identifier used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            RoadmapError::NoRoadmap => "no_roadmap",
            RoadmapError::ReplacementFailed { .. } => "replacement_failed",
        }
    }
}

// ---------------------------------------------------------------------------
// RoadmapStep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoadmapStep {
    pub step_id: String,
    pub description: String,
    /// Literal status cell; `None` when blank, `-`, or not a known status.
    pub status: Option<StepStatus>,
    pub pr_ref: String,
    pub resolved_status: StepStatus,
    /// Zero-based line of the row in the source document.
    pub line: usize,
}

// ---------------------------------------------------------------------------
// RoadmapPhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoadmapPhase {
    pub phase_number: u32,
    pub phase_suffix: String,
    pub name: String,
    pub steps: Vec<RoadmapStep>,
}

impl RoadmapPhase {
    /// `1`, `1A`, `12B`, ...
    pub fn label(&self) -> String {
        format!("{}{}", self.phase_number, self.phase_suffix)
    }

    /// Numeric phase first, then suffix, so `1A < 1B < 2 < 10`.
    pub fn order_key(&self) -> (u32, &str) {
        (self.phase_number, self.phase_suffix.as_str())
    }

    pub fn cmp_order(&self, other: &RoadmapPhase) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

// ---------------------------------------------------------------------------
// Roadmap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Roadmap {
    pub phases: Vec<RoadmapPhase>,
}

impl Roadmap {
    pub fn all_steps(&self) -> impl Iterator<Item = &RoadmapStep> {
        self.phases.iter().flat_map(|p| p.steps.iter())
    }

    /// First step with this id in document order.
    pub fn find_step(&self, step_id: &str) -> Option<&RoadmapStep> {
        self.all_steps().find(|s| s.step_id == step_id)
    }

    pub fn step_count(&self) -> usize {
        self.phases.iter().map(|p| p.steps.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
