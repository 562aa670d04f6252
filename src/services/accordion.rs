use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::models::form::SectionId;
use crate::services::validation::SectionStatus;

/// Visual state of one step in the wizard indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Active,
    Complete,
}

/// One entry of the step indicator sent back to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StepEntry {
    pub section: SectionId,
    pub required: bool,
    pub state: StepState,
    pub summary: String,
}

/// Open/closed state of the accordion sections.
///
/// A set of independent flags, not a current-step index. The wizard is not
/// sequentially gated and toggling never touches the form model.
#[derive(Debug, Clone, Default)]
pub struct AccordionState {
    open: HashSet<SectionId>,
}

impl AccordionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one section and report whether it is now open.
    pub fn toggle(&mut self, section: SectionId) -> bool {
        if self.open.remove(&section) {
            false
        } else {
            self.open.insert(section);
            true
        }
    }

    /// Expand a section without toggling; used by the submission gate to
    /// surface failing sections.
    pub fn expand(&mut self, section: SectionId) {
        self.open.insert(section);
    }

    pub fn is_open(&self, section: SectionId) -> bool {
        self.open.contains(&section)
    }

    /// Open sections in fixed wizard order, for stable snapshots.
    pub fn open_sections(&self) -> Vec<SectionId> {
        SectionId::ALL
            .iter()
            .copied()
            .filter(|section| self.open.contains(section))
            .collect()
    }

    /// Derive the step indicator from the cached section statuses.
    ///
    /// Complete wins over open: a finished section shows its checkmark even
    /// while the organizer still has it expanded.
    pub fn step_indicator(
        &self,
        statuses: &HashMap<SectionId, SectionStatus>,
    ) -> Vec<StepEntry> {
        SectionId::ALL
            .iter()
            .map(|section| {
                let status = statuses.get(section);
                let complete = status.map(|s| s.complete).unwrap_or(false);
                let state = if complete {
                    StepState::Complete
                } else if self.is_open(*section) {
                    StepState::Active
                } else {
                    StepState::Pending
                };
                StepEntry {
                    section: *section,
                    required: section.is_required(),
                    state,
                    summary: status.map(|s| s.summary.clone()).unwrap_or_default(),
                }
            })
            .collect()
    }
}
