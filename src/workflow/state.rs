//! Workflow state: per-step status records and the derived outputs.

use std::fmt;

use crate::ai::Rendering;
use crate::core::BomItem;

/// Identity of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKey {
    Analysis,
    Renderings,
    BillOfMaterials,
    OrderSheet,
}

impl StepKey {
    /// All steps in pipeline order.
    pub const ALL: [Self; 4] =
        [Self::Analysis, Self::Renderings, Self::BillOfMaterials, Self::OrderSheet];

    /// Title shown on the step's panel.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Analysis => "Component Compatibility",
            Self::Renderings => "3D Renderings",
            Self::BillOfMaterials => "Bill of Materials",
            Self::OrderSheet => "Order Sheet",
        }
    }

    /// Short description shown under the title.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Analysis => "AI analyzes requirements for compatible hardware",
            Self::Renderings => "AI generates visualizations of the installation",
            Self::BillOfMaterials => "AI creates an itemized materials list",
            Self::OrderSheet => "AI compiles a final purchase order",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Renderings => "renderings",
            Self::BillOfMaterials => "bill_of_materials",
            Self::OrderSheet => "order_sheet",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Analysis => 0,
            Self::Renderings => 1,
            Self::BillOfMaterials => 2,
            Self::OrderSheet => 3,
        }
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived view of a step's status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// One step's status record.
///
/// Invariant: `loading` never holds together with a terminal outcome;
/// entering Running clears both `error` and `success` first.
#[derive(Debug, Clone, Default)]
pub struct StepStatus {
    /// True while the step's call is in flight.
    pub loading: bool,

    /// Last failure message, cleared at the start of each attempt.
    pub error: Option<String>,

    /// True once the last attempt completed without error.
    pub success: bool,
}

impl StepStatus {
    pub fn phase(&self) -> StepPhase {
        if self.loading {
            StepPhase::Running
        } else if self.error.is_some() {
            StepPhase::Failed
        } else if self.success {
            StepPhase::Succeeded
        } else {
            StepPhase::Idle
        }
    }
}

/// The session's workflow state: four independent step records plus the
/// derived outputs that chain the steps together.
#[derive(Debug, Default)]
pub struct WorkflowState {
    statuses: [StepStatus; 4],

    /// Output of the analysis step; input to renderings and the BOM.
    pub compatible_components: String,

    /// Output of the renderings step.
    pub renderings: Vec<Rendering>,

    /// Output of the BOM step; input to the order sheet.
    pub bill_of_materials: Vec<BomItem>,

    /// Output of the final step.
    pub order_sheet: String,
}

impl WorkflowState {
    pub fn status(&self, step: StepKey) -> &StepStatus {
        &self.statuses[step.index()]
    }

    pub(crate) fn status_mut(&mut self, step: StepKey) -> &mut StepStatus {
        &mut self.statuses[step.index()]
    }

    /// Enter Running: mark the step loading and clear its previous outcome.
    pub(crate) fn begin(&mut self, step: StepKey) {
        let status = self.status_mut(step);
        status.loading = true;
        status.error = None;
        status.success = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_derivation() {
        let mut status = StepStatus::default();
        assert_eq!(status.phase(), StepPhase::Idle);

        status.loading = true;
        assert_eq!(status.phase(), StepPhase::Running);

        status.loading = false;
        status.success = true;
        assert_eq!(status.phase(), StepPhase::Succeeded);

        status.error = Some("boom".to_string());
        assert_eq!(status.phase(), StepPhase::Failed);
    }

    #[test]
    fn test_begin_clears_previous_outcome() {
        let mut state = WorkflowState::default();
        state.status_mut(StepKey::Analysis).error = Some("old failure".to_string());
        state.status_mut(StepKey::Analysis).success = true;

        state.begin(StepKey::Analysis);

        let status = state.status(StepKey::Analysis);
        assert!(status.loading);
        assert!(status.error.is_none());
        assert!(!status.success);
    }

    #[test]
    fn test_steps_are_independent_in_storage() {
        let mut state = WorkflowState::default();
        state.begin(StepKey::Renderings);

        assert!(state.status(StepKey::Renderings).loading);
        for step in [StepKey::Analysis, StepKey::BillOfMaterials, StepKey::OrderSheet] {
            assert_eq!(state.status(step).phase(), StepPhase::Idle);
        }
    }
}
