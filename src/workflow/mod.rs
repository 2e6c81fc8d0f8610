//! Workflow system for the four-step generation pipeline.
//!
//! Each step runs the same state machine (Idle → Running → Succeeded or
//! Failed, terminal states re-enterable) with its own status record; the
//! engine wires the steps together through gating predicates and
//! output-to-input data flow.

mod engine;
mod state;

pub use engine::{StepCall, StepOutput, WorkflowEngine};
pub use state::{StepKey, StepPhase, StepStatus, WorkflowState};
