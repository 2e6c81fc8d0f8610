//! The workflow engine.
//!
//! Sequences the four generation steps: prerequisite gating, per-step
//! status tracking, single-flight invocation, and manual fallback editing
//! when no gateway is available.

use std::sync::Arc;

use tracing::{debug, warn};

use super::state::{StepKey, StepStatus, WorkflowState};
use crate::ai::{GatewayError, Rendering, SolarGateway};
use crate::core::{
    parse_bom_json, BomItem, BomParseError, PhotoLibrary, SitePhoto, SystemRequirements,
};

/// Orchestrates the generation pipeline for one editing session.
///
/// The engine exclusively owns the workflow state and the derived outputs;
/// every transition goes through `begin`/`finish` or the manual editors.
pub struct WorkflowEngine {
    gateway: Option<Arc<dyn SolarGateway>>,

    /// The user-edited requirements record.
    pub requirements: SystemRequirements,

    /// The session's uploaded site photos.
    pub photos: PhotoLibrary,

    state: WorkflowState,
}

impl WorkflowEngine {
    pub fn new(gateway: Option<Arc<dyn SolarGateway>>) -> Self {
        Self {
            gateway,
            requirements: SystemRequirements::default(),
            photos: PhotoLibrary::new(),
            state: WorkflowState::default(),
        }
    }

    /// Whether gateway calls are possible this session.
    pub fn ai_online(&self) -> bool {
        self.gateway.is_some()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn status(&self, step: StepKey) -> &StepStatus {
        self.state.status(step)
    }

    /// Whether the inputs stage is complete (lights up the first node of the
    /// workflow diagram).
    pub fn inputs_complete(&self) -> bool {
        !self.photos.is_empty()
    }

    /// Gating predicate: may `step` be triggered right now?
    pub fn can_run(&self, step: StepKey) -> bool {
        match step {
            StepKey::Analysis => !self.requirements.desired_kw.trim().is_empty(),
            StepKey::Renderings => {
                !self.state.compatible_components.is_empty() && !self.photos.is_empty()
            }
            StepKey::BillOfMaterials => self.state.status(StepKey::Renderings).success,
            StepKey::OrderSheet => !self.state.bill_of_materials.is_empty(),
        }
    }

    /// Start a step invocation.
    ///
    /// Returns the in-flight call, or None when the gateway is unavailable,
    /// the gating predicate does not hold, or the step is already running
    /// (single-flight). A refused trigger is a no-op, not an error.
    ///
    /// The step's inputs are read here, at invocation time; later edits do
    /// not affect a call already in flight.
    pub fn begin(&mut self, step: StepKey) -> Option<StepCall> {
        let gateway = match &self.gateway {
            Some(gateway) => Arc::clone(gateway),
            None => {
                debug!(step = %step, "Gateway unavailable, step not started");
                return None;
            }
        };

        if !self.can_run(step) {
            debug!(step = %step, "Precondition not met, step not started");
            return None;
        }

        if self.state.status(step).loading {
            debug!(step = %step, "Step already in flight, trigger ignored");
            return None;
        }

        self.state.begin(step);

        let inputs = match step {
            StepKey::Analysis => {
                StepInputs::Analysis { requirements: self.requirements.clone() }
            }
            StepKey::Renderings => StepInputs::Renderings {
                components: self.state.compatible_components.clone(),
                photos: self.photos.photos().to_vec(),
            },
            StepKey::BillOfMaterials => StepInputs::BillOfMaterials {
                components: self.state.compatible_components.clone(),
                photos: self.photos.photos().to_vec(),
            },
            StepKey::OrderSheet => {
                StepInputs::OrderSheet { items: self.state.bill_of_materials.clone() }
            }
        };

        Some(StepCall { step, gateway, inputs })
    }

    /// Apply a completed invocation's outcome.
    pub fn finish(&mut self, step: StepKey, outcome: Result<StepOutput, GatewayError>) {
        match outcome {
            Ok(output) => {
                match output {
                    StepOutput::Analysis(text) => self.state.compatible_components = text,
                    StepOutput::Renderings(images) => self.state.renderings = images,
                    StepOutput::BillOfMaterials(items) => self.state.bill_of_materials = items,
                    StepOutput::OrderSheet(text) => self.state.order_sheet = text,
                }
                self.state.status_mut(step).success = true;
            }
            Err(e) => {
                warn!(step = %step, error = %e, "Step failed");
                let message = e.to_string();
                let message = if message.is_empty() {
                    format!("An error occurred during {}.", step)
                } else {
                    message
                };
                self.state.status_mut(step).error = Some(message);
            }
        }

        self.state.status_mut(step).loading = false;
    }

    /// Run a step to completion. Returns whether the step was started.
    pub async fn run(&mut self, step: StepKey) -> bool {
        let Some(call) = self.begin(step) else {
            return false;
        };
        let step = call.step();
        let outcome = call.execute().await;
        self.finish(step, outcome);
        true
    }

    // --- Manual fallback -------------------------------------------------
    //
    // When no gateway is available the output fields are edited directly.
    // The UI only exposes these editors in that mode.

    /// Replace the component list text.
    pub fn set_components_text(&mut self, text: impl Into<String>) {
        self.state.compatible_components = text.into();
    }

    /// Replace the order sheet text.
    pub fn set_order_sheet_text(&mut self, text: impl Into<String>) {
        self.state.order_sheet = text.into();
    }

    /// Replace the bill of materials from pasted JSON.
    ///
    /// On a syntax or schema error the previous items are retained and the
    /// error is recorded on the step.
    pub fn apply_manual_bom(&mut self, text: &str) -> Result<(), BomParseError> {
        match parse_bom_json(text) {
            Ok(items) => {
                self.state.bill_of_materials = items;
                self.state.status_mut(StepKey::BillOfMaterials).error = None;
                Ok(())
            }
            Err(e) => {
                self.state.status_mut(StepKey::BillOfMaterials).error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

/// Inputs captured for one invocation.
enum StepInputs {
    Analysis { requirements: SystemRequirements },
    Renderings { components: String, photos: Vec<SitePhoto> },
    BillOfMaterials { components: String, photos: Vec<SitePhoto> },
    OrderSheet { items: Vec<BomItem> },
}

/// An in-flight invocation of one step, detached from the engine so the
/// caller can await it anywhere (the TUI spawns it onto the runtime).
pub struct StepCall {
    step: StepKey,
    gateway: Arc<dyn SolarGateway>,
    inputs: StepInputs,
}

impl StepCall {
    pub fn step(&self) -> StepKey {
        self.step
    }

    /// Perform the gateway operation.
    pub async fn execute(self) -> Result<StepOutput, GatewayError> {
        let Self { gateway, inputs, .. } = self;
        match inputs {
            StepInputs::Analysis { requirements } => {
                gateway.analyze_components(&requirements).await.map(StepOutput::Analysis)
            }
            StepInputs::Renderings { components, photos } => {
                gateway.render_previews(&components, &photos).await.map(StepOutput::Renderings)
            }
            StepInputs::BillOfMaterials { components, photos } => gateway
                .build_bill_of_materials(&components, &photos)
                .await
                .map(StepOutput::BillOfMaterials),
            StepInputs::OrderSheet { items } => {
                gateway.compile_order_sheet(&items).await.map(StepOutput::OrderSheet)
            }
        }
    }
}

/// Result payload of a successful step.
#[derive(Debug)]
pub enum StepOutput {
    Analysis(String),
    Renderings(Vec<Rendering>),
    BillOfMaterials(Vec<BomItem>),
    OrderSheet(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::StepPhase;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Gateway double: echoes its inputs and fails on demand.
    #[derive(Default)]
    struct FakeGateway {
        failing: Mutex<HashSet<StepKey>>,
    }

    impl FakeGateway {
        fn fail(&self, step: StepKey) {
            self.failing.lock().unwrap().insert(step);
        }

        fn recover(&self, step: StepKey) {
            self.failing.lock().unwrap().remove(&step);
        }

        fn check(&self, step: StepKey) -> Result<(), GatewayError> {
            if self.failing.lock().unwrap().contains(&step) {
                Err(GatewayError::Provider(format!("{step} exploded")))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl SolarGateway for FakeGateway {
        async fn analyze_components(
            &self,
            requirements: &SystemRequirements,
        ) -> Result<String, GatewayError> {
            self.check(StepKey::Analysis)?;
            Ok(format!("components for {} kW", requirements.desired_kw))
        }

        async fn render_previews(
            &self,
            _components: &str,
            photos: &[SitePhoto],
        ) -> Result<Vec<Rendering>, GatewayError> {
            self.check(StepKey::Renderings)?;
            if photos.is_empty() {
                return Err(GatewayError::Input("no photos".to_string()));
            }
            Ok(vec![Rendering { mime_type: "image/jpeg".to_string(), base64: "aGk=".to_string() }])
        }

        async fn build_bill_of_materials(
            &self,
            components: &str,
            _photos: &[SitePhoto],
        ) -> Result<Vec<BomItem>, GatewayError> {
            self.check(StepKey::BillOfMaterials)?;
            Ok(vec![BomItem {
                item: "Panel".to_string(),
                quantity: 10,
                description: format!("derived from: {components}"),
                vendor: "Acme".to_string(),
            }])
        }

        async fn compile_order_sheet(&self, items: &[BomItem]) -> Result<String, GatewayError> {
            self.check(StepKey::OrderSheet)?;
            Ok(format!("ORDER ({} line items)", items.len()))
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn test_photo() -> SitePhoto {
        SitePhoto {
            path: PathBuf::from("roof.jpg"),
            name: "roof.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            base64: "cm9vZg==".to_string(),
        }
    }

    fn engine_with_gateway() -> (WorkflowEngine, Arc<FakeGateway>) {
        let gateway = Arc::new(FakeGateway::default());
        (WorkflowEngine::new(Some(gateway.clone())), gateway)
    }

    #[test]
    fn test_begin_requires_gateway() {
        let mut engine = WorkflowEngine::new(None);
        assert!(!engine.ai_online());
        assert!(engine.begin(StepKey::Analysis).is_none());
    }

    #[test]
    fn test_gating_predicates() {
        let (mut engine, _) = engine_with_gateway();

        // Analysis needs a desired kW value.
        assert!(engine.can_run(StepKey::Analysis));
        engine.requirements.desired_kw = "   ".to_string();
        assert!(!engine.can_run(StepKey::Analysis));

        // Renderings need components AND at least one photo.
        engine.set_components_text("- Panels: Acme 400W");
        assert!(!engine.can_run(StepKey::Renderings));
        engine.photos.push(test_photo());
        assert!(engine.can_run(StepKey::Renderings));

        // BOM needs renderings to have *succeeded*, not merely run.
        assert!(!engine.can_run(StepKey::BillOfMaterials));

        // Order sheet needs a non-empty BOM.
        assert!(!engine.can_run(StepKey::OrderSheet));
    }

    #[test]
    fn test_renderings_gated_without_photos_even_with_components() {
        let (mut engine, _) = engine_with_gateway();
        engine.set_components_text("- Panels: Acme 400W");

        assert!(engine.photos.is_empty());
        assert!(!engine.can_run(StepKey::Renderings));
        assert!(engine.begin(StepKey::Renderings).is_none());
    }

    #[tokio::test]
    async fn test_run_success_stores_output() {
        let (mut engine, _) = engine_with_gateway();

        assert!(engine.run(StepKey::Analysis).await);

        let status = engine.status(StepKey::Analysis);
        assert_eq!(status.phase(), StepPhase::Succeeded);
        assert!(!status.loading);
        assert!(status.error.is_none());
        assert_eq!(engine.state().compatible_components, "components for 10 kW");
    }

    #[tokio::test]
    async fn test_run_failure_records_message_and_clears_loading() {
        let (mut engine, gateway) = engine_with_gateway();
        gateway.fail(StepKey::Analysis);

        assert!(engine.run(StepKey::Analysis).await);

        let status = engine.status(StepKey::Analysis);
        assert_eq!(status.phase(), StepPhase::Failed);
        assert!(!status.loading);
        assert!(!status.success);
        assert_eq!(status.error.as_deref(), Some("analysis exploded"));
    }

    #[tokio::test]
    async fn test_rerun_after_failure_clears_stale_error() {
        let (mut engine, gateway) = engine_with_gateway();
        gateway.fail(StepKey::Analysis);
        engine.run(StepKey::Analysis).await;
        assert!(engine.status(StepKey::Analysis).error.is_some());

        gateway.recover(StepKey::Analysis);
        let call = engine.begin(StepKey::Analysis).expect("re-run is permitted");

        // The new attempt is loading with no stale error alongside it.
        let status = engine.status(StepKey::Analysis);
        assert!(status.loading);
        assert!(status.error.is_none());
        assert!(!status.success);

        let outcome = call.execute().await;
        engine.finish(StepKey::Analysis, outcome);
        assert_eq!(engine.status(StepKey::Analysis).phase(), StepPhase::Succeeded);
    }

    #[tokio::test]
    async fn test_single_flight_rejects_second_invocation() {
        let (mut engine, _) = engine_with_gateway();

        let first = engine.begin(StepKey::Analysis).expect("first trigger starts");
        assert!(engine.begin(StepKey::Analysis).is_none());

        let outcome = first.execute().await;
        engine.finish(StepKey::Analysis, outcome);

        // Completed steps may be re-run.
        assert!(engine.begin(StepKey::Analysis).is_some());
    }

    #[tokio::test]
    async fn test_inputs_read_at_invocation_time() {
        let (mut engine, _) = engine_with_gateway();
        engine.requirements.desired_kw = "8".to_string();

        let call = engine.begin(StepKey::Analysis).unwrap();
        // Edits after begin must not affect the call in flight.
        engine.requirements.desired_kw = "99".to_string();

        let outcome = call.execute().await;
        engine.finish(StepKey::Analysis, outcome);
        assert_eq!(engine.state().compatible_components, "components for 8 kW");
    }

    #[tokio::test]
    async fn test_bom_unlocks_only_after_renderings_succeed() {
        let (mut engine, gateway) = engine_with_gateway();
        engine.photos.push(test_photo());
        engine.run(StepKey::Analysis).await;

        gateway.fail(StepKey::Renderings);
        engine.run(StepKey::Renderings).await;
        assert_eq!(engine.status(StepKey::Renderings).phase(), StepPhase::Failed);
        assert!(!engine.can_run(StepKey::BillOfMaterials));

        gateway.recover(StepKey::Renderings);
        engine.run(StepKey::Renderings).await;
        assert!(engine.can_run(StepKey::BillOfMaterials));
    }

    #[tokio::test]
    async fn test_full_pipeline_chains_outputs() {
        let (mut engine, _) = engine_with_gateway();
        engine.photos.push(test_photo());

        for step in StepKey::ALL {
            assert!(engine.run(step).await, "step {step} should start");
            assert_eq!(engine.status(step).phase(), StepPhase::Succeeded);
        }

        assert_eq!(engine.state().renderings.len(), 1);
        assert!(engine.state().bill_of_materials[0]
            .description
            .contains("components for 10 kW"));
        assert_eq!(engine.state().order_sheet, "ORDER (1 line items)");
    }

    #[test]
    fn test_manual_bom_parse_error_retains_prior_items() {
        let mut engine = WorkflowEngine::new(None);
        engine
            .apply_manual_bom(
                r#"[{"item":"Panel","quantity":10,"description":"400W mono","vendor":"Acme"}]"#,
            )
            .unwrap();
        assert_eq!(engine.state().bill_of_materials.len(), 1);
        assert!(engine.status(StepKey::BillOfMaterials).error.is_none());

        // A top-level object is rejected and the prior value kept.
        assert!(engine.apply_manual_bom(r#"{"item":"x"}"#).is_err());
        assert_eq!(engine.state().bill_of_materials.len(), 1);
        assert!(engine
            .status(StepKey::BillOfMaterials)
            .error
            .as_deref()
            .unwrap()
            .contains("array"));

        // Unparseable text reports a syntax error.
        assert!(engine.apply_manual_bom("not json").is_err());
        assert!(engine
            .status(StepKey::BillOfMaterials)
            .error
            .as_deref()
            .unwrap()
            .contains("JSON"));
        assert_eq!(engine.state().bill_of_materials.len(), 1);
    }

    #[test]
    fn test_manual_edits_enable_downstream_gating() {
        let mut engine = WorkflowEngine::new(None);
        engine
            .apply_manual_bom(
                r#"[{"item":"Panel","quantity":10,"description":"400W mono","vendor":"Acme"}]"#,
            )
            .unwrap();

        // Order sheet is gated only on a non-empty BOM, so manual entry
        // unlocks it (though with no gateway it stays manual too).
        assert!(engine.can_run(StepKey::OrderSheet));
        assert!(engine.begin(StepKey::OrderSheet).is_none());
    }
}
