//! Application state and lifecycle management.
//!
//! The `App` struct holds everything the interactive planner needs: the
//! workflow engine, input focus and edit state, and the channel that carries
//! results of spawned work back to the UI thread.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;

use crate::ai::{CredentialResolver, GatewayError, GeminiClient, Rendering};
use crate::core::{
    encode_batch, to_editable_json, Config, PhotoError, RequirementField, SitePhoto,
};
use crate::tui::Theme;
use crate::workflow::{StepKey, StepOutput, WorkflowEngine};

/// How long the "Copied!" confirmation stays visible.
pub const COPIED_RESET: Duration = Duration::from_secs(2);

/// Results of spawned work, delivered back to the UI thread on tick.
pub enum AppEvent {
    /// A workflow step's gateway call completed.
    StepDone(StepKey, Result<StepOutput, GatewayError>),

    /// A photo batch finished encoding.
    PhotosEncoded(Result<Vec<SitePhoto>, PhotoError>),
}

/// Which widget has input focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Photos,
    DesiredKw,
    BatteryKwh,
    PanelType,
    InverterType,
    AdditionalNotes,
    Step(StepKey),
}

impl Focus {
    /// Traversal order for Tab/Shift-Tab.
    pub const ORDER: [Self; 10] = [
        Self::Photos,
        Self::DesiredKw,
        Self::BatteryKwh,
        Self::PanelType,
        Self::InverterType,
        Self::AdditionalNotes,
        Self::Step(StepKey::Analysis),
        Self::Step(StepKey::Renderings),
        Self::Step(StepKey::BillOfMaterials),
        Self::Step(StepKey::OrderSheet),
    ];

    pub fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// What an active edit session is writing to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Requirement(RequirementField),
    PhotoPath,
    Components,
    ManualBom,
    OrderSheet,
}

/// A text field being edited.
#[derive(Debug, Clone)]
pub struct EditSession {
    pub target: EditTarget,
    pub buffer: String,
    /// Cursor position as a character index into `buffer`.
    pub cursor: usize,
    pub multiline: bool,
}

impl EditSession {
    pub fn new(target: EditTarget, initial: String, multiline: bool) -> Self {
        let cursor = initial.chars().count();
        Self { target, buffer: initial, cursor, multiline }
    }

    fn byte_index(&self) -> usize {
        self.buffer
            .char_indices()
            .nth(self.cursor)
            .map_or(self.buffer.len(), |(i, _)| i)
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index();
        self.buffer.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.buffer.remove(at);
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.buffer.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.buffer.chars().count();
    }
}

/// Input mode.
#[derive(Debug, Clone)]
pub enum Mode {
    Normal,
    Editing(EditSession),
}

/// Transient "Copied!" confirmation that self-clears after a fixed delay.
#[derive(Debug, Default)]
pub struct CopiedIndicator {
    shown_at: Option<Instant>,
}

impl CopiedIndicator {
    pub fn mark(&mut self, now: Instant) {
        self.shown_at = Some(now);
    }

    pub fn visible(&self) -> bool {
        self.shown_at.is_some()
    }

    /// Clear the indicator once the reset delay has elapsed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(at) = self.shown_at {
            if now.duration_since(at) >= COPIED_RESET {
                self.shown_at = None;
            }
        }
    }
}

/// Main application state.
pub struct App {
    /// The workflow engine owning all session state
    pub engine: WorkflowEngine,

    /// Application configuration
    pub config: Config,

    /// Active color theme
    pub theme: Theme,

    /// Which widget has focus
    pub focus: Focus,

    /// Current input mode
    pub mode: Mode,

    /// Status message to display (if any)
    pub status_message: Option<String>,

    /// The order-sheet "Copied!" flash
    pub copied: CopiedIndicator,

    /// Whether a photo batch is currently encoding
    pub encoding_photos: bool,

    /// Whether the application should quit
    pub should_quit: bool,

    runtime: tokio::runtime::Handle,
    events_tx: Sender<AppEvent>,
    events_rx: Receiver<AppEvent>,
}

impl App {
    /// Create the application, probing credential availability once at
    /// startup to pick online or manual mode.
    pub fn new(config: Config, runtime: tokio::runtime::Handle) -> Self {
        let credentials = CredentialResolver::new();
        let gateway = if credentials.is_available() {
            Some(Arc::new(GeminiClient::new(&config.ai)) as Arc<dyn crate::ai::SolarGateway>)
        } else {
            None
        };

        let (events_tx, events_rx) = mpsc::channel();
        let theme = Theme::from_config(&config.ui);

        Self {
            engine: WorkflowEngine::new(gateway),
            config,
            theme,
            focus: Focus::Photos,
            mode: Mode::Normal,
            status_message: None,
            copied: CopiedIndicator::default(),
            encoding_photos: false,
            should_quit: false,
            runtime,
            events_tx,
            events_rx,
        }
    }

    /// Set a status message to display.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Request the application to quit.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Trigger a workflow step from the UI.
    ///
    /// The engine decides whether the trigger starts anything; a refused
    /// trigger surfaces a hint instead of an error.
    pub fn trigger_step(&mut self, step: StepKey) {
        if !self.engine.ai_online() {
            self.set_status("AI is offline - edit this step manually (Enter on the panel)");
            return;
        }
        if self.engine.status(step).loading {
            return;
        }
        if !self.engine.can_run(step) {
            self.set_status(precondition_hint(step));
            return;
        }

        if let Some(call) = self.engine.begin(step) {
            let tx = self.events_tx.clone();
            self.runtime.spawn(async move {
                let step = call.step();
                let outcome = call.execute().await;
                let _ = tx.send(AppEvent::StepDone(step, outcome));
            });
        }
    }

    /// Encode and append a batch of photos in the background.
    pub fn add_photos(&mut self, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            return;
        }
        self.encoding_photos = true;
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = encode_batch(&paths).await;
            let _ = tx.send(AppEvent::PhotosEncoded(result));
        });
    }

    /// Copy the order sheet to the system clipboard.
    pub fn copy_order_sheet(&mut self) {
        let text = self.engine.state().order_sheet.clone();
        if text.is_empty() {
            self.set_status("Nothing to copy yet");
            return;
        }

        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(()) => self.copied.mark(Instant::now()),
            Err(e) => self.set_status(format!("Clipboard unavailable: {e}")),
        }
    }

    /// Write the generated renderings into `dir`.
    pub fn export_renderings(&mut self, dir: &Path) {
        let renderings = &self.engine.state().renderings;
        if renderings.is_empty() {
            self.set_status("No renderings to export yet");
            return;
        }

        match export_renderings(renderings, dir) {
            Ok(count) => self.set_status(format!("Saved {count} rendering(s) to {}", dir.display())),
            Err(e) => self.set_status(format!("Export failed: {e}")),
        }
    }

    /// Open an edit session for a target, prefilled with the current value.
    pub fn start_edit(&mut self, target: EditTarget) {
        let (initial, multiline) = match target {
            EditTarget::Requirement(field) => (self.requirement_value(field), false),
            EditTarget::PhotoPath => (String::new(), false),
            EditTarget::Components => (self.engine.state().compatible_components.clone(), true),
            EditTarget::ManualBom => {
                (to_editable_json(&self.engine.state().bill_of_materials), true)
            }
            EditTarget::OrderSheet => (self.engine.state().order_sheet.clone(), true),
        };
        self.mode = Mode::Editing(EditSession::new(target, initial, multiline));
    }

    /// Apply a finished edit session.
    pub fn commit_edit(&mut self, session: EditSession) {
        match session.target {
            EditTarget::Requirement(field) => {
                self.engine.requirements.set_field(field, &session.buffer);
            }
            EditTarget::PhotoPath => {
                let paths: Vec<PathBuf> =
                    session.buffer.split_whitespace().map(PathBuf::from).collect();
                self.add_photos(paths);
            }
            EditTarget::Components => self.engine.set_components_text(session.buffer),
            EditTarget::ManualBom => {
                if let Err(e) = self.engine.apply_manual_bom(&session.buffer) {
                    self.set_status(format!("Bill of materials rejected: {e}"));
                }
            }
            EditTarget::OrderSheet => self.engine.set_order_sheet_text(session.buffer),
        }
        self.mode = Mode::Normal;
    }

    fn requirement_value(&self, field: RequirementField) -> String {
        let requirements = &self.engine.requirements;
        match field {
            RequirementField::DesiredKw => requirements.desired_kw.clone(),
            RequirementField::BatteryKwh => requirements.battery_kwh.clone(),
            RequirementField::PanelType => requirements.panel_type.to_string(),
            RequirementField::InverterType => requirements.inverter_type.to_string(),
            RequirementField::AdditionalNotes => requirements.additional_notes.clone(),
        }
    }

    /// Perform periodic updates: apply completed background work and expire
    /// the copied indicator.
    pub fn tick(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::StepDone(step, outcome) => self.engine.finish(step, outcome),
                AppEvent::PhotosEncoded(result) => {
                    self.encoding_photos = false;
                    match result {
                        Ok(photos) => {
                            let count = photos.len();
                            self.engine.photos.extend(photos);
                            self.set_status(format!("Added {count} photo(s)"));
                        }
                        Err(e) => self.set_status(format!("Photo import failed: {e}")),
                    }
                }
            }
        }

        self.copied.tick(Instant::now());
    }
}

/// Write renderings to `dir` as `rendering-1.jpg`, `rendering-2.png`, ...
pub fn export_renderings(renderings: &[Rendering], dir: &Path) -> anyhow::Result<usize> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    for (i, rendering) in renderings.iter().enumerate() {
        let path = dir.join(format!("rendering-{}.{}", i + 1, rendering.file_extension()));
        let bytes = rendering.decode().context("invalid image payload")?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(renderings.len())
}

/// Hint shown when a step's precondition does not hold.
fn precondition_hint(step: StepKey) -> &'static str {
    match step {
        StepKey::Analysis => "Enter the desired kW first",
        StepKey::Renderings => "Run the analysis and add at least one site photo first",
        StepKey::BillOfMaterials => "Generate renderings successfully first",
        StepKey::OrderSheet => "Generate or enter a bill of materials first",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copied_indicator_reverts_after_delay() {
        let mut copied = CopiedIndicator::default();
        let start = Instant::now();

        copied.mark(start);
        assert!(copied.visible());

        // Still visible just before the reset delay.
        copied.tick(start + Duration::from_millis(1900));
        assert!(copied.visible());

        copied.tick(start + COPIED_RESET);
        assert!(!copied.visible());

        // Further ticks are a no-op.
        copied.tick(start + Duration::from_secs(10));
        assert!(!copied.visible());
    }

    #[test]
    fn test_focus_cycle_wraps() {
        let mut focus = Focus::Photos;
        for _ in 0..Focus::ORDER.len() {
            focus = focus.next();
        }
        assert_eq!(focus, Focus::Photos);

        assert_eq!(Focus::Photos.prev(), Focus::Step(StepKey::OrderSheet));
        assert_eq!(Focus::Step(StepKey::OrderSheet).next(), Focus::Photos);
    }

    #[test]
    fn test_edit_session_cursor_operations() {
        let mut session = EditSession::new(EditTarget::PhotoPath, String::new(), false);
        for c in "rof".chars() {
            session.insert(c);
        }
        session.left();
        session.left();
        session.insert('o');
        assert_eq!(session.buffer, "roof");

        session.end();
        session.backspace();
        assert_eq!(session.buffer, "roo");

        session.home();
        session.backspace(); // at the start, nothing happens
        assert_eq!(session.buffer, "roo");
    }

    #[test]
    fn test_edit_session_prefill_places_cursor_at_end() {
        let session = EditSession::new(EditTarget::Components, "abc".to_string(), true);
        assert_eq!(session.cursor, 3);
    }

    #[test]
    fn test_export_renderings_writes_decoded_files() {
        let dir = tempfile::tempdir().unwrap();
        let renderings = vec![Rendering {
            mime_type: "image/png".to_string(),
            base64: "aGVsbG8=".to_string(),
        }];

        let count = export_renderings(&renderings, dir.path()).unwrap();
        assert_eq!(count, 1);

        let bytes = std::fs::read(dir.path().join("rendering-1.png")).unwrap();
        assert_eq!(bytes, b"hello");
    }
}
