//! Input handling for the TUI.
//!
//! Keys are dispatched on the current mode: Normal drives focus and step
//! triggers, Editing feeds the active edit session.

use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, EditTarget, Focus, Mode};
use crate::core::RequirementField;
use crate::workflow::StepKey;

/// Handle a key event.
pub fn handle_events(key: KeyEvent, app: &mut App) {
    match app.mode {
        Mode::Normal => handle_normal(key, app),
        Mode::Editing(_) => handle_editing(key, app),
    }
}

fn handle_normal(key: KeyEvent, app: &mut App) {
    app.status_message = None;

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => app.focus = app.focus.next(),
        KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => app.focus = app.focus.prev(),
        KeyCode::Char('p') => app.start_edit(EditTarget::PhotoPath),
        KeyCode::Char('c') => app.copy_order_sheet(),
        KeyCode::Char('s') => app.export_renderings(Path::new("renderings")),
        KeyCode::Char('1') => app.trigger_step(StepKey::Analysis),
        KeyCode::Char('2') => app.trigger_step(StepKey::Renderings),
        KeyCode::Char('3') => app.trigger_step(StepKey::BillOfMaterials),
        KeyCode::Char('4') => app.trigger_step(StepKey::OrderSheet),
        KeyCode::Enter => activate_focused(app),
        _ => {}
    }
}

/// Enter on the focused widget: edit a field, cycle a selector, or act on a
/// step panel (generate online, edit manually offline).
fn activate_focused(app: &mut App) {
    match app.focus {
        Focus::Photos => app.start_edit(EditTarget::PhotoPath),
        Focus::DesiredKw => app.start_edit(EditTarget::Requirement(RequirementField::DesiredKw)),
        Focus::BatteryKwh => {
            app.start_edit(EditTarget::Requirement(RequirementField::BatteryKwh));
        }
        Focus::PanelType => {
            let requirements = &mut app.engine.requirements;
            requirements.panel_type = requirements.panel_type.cycle();
        }
        Focus::InverterType => {
            let requirements = &mut app.engine.requirements;
            requirements.inverter_type = requirements.inverter_type.cycle();
        }
        Focus::AdditionalNotes => {
            app.start_edit(EditTarget::Requirement(RequirementField::AdditionalNotes));
        }
        Focus::Step(step) => {
            if app.engine.ai_online() {
                app.trigger_step(step);
            } else if let Some(target) = manual_target(step) {
                app.start_edit(target);
            } else {
                app.set_status("In manual mode the renderings panel shows your uploaded photos");
            }
        }
    }
}

/// The manual editor backing a step panel, if it has one.
fn manual_target(step: StepKey) -> Option<EditTarget> {
    match step {
        StepKey::Analysis => Some(EditTarget::Components),
        StepKey::Renderings => None,
        StepKey::BillOfMaterials => Some(EditTarget::ManualBom),
        StepKey::OrderSheet => Some(EditTarget::OrderSheet),
    }
}

fn handle_editing(key: KeyEvent, app: &mut App) {
    let Mode::Editing(mut session) = std::mem::replace(&mut app.mode, Mode::Normal) else {
        return;
    };

    match key.code {
        // Cancel: mode is already back to Normal.
        KeyCode::Esc => {}
        KeyCode::Enter if session.multiline => {
            session.insert('\n');
            app.mode = Mode::Editing(session);
        }
        KeyCode::Enter => app.commit_edit(session),
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.commit_edit(session);
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            session.insert(c);
            app.mode = Mode::Editing(session);
        }
        KeyCode::Backspace => {
            session.backspace();
            app.mode = Mode::Editing(session);
        }
        KeyCode::Left => {
            session.left();
            app.mode = Mode::Editing(session);
        }
        KeyCode::Right => {
            session.right();
            app.mode = Mode::Editing(session);
        }
        KeyCode::Home => {
            session.home();
            app.mode = Mode::Editing(session);
        }
        KeyCode::End => {
            session.end();
            app.mode = Mode::Editing(session);
        }
        _ => app.mode = Mode::Editing(session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Config, PanelType};

    fn test_app(rt: &tokio::runtime::Runtime) -> App {
        App::new(Config::default(), rt.handle().clone())
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_quit_key() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = test_app(&rt);

        handle_events(press(KeyCode::Char('q')), &mut app);
        assert!(app.should_quit);
    }

    #[test]
    fn test_tab_cycles_focus() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = test_app(&rt);

        assert_eq!(app.focus, Focus::Photos);
        handle_events(press(KeyCode::Tab), &mut app);
        assert_eq!(app.focus, Focus::DesiredKw);
        handle_events(press(KeyCode::BackTab), &mut app);
        assert_eq!(app.focus, Focus::Photos);
    }

    #[test]
    fn test_enter_cycles_panel_type_selector() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = test_app(&rt);
        app.focus = Focus::PanelType;

        assert_eq!(app.engine.requirements.panel_type, PanelType::Monocrystalline);
        handle_events(press(KeyCode::Enter), &mut app);
        assert_eq!(app.engine.requirements.panel_type, PanelType::Polycrystalline);
    }

    #[test]
    fn test_edit_commit_updates_requirements() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = test_app(&rt);
        app.focus = Focus::DesiredKw;

        handle_events(press(KeyCode::Enter), &mut app);
        assert!(matches!(app.mode, Mode::Editing(_)));

        // Clear the prefilled "10" and type a new value.
        handle_events(press(KeyCode::Backspace), &mut app);
        handle_events(press(KeyCode::Backspace), &mut app);
        handle_events(press(KeyCode::Char('8')), &mut app);
        handle_events(press(KeyCode::Enter), &mut app);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.engine.requirements.desired_kw, "8");
    }

    #[test]
    fn test_edit_escape_cancels() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = test_app(&rt);
        app.focus = Focus::DesiredKw;

        handle_events(press(KeyCode::Enter), &mut app);
        handle_events(press(KeyCode::Char('x')), &mut app);
        handle_events(press(KeyCode::Esc), &mut app);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.engine.requirements.desired_kw, "10");
    }
}
