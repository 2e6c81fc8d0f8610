//! UI rendering for the TUI.
//!
//! Handles layout and widget rendering using ratatui. The screen mirrors the
//! planner's workflow: header with AI status, the five-node workflow strip,
//! the inputs form on the left and the four step panels on the right.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{EditTarget, Focus, Mode};
use crate::workflow::{StepKey, StepPhase};
use crate::App;

/// Draw the main UI.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let banner_height = if app.engine.ai_online() { 0 } else { 3 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Header
            Constraint::Length(banner_height), // Offline banner
            Constraint::Length(3),             // Workflow strip
            Constraint::Min(10),               // Main content
            Constraint::Length(1),             // Status bar
        ])
        .split(area);

    draw_header(frame, app, chunks[0]);
    if banner_height > 0 {
        draw_offline_banner(frame, app, chunks[1]);
    }
    draw_workflow_strip(frame, app, chunks[2]);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(34), Constraint::Percentage(66)])
        .split(chunks[3]);

    draw_inputs(frame, app, content[0]);
    draw_steps(frame, app, content[1]);
    draw_status_bar(frame, app, chunks[4]);

    if let Mode::Editing(session) = &app.mode {
        draw_edit_overlay(frame, app, session);
    }
}

/// Header: app name on the left, AI status pill on the right.
fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let (status_text, status_style) = if app.engine.ai_online() {
        ("AI: Online", Style::default().fg(theme.success))
    } else {
        ("AI: Offline", Style::default().fg(theme.error))
    };

    let title = Line::from(vec![
        Span::styled("solar", Style::default().fg(theme.text).add_modifier(Modifier::BOLD)),
        Span::styled("plan", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
        Span::styled("  AI-assisted installation planner", Style::default().fg(theme.text_dim)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(Line::from(Span::styled(status_text, status_style)).right_aligned());

    frame.render_widget(Paragraph::new(title).block(block), area);
}

/// Offline banner shown while no API key is configured.
fn draw_offline_banner(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let text = Line::from(vec![
        Span::styled("AI features unavailable. ", Style::default().fg(theme.warning).add_modifier(Modifier::BOLD)),
        Span::styled(
            "No Gemini API key configured (`solarplan key set` or GEMINI_API_KEY). Manual data entry is enabled.",
            Style::default().fg(theme.text_dim),
        ),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.warning));
    frame.render_widget(Paragraph::new(text).block(block), area);
}

/// The five-node workflow diagram: Inputs plus the four generation steps.
fn draw_workflow_strip(frame: &mut Frame, app: &App, area: Rect) {
    fn node(
        theme: &crate::tui::Theme,
        label: &'static str,
        done: bool,
        running: bool,
    ) -> Span<'static> {
        let glyph = if done {
            "(*)"
        } else if running {
            "(~)"
        } else {
            "( )"
        };
        let style = if done {
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
        } else if running {
            Style::default().fg(theme.warning)
        } else {
            Style::default().fg(theme.text_muted)
        };
        Span::styled(format!("{glyph} {label}"), style)
    }

    let theme = &app.theme;
    let mut spans: Vec<Span> = Vec::new();

    spans.push(node(theme, "Inputs", app.engine.inputs_complete(), app.encoding_photos));
    for step in StepKey::ALL {
        spans.push(Span::styled("  --  ", Style::default().fg(theme.border)));
        let status = app.engine.status(step);
        spans.push(node(theme, step.title(), status.success, status.loading));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(" Project Workflow ");
    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center).block(block),
        area,
    );
}

/// The inputs column: photos and the requirements form.
fn draw_inputs(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let requirements = &app.engine.requirements;
    let mut lines: Vec<Line> = Vec::new();

    let focus_style = Style::default().bg(theme.selected_bg).fg(theme.text);
    let label_style = Style::default().fg(theme.text_dim);
    let value_style = Style::default().fg(theme.text);

    // Photos
    let photos_line = format!(
        "Site Photos ({}){}",
        app.engine.photos.len(),
        if app.encoding_photos { "  encoding..." } else { "" }
    );
    lines.push(Line::from(Span::styled(
        photos_line,
        if app.focus == Focus::Photos { focus_style } else { label_style },
    )));
    for photo in app.engine.photos.photos().iter().rev().take(3).rev() {
        lines.push(Line::from(Span::styled(format!("  {}", photo.name), value_style)));
    }
    lines.push(Line::from(""));

    // Requirements fields
    let fields: [(Focus, &str, String); 5] = [
        (Focus::DesiredKw, "Desired kW", requirements.desired_kw.clone()),
        (Focus::BatteryKwh, "Battery kWh", requirements.battery_kwh.clone()),
        (Focus::PanelType, "Panel type", requirements.panel_type.to_string()),
        (Focus::InverterType, "Inverter type", requirements.inverter_type.to_string()),
        (Focus::AdditionalNotes, "Notes", requirements.additional_notes.clone()),
    ];

    for (focus, label, value) in fields {
        let style = if app.focus == focus { focus_style } else { label_style };
        lines.push(Line::from(vec![
            Span::styled(format!("{label}: "), style),
            Span::styled(value, value_style),
        ]));
    }

    let focused = matches!(
        app.focus,
        Focus::Photos
            | Focus::DesiredKw
            | Focus::BatteryKwh
            | Focus::PanelType
            | Focus::InverterType
            | Focus::AdditionalNotes
    );
    let border_style = if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.border)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(" 1. Site & System Inputs ");
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}

/// The 2x2 grid of step panels.
fn draw_steps(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    draw_step_panel(frame, app, StepKey::Analysis, top[0]);
    draw_step_panel(frame, app, StepKey::Renderings, top[1]);
    draw_step_panel(frame, app, StepKey::BillOfMaterials, bottom[0]);
    draw_step_panel(frame, app, StepKey::OrderSheet, bottom[1]);
}

/// One step panel: title with status glyph, error or output body.
fn draw_step_panel(frame: &mut Frame, app: &App, step: StepKey, area: Rect) {
    let theme = &app.theme;
    let status = app.engine.status(step);

    let (glyph, glyph_style) = match status.phase() {
        StepPhase::Idle => ("   ", Style::default().fg(theme.text_muted)),
        StepPhase::Running => (" ~ ", Style::default().fg(theme.warning)),
        StepPhase::Succeeded => (" + ", Style::default().fg(theme.success)),
        StepPhase::Failed => (" ! ", Style::default().fg(theme.error)),
    };

    let border_style = if app.focus == Focus::Step(step) {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.border)
    };

    let mut title_text = format!(" {} ", step.title());
    if step == StepKey::OrderSheet && app.copied.visible() {
        title_text.push_str("[Copied!] ");
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(title_text, Style::default().fg(theme.accent)))
        .title(Line::from(Span::styled(glyph, glyph_style)).right_aligned());

    // The BOM renders as a table; everything else as wrapped text lines.
    if step == StepKey::BillOfMaterials
        && status.error.is_none()
        && !app.engine.state().bill_of_materials.is_empty()
    {
        let rows: Vec<Row> = app
            .engine
            .state()
            .bill_of_materials
            .iter()
            .map(|item| {
                Row::new(vec![
                    item.item.clone(),
                    item.quantity.to_string(),
                    item.vendor.clone(),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [Constraint::Percentage(50), Constraint::Length(5), Constraint::Percentage(40)],
        )
        .header(
            Row::new(vec!["Item", "Qty", "Vendor"])
                .style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
        )
        .block(block);

        frame.render_widget(table, area);
        return;
    }

    let lines = step_body_lines(app, step);
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}

/// Body text for a step panel.
fn step_body_lines(app: &App, step: StepKey) -> Vec<Line<'static>> {
    let theme = &app.theme;
    let state = app.engine.state();
    let status = app.engine.status(step);
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        step.description().to_string(),
        Style::default().fg(theme.text_muted),
    )));

    if let Some(error) = &status.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(theme.error),
        )));
        return lines;
    }

    let body_style = Style::default().fg(theme.text);
    match step {
        StepKey::Analysis => {
            if state.compatible_components.is_empty() {
                lines.push(placeholder(app, "Generated component list will appear here", "Enter a component list manually"));
            } else {
                for row in state.compatible_components.lines().take(12) {
                    lines.push(Line::from(Span::styled(row.to_string(), body_style)));
                }
            }
        }
        StepKey::Renderings => {
            if state.renderings.is_empty() {
                if app.engine.ai_online() {
                    lines.push(placeholder(app, "Generated renderings will appear here", ""));
                } else {
                    // Manual mode shows the uploaded site photos instead.
                    for photo in app.engine.photos.photos() {
                        lines.push(Line::from(Span::styled(
                            format!("{} ({} KB)", photo.name, photo.size_bytes() / 1024),
                            body_style,
                        )));
                    }
                    lines.push(Line::from(Span::styled(
                        "In manual mode this panel lists the uploaded site photos.".to_string(),
                        Style::default().fg(theme.text_muted),
                    )));
                }
            } else {
                for (i, rendering) in state.renderings.iter().enumerate() {
                    lines.push(Line::from(Span::styled(
                        format!(
                            "rendering-{}.{} ({} KB)",
                            i + 1,
                            rendering.file_extension(),
                            rendering.size_bytes() / 1024
                        ),
                        body_style,
                    )));
                }
                lines.push(Line::from(Span::styled(
                    "[s] save to ./renderings".to_string(),
                    Style::default().fg(theme.text_muted),
                )));
            }
        }
        StepKey::BillOfMaterials => {
            lines.push(placeholder(
                app,
                "Generated bill of materials will appear here",
                "Enter a JSON array of material items",
            ));
        }
        StepKey::OrderSheet => {
            if state.order_sheet.is_empty() {
                lines.push(placeholder(app, "Generated order sheet will appear here", "Write the order sheet manually"));
            } else {
                for row in state.order_sheet.lines().take(10) {
                    lines.push(Line::from(Span::styled(row.to_string(), body_style)));
                }
                lines.push(Line::from(Span::styled(
                    "[c] copy to clipboard".to_string(),
                    Style::default().fg(theme.text_muted),
                )));
            }
        }
    }

    lines
}

fn placeholder(app: &App, online: &str, manual: &str) -> Line<'static> {
    let text = if app.engine.ai_online() || manual.is_empty() { online } else { manual };
    Line::from(Span::styled(
        format!("{text}..."),
        Style::default().fg(app.theme.text_muted),
    ))
}

/// Status bar: transient message, or key hints.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let text = if let Some(message) = &app.status_message {
        message.clone()
    } else if app.config.ui.show_help {
        let action = if app.engine.ai_online() { "generate" } else { "edit" };
        format!("tab/shift-tab focus | enter {action} | 1-4 run step | p photos | c copy | s save | q quit")
    } else {
        String::new()
    };

    frame.render_widget(
        Paragraph::new(Span::styled(text, Style::default().fg(theme.text_dim))),
        area,
    );
}

/// Centered popup for an active edit session.
fn draw_edit_overlay(frame: &mut Frame, app: &App, session: &crate::app::EditSession) {
    let theme = &app.theme;
    let area = frame.area();
    let popup = centered_rect(area, 70, if session.multiline { 60 } else { 20 });

    let title = match session.target {
        EditTarget::Requirement(_) => " Edit field ",
        EditTarget::PhotoPath => " Add photos (space-separated paths) ",
        EditTarget::Components => " Component list (manual) ",
        EditTarget::ManualBom => " Bill of materials JSON (manual) ",
        EditTarget::OrderSheet => " Order sheet (manual) ",
    };
    let hint = if session.multiline { " esc cancel | ctrl-s apply " } else { " esc cancel | enter apply " };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent))
        .title(title)
        .title(Line::from(Span::styled(hint, Style::default().fg(theme.text_muted))).right_aligned());

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(session.buffer.clone())
            .style(Style::default().fg(theme.text))
            .wrap(Wrap { trim: false })
            .block(block),
        popup,
    );

    let (line, col) = cursor_line_col(&session.buffer, session.cursor);
    frame.set_cursor_position(Position::new(
        popup.x.saturating_add(1).saturating_add(col),
        popup.y.saturating_add(1).saturating_add(line),
    ));
}

/// Line and column of a character index within a buffer.
fn cursor_line_col(buffer: &str, cursor: usize) -> (u16, u16) {
    let before: String = buffer.chars().take(cursor).collect();
    let line = before.matches('\n').count();
    let col = before.chars().rev().take_while(|c| *c != '\n').count();
    (line.min(u16::MAX as usize) as u16, col.min(u16::MAX as usize) as u16)
}

/// A rectangle centered in `area` sized by percentages.
fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_line_col() {
        assert_eq!(cursor_line_col("abc", 2), (0, 2));
        assert_eq!(cursor_line_col("ab\ncd", 3), (1, 0));
        assert_eq!(cursor_line_col("ab\ncd", 5), (1, 2));
        assert_eq!(cursor_line_col("", 0), (0, 0));
    }

    #[test]
    fn test_centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(area, 70, 60);
        assert!(popup.width <= area.width);
        assert!(popup.height <= area.height);
        assert!(popup.x >= area.x && popup.y >= area.y);
    }
}
