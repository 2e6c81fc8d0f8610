//! Terminal User Interface module.
//!
//! Rendering and input handling for the interactive planner, built on
//! ratatui.

mod app;
mod input;
mod theme;
mod ui;

pub use app::run_tui;
pub use input::handle_events;
pub use theme::{parse_hex_color, Theme};
pub use ui::draw;
