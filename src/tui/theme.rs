//! Theme support for the TUI.
//!
//! A single dark palette modeled on the planner's web styling, with an
//! optional accent override from the config file.

use ratatui::style::Color;

use crate::core::UiConfig;

/// A complete color theme for the TUI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Accent color (titles, active borders, completed workflow nodes)
    pub accent: Color,
    /// Main text color
    pub text: Color,
    /// Dimmed text color (descriptions, secondary info)
    pub text_dim: Color,
    /// Muted text color (placeholders, hints)
    pub text_muted: Color,
    /// Border color
    pub border: Color,
    /// Focused item background
    pub selected_bg: Color,
    /// Success indicator color
    pub success: Color,
    /// Warning indicator color (offline banner)
    pub warning: Color,
    /// Error indicator color
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Rgb(163, 230, 53),      // Lime
            text: Color::Rgb(229, 231, 235),       // Gray-200
            text_dim: Color::Rgb(156, 163, 175),   // Gray-400
            text_muted: Color::Rgb(107, 114, 128), // Gray-500
            border: Color::Rgb(51, 65, 85),        // Slate-700
            selected_bg: Color::Rgb(30, 41, 59),   // Slate-800
            success: Color::Rgb(163, 230, 53),     // Lime
            warning: Color::Rgb(234, 179, 8),      // Yellow
            error: Color::Rgb(248, 113, 113),      // Red-400
        }
    }
}

impl Theme {
    /// Build the theme, applying any accent override from the config.
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = Self::default();
        if let Some(accent) = ui.accent.as_deref().and_then(parse_hex_color) {
            theme.accent = accent;
            theme.success = accent;
        }
        theme
    }
}

/// Parse a "#RRGGBB" hex color string.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#A3E635"), Some(Color::Rgb(163, 230, 53)));
        assert_eq!(parse_hex_color("a3e635"), Some(Color::Rgb(163, 230, 53)));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("not a color"), None);
    }

    #[test]
    fn test_accent_override() {
        let ui = UiConfig { accent: Some("#FF0000".to_string()), ..UiConfig::default() };
        let theme = Theme::from_config(&ui);
        assert_eq!(theme.accent, Color::Rgb(255, 0, 0));

        let bad = UiConfig { accent: Some("nope".to_string()), ..UiConfig::default() };
        assert_eq!(Theme::from_config(&bad).accent, Theme::default().accent);
    }
}
