use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

use crate::reminder::Urgency;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the theme built from configuration. Later calls are ignored.
pub fn init(theme: Theme) {
    if THEME.set(theme).is_err() {
        tracing::debug!("theme already initialised");
    }
}

/// Get the active theme (default until `init` runs).
pub fn current() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Const fallbacks used in places that need compile-time styles
pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::White)
    .add_modifier(Modifier::BOLD);
pub const DIM_STYLE: Style = Style::new().fg(Color::DarkGray);

#[derive(Debug, Clone)]
pub struct Theme {
    #[allow(dead_code)]
    pub name: String,
    pub header: Style,
    pub dim: Style,
    pub border: Style,
    pub status: Style,
    pub active: Style,
    pub error: Style,
    pub land: Color,
    pub cursor: Color,
    pub past: Color,
    pub imminent: Color,
    pub future: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            header: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::DarkGray),
            border: Style::default().fg(Color::Gray),
            status: Style::default().fg(Color::White).bg(Color::DarkGray),
            active: Style::default().fg(Color::Cyan),
            error: Style::default().fg(Color::LightRed),
            land: Color::Gray,
            cursor: Color::Cyan,
            past: Urgency::Past.default_color(),
            imminent: Urgency::Imminent.default_color(),
            future: Urgency::Future.default_color(),
        }
    }
}

impl Theme {
    /// Marker color for an urgency category.
    pub fn urgency_color(&self, urgency: Urgency) -> Color {
        match urgency {
            Urgency::Past => self.past,
            Urgency::Imminent => self.imminent,
            Urgency::Future => self.future,
        }
    }

    /// Get a built-in preset by name.
    pub fn preset(name: &str) -> Self {
        match name {
            "dracula" => Self::dracula(),
            "gruvbox" => Self::gruvbox(),
            "nord" => Self::nord(),
            _ => Self::default(),
        }
    }

    fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            header: Style::default().fg(Color::Rgb(248, 248, 242)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(98, 114, 164)),
            border: Style::default().fg(Color::Rgb(68, 71, 90)),
            status: Style::default()
                .fg(Color::Rgb(248, 248, 242))
                .bg(Color::Rgb(68, 71, 90)),
            active: Style::default().fg(Color::Rgb(139, 233, 253)),
            land: Color::Rgb(98, 114, 164),
            cursor: Color::Rgb(139, 233, 253),
            past: Color::Rgb(255, 85, 85),
            imminent: Color::Rgb(255, 184, 108),
            future: Color::Rgb(80, 250, 123),
            ..Self::default()
        }
    }

    fn gruvbox() -> Self {
        Self {
            name: "gruvbox".to_string(),
            header: Style::default().fg(Color::Rgb(235, 219, 178)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(146, 131, 116)),
            border: Style::default().fg(Color::Rgb(102, 92, 84)),
            status: Style::default()
                .fg(Color::Rgb(235, 219, 178))
                .bg(Color::Rgb(80, 73, 69)),
            active: Style::default().fg(Color::Rgb(131, 165, 152)),
            land: Color::Rgb(146, 131, 116),
            cursor: Color::Rgb(131, 165, 152),
            past: Color::Rgb(251, 73, 52),
            imminent: Color::Rgb(254, 128, 25),
            future: Color::Rgb(184, 187, 38),
            ..Self::default()
        }
    }

    fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            header: Style::default().fg(Color::Rgb(229, 233, 240)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(76, 86, 106)),
            border: Style::default().fg(Color::Rgb(67, 76, 94)),
            status: Style::default()
                .fg(Color::Rgb(229, 233, 240))
                .bg(Color::Rgb(67, 76, 94)),
            active: Style::default().fg(Color::Rgb(136, 192, 208)),
            land: Color::Rgb(76, 86, 106),
            cursor: Color::Rgb(136, 192, 208),
            past: Color::Rgb(191, 97, 106),
            imminent: Color::Rgb(208, 135, 112),
            future: Color::Rgb(163, 190, 140),
            ..Self::default()
        }
    }
}

// ── TOML config types ──

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ThemeConfig {
    preset: Option<String>,
    header_fg: Option<String>,
    dim_fg: Option<String>,
    border_fg: Option<String>,
    status_fg: Option<String>,
    status_bg: Option<String>,
    land: Option<String>,
    past: Option<String>,
    imminent: Option<String>,
    future: Option<String>,
}

impl ThemeConfig {
    pub fn into_theme(self) -> Theme {
        // Start from preset or default
        let mut theme = self
            .preset
            .as_deref()
            .map(Theme::preset)
            .unwrap_or_default();

        // Override individual colors
        if let Some(c) = self.header_fg.as_deref().and_then(parse_color) {
            theme.header = theme.header.fg(c);
        }
        if let Some(c) = self.dim_fg.as_deref().and_then(parse_color) {
            theme.dim = theme.dim.fg(c);
        }
        if let Some(c) = self.border_fg.as_deref().and_then(parse_color) {
            theme.border = theme.border.fg(c);
        }
        if let Some(c) = self.status_fg.as_deref().and_then(parse_color) {
            theme.status = theme.status.fg(c);
        }
        if let Some(c) = self.status_bg.as_deref().and_then(parse_color) {
            theme.status = theme.status.bg(c);
        }
        if let Some(c) = self.land.as_deref().and_then(parse_color) {
            theme.land = c;
        }
        if let Some(c) = self.past.as_deref().and_then(parse_color) {
            theme.past = c;
        }
        if let Some(c) = self.imminent.as_deref().and_then(parse_color) {
            theme.imminent = c;
        }
        if let Some(c) = self.future.as_deref().and_then(parse_color) {
            theme.future = c;
        }

        theme
    }
}

/// Parse a color string: hex "#rrggbb", or named colors.
fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if s.starts_with('#') && s.len() == 7 {
        let r = u8::from_str_radix(&s[1..3], 16).ok()?;
        let g = u8::from_str_radix(&s[3..5], 16).ok()?;
        let b = u8::from_str_radix(&s[5..7], 16).ok()?;
        return Some(Color::Rgb(r, g, b));
    }
    match s.to_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "orange" => Some(Color::Rgb(255, 165, 0)),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "gray" | "grey" => Some(Color::Gray),
        "darkgray" | "darkgrey" => Some(Color::DarkGray),
        "lightred" => Some(Color::LightRed),
        "lightgreen" => Some(Color::LightGreen),
        "lightyellow" => Some(Color::LightYellow),
        "lightblue" => Some(Color::LightBlue),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_and_named() {
        assert_eq!(parse_color("#ff8000"), Some(Color::Rgb(255, 128, 0)));
        assert_eq!(parse_color(" Orange "), Some(Color::Rgb(255, 165, 0)));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("mauve"), None);
    }

    #[test]
    fn overrides_apply_on_top_of_preset() {
        let cfg: ThemeConfig = toml::from_str(
            r##"
            preset = "nord"
            past = "#010203"
            "##,
        )
        .unwrap();
        let theme = cfg.into_theme();
        assert_eq!(theme.name, "nord");
        assert_eq!(theme.urgency_color(Urgency::Past), Color::Rgb(1, 2, 3));
        assert_eq!(theme.urgency_color(Urgency::Future), Color::Rgb(163, 190, 140));
    }

    #[test]
    fn default_palette_is_red_orange_green() {
        let theme = Theme::default();
        assert_eq!(theme.urgency_color(Urgency::Past), Color::Red);
        assert_eq!(theme.urgency_color(Urgency::Imminent), Color::Rgb(255, 165, 0));
        assert_eq!(theme.urgency_color(Urgency::Future), Color::Green);
    }
}
