use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::components::map_view::MapSurface;
use crate::reminder::Urgency;
use crate::theme;

/// Per-category marker visibility. Purely presentational: toggling never
/// reclassifies anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterController {
    past: bool,
    imminent: bool,
    future: bool,
}

impl Default for FilterController {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterController {
    pub fn new() -> Self {
        Self {
            past: true,
            imminent: true,
            future: true,
        }
    }

    pub fn is_visible(&self, urgency: Urgency) -> bool {
        match urgency {
            Urgency::Past => self.past,
            Urgency::Imminent => self.imminent,
            Urgency::Future => self.future,
        }
    }

    /// Show or hide every marker of `urgency` currently on `surface`.
    pub fn set_visible(&mut self, urgency: Urgency, visible: bool, surface: &mut dyn MapSurface) {
        match urgency {
            Urgency::Past => self.past = visible,
            Urgency::Imminent => self.imminent = visible,
            Urgency::Future => self.future = visible,
        }

        let matching: Vec<usize> = surface
            .markers()
            .iter()
            .enumerate()
            .filter(|(_, m)| m.urgency == urgency)
            .map(|(id, _)| id)
            .collect();
        for id in &matching {
            surface.set_marker_visible(*id, visible);
        }
        tracing::debug!(?urgency, visible, markers = matching.len(), "filter changed");
    }

    /// Flip one category; returns its new visibility.
    pub fn toggle(&mut self, urgency: Urgency, surface: &mut dyn MapSurface) -> bool {
        let visible = !self.is_visible(urgency);
        self.set_visible(urgency, visible, surface);
        visible
    }
}

/// The checkbox strip drawn as a map control.
pub struct FilterControl;

impl FilterControl {
    const ITEM_W: u16 = 10;
    pub const WIDTH: u16 = Self::ITEM_W * 3 + 1;

    pub fn render(frame: &mut Frame, area: Rect, filters: &FilterController) {
        let theme = theme::current();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border);

        let mut spans = Vec::new();
        for urgency in Urgency::ALL {
            let mark = if filters.is_visible(urgency) { "x" } else { " " };
            let style = if filters.is_visible(urgency) {
                Style::default().fg(theme.urgency_color(urgency)).add_modifier(Modifier::BOLD)
            } else {
                theme.dim
            };
            spans.push(Span::styled(
                format!("[{}]{:<6}", mark, urgency.label()),
                style,
            ));
            spans.push(Span::raw(" "));
        }
        spans.pop();

        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    /// Category whose checkbox sits under column `col` of the control at `area`.
    pub fn hit(area: Rect, col: u16) -> Option<Urgency> {
        let offset = col.checked_sub(area.x + 1)?;
        if col >= area.right().saturating_sub(1) {
            return None;
        }
        Urgency::ALL.get((offset / Self::ITEM_W) as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::marker::tests::RecordingSurface;
    use crate::components::marker::{DetailPopup, MapMarker, SummaryPopup};
    use crate::components::map_view::GeoPoint;
    use ratatui::style::Color;

    fn surface_with(categories: &[Urgency]) -> RecordingSurface {
        let mut surface = RecordingSurface::default();
        for (i, urgency) in categories.iter().enumerate() {
            surface.add_marker(MapMarker {
                reminder_index: i,
                position: GeoPoint { lat: 0.0, lon: 0.0 },
                urgency: *urgency,
                color: Color::White,
                visible: true,
                detail: DetailPopup::default(),
                summary: SummaryPopup::default(),
            });
        }
        surface
    }

    fn visibility(surface: &RecordingSurface) -> Vec<bool> {
        surface.markers.iter().map(|m| m.visible).collect()
    }

    #[test]
    fn hiding_one_category_leaves_others() {
        let mut surface = surface_with(&[Urgency::Past, Urgency::Future, Urgency::Past, Urgency::Imminent]);
        let mut filters = FilterController::new();

        filters.set_visible(Urgency::Past, false, &mut surface);
        assert_eq!(visibility(&surface), vec![false, true, false, true]);
        assert!(!filters.is_visible(Urgency::Past));
        assert!(filters.is_visible(Urgency::Future));

        filters.set_visible(Urgency::Past, true, &mut surface);
        assert_eq!(visibility(&surface), vec![true, true, true, true]);
    }

    #[test]
    fn toggle_does_not_touch_classification() {
        let mut surface = surface_with(&[Urgency::Imminent, Urgency::Future]);
        let before: Vec<Urgency> = surface.markers.iter().map(|m| m.urgency).collect();
        let mut filters = FilterController::new();

        assert!(!filters.toggle(Urgency::Imminent, &mut surface));
        assert_eq!(visibility(&surface), vec![false, true]);
        assert!(filters.toggle(Urgency::Imminent, &mut surface));

        let after: Vec<Urgency> = surface.markers.iter().map(|m| m.urgency).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn hit_maps_columns_to_checkboxes() {
        let area = Rect::new(10, 0, FilterControl::WIDTH, 3);
        assert_eq!(FilterControl::hit(area, 10), None);
        assert_eq!(FilterControl::hit(area, 11), Some(Urgency::Future));
        assert_eq!(FilterControl::hit(area, 21), Some(Urgency::Imminent));
        assert_eq!(FilterControl::hit(area, 31), Some(Urgency::Past));
        assert_eq!(FilterControl::hit(area, area.right() - 1), None);
    }
}
