use ratatui::{
    layout::{Position, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Map, MapResolution},
        Block, Borders, Clear, Paragraph,
    },
    Frame,
};

use crate::components::filters::{FilterControl, FilterController};
use crate::components::marker::MapMarker;
use crate::config::{MapConfig, MapDetail};
use crate::reminder::Urgency;
use crate::theme;

pub type MarkerId = usize;

const MIN_ZOOM: f64 = 0.0;
const MAX_ZOOM: f64 = 12.0;
const MAX_LAT: f64 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAnchor {
    TopLeft,
    TopRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapControl {
    Filters,
    Refresh,
}

impl MapControl {
    fn size(&self) -> (u16, u16) {
        match self {
            MapControl::Filters => (FilterControl::WIDTH, 3),
            MapControl::Refresh => (13, 3),
        }
    }
}

/// What a click on the map area hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    /// Consumed by the one-shot coordinate listener.
    Picked(GeoPoint),
    Marker(MarkerId),
    Filter(Urgency),
    Refresh,
    Map(GeoPoint),
}

/// The host surface markers, popups and controls are attached to.
pub trait MapSurface {
    fn add_marker(&mut self, marker: MapMarker) -> MarkerId;
    fn markers(&self) -> &[MapMarker];
    fn set_marker_visible(&mut self, id: MarkerId, visible: bool);
    fn clear_markers(&mut self);
    /// Register a listener for the next map click only.
    fn once_click(&mut self);
    fn add_control(&mut self, anchor: ControlAnchor, control: MapControl);
    fn remove_control(&mut self, control: MapControl);
}

/// Equirectangular view onto the world map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: GeoPoint,
    pub zoom: f64,
}

impl Viewport {
    /// Degrees of longitude across the view; halves with each zoom level.
    pub fn lon_span(&self) -> f64 {
        (720.0 / 2f64.powf(self.zoom)).min(360.0)
    }

    /// `(x_bounds, y_bounds)` for a canvas of `area`. Terminal cells are about
    /// twice as tall as wide, so latitude span follows the aspect ratio.
    pub fn bounds(&self, area: Rect) -> ([f64; 2], [f64; 2]) {
        let lon_span = self.lon_span();
        let w = area.width.max(1) as f64;
        let h = area.height.max(1) as f64;
        let lat_span = (lon_span * 2.0 * h / w).min(180.0);
        (
            [self.center.lon - lon_span / 2.0, self.center.lon + lon_span / 2.0],
            [self.center.lat - lat_span / 2.0, self.center.lat + lat_span / 2.0],
        )
    }

    pub fn to_geo(&self, area: Rect, col: u16, row: u16) -> Option<GeoPoint> {
        if !area.contains(Position::new(col, row)) {
            return None;
        }
        let ([x0, x1], [y0, y1]) = self.bounds(area);
        let cols = area.width.saturating_sub(1).max(1) as f64;
        let rows = area.height.saturating_sub(1).max(1) as f64;
        Some(GeoPoint {
            lon: x0 + (col - area.x) as f64 * (x1 - x0) / cols,
            lat: y1 - (row - area.y) as f64 * (y1 - y0) / rows,
        })
    }

    pub fn to_cell(&self, area: Rect, point: GeoPoint) -> Option<(u16, u16)> {
        let ([x0, x1], [y0, y1]) = self.bounds(area);
        let cols = area.width.saturating_sub(1).max(1) as f64;
        let rows = area.height.saturating_sub(1).max(1) as f64;
        let col = ((point.lon - x0) * cols / (x1 - x0)).round();
        let row = ((y1 - point.lat) * rows / (y1 - y0)).round();
        if !(0.0..=cols).contains(&col) || !(0.0..=rows).contains(&row) {
            return None;
        }
        Some((area.x + col as u16, area.y + row as u16))
    }

    /// Move the center by a fraction of the visible longitude span.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let step = self.lon_span();
        let mut lon = self.center.lon + dx * step;
        if lon > 180.0 {
            lon -= 360.0;
        } else if lon < -180.0 {
            lon += 360.0;
        }
        self.center.lon = lon;
        self.center.lat = (self.center.lat + dy * step / 2.0).clamp(-MAX_LAT, MAX_LAT);
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

pub struct MapView {
    viewport: Viewport,
    resolution: MapResolution,
    area: Rect,
    markers: Vec<MapMarker>,
    controls: Vec<(ControlAnchor, MapControl)>,
    click_listener: bool,
    cursor: Option<GeoPoint>,
}

impl MapView {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            viewport: Viewport {
                center: GeoPoint {
                    lat: config.center_lat,
                    lon: config.center_lon,
                },
                zoom: config.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            },
            resolution: match config.detail {
                MapDetail::Low => MapResolution::Low,
                MapDetail::High => MapResolution::High,
            },
            area: Rect::default(),
            markers: Vec::new(),
            controls: Vec::new(),
            click_listener: false,
            cursor: None,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Record the frame area; the map draws inside its border.
    pub fn layout(&mut self, area: Rect) {
        self.area = Block::default().borders(Borders::ALL).inner(area);
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn is_listening(&self) -> bool {
        self.click_listener
    }

    pub fn cursor(&self) -> Option<GeoPoint> {
        self.cursor
    }

    /// Drop a pending click listener without firing it.
    pub fn cancel_listener(&mut self) {
        self.click_listener = false;
        self.cursor = None;
    }

    /// Move the keyboard cursor shown while a click listener is pending.
    pub fn move_cursor(&mut self, dx: f64, dy: f64) {
        let step = self.viewport.lon_span() / 40.0;
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.lon = (cursor.lon + dx * step).clamp(-180.0, 180.0);
            cursor.lat = (cursor.lat + dy * step).clamp(-90.0, 90.0);
        }
    }

    /// Fire the pending listener at the keyboard cursor.
    pub fn confirm_cursor(&mut self) -> Option<GeoPoint> {
        if !self.click_listener {
            return None;
        }
        let point = self.cursor?;
        self.cancel_listener();
        Some(point)
    }

    pub fn controls(&self) -> &[(ControlAnchor, MapControl)] {
        &self.controls
    }

    pub fn has_control(&self, control: MapControl) -> bool {
        self.controls.iter().any(|(_, c)| *c == control)
    }

    /// Resolve a click at terminal cell `(col, row)`.
    pub fn click(&mut self, col: u16, row: u16) -> Option<ClickOutcome> {
        let pos = Position::new(col, row);
        for (anchor, control) in &self.controls {
            let rect = self.control_rect(*anchor, *control);
            if !rect.contains(pos) {
                continue;
            }
            return match control {
                MapControl::Filters => {
                    FilterControl::hit(rect, col).map(ClickOutcome::Filter)
                }
                MapControl::Refresh => Some(ClickOutcome::Refresh),
            };
        }

        let point = self.viewport.to_geo(self.area, col, row)?;
        if self.click_listener {
            self.cancel_listener();
            return Some(ClickOutcome::Picked(point));
        }
        if let Some(id) = self.marker_at(col, row) {
            return Some(ClickOutcome::Marker(id));
        }
        Some(ClickOutcome::Map(point))
    }

    /// Topmost visible marker drawn on or next to `(col, row)`.
    pub fn marker_at(&self, col: u16, row: u16) -> Option<MarkerId> {
        let mut best: Option<(MarkerId, u16)> = None;
        for (id, marker) in self.markers.iter().enumerate().rev() {
            if !marker.visible {
                continue;
            }
            let Some((mc, mr)) = self.viewport.to_cell(self.area, marker.position) else {
                continue;
            };
            let dist = mc.abs_diff(col).max(mr.abs_diff(row));
            if dist <= 1 && best.map_or(true, |(_, d)| dist < d) {
                best = Some((id, dist));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Visible markers after `current`, wrapping around.
    pub fn next_visible(&self, current: Option<MarkerId>) -> Option<MarkerId> {
        let n = self.markers.len();
        let start = current.map_or(0, |c| c + 1);
        (0..n)
            .map(|i| (start + i) % n)
            .find(|&id| self.markers[id].visible)
    }

    pub fn marker(&self, id: MarkerId) -> Option<&MapMarker> {
        self.markers.get(id)
    }

    fn control_rect(&self, anchor: ControlAnchor, control: MapControl) -> Rect {
        let (w, h) = control.size();
        let w = w.min(self.area.width);
        let h = h.min(self.area.height);
        let x = match anchor {
            ControlAnchor::TopLeft => self.area.x,
            ControlAnchor::TopRight => self.area.right().saturating_sub(w),
        };
        Rect::new(x, self.area.y, w, h)
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        outer: Rect,
        filters: &FilterController,
        hovered: Option<MarkerId>,
    ) {
        let theme = theme::current();
        let shown = self.markers.iter().filter(|m| m.visible).count();
        let center = self.viewport.center;

        let block = Block::default()
            .title(" Event Reminders ")
            .title_style(theme.header)
            .title_bottom(Line::from(Span::styled(
                format!(
                    " {:.4}, {:.4}  z{:.1}  {}/{} shown ",
                    center.lat,
                    center.lon,
                    self.viewport.zoom,
                    shown,
                    self.markers.len()
                ),
                theme.dim,
            )))
            .borders(Borders::ALL)
            .border_style(if self.click_listener {
                theme.active
            } else {
                theme.border
            });

        let (x_bounds, y_bounds) = self.viewport.bounds(self.area);
        let resolution = self.resolution;
        let land = theme.land;

        let canvas = Canvas::default()
            .block(block)
            .marker(symbols::Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(|ctx| {
                ctx.draw(&Map {
                    color: land,
                    resolution,
                });
                ctx.layer();
                for (id, marker) in self.markers.iter().enumerate() {
                    if !marker.visible {
                        continue;
                    }
                    let (glyph, style) = if Some(id) == hovered {
                        ("◆", Style::default().fg(marker.color).add_modifier(Modifier::BOLD))
                    } else {
                        ("●", Style::default().fg(marker.color))
                    };
                    ctx.print(marker.position.lon, marker.position.lat, Span::styled(glyph, style));
                }
                if let Some(cursor) = self.cursor {
                    ctx.print(
                        cursor.lon,
                        cursor.lat,
                        Span::styled("+", Style::default().fg(theme.cursor).add_modifier(Modifier::BOLD)),
                    );
                }
            });
        frame.render_widget(canvas, outer);

        for (anchor, control) in &self.controls {
            let rect = self.control_rect(*anchor, *control);
            frame.render_widget(Clear, rect);
            match control {
                MapControl::Filters => FilterControl::render(frame, rect, filters),
                MapControl::Refresh => {
                    let block = Block::default()
                        .borders(Borders::ALL)
                        .border_style(theme.border);
                    let label = Paragraph::new(Line::from(vec![
                        Span::styled("⟳ ", theme.active),
                        Span::raw("Refresh"),
                    ]))
                    .block(block);
                    frame.render_widget(label, rect);
                }
            }
        }
    }
}

impl MapSurface for MapView {
    fn add_marker(&mut self, marker: MapMarker) -> MarkerId {
        self.markers.push(marker);
        self.markers.len() - 1
    }

    fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    fn set_marker_visible(&mut self, id: MarkerId, visible: bool) {
        if let Some(marker) = self.markers.get_mut(id) {
            marker.visible = visible;
        }
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
    }

    fn once_click(&mut self) {
        self.click_listener = true;
        self.cursor = Some(self.viewport.center);
    }

    fn add_control(&mut self, anchor: ControlAnchor, control: MapControl) {
        if self.has_control(control) {
            return;
        }
        self.controls.push((anchor, control));
    }

    fn remove_control(&mut self, control: MapControl) {
        self.controls.retain(|(_, c)| *c != control);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::marker::{DetailPopup, SummaryPopup};
    use ratatui::style::Color;

    fn view() -> MapView {
        let mut view = MapView::new(&MapConfig::default());
        view.layout(Rect::new(0, 0, 82, 32));
        view
    }

    fn marker_at(point: GeoPoint) -> MapMarker {
        MapMarker {
            reminder_index: 0,
            position: point,
            urgency: Urgency::Future,
            color: Color::Green,
            visible: true,
            detail: DetailPopup::default(),
            summary: SummaryPopup::default(),
        }
    }

    #[test]
    fn layout_strips_border() {
        assert_eq!(view().area(), Rect::new(1, 1, 80, 30));
    }

    #[test]
    fn cells_map_to_geo_and_back() {
        let v = view();
        for (col, row) in [(1, 1), (40, 15), (80, 30), (13, 27)] {
            let p = v.viewport().to_geo(v.area(), col, row).unwrap();
            assert_eq!(v.viewport().to_cell(v.area(), p), Some((col, row)));
        }
        assert_eq!(v.viewport().to_geo(v.area(), 0, 0), None);
    }

    #[test]
    fn center_is_inside_bounds() {
        let v = view();
        let ([x0, x1], [y0, y1]) = v.viewport().bounds(v.area());
        assert!(x0 < 2.213749 && 2.213749 < x1);
        assert!(y0 < 47.038165 && 47.038165 < y1);
    }

    #[test]
    fn zoom_halves_span_and_clamps() {
        let mut vp = view().viewport;
        vp.zoom = 2.0;
        let wide = vp.lon_span();
        vp.zoom_by(1.0);
        assert!((vp.lon_span() - wide / 2.0).abs() < 1e-9);
        vp.zoom_by(100.0);
        assert_eq!(vp.zoom, MAX_ZOOM);
        vp.zoom_by(-100.0);
        assert_eq!(vp.lon_span(), 360.0);
    }

    #[test]
    fn pan_wraps_longitude() {
        let mut vp = view().viewport;
        vp.zoom = 0.0;
        vp.center.lon = 170.0;
        vp.pan(0.1, 0.0);
        assert!((vp.center.lon - (-154.0)).abs() < 1e-9);
    }

    #[test]
    fn click_listener_fires_once() {
        let mut v = view();
        v.once_click();
        assert!(v.is_listening());
        assert!(matches!(v.click(40, 15), Some(ClickOutcome::Picked(_))));
        assert!(!v.is_listening());
        assert!(matches!(v.click(40, 15), Some(ClickOutcome::Map(_))));
    }

    #[test]
    fn keyboard_cursor_confirms_listener() {
        let mut v = view();
        assert_eq!(v.confirm_cursor(), None);
        v.once_click();
        v.move_cursor(1.0, 0.0);
        let picked = v.confirm_cursor().unwrap();
        assert!(picked.lon > 2.213749);
        assert!(!v.is_listening());
        assert_eq!(v.cursor(), None);
    }

    #[test]
    fn click_hits_marker_but_not_hidden_one() {
        let mut v = view();
        let point = v.viewport().to_geo(v.area(), 30, 10).unwrap();
        let id = v.add_marker(marker_at(point));
        assert_eq!(v.click(31, 10), Some(ClickOutcome::Marker(id)));
        v.set_marker_visible(id, false);
        assert!(matches!(v.click(30, 10), Some(ClickOutcome::Map(_))));
    }

    #[test]
    fn controls_take_clicks_and_can_be_removed() {
        let mut v = view();
        v.add_control(ControlAnchor::TopLeft, MapControl::Refresh);
        v.add_control(ControlAnchor::TopLeft, MapControl::Refresh);
        assert_eq!(v.controls().len(), 1);
        assert_eq!(v.click(2, 2), Some(ClickOutcome::Refresh));
        v.remove_control(MapControl::Refresh);
        assert!(matches!(v.click(2, 2), Some(ClickOutcome::Map(_))));
    }

    #[test]
    fn top_right_control_hugs_right_edge() {
        let mut v = view();
        v.add_control(ControlAnchor::TopRight, MapControl::Filters);
        // Inner area is x 1..81, so the control spans 50..81.
        assert_eq!(v.click(51, 1), Some(ClickOutcome::Filter(Urgency::Future)));
        assert!(matches!(v.click(49, 1), Some(ClickOutcome::Map(_))));
    }

    #[test]
    fn next_visible_skips_hidden_and_wraps() {
        let mut v = view();
        let p = GeoPoint { lat: 47.0, lon: 2.0 };
        let a = v.add_marker(marker_at(p));
        let b = v.add_marker(marker_at(p));
        let c = v.add_marker(marker_at(p));
        v.set_marker_visible(b, false);
        assert_eq!(v.next_visible(None), Some(a));
        assert_eq!(v.next_visible(Some(a)), Some(c));
        assert_eq!(v.next_visible(Some(c)), Some(a));
    }
}
