use chrono::{DateTime, Local};
use ratatui::style::Color;

use crate::components::filters::FilterController;
use crate::components::map_view::{GeoPoint, MapSurface, MarkerId};
use crate::reminder::{classify, Classification, Reminder, Urgency};
use crate::theme::Theme;

/// Content of the popup opened by clicking a marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailPopup {
    pub title: String,
    pub description: String,
    pub window: String,
    pub coordinates: String,
    pub message: String,
    pub banner: Option<String>,
}

/// Content of the popup shown while hovering a marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryPopup {
    pub title: String,
    pub message: String,
}

/// Rendered projection of one reminder. Never written back to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub reminder_index: usize,
    pub position: GeoPoint,
    pub urgency: Urgency,
    pub color: Color,
    pub visible: bool,
    pub detail: DetailPopup,
    pub summary: SummaryPopup,
}

/// Build the marker for `reminder`. `None` when its coordinates are unusable.
pub fn present(
    index: usize,
    reminder: &Reminder,
    classification: &Classification,
    theme: &Theme,
    filters: &FilterController,
) -> Option<MapMarker> {
    let (lat, lon) = reminder.coordinates()?;
    let message = classification.message();

    Some(MapMarker {
        reminder_index: index,
        position: GeoPoint { lat, lon },
        urgency: classification.urgency,
        color: theme.urgency_color(classification.urgency),
        visible: filters.is_visible(classification.urgency),
        detail: DetailPopup {
            title: reminder.title().to_string(),
            description: reminder.description().to_string(),
            window: reminder.window_display(),
            coordinates: format!("{}, {}", reminder.latitude(), reminder.longitude()),
            message: message.clone(),
            banner: classification.banner(),
        },
        summary: SummaryPopup {
            title: reminder.title().to_string(),
            message,
        },
    })
}

/// Classify `reminder` against `now` and attach its marker to `surface`.
pub fn render_reminder(
    surface: &mut dyn MapSurface,
    index: usize,
    reminder: &Reminder,
    now: DateTime<Local>,
    theme: &Theme,
    filters: &FilterController,
) -> Option<MarkerId> {
    let classification = classify(&reminder.start(), &now);
    match present(index, reminder, &classification, theme, filters) {
        Some(marker) => Some(surface.add_marker(marker)),
        None => {
            tracing::warn!(
                index,
                latitude = reminder.latitude(),
                longitude = reminder.longitude(),
                "skipping reminder with unusable coordinates"
            );
            None
        }
    }
}
