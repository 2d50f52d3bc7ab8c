use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub const TITLE_MAX: usize = 25;
pub const DESCRIPTION_MAX: usize = 250;
pub const COORDINATE_MAX: usize = 10;

const ELLIPSIS: &str = "...";

/// A dated, geolocated event reminder.
///
/// Text fields are truncated on construction, so every `Reminder` in memory
/// already satisfies the length limits. Deserialization goes through the same
/// constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredReminder")]
pub struct Reminder {
    title: String,
    description: String,
    #[serde(rename = "date_start")]
    start: DateTime<Local>,
    #[serde(rename = "date_end")]
    end: DateTime<Local>,
    latitude: String,
    longitude: String,
}

impl Reminder {
    pub fn new(
        title: &str,
        description: &str,
        start: DateTime<Local>,
        end: DateTime<Local>,
        latitude: &str,
        longitude: &str,
    ) -> Self {
        Self {
            title: shrink(title, TITLE_MAX),
            description: shrink(description, DESCRIPTION_MAX),
            start,
            end,
            latitude: clip(latitude, COORDINATE_MAX),
            longitude: clip(longitude, COORDINATE_MAX),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn start(&self) -> DateTime<Local> {
        self.start
    }

    pub fn end(&self) -> DateTime<Local> {
        self.end
    }

    pub fn latitude(&self) -> &str {
        &self.latitude
    }

    pub fn longitude(&self) -> &str {
        &self.longitude
    }

    /// Parsed `(latitude, longitude)` in decimal degrees, if both are finite
    /// and inside the valid range.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = parse_degrees(&self.latitude, 90.0)?;
        let lon = parse_degrees(&self.longitude, 180.0)?;
        Some((lat, lon))
    }

    pub fn window_display(&self) -> String {
        if self.start.date_naive() == self.end.date_naive() {
            format!(
                "{} {} - {}",
                self.start.format("%Y-%m-%d"),
                self.start.format("%H:%M"),
                self.end.format("%H:%M")
            )
        } else {
            format!(
                "{} - {}",
                self.start.format("%Y-%m-%d %H:%M"),
                self.end.format("%Y-%m-%d %H:%M")
            )
        }
    }
}

/// On-disk record layout. Unknown keys are ignored.
#[derive(Deserialize)]
struct StoredReminder {
    title: String,
    description: String,
    date_start: DateTime<Local>,
    date_end: DateTime<Local>,
    latitude: String,
    longitude: String,
}

impl From<StoredReminder> for Reminder {
    fn from(raw: StoredReminder) -> Self {
        Reminder::new(
            &raw.title,
            &raw.description,
            raw.date_start,
            raw.date_end,
            &raw.latitude,
            &raw.longitude,
        )
    }
}

/// Truncate `text` to `max` characters, ending with an ellipsis when cut.
pub fn shrink(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Keep at most `max` characters, without an ellipsis.
pub fn clip(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

pub fn parse_degrees(text: &str, limit: f64) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    (value.is_finite() && value.abs() <= limit).then_some(value)
}
