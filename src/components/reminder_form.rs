use std::fmt;

use chrono::{Duration, NaiveDateTime};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use thiserror::Error;

use crate::components::map_view::GeoPoint;
use crate::reminder::model::{clip, parse_degrees, COORDINATE_MAX};
use crate::reminder::schedule::{self, INPUT_FORMAT};
use crate::reminder::Reminder;
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Start,
    AllDay,
    End,
    Latitude,
    Longitude,
}

impl FormField {
    pub fn next(&self) -> Self {
        match self {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::Start,
            FormField::Start => FormField::AllDay,
            FormField::AllDay => FormField::End,
            FormField::End => FormField::Latitude,
            FormField::Latitude => FormField::Longitude,
            FormField::Longitude => FormField::Title,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::Title => FormField::Longitude,
            FormField::Description => FormField::Title,
            FormField::Start => FormField::Description,
            FormField::AllDay => FormField::Start,
            FormField::End => FormField::AllDay,
            FormField::Latitude => FormField::End,
            FormField::Longitude => FormField::Latitude,
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormField::Title => "title",
            FormField::Description => "description",
            FormField::Start => "start",
            FormField::AllDay => "all day",
            FormField::End => "end",
            FormField::Latitude => "latitude",
            FormField::Longitude => "longitude",
        };
        f.write_str(name)
    }
}

/// Why a submitted form was rejected. Submission is blocked while any
/// error remains.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("title is required")]
    MissingTitle,
    #[error("{0} must look like YYYY-MM-DDTHH:MM")]
    Pattern(FormField),
    #[error("{0} is not a real date")]
    InvalidDate(FormField),
    #[error("{0} does not exist in the local time zone")]
    NonexistentTime(FormField),
    #[error("end is before start")]
    EndBeforeStart,
    #[error("{0} must be a number between -{1} and {1}")]
    Coordinate(FormField, u32),
}

impl FormError {
    pub fn field(&self) -> FormField {
        match self {
            FormError::MissingTitle => FormField::Title,
            FormError::Pattern(f)
            | FormError::InvalidDate(f)
            | FormError::NonexistentTime(f)
            | FormError::Coordinate(f, _) => *f,
            FormError::EndBeforeStart => FormField::End,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReminderFormState {
    pub title: String,
    pub description: String,
    pub start: String,
    pub is_all_day: bool,
    pub end: String,
    pub latitude: String,
    pub longitude: String,
    pub active_field: FormField,
    pub errors: Vec<FormError>,
}

impl ReminderFormState {
    /// Empty form with start/end pre-filled one and two hours after `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            start: (now + Duration::hours(1)).format(INPUT_FORMAT).to_string(),
            is_all_day: false,
            end: (now + Duration::hours(2)).format(INPUT_FORMAT).to_string(),
            latitude: String::new(),
            longitude: String::new(),
            active_field: FormField::Title,
            errors: Vec::new(),
        }
    }

    pub fn input_char(&mut self, c: char) {
        match self.active_field {
            FormField::Title => self.title.push(c),
            FormField::Description => self.description.push(c),
            FormField::Start => self.start.push(c),
            FormField::End => self.end.push(c),
            FormField::Latitude => self.latitude.push(c),
            FormField::Longitude => self.longitude.push(c),
            FormField::AllDay => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.active_field {
            FormField::Title => { self.title.pop(); }
            FormField::Description => { self.description.pop(); }
            FormField::Start => { self.start.pop(); }
            FormField::End => { self.end.pop(); }
            FormField::Latitude => { self.latitude.pop(); }
            FormField::Longitude => { self.longitude.pop(); }
            FormField::AllDay => {}
        }
    }

    pub fn toggle_all_day(&mut self) {
        self.is_all_day = !self.is_all_day;
    }

    /// Fill latitude and longitude from a point picked on the map.
    pub fn set_coordinates(&mut self, point: GeoPoint) {
        self.latitude = format!("{:.6}", point.lat);
        self.longitude = format!("{:.6}", point.lon);
    }

    pub fn has_error(&self, field: FormField) -> bool {
        self.errors.iter().any(|e| e.field() == field)
    }

    /// Build a reminder from the fields, or report every invalid field.
    pub fn validate(&self) -> Result<Reminder, Vec<FormError>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(FormError::MissingTitle);
        }

        let start = parse_field(FormField::Start, &self.start, &mut errors);
        let (start, end) = if self.is_all_day {
            match start.map(schedule::all_day_window) {
                Some((s, e)) => (Some(s), Some(e)),
                None => (None, None),
            }
        } else {
            (start, parse_field(FormField::End, &self.end, &mut errors))
        };

        let start = start.and_then(|s| resolve(FormField::Start, s, &mut errors));
        let end = end.and_then(|e| resolve(FormField::End, e, &mut errors));
        if let (Some(s), Some(e)) = (start, end) {
            if e < s {
                errors.push(FormError::EndBeforeStart);
            }
        }

        // Check the values as they will be stored, not as typed.
        let latitude = clip(self.latitude.trim(), COORDINATE_MAX);
        let longitude = clip(self.longitude.trim(), COORDINATE_MAX);
        if parse_degrees(&latitude, 90.0).is_none() {
            errors.push(FormError::Coordinate(FormField::Latitude, 90));
        }
        if parse_degrees(&longitude, 180.0).is_none() {
            errors.push(FormError::Coordinate(FormField::Longitude, 180));
        }

        match (start, end) {
            (Some(start), Some(end)) if errors.is_empty() => Ok(Reminder::new(
                self.title.trim(),
                self.description.trim(),
                start,
                end,
                &latitude,
                &longitude,
            )),
            _ => Err(errors),
        }
    }
}

fn parse_field(field: FormField, text: &str, errors: &mut Vec<FormError>) -> Option<NaiveDateTime> {
    if !schedule::matches_pattern(text) {
        errors.push(FormError::Pattern(field));
        return None;
    }
    let parsed = schedule::parse_date_time(text);
    if parsed.is_none() {
        errors.push(FormError::InvalidDate(field));
    }
    parsed
}

fn resolve(
    field: FormField,
    naive: NaiveDateTime,
    errors: &mut Vec<FormError>,
) -> Option<chrono::DateTime<chrono::Local>> {
    let local = schedule::to_local(naive);
    if local.is_none() {
        errors.push(FormError::NonexistentTime(field));
    }
    local
}

pub struct ReminderForm;

impl ReminderForm {
    pub fn render(frame: &mut Frame, area: Rect, state: &ReminderFormState) {
        let theme = theme::current();

        // Center the form popup
        let form_w = area.width.min(60).max(34);
        let form_h = area.height.min(16 + state.errors.len() as u16).max(12);
        let x = area.x + (area.width.saturating_sub(form_w)) / 2;
        let y = area.y + (area.height.saturating_sub(form_h)) / 2;
        let form_area = Rect::new(x, y, form_w, form_h);

        // Clear background
        frame.render_widget(Clear, form_area);

        let block = Block::default()
            .title(" New Reminder ")
            .title_style(theme.header)
            .borders(Borders::ALL)
            .border_style(theme.active);

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let rows = Layout::vertical([
            Constraint::Length(1), // title
            Constraint::Length(1), // description
            Constraint::Length(1), // start
            Constraint::Length(1), // all day
            Constraint::Length(1), // end
            Constraint::Length(1), // latitude
            Constraint::Length(1), // longitude
            Constraint::Length(1), // spacer
            Constraint::Length(1), // help
            Constraint::Min(0),    // errors
        ])
        .split(inner);

        let field = |f: FormField| (state.active_field == f, state.has_error(f));

        render_field(frame, rows[0], "Title:", &state.title, field(FormField::Title));
        render_field(frame, rows[1], "Notes:", &state.description, field(FormField::Description));
        render_field(frame, rows[2], "Start:", &state.start, field(FormField::Start));

        let all_day_val = if state.is_all_day {
            "[x] All day (08:00 - 18:00)"
        } else {
            "[ ] All day"
        };
        render_field(frame, rows[3], "", all_day_val, field(FormField::AllDay));

        if state.is_all_day {
            render_field(frame, rows[4], "End:", "----------T18:00", (false, false));
        } else {
            render_field(frame, rows[4], "End:", &state.end, field(FormField::End));
        }
        render_field(frame, rows[5], "Lat:", &state.latitude, field(FormField::Latitude));
        render_field(frame, rows[6], "Lon:", &state.longitude, field(FormField::Longitude));

        let key = Style::default().add_modifier(Modifier::BOLD);
        let help = Line::from(vec![
            Span::styled("Tab", key),
            Span::styled(":Next ", theme.dim),
            Span::styled("^P", key),
            Span::styled(":Pick on map ", theme.dim),
            Span::styled("Enter", key),
            Span::styled(":Save ", theme.dim),
            Span::styled("Esc", key),
            Span::styled(":Cancel", theme.dim),
        ]);
        frame.render_widget(Paragraph::new(help), rows[8]);

        if !state.errors.is_empty() {
            let lines: Vec<Line> = state
                .errors
                .iter()
                .map(|e| Line::from(Span::styled(format!("! {}", e), theme.error)))
                .collect();
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), rows[9]);
        }
    }
}

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, (active, invalid): (bool, bool)) {
    let theme = theme::current();
    let label_w = if label.is_empty() { 0 } else { 7 };
    let cursor = if active { "_" } else { "" };

    let style = if active {
        theme.active
    } else if invalid {
        theme.error
    } else {
        Style::default()
    };

    let mut spans = Vec::new();
    if !label.is_empty() {
        spans.push(Span::styled(
            format!("{:<width$}", label, width = label_w),
            if invalid { theme.error } else { theme.dim },
        ));
    }
    // Show the tail of long values so the cursor stays visible.
    let room = (area.width as usize).saturating_sub(label_w + 1);
    let shown: String = {
        let count = value.chars().count();
        value.chars().skip(count.saturating_sub(room)).collect()
    };
    spans.push(Span::styled(format!("{}{}", shown, cursor), style));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
