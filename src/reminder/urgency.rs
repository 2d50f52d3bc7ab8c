use std::fmt;

use chrono::{DateTime, TimeZone};
use ratatui::style::Color;

/// Events at most this many days away are imminent.
pub const IMMINENT_DAYS: f64 = 3.0;

/// `days_left` reported for any event whose start is behind `now`.
pub const PAST_SENTINEL: f64 = -1.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Urgency {
    Past,
    Imminent,
    Future,
}

impl Urgency {
    /// Display order of the filter control: green, orange, red.
    pub const ALL: [Urgency; 3] = [Urgency::Future, Urgency::Imminent, Urgency::Past];

    pub fn from_days_left(days_left: f64) -> Self {
        if days_left < 0.0 {
            Urgency::Past
        } else if days_left <= IMMINENT_DAYS {
            Urgency::Imminent
        } else {
            Urgency::Future
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Urgency::Past => "Past",
            Urgency::Imminent => "Soon",
            Urgency::Future => "Later",
        }
    }

    pub fn default_color(&self) -> Color {
        match self {
            Urgency::Past => Color::Red,
            Urgency::Imminent => Color::Rgb(255, 165, 0),
            Urgency::Future => Color::Green,
        }
    }
}

/// Time remaining split into whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl Countdown {
    /// Decompose a non-negative fractional day count.
    pub fn from_days_left(days_left: f64) -> Self {
        let days = days_left.floor();
        let hours_f = (days_left - days) * 24.0;
        let hours = hours_f.floor();
        let minutes = ((hours_f - hours) * 60.0).floor();
        Self {
            days: days as i64,
            hours: hours as i64,
            minutes: minutes as i64,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 3 {
            write!(f, "{} days", self.days)
        } else if self.days > 0 {
            write!(f, "{} days and {} hours", self.days, self.hours)
        } else if self.hours > 0 {
            write!(f, "{} hours and {} minutes", self.hours, self.minutes)
        } else {
            write!(f, "{} minutes", self.minutes)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub days_left: f64,
    pub urgency: Urgency,
    /// `None` for past events.
    pub countdown: Option<Countdown>,
}

impl Classification {
    pub fn color(&self) -> Color {
        self.urgency.default_color()
    }

    pub fn message(&self) -> String {
        match self.countdown {
            Some(countdown) => format!("Starting in {}", countdown),
            None => "This event has already passed".to_string(),
        }
    }

    /// Alert text for events that need attention.
    pub fn banner(&self) -> Option<String> {
        match self.urgency {
            Urgency::Past => Some("You missed this event".to_string()),
            Urgency::Imminent => Some(self.message().to_lowercase()),
            Urgency::Future => None,
        }
    }
}

/// Classify an event by the time left before `start`.
pub fn classify<Tz: TimeZone>(start: &DateTime<Tz>, now: &DateTime<Tz>) -> Classification {
    let days_left = if now > start {
        PAST_SENTINEL
    } else {
        let diff = start.clone().signed_duration_since(now.clone());
        diff.num_milliseconds() as f64 / MILLIS_PER_DAY
    };
    classify_days_left(days_left)
}

pub fn classify_days_left(days_left: f64) -> Classification {
    let urgency = Urgency::from_days_left(days_left);
    let countdown = match urgency {
        Urgency::Past => None,
        _ => Some(Countdown::from_days_left(days_left)),
    };
    Classification {
        days_left,
        urgency,
        countdown,
    }
}
