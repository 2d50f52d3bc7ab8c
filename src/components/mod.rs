pub mod filters;
pub mod map_view;
pub mod marker;
pub mod popup;
pub mod reminder_form;
pub mod status_bar;

pub use filters::FilterController;
pub use map_view::{ClickOutcome, ControlAnchor, GeoPoint, MapControl, MapSurface, MapView, MarkerId};
pub use reminder_form::{ReminderForm, ReminderFormState};
pub use status_bar::StatusBar;
