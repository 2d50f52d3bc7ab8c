use chrono::{DateTime, Duration, Local};
use color_eyre::Result;

use crate::components::marker;
use crate::components::{
    ClickOutcome, ControlAnchor, FilterController, GeoPoint, MapControl, MapSurface, MapView,
    MarkerId, ReminderFormState,
};
use crate::config::Config;
use crate::reminder::{KeyValueStorage, Reminder, Store, StoreError, Urgency};
use crate::theme;

/// Markers are reclassified this often so countdowns stay current.
const REFRESH_INTERVAL_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Form,
    /// Waiting for a map click to fill the form's coordinates.
    Pick,
    ConfirmClear,
}

/// Application context: owns the store and every piece of view state.
/// Handlers receive it by `&mut` and run one at a time.
pub struct App {
    pub running: bool,
    pub input_mode: InputMode,
    pub map: MapView,
    pub filters: FilterController,
    pub form_state: Option<ReminderFormState>,
    pub hovered: Option<MarkerId>,
    pub detail: Option<MarkerId>,
    pub status_message: Option<String>,
    pub show_help: bool,
    last_refresh: DateTime<Local>,
    store: Store,
}

impl App {
    pub fn new(config: &Config, storage: Box<dyn KeyValueStorage>, now: DateTime<Local>) -> Result<Self> {
        let mut app = Self {
            running: true,
            input_mode: InputMode::Normal,
            map: MapView::new(&config.map),
            filters: FilterController::new(),
            form_state: None,
            hovered: None,
            detail: None,
            status_message: None,
            show_help: false,
            last_refresh: now,
            store: Store::new(storage),
        };

        app.map.add_control(ControlAnchor::TopRight, MapControl::Filters);
        app.map.add_control(ControlAnchor::TopLeft, MapControl::Refresh);

        match app.store.load_all().map(|r| r.len()) {
            Ok(_) => {}
            Err(StoreError::Corrupted { backup_key, .. }) => {
                app.status_message = Some(match backup_key {
                    Some(key) => format!(
                        "Stored reminders were unreadable (copy saved as {}); starting empty",
                        key
                    ),
                    None => "Stored reminders were unreadable and could not be backed up; starting empty".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        app.refresh_markers(now);
        Ok(app)
    }

    pub fn reminders(&self) -> &[Reminder] {
        self.store.reminders()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Reclassify every reminder against `now` and rebuild the markers.
    pub fn refresh_markers(&mut self, now: DateTime<Local>) {
        self.map.clear_markers();
        let theme = theme::current();
        for (index, reminder) in self.store.reminders().iter().enumerate() {
            marker::render_reminder(&mut self.map, index, reminder, now, theme, &self.filters);
        }

        let count = self.map.markers().len();
        if self.hovered.is_some_and(|id| id >= count) {
            self.hovered = None;
        }
        if self.detail.is_some_and(|id| id >= count) {
            self.detail = None;
        }
        self.last_refresh = now;
        tracing::debug!(markers = count, "markers rendered");
    }

    pub fn refresh(&mut self, now: DateTime<Local>) {
        self.refresh_markers(now);
        self.status_message = Some("Markers refreshed".to_string());
    }

    /// Periodic hook from the event loop.
    pub fn tick(&mut self, now: DateTime<Local>) {
        if now - self.last_refresh >= Duration::seconds(REFRESH_INTERVAL_SECS) {
            self.refresh_markers(now);
        }
    }

    // ── Form ──

    pub fn open_form(&mut self, now: DateTime<Local>) {
        self.form_state = Some(ReminderFormState::new(now.naive_local()));
        self.input_mode = InputMode::Form;
        self.detail = None;
    }

    pub fn close_form(&mut self) {
        self.form_state = None;
        self.map.cancel_listener();
        self.input_mode = InputMode::Normal;
    }

    pub fn submit_form(&mut self, now: DateTime<Local>) {
        let Some(form) = self.form_state.as_mut() else {
            return;
        };

        match form.validate() {
            Ok(reminder) => match self.store.add(reminder) {
                Ok(()) => {
                    let index = self.store.len() - 1;
                    let reminder = &self.store.reminders()[index];
                    marker::render_reminder(
                        &mut self.map,
                        index,
                        reminder,
                        now,
                        theme::current(),
                        &self.filters,
                    );
                    self.form_state = None;
                    self.input_mode = InputMode::Normal;
                    self.status_message = Some("Reminder saved".to_string());
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to save reminder");
                    self.status_message = Some(format!("Could not save reminder: {}", e));
                }
            },
            Err(errors) => {
                tracing::debug!(errors = errors.len(), "form rejected");
                form.errors = errors;
                self.status_message = Some("Fix the highlighted fields".to_string());
            }
        }
    }

    pub fn form_input_char(&mut self, c: char) {
        if let Some(ref mut form) = self.form_state {
            form.input_char(c);
        }
    }

    pub fn form_backspace(&mut self) {
        if let Some(ref mut form) = self.form_state {
            form.backspace();
        }
    }

    pub fn form_tab(&mut self) {
        if let Some(ref mut form) = self.form_state {
            form.active_field = form.active_field.next();
        }
    }

    pub fn form_backtab(&mut self) {
        if let Some(ref mut form) = self.form_state {
            form.active_field = form.active_field.prev();
        }
    }

    // ── Coordinate picking ──

    pub fn begin_pick(&mut self) {
        if self.form_state.is_none() {
            return;
        }
        self.map.once_click();
        self.input_mode = InputMode::Pick;
    }

    pub fn cancel_pick(&mut self) {
        self.map.cancel_listener();
        self.input_mode = InputMode::Form;
    }

    pub fn confirm_pick(&mut self) {
        if let Some(point) = self.map.confirm_cursor() {
            self.finish_pick(point);
        }
    }

    fn finish_pick(&mut self, point: GeoPoint) {
        if let Some(ref mut form) = self.form_state {
            form.set_coordinates(point);
            self.status_message = Some(format!("Picked {:.4}, {:.4}", point.lat, point.lon));
        }
        self.input_mode = InputMode::Form;
    }

    // ── Map interaction ──

    pub fn handle_click(&mut self, col: u16, row: u16, now: DateTime<Local>) {
        match self.map.click(col, row) {
            Some(ClickOutcome::Picked(point)) => self.finish_pick(point),
            Some(ClickOutcome::Marker(id)) => {
                self.hovered = Some(id);
                self.detail = Some(id);
            }
            Some(ClickOutcome::Filter(urgency)) => self.toggle_filter(urgency),
            Some(ClickOutcome::Refresh) => self.refresh(now),
            Some(ClickOutcome::Map(_)) => self.detail = None,
            None => {}
        }
    }

    pub fn handle_hover(&mut self, col: u16, row: u16) {
        self.hovered = self.map.marker_at(col, row);
    }

    pub fn toggle_filter(&mut self, urgency: Urgency) {
        let visible = self.filters.toggle(urgency, &mut self.map);
        if !visible {
            let hidden = |id: &MarkerId| {
                self.map
                    .marker(*id)
                    .is_some_and(|m| m.urgency == urgency)
            };
            if self.hovered.as_ref().is_some_and(hidden) {
                self.hovered = None;
            }
            if self.detail.as_ref().is_some_and(hidden) {
                self.detail = None;
            }
        }
        self.status_message = Some(format!(
            "{} reminders {}",
            urgency.label(),
            if visible { "shown" } else { "hidden" }
        ));
    }

    pub fn select_next(&mut self) {
        self.hovered = self.map.next_visible(self.hovered);
    }

    pub fn show_detail(&mut self) {
        self.detail = self.hovered;
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn toggle_controls(&mut self) {
        if self.map.has_control(MapControl::Filters) {
            self.map.remove_control(MapControl::Filters);
            self.map.remove_control(MapControl::Refresh);
        } else {
            self.map.add_control(ControlAnchor::TopRight, MapControl::Filters);
            self.map.add_control(ControlAnchor::TopLeft, MapControl::Refresh);
        }
    }

    // ── Clear all ──

    pub fn request_clear(&mut self) {
        if self.store.is_empty() {
            self.status_message = Some("No reminders to clear".to_string());
            return;
        }
        self.input_mode = InputMode::ConfirmClear;
    }

    pub fn cancel_clear(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn confirm_clear(&mut self) {
        self.input_mode = InputMode::Normal;
        match self.store.clear() {
            Ok(()) => {
                self.map.clear_markers();
                self.hovered = None;
                self.detail = None;
                self.status_message = Some("All reminders cleared".to_string());
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to clear reminders");
                self.status_message = Some(format!("Could not clear reminders: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::reminder_form::FormField;
    use crate::reminder::schedule::INPUT_FORMAT;
    use crate::reminder::store::{decode, encode, STORAGE_KEY};
    use crate::reminder::MemoryStorage;
    use ratatui::layout::Rect;

    fn reminder(title: &str, now: DateTime<Local>, offset: Duration) -> Reminder {
        let start = now + offset;
        Reminder::new(title, "", start, start + Duration::hours(1), "47.0", "2.2")
    }

    fn app_with(reminders: &[Reminder], now: DateTime<Local>) -> App {
        let mut storage = MemoryStorage::new();
        if !reminders.is_empty() {
            storage.set(STORAGE_KEY, &encode(reminders).unwrap()).unwrap();
        }
        let mut app = App::new(&Config::default(), Box::new(storage), now).unwrap();
        app.map.layout(Rect::new(0, 0, 82, 32));
        app
    }

    fn persisted(app: &App) -> Vec<Reminder> {
        decode(&app.store().storage().get(STORAGE_KEY).unwrap().unwrap()).unwrap()
    }

    fn urgencies(app: &App) -> Vec<Urgency> {
        app.map.markers().iter().map(|m| m.urgency).collect()
    }

    fn fill_form(app: &mut App, now: DateTime<Local>) {
        let form = app.form_state.as_mut().unwrap();
        form.title = "Night market".into();
        form.start = (now + Duration::days(2)).format(INPUT_FORMAT).to_string();
        form.end = (now + Duration::days(2) + Duration::hours(3)).format(INPUT_FORMAT).to_string();
        form.latitude = "45.75".into();
        form.longitude = "4.85".into();
    }

    #[test]
    fn startup_presents_stored_reminders() {
        let now = Local::now();
        let app = app_with(
            &[
                reminder("gone", now, Duration::days(-1)),
                reminder("soon", now, Duration::hours(5)),
                reminder("later", now, Duration::days(10)),
            ],
            now,
        );
        assert_eq!(app.reminders().len(), 3);
        assert_eq!(urgencies(&app), vec![Urgency::Past, Urgency::Imminent, Urgency::Future]);
        assert!(app.status_message.is_none());
    }

    #[test]
    fn corrupted_storage_starts_empty_with_notice() {
        let mut storage = MemoryStorage::new();
        storage.set(STORAGE_KEY, "[{\"title\":").unwrap();
        let app = App::new(&Config::default(), Box::new(storage), Local::now()).unwrap();
        assert!(app.reminders().is_empty());
        assert!(app.status_message.as_deref().unwrap().contains("unreadable"));
    }

    struct ReadOnlyStorage(String);

    impl KeyValueStorage for ReadOnlyStorage {
        fn get(&self, _key: &str) -> std::io::Result<Option<String>> {
            Ok(Some(self.0.clone()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    #[test]
    fn corrupted_read_only_storage_still_starts() {
        let storage = ReadOnlyStorage("{broken".to_string());
        let app = App::new(&Config::default(), Box::new(storage), Local::now()).unwrap();
        assert!(app.reminders().is_empty());
        assert!(app.status_message.as_deref().unwrap().contains("could not be backed up"));
    }

    #[test]
    fn valid_submission_persists_and_renders() {
        let now = Local::now();
        let mut app = app_with(&[], now);
        app.open_form(now);
        fill_form(&mut app, now);
        app.submit_form(now);

        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.form_state.is_none());
        assert_eq!(persisted(&app).len(), 1);
        assert_eq!(persisted(&app)[0].title(), "Night market");
        assert_eq!(urgencies(&app), vec![Urgency::Imminent]);
    }

    #[test]
    fn invalid_submission_keeps_form_open() {
        let now = Local::now();
        let mut app = app_with(&[], now);
        app.open_form(now);
        fill_form(&mut app, now);
        app.form_state.as_mut().unwrap().start = "tomorrow".into();
        app.submit_form(now);

        assert_eq!(app.input_mode, InputMode::Form);
        let form = app.form_state.as_ref().unwrap();
        assert!(form.has_error(FormField::Start));
        assert!(app.reminders().is_empty());
        assert!(app.store().storage().get(STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn map_click_fills_form_once() {
        let now = Local::now();
        let mut app = app_with(&[], now);
        app.open_form(now);
        app.begin_pick();
        assert_eq!(app.input_mode, InputMode::Pick);

        app.handle_click(40, 20, now);
        assert_eq!(app.input_mode, InputMode::Form);
        let form = app.form_state.as_ref().unwrap();
        assert!(!form.latitude.is_empty());
        assert!(!form.longitude.is_empty());
        assert!(!app.map.is_listening());
    }

    #[test]
    fn pick_without_form_is_ignored() {
        let mut app = app_with(&[], Local::now());
        app.begin_pick();
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(!app.map.is_listening());
    }

    #[test]
    fn filter_control_click_hides_category() {
        let now = Local::now();
        let mut app = app_with(
            &[
                reminder("soon", now, Duration::hours(5)),
                reminder("later", now, Duration::days(10)),
            ],
            now,
        );
        // Filter control sits top-right; its first checkbox is "Later".
        let area = app.map.area();
        let col = area.right() - crate::components::filters::FilterControl::WIDTH + 1;
        app.handle_click(col, area.y + 1, now);

        assert!(!app.filters.is_visible(Urgency::Future));
        let visible: Vec<bool> = app.map.markers().iter().map(|m| m.visible).collect();
        assert_eq!(visible, vec![true, false]);
    }

    #[test]
    fn hidden_selection_is_dropped() {
        let now = Local::now();
        let mut app = app_with(&[reminder("later", now, Duration::days(10))], now);
        app.select_next();
        app.show_detail();
        assert_eq!(app.detail, Some(0));
        app.toggle_filter(Urgency::Future);
        assert_eq!(app.hovered, None);
        assert_eq!(app.detail, None);
        app.select_next();
        assert_eq!(app.hovered, None);
    }

    #[test]
    fn tick_reclassifies_after_interval() {
        let now = Local::now();
        let mut app = app_with(
            &[reminder("trip", now, Duration::days(3) + Duration::minutes(30))],
            now,
        );
        assert_eq!(urgencies(&app), vec![Urgency::Future]);

        app.tick(now + Duration::seconds(30));
        assert_eq!(urgencies(&app), vec![Urgency::Future]);

        app.tick(now + Duration::hours(1));
        assert_eq!(urgencies(&app), vec![Urgency::Imminent]);
    }

    #[test]
    fn clear_requires_confirmation() {
        let now = Local::now();
        let mut app = app_with(&[reminder("a", now, Duration::days(1))], now);

        app.request_clear();
        assert_eq!(app.input_mode, InputMode::ConfirmClear);
        app.cancel_clear();
        assert_eq!(app.reminders().len(), 1);

        app.request_clear();
        app.confirm_clear();
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.reminders().is_empty());
        assert!(app.map.markers().is_empty());
        assert_eq!(persisted(&app), Vec::<Reminder>::new());
    }

    #[test]
    fn controls_can_be_hidden_and_restored() {
        let mut app = app_with(&[], Local::now());
        assert_eq!(app.map.controls().len(), 2);
        app.toggle_controls();
        assert!(app.map.controls().is_empty());
        app.toggle_controls();
        assert!(app.map.has_control(MapControl::Filters));
        assert!(app.map.has_control(MapControl::Refresh));
    }
}
