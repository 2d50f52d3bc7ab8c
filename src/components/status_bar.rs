use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::InputMode;
use crate::theme;

pub struct StatusBar;

impl StatusBar {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        mode: InputMode,
        reminder_count: usize,
        message: Option<&str>,
    ) {
        let status = theme::current().status;
        let w = area.width as usize;

        let mode_str = match mode {
            InputMode::Normal => format!("{} reminders", reminder_count),
            InputMode::Form => "[New Reminder]".to_string(),
            InputMode::Pick => "[Pick location]".to_string(),
            InputMode::ConfirmClear => "[Clear all?]".to_string(),
        };

        // Show status message if present, otherwise show context-aware hints
        let hints = if let Some(msg) = message {
            format!(" {} ", msg)
        } else {
            match mode {
                InputMode::Normal if w >= 90 => {
                    " hjkl:Pan +/-:Zoom Tab:Select Enter:Detail n:New 1/2/3:Filter r:Refresh ?:Help q:Quit "
                        .to_string()
                }
                InputMode::Normal if w >= 50 => " n:New Tab:Select r:Refresh ?:Help q:Quit ".to_string(),
                InputMode::Pick => " Click the map or move with hjkl, Enter to pick, Esc to cancel ".to_string(),
                InputMode::Form if w >= 60 => " Tab:Next Space:Toggle ^P:Pick Enter:Save Esc:Cancel ".to_string(),
                _ => " ?:Help q:Quit ".to_string(),
            }
        };

        let left = format!(" {} ", mode_str);
        let padding = " ".repeat(w.saturating_sub(left.chars().count() + hints.chars().count()));

        let line = Line::from(vec![
            Span::styled(left, status),
            Span::styled(padding, status),
            Span::styled(hints, status),
        ]);

        let bar = Paragraph::new(line).style(status);
        frame.render_widget(bar, area);
    }
}
