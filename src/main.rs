mod app;
mod cli;
mod components;
mod config;
mod event;
mod reminder;
mod theme;
mod tui;

use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use std::time::Duration;

use app::{App, InputMode};
use chrono::Local;
use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use crossterm::event::{Event, KeyCode, KeyModifiers, MouseButton, MouseEventKind};
use ratatui::layout::{Constraint, Layout, Rect};
use tracing_subscriber::EnvFilter;

use cli::Args;
use components::{MapSurface, StatusBar};
use config::Config;
use reminder::{classify, FileStorage, Store};

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = Some(dir);
    }
    theme::init(config.theme.clone().into_theme());

    let data_dir = config.data_dir();
    let storage = FileStorage::open(&data_dir)
        .wrap_err_with(|| format!("cannot open data directory {}", data_dir.display()))?;
    init_logging(&config)?;
    tracing::info!(data_dir = %storage.dir().display(), "starting");

    if args.list {
        return list_reminders(storage);
    }
    if args.clear {
        let mut store = Store::new(Box::new(storage));
        store.clear()?;
        println!("All reminders cleared.");
        return Ok(());
    }

    let mut app = App::new(&config, Box::new(storage), Local::now())?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app);
    tui::restore()?;
    tracing::info!("exiting");
    result
}

/// Log to a file; stderr belongs to the alternate screen.
fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .wrap_err_with(|| format!("cannot open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn list_reminders(storage: FileStorage) -> Result<()> {
    let mut store = Store::new(Box::new(storage));
    let reminders = store.load_all()?;
    if reminders.is_empty() {
        println!("No reminders stored.");
        return Ok(());
    }

    let now = Local::now();
    for r in reminders {
        let c = classify(&r.start(), &now);
        println!(
            "{:<6} {:<25}  {}  ({}, {})  {}",
            c.urgency.label(),
            r.title(),
            r.window_display(),
            r.latitude(),
            r.longitude(),
            c.message()
        );
    }
    Ok(())
}

fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            // Main layout: map + status bar
            let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);

            app.map.layout(layout[0]);
            app.map.render(frame, layout[0], &app.filters, app.hovered);

            // Hover summary next to its marker
            if app.detail.is_none() && app.input_mode == InputMode::Normal {
                if let Some(marker) = app.hovered.and_then(|id| app.map.marker(id)) {
                    if let Some(cell) = app.map.viewport().to_cell(app.map.area(), marker.position) {
                        components::popup::render_summary_popup(frame, app.map.area(), cell, marker);
                    }
                }
            }

            // Detail popup overlay
            if let Some(marker) = app.detail.and_then(|id| app.map.marker(id)) {
                components::popup::render_detail_popup(frame, layout[0], marker);
            }

            // Form overlay, hidden while picking so the map is reachable
            if app.input_mode == InputMode::Form {
                if let Some(ref form) = app.form_state {
                    components::ReminderForm::render(frame, layout[0], form);
                }
            }

            if app.input_mode == InputMode::ConfirmClear {
                components::popup::render_confirm(
                    frame,
                    layout[0],
                    &format!("Delete all {} reminders?", app.reminders().len()),
                );
            }

            if app.show_help {
                render_help(frame, area);
            }

            StatusBar::render(
                frame,
                layout[1],
                app.input_mode,
                app.reminders().len(),
                app.status_message.as_deref(),
            );
        })?;

        app.tick(Local::now());

        let Some(ev) = event::next_input_event(Duration::from_millis(100))? else {
            continue;
        };

        match ev {
            Event::Key(key) => {
                // Clear status message on any key
                app.status_message = None;

                // Help overlay takes priority
                if app.show_help {
                    if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
                        app.show_help = false;
                    }
                    continue;
                }

                match app.input_mode {
                    InputMode::Normal => handle_normal_input(app, key.code, key.modifiers),
                    InputMode::Form => handle_form_input(app, key.code, key.modifiers),
                    InputMode::Pick => handle_pick_input(app, key.code),
                    InputMode::ConfirmClear => match key.code {
                        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_clear(),
                        KeyCode::Char('n') | KeyCode::Esc => app.cancel_clear(),
                        _ => {}
                    },
                }
            }
            Event::Mouse(mouse) => match (mouse.kind, app.input_mode) {
                (MouseEventKind::Down(MouseButton::Left), InputMode::Normal | InputMode::Pick) => {
                    app.handle_click(mouse.column, mouse.row, Local::now());
                }
                (MouseEventKind::Moved, InputMode::Normal) if app.detail.is_none() => {
                    app.handle_hover(mouse.column, mouse.row);
                }
                (MouseEventKind::ScrollUp, InputMode::Normal | InputMode::Pick) => {
                    app.map.viewport_mut().zoom_by(0.5);
                }
                (MouseEventKind::ScrollDown, InputMode::Normal | InputMode::Pick) => {
                    app.map.viewport_mut().zoom_by(-0.5);
                }
                _ => {}
            },
            _ => {}
        }
    }

    Ok(())
}

const PAN_STEP: f64 = 0.1;

fn handle_normal_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    // Esc closes the detail popup first
    if app.detail.is_some() {
        if matches!(code, KeyCode::Esc | KeyCode::Enter) {
            app.close_detail();
        }
        return;
    }

    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Left, _) | (KeyCode::Char('h'), _) => app.map.viewport_mut().pan(-PAN_STEP, 0.0),
        (KeyCode::Right, _) | (KeyCode::Char('l'), _) => app.map.viewport_mut().pan(PAN_STEP, 0.0),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.map.viewport_mut().pan(0.0, PAN_STEP),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.map.viewport_mut().pan(0.0, -PAN_STEP),
        (KeyCode::Char('+'), _) | (KeyCode::Char('='), _) => app.map.viewport_mut().zoom_by(0.5),
        (KeyCode::Char('-'), _) => app.map.viewport_mut().zoom_by(-0.5),
        (KeyCode::Tab, _) => app.select_next(),
        (KeyCode::Esc, _) => app.hovered = None,
        (KeyCode::Enter, _) => app.show_detail(),
        (KeyCode::Char('n'), _) => app.open_form(Local::now()),
        (KeyCode::Char('r'), _) => app.refresh(Local::now()),
        (KeyCode::Char('1'), _) => app.toggle_filter(reminder::Urgency::Future),
        (KeyCode::Char('2'), _) => app.toggle_filter(reminder::Urgency::Imminent),
        (KeyCode::Char('3'), _) => app.toggle_filter(reminder::Urgency::Past),
        (KeyCode::Char('c'), _) => app.toggle_controls(),
        (KeyCode::Char('D'), _) => app.request_clear(),
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => {}
    }

    if app.map.markers().is_empty() {
        app.hovered = None;
    }
}

fn handle_form_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Esc, _) => app.close_form(),
        (KeyCode::Enter, _) => app.submit_form(Local::now()),
        (KeyCode::Tab, _) => app.form_tab(),
        (KeyCode::BackTab, _) => app.form_backtab(),
        (KeyCode::Backspace, _) => app.form_backspace(),
        (KeyCode::Char('p'), KeyModifiers::CONTROL) => app.begin_pick(),
        (KeyCode::Char(' '), _) => {
            // Space toggles all-day
            let on_all_day = app
                .form_state
                .as_ref()
                .is_some_and(|f| f.active_field == components::reminder_form::FormField::AllDay);
            if on_all_day {
                if let Some(ref mut f) = app.form_state {
                    f.toggle_all_day();
                }
            } else {
                app.form_input_char(' ');
            }
        }
        (KeyCode::Char(c), _) => app.form_input_char(c),
        _ => {}
    }
}

fn handle_pick_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.cancel_pick(),
        KeyCode::Enter => app.confirm_pick(),
        KeyCode::Left | KeyCode::Char('h') => app.map.move_cursor(-1.0, 0.0),
        KeyCode::Right | KeyCode::Char('l') => app.map.move_cursor(1.0, 0.0),
        KeyCode::Up | KeyCode::Char('k') => app.map.move_cursor(0.0, 1.0),
        KeyCode::Down | KeyCode::Char('j') => app.map.move_cursor(0.0, -1.0),
        KeyCode::Char('+') | KeyCode::Char('=') => app.map.viewport_mut().zoom_by(0.5),
        KeyCode::Char('-') => app.map.viewport_mut().zoom_by(-0.5),
        _ => {}
    }
}

fn render_help(frame: &mut ratatui::Frame, area: Rect) {
    use ratatui::style::{Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

    let theme = theme::current();
    let popup_w = area.width.min(54).max(30);
    let popup_h = area.height.min(24).max(12);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_style(theme.active.add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(theme.active);

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = theme.active.add_modifier(Modifier::BOLD);
    let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let entry = |keys: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", keys), key_style),
            Span::raw(desc),
        ])
    };

    let lines = vec![
        Line::from(Span::styled("Map", section_style)),
        entry("hjkl", "Pan (arrows work too)"),
        entry("+/-", "Zoom in / out (or scroll)"),
        entry("Tab", "Select next marker"),
        entry("Enter", "Open marker details (or click)"),
        Line::from(""),
        Line::from(Span::styled("Reminders", section_style)),
        entry("n", "New reminder"),
        entry("^P", "Pick location on map (in form)"),
        entry("r", "Refresh countdowns"),
        entry("D", "Clear all reminders"),
        Line::from(""),
        Line::from(Span::styled("Filters", section_style)),
        entry("1/2/3", "Toggle later / soon / past"),
        entry("c", "Hide / show map controls"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  q", key_style),
            Span::styled(" / ", theme::DIM_STYLE),
            Span::styled("Esc     ", key_style),
            Span::raw("Quit / close popup"),
        ]),
    ];

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}
