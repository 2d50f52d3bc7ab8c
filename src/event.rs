use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};

pub fn poll_event(timeout: Duration) -> color_eyre::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Next key press or mouse event, skipping everything else.
pub fn next_input_event(timeout: Duration) -> color_eyre::Result<Option<Event>> {
    loop {
        match poll_event(timeout)? {
            Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                return Ok(Some(Event::Key(key)))
            }
            Some(ev @ Event::Mouse(_)) => return Ok(Some(ev)),
            Some(_) => continue,
            None => return Ok(None),
        }
    }
}
