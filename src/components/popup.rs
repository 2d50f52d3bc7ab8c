use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::components::marker::MapMarker;
use crate::theme;

/// Render a marker's detail popup overlay.
pub fn render_detail_popup(frame: &mut Frame, area: Rect, marker: &MapMarker) {
    let theme = theme::current();
    let detail = &marker.detail;

    let popup_w = area.width.min(60).max(30);
    let popup_h = area.height.min(18).max(8);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);

    let accent = Style::default().fg(marker.color);
    let block = Block::default()
        .title(format!(" {} ", detail.title))
        .title_style(accent.add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(accent);

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut lines: Vec<Line> = Vec::new();

    // Alert banner
    if let Some(ref banner) = detail.banner {
        lines.push(Line::from(Span::styled(
            format!(" {} ", banner),
            Style::default()
                .fg(ratatui::style::Color::Black)
                .bg(marker.color)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(vec![
        Span::styled("  ", Style::default().bg(marker.color)),
        Span::styled(format!(" {}", marker.urgency.label()), Style::default()),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("When: ", theme.dim),
        Span::raw(detail.window.clone()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Where: ", theme.dim),
        Span::raw(detail.coordinates.clone()),
    ]));
    lines.push(Line::from(Span::styled(detail.message.clone(), accent)));

    if !detail.description.is_empty() {
        lines.push(Line::from(""));
        for line in detail.description.lines() {
            lines.push(Line::from(line.to_string()));
        }
    }

    // Footer hint
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Press Esc to close", theme.dim)));

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}

/// Render the small hover popup next to the marker at `anchor`.
pub fn render_summary_popup(frame: &mut Frame, bounds: Rect, anchor: (u16, u16), marker: &MapMarker) {
    let summary = &marker.summary;
    let text_w = summary.title.chars().count().max(summary.message.chars().count()) as u16;
    let w = (text_w + 2).min(bounds.width);
    let h = 4u16.min(bounds.height);

    // Prefer above-right of the marker, flip when it would leave the map.
    let (col, row) = anchor;
    let x = if col + 1 + w <= bounds.right() {
        col + 1
    } else {
        col.saturating_sub(w).max(bounds.x)
    };
    let y = if row >= bounds.y + h { row - h } else { row + 1 };
    let popup_area = Rect::new(x, y, w, h).intersection(bounds);

    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(marker.color));
    let lines = vec![
        Line::from(Span::styled(summary.title.clone(), theme::HEADER_STYLE)),
        Line::from(Span::styled(summary.message.clone(), theme::DIM_STYLE)),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}

/// Yes/no prompt centered in `area`.
pub fn render_confirm(frame: &mut Frame, area: Rect, question: &str) {
    let theme = theme::current();
    let w = (question.chars().count() as u16 + 4).min(area.width).max(24);
    let h = 4u16.min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    let popup_area = Rect::new(x, y, w, h);

    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.error);
    let lines = vec![
        Line::from(question.to_string()),
        Line::from(vec![
            Span::styled("y", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Yes  ", theme.dim),
            Span::styled("n", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":No", theme.dim),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}
