//! Alert log view rendering.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::app::App;
use crate::data::{AlertKind, ALERT_LOG_CAPACITY};

/// Render the alert log, newest first.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let log = app.monitor.alerts();

    let items: Vec<ListItem> = log
        .iter()
        .map(|alert| {
            let style = match alert.kind {
                AlertKind::Awol => {
                    Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD)
                }
                AlertKind::NewWarning(_) => Style::default().fg(app.theme.caution),
                AlertKind::PersistentWarnings(_) => {
                    Style::default().fg(app.theme.caution).add_modifier(Modifier::DIM)
                }
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("[{}] ", alert.at.format("%H:%M:%S")),
                    Style::default().add_modifier(Modifier::DIM),
                ),
                Span::raw(format!("{}: ", alert.node)),
                Span::styled(alert.message.clone(), style),
            ]))
        })
        .collect();

    let title = format!(" Alerts ({}/{}) ", log.len(), ALERT_LOG_CAPACITY);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if items.is_empty() {
        let empty = List::new(vec![ListItem::new(Span::styled(
            "  No alerts",
            Style::default().add_modifier(Modifier::DIM),
        ))])
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    state.select(Some(app.alert_scroll.min(log.len().saturating_sub(1))));

    frame.render_stateful_widget(list, area, &mut state);
}
