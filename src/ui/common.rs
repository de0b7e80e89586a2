//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::duration::format_elapsed;
use crate::data::{NodeStatus, REGISTRY_CAPACITY};

/// Node counts per status, for the header bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub synced: usize,
    pub not_synced: usize,
    pub awol: usize,
    pub initializing: usize,
}

impl StatusCounts {
    pub fn tally(statuses: impl IntoIterator<Item = NodeStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            match status {
                NodeStatus::Synced => counts.synced += 1,
                NodeStatus::NotSynced => counts.not_synced += 1,
                NodeStatus::Awol => counts.awol += 1,
                NodeStatus::Initializing => counts.initializing += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.synced + self.not_synced + self.awol + self.initializing
    }
}

/// Render the header bar with the fleet overview.
///
/// Displays: status indicator, node counts by status, datagram totals.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let counts = StatusCounts::tally(app.monitor.nodes().iter().map(|n| n.status));
    let stats = app.monitor.stats();

    let overall = if counts.awol > 0 {
        NodeStatus::Awol
    } else if counts.not_synced > 0 {
        NodeStatus::NotSynced
    } else if counts.synced > 0 {
        NodeStatus::Synced
    } else {
        NodeStatus::Initializing
    };

    let count_span = |n: usize, style: Style| {
        if n > 0 {
            Span::styled(n.to_string(), style)
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        }
    };

    let line = Line::from(vec![
        Span::styled(" ● ", app.theme.status_style(overall)),
        Span::styled("NODEWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        count_span(counts.synced, app.theme.status_style(NodeStatus::Synced)),
        Span::raw(" synced "),
        count_span(counts.not_synced, app.theme.status_style(NodeStatus::NotSynced)),
        Span::raw(" not synced "),
        count_span(counts.awol, app.theme.status_style(NodeStatus::Awol)),
        Span::raw(" awol │ "),
        Span::styled(
            format!("{}/{}", counts.total(), REGISTRY_CAPACITY),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" nodes │ "),
        Span::raw(format!(
            "{} pkts {} bad │ {}",
            format_count(stats.received),
            format_count(stats.rejected + stats.truncated),
            app.monitor.layout()
        )),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Format a count for display (e.g., 1234 -> "1.2K", 1234567 -> "1.2M").
fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Render the tab bar showing available views.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let alerts = app.monitor.alerts().len();
    let titles: Vec<Line> = vec![
        Line::from(format!(" 1:{} ", View::Nodes.label())),
        Line::from(format!(" 2:{} ({}) ", View::Alerts.label(), alerts)),
    ];

    let selected = match app.current_view {
        View::Nodes => 0,
        View::Alerts => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: source, time since the last datagram, available controls.
/// Also displays temporary status messages and source errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(ref err) = app.source_error {
        let text = format!(" {} | Error: {} | q:quit", app.source_description(), err);
        let paragraph = Paragraph::new(text).style(Style::default().fg(app.theme.critical));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::Nodes if app.filter_active => "Type to search | Enter:apply Esc:cancel",
        View::Nodes => "/:search Tab:switch Enter:detail e:export ?:help q:quit",
        View::Alerts => "↑↓:scroll Tab:switch e:export ?:help q:quit",
    };

    let received = match app.since_last_datagram() {
        Some(elapsed) => format!("Last datagram {} ago", format_elapsed(elapsed)),
        None => "Waiting for datagrams".to_string(),
    };

    let status = format!(" {} | {} | {}", app.source_description(), received, controls);
    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  1/2 Tab     Switch views"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       Node detail"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        section(" Nodes"),
        Line::from("  /         Filter by node id"),
        Line::from("  c         Clear filter"),
        Line::from(""),
        section(" General"),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 22u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts_each_status() {
        let counts = StatusCounts::tally([
            NodeStatus::Synced,
            NodeStatus::Synced,
            NodeStatus::Awol,
            NodeStatus::NotSynced,
        ]);
        assert_eq!(counts.synced, 2);
        assert_eq!(counts.awol, 1);
        assert_eq!(counts.not_synced, 1);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_234), "1.2K");
        assert_eq!(format_count(2_500_000), "2.5M");
    }
}
