//! Detail overlay rendering.
//!
//! Displays a modal overlay with everything the selected node last reported.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::data::classify::{format_bytes, format_rate};
use crate::data::duration::format_micros;
use crate::data::identity::fallback_id;
use crate::data::Observation;
use crate::wire::{DebugCounters, RateStat, ACCOUNTED_STATES};

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 60;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 20;

const MICROS_PER_SECOND: u64 = 1_000_000;

/// Render the node detail as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let Some(node) = app.selected_node() else {
        return;
    };

    let overlay_width = (area.width * 95 / 100).clamp(MIN_OVERLAY_WIDTH, 140);
    let overlay_height = (area.height * 90 / 100).clamp(MIN_OVERLAY_HEIGHT, 50);

    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    frame.render_widget(Clear, overlay_area);

    let chunks = Layout::vertical([
        Constraint::Length(7), // Identity and headline numbers
        Constraint::Min(10),   // Tables
        Constraint::Length(1), // Footer
    ])
    .split(overlay_area);

    // ===== HEADER SECTION =====
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut header_lines = vec![
        Line::from(vec![
            Span::styled(format!(" {} ", node.display_id), bold),
            Span::styled(
                format!("{} ", node.status.label()),
                app.theme.status_style(node.status).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("key {}", fallback_id(&node.key)),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]),
        Line::from(""),
    ];

    match node.current.as_deref() {
        Some(obs) => {
            let s = &obs.snapshot;
            header_lines.push(Line::from(vec![
                Span::raw(" Version: "),
                Span::styled(
                    s.version_string.clone().unwrap_or_else(|| format!("protocol {}", s.version)),
                    bold,
                ),
                Span::raw("    State: "),
                Span::styled(s.server_state.label(), bold),
                Span::raw("    Uptime: "),
                Span::styled(format_micros(s.uptime.saturating_mul(MICROS_PER_SECOND)), bold),
            ]));
            header_lines.push(Line::from(vec![
                Span::raw(" Ledger: "),
                Span::styled(s.ledger_seq.to_string(), bold),
                Span::raw("    Peers: "),
                Span::styled(s.peer_count.to_string(), bold),
                Span::raw("    Network: "),
                Span::styled(s.network_id.to_string(), bold),
                Span::raw("    Quorum: "),
                Span::styled(s.validation_quorum.to_string(), bold),
                Span::raw("    Load factor: "),
                Span::styled(format!("{}/{}", s.load_factor, s.load_base), bold),
            ]));
            header_lines.push(Line::from(vec![
                Span::raw(" Packets: "),
                Span::styled(node.packets.to_string(), bold),
                Span::raw("    From: "),
                Span::styled(
                    obs.source.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()),
                    bold,
                ),
                Span::raw("    I/O latency: "),
                Span::styled(format!("{}us", s.io_latency_us), bold),
                Span::raw("    Converge: "),
                Span::styled(format!("{}ms", s.converge_time_ms), bold),
            ]));
        }
        None => header_lines.push(Line::from(Span::styled(
            " Waiting for telemetry",
            Style::default().add_modifier(Modifier::DIM),
        ))),
    }

    let header_block = Block::default()
        .title(" Node Detail ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));
    frame.render_widget(Paragraph::new(header_lines).block(header_block), chunks[0]);

    // ===== CONTENT SECTION =====
    if let Some(obs) = node.current.as_deref() {
        let columns =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(chunks[1]);
        let left = Layout::vertical([Constraint::Length(7), Constraint::Min(4)]).split(columns[0]);
        let right = Layout::vertical([Constraint::Length(5), Constraint::Min(4)]).split(columns[1]);

        render_rates(frame, app, obs, left[0]);
        render_state_accounting(frame, app, obs, left[1]);
        render_ranges(frame, app, obs, right[0]);
        render_counters(frame, app, obs, right[1]);
    }

    // ===== FOOTER =====
    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " Press Esc to close ",
        Style::default().add_modifier(Modifier::DIM),
    )]));
    frame.render_widget(footer, chunks[2]);
}

fn block<'a>(app: &App, title: String) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

fn render_rates(frame: &mut Frame, app: &App, obs: &Observation, area: Rect) {
    let header = Row::new(vec!["Channel", "1m", "5m", "1h", "24h"]).style(app.theme.header);
    let rates = &obs.snapshot.rates;
    let row = |name: &'static str, r: &RateStat| {
        Row::new(vec![
            Cell::from(name),
            Cell::from(format_rate(r.one_minute)),
            Cell::from(format_rate(r.five_minutes)),
            Cell::from(format_rate(r.one_hour)),
            Cell::from(format_rate(r.one_day)),
        ])
    };
    let rows = vec![
        row("Net in", &rates.net_in),
        row("Net out", &rates.net_out),
        row("Disk read", &rates.disk_read),
        row("Disk write", &rates.disk_write),
    ];
    let widths = [
        Constraint::Length(10),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
    ];
    let table =
        Table::new(rows, widths).header(header).block(block(app, " Throughput ".to_string()));
    frame.render_widget(table, area);
}

fn render_state_accounting(frame: &mut Frame, app: &App, obs: &Observation, area: Rect) {
    let Some(acct) = obs.snapshot.state_accounting else {
        let s = &obs.snapshot.system;
        let lines = vec![
            Line::from(format!(
                " Memory: {} / {}",
                format_bytes(s.mem_used),
                format_bytes(s.mem_total)
            )),
            Line::from(format!(
                " Disk:   {} / {}",
                format_bytes(s.disk_used),
                format_bytes(s.disk_total)
            )),
            Line::from(Span::styled(
                " No state accounting in this layout",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];
        let paragraph = Paragraph::new(lines).block(block(app, " Resources ".to_string()));
        frame.render_widget(paragraph, area);
        return;
    };

    let header = Row::new(vec!["State", "Transitions", "Time"]).style(app.theme.header);
    let rows: Vec<Row> = ACCOUNTED_STATES
        .iter()
        .zip(acct.transitions.iter().zip(acct.durations_us.iter()))
        .map(|(name, (transitions, us))| {
            Row::new(vec![
                Cell::from(*name),
                Cell::from(transitions.to_string()),
                Cell::from(format_micros(*us)),
            ])
        })
        .collect();
    let widths = [Constraint::Length(12), Constraint::Length(12), Constraint::Fill(1)];
    let title = format!(" State accounting (initial sync {}) ", format_micros(acct.initial_sync_us));
    let table = Table::new(rows, widths).header(header).block(block(app, title));
    frame.render_widget(table, area);
}

fn render_ranges(frame: &mut Frame, app: &App, obs: &Observation, area: Rect) {
    let text = if obs.ranges.is_empty() {
        "none".to_string()
    } else {
        obs.ranges.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ")
    };
    let paragraph = Paragraph::new(format!(" {}", text))
        .wrap(ratatui::widgets::Wrap { trim: true })
        .block(block(app, format!(" Complete ledgers ({}) ", obs.ranges.len())));
    frame.render_widget(paragraph, area);
}

/// Object counts, followed by the storage counters when the layout has them.
fn render_counters(frame: &mut Frame, app: &App, obs: &Observation, area: Rect) {
    let mut rows: Vec<Row> = obs
        .objects
        .iter()
        .map(|o| Row::new(vec![Cell::from(o.name.clone()), Cell::from(o.count.to_string())]))
        .collect();

    if let Some(debug) = &obs.debug {
        rows.extend(
            debug_rows(debug)
                .into_iter()
                .map(|(name, value)| Row::new(vec![Cell::from(name), Cell::from(value)])),
        );
    }

    let widths = [Constraint::Fill(2), Constraint::Fill(1)];
    let title = format!(" Counters ({} objects) ", obs.objects.len());
    let table = Table::new(rows, widths).block(block(app, title));
    frame.render_widget(table, area);
}

fn debug_rows(d: &DebugCounters) -> Vec<(&'static str, String)> {
    let pct = |rate: f64| format!("{:.1}%", rate);
    vec![
        ("db size", format_bytes(d.db_kb_total.saturating_mul(1024))),
        ("db ledger", format_bytes(d.db_kb_ledger.saturating_mul(1024))),
        ("db transaction", format_bytes(d.db_kb_transaction.saturating_mul(1024))),
        ("local txs", d.local_txs.to_string()),
        ("write load", d.write_load.to_string()),
        ("historical/min", d.historical_per_minute.to_string()),
        ("SLE hit rate", pct(d.sle_hit_rate)),
        ("ledger hit rate", pct(d.ledger_hit_rate)),
        ("accepted ledgers", d.accepted_ledger_size.to_string()),
        ("accepted hit rate", pct(d.accepted_ledger_hit_rate)),
        ("full below", d.full_below_size.to_string()),
        ("treenode cache", d.tree_node_cache_size.to_string()),
        ("treenode track", d.tree_node_track_size.to_string()),
        ("node read", format_bytes(d.node_read_bytes)),
        ("node reads", d.node_reads_total.to_string()),
        ("node reads hit", d.node_reads_hit.to_string()),
        ("node writes", d.node_writes.to_string()),
        ("node written", format_bytes(d.node_written_bytes)),
        ("node read time", format_micros(d.node_read_duration_us)),
        ("writes delayed", d.node_writes_delayed.to_string()),
        ("read queue", d.read_queue.to_string()),
        ("read bundle", d.read_request_bundle.to_string()),
        ("read threads", format!("{}/{}", d.read_threads_running, d.read_threads_total)),
        ("cache hit rate", pct(d.cache_hit_rate)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_rows_cover_every_counter() {
        let counters = DebugCounters {
            db_kb_total: 2,
            read_threads_running: 3,
            read_threads_total: 8,
            cache_hit_rate: 97.3,
            ..Default::default()
        };
        let rows = debug_rows(&counters);

        // 25 slots, with running/total threads sharing a row.
        assert_eq!(rows.len(), 24);
        assert_eq!(rows[0], ("db size", "2.00 KiB".to_string()));
        assert!(rows.contains(&("read threads", "3/8".to_string())));
        assert!(rows.contains(&("cache hit rate", "97.3%".to_string())));
    }
}
