//! Nodes view rendering.
//!
//! One table row per tracked node, in registration order, with every
//! resource column colored by its classified severity.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::classify::{self, Classified, Severity};
use crate::data::clock::Timestamp;
use crate::data::duration::format_elapsed;
use crate::data::{NodeState, NodeStatus};

/// Display values for one node, computed from its latest snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub id: String,
    pub status: NodeStatus,
    pub ledger: String,
    pub peers: String,
    pub load: Classified,
    pub memory: Classified,
    pub disk: Classified,
    pub net_in: Classified,
    pub net_out: Classified,
    pub disk_io: Classified,
    pub warnings: String,
    pub last_seen: String,
}

impl NodeRow {
    pub fn from_node(node: &NodeState, now: Timestamp) -> Self {
        let last_seen = node
            .silence(now)
            .map(format_elapsed)
            .unwrap_or_else(|| "-".to_string());

        let Some(obs) = node.current.as_deref() else {
            let blank = || Classified {
                severity: Severity::Normal,
                text: "-".to_string(),
            };
            return Self {
                id: node.display_id.clone(),
                status: node.status,
                ledger: "-".to_string(),
                peers: "-".to_string(),
                load: blank(),
                memory: blank(),
                disk: blank(),
                net_in: blank(),
                net_out: blank(),
                disk_io: blank(),
                warnings: String::new(),
                last_seen,
            };
        };

        let s = &obs.snapshot;
        Self {
            id: node.display_id.clone(),
            status: node.status,
            ledger: s.ledger_seq.to_string(),
            peers: s.peer_count.to_string(),
            load: classify::load_average(s.load_avg.one, s.cpu_cores),
            memory: classify::memory_usage(s.system.mem_used, s.system.mem_total),
            disk: classify::disk_usage(s.system.disk_used, s.system.disk_total),
            net_in: classify::network_throughput(s.rates.net_in.one_minute),
            net_out: classify::network_throughput(s.rates.net_out.one_minute),
            disk_io: classify::disk_throughput(
                s.rates.disk_read.one_minute + s.rates.disk_write.one_minute,
            ),
            warnings: node.warnings.labels(),
            last_seen,
        }
    }

    /// Worst severity across the resource columns.
    pub fn worst(&self) -> Severity {
        [&self.load, &self.memory, &self.disk, &self.net_in, &self.net_out, &self.disk_io]
            .iter()
            .map(|c| c.severity)
            .max()
            .unwrap_or(Severity::Normal)
    }
}

/// Render the Nodes view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let now = app.now();
    let nodes = app.visible_nodes();
    let total = app.monitor.nodes().len();

    let header = Row::new(vec![
        "Node", "Status", "Health", "Ledger", "Peers", "Load", "Mem", "Disk", "Net In",
        "Net Out", "Disk I/O", "Seen", "Warnings",
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = nodes
        .iter()
        .map(|node| {
            let row = NodeRow::from_node(node, now);
            let metric = |c: &Classified| {
                Cell::from(c.text.clone()).style(app.theme.severity_style(c.severity))
            };
            Row::new(vec![
                Cell::from(row.id.clone()),
                Cell::from(row.status.label()).style(app.theme.status_style(row.status)),
                Cell::from(row.worst().symbol()).style(app.theme.severity_style(row.worst())),
                Cell::from(row.ledger.clone()),
                Cell::from(row.peers.clone()),
                metric(&row.load),
                metric(&row.memory),
                metric(&row.disk),
                metric(&row.net_in),
                metric(&row.net_out),
                metric(&row.disk_io),
                Cell::from(row.last_seen.clone()),
                Cell::from(row.warnings.clone())
                    .style(app.theme.severity_style(if row.warnings.is_empty() {
                        Severity::Normal
                    } else {
                        Severity::Caution
                    })),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3),    // Node id
        Constraint::Length(10), // Status
        Constraint::Length(6),  // Health
        Constraint::Length(10), // Ledger
        Constraint::Length(5),  // Peers
        Constraint::Length(6),  // Load
        Constraint::Length(6),  // Mem
        Constraint::Length(6),  // Disk
        Constraint::Length(12), // Net in
        Constraint::Length(12), // Net out
        Constraint::Length(12), // Disk I/O
        Constraint::Length(7),  // Seen
        Constraint::Fill(2),    // Warnings
    ];

    let selected = app.selected_node_index.min(nodes.len().saturating_sub(1));

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    let position_info = if nodes.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", selected + 1, nodes.len())
    };

    let title = format!(" Nodes ({}/{}){}{} ", nodes.len(), total, filter_info, position_info);

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !nodes.is_empty() {
        state.select(Some(selected));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clock::test_time;
    use crate::data::Registry;
    use crate::wire::testutil::PacketBuilder;
    use crate::wire::{decode, LayoutVersion};
    use chrono::TimeDelta;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn node_from(builder: PacketBuilder) -> NodeState {
        let packet = decode(&builder.build(), LayoutVersion::Current).unwrap();
        let mut reg = Registry::new();
        reg.upsert(packet, None, test_time(12, 0, 0));
        reg.list()[0].clone()
    }

    #[test]
    fn test_row_classifies_resources() {
        let node = node_from(
            PacketBuilder::new(LayoutVersion::Current)
                .cpu_cores(4)
                .load_avg(3.6)
                .mem(100 * GIB, 80 * GIB)
                .disk(100 * GIB, 10 * GIB)
                .net_in(1024.0 * 1024.0)
                .ledger_seq(90_000_000),
        );
        let row = NodeRow::from_node(&node, test_time(12, 0, 1));

        assert_eq!(row.load.severity, Severity::Critical);
        assert_eq!(row.load.text, "3.60");
        assert_eq!(row.memory.severity, Severity::Caution);
        assert_eq!(row.disk.severity, Severity::Normal);
        assert_eq!(row.net_in.severity, Severity::Normal);
        // No outbound traffic reported.
        assert_eq!(row.net_out.severity, Severity::Critical);
        assert_eq!(row.ledger, "90000000");
        assert_eq!(row.last_seen, "1.0s");
        assert_eq!(row.worst(), Severity::Critical);
    }

    #[test]
    fn test_row_lists_warnings() {
        let node = node_from(PacketBuilder::new(LayoutVersion::Current).warning_flags(0b1001));
        let row = NodeRow::from_node(&node, test_time(12, 0, 0));
        assert_eq!(row.status, NodeStatus::NotSynced);
        assert_eq!(row.warnings, "AMENDMENT BLOCKED, NOT SYNCED");
    }

    #[test]
    fn test_row_without_snapshot_is_blank() {
        let key = crate::wire::NodeKey([0x02; crate::wire::NODE_KEY_LEN]);
        let node = NodeState::new(0, key, "nX".to_string(), test_time(12, 0, 0));
        let row = NodeRow::from_node(&node, test_time(12, 0, 0) + TimeDelta::seconds(5));

        assert_eq!(row.status, NodeStatus::Initializing);
        assert_eq!(row.ledger, "-");
        assert_eq!(row.last_seen, "-");
        assert_eq!(row.worst(), Severity::Normal);
    }
}
