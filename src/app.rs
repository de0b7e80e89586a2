//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde_json::json;

use crate::data::{Clock, Monitor, NodeState, NodeStatus, Timestamp};
use crate::source::DataSource;
use crate::ui::Theme;

/// Upper bound on datagrams drained from the source per [`App::pump`], so a
/// flood cannot starve rendering and input.
const MAX_DATAGRAMS_PER_PUMP: usize = 4096;

/// How long a status bar message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
///
/// Node detail is shown as an overlay (controlled by `App::show_detail_overlay`)
/// rather than as a separate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// One row per tracked node.
    Nodes,
    /// The alert log, newest first.
    Alerts,
}

impl View {
    pub fn next(self) -> Self {
        match self {
            View::Nodes => View::Alerts,
            View::Alerts => View::Nodes,
        }
    }

    pub fn prev(self) -> Self {
        // Two views: previous and next coincide.
        self.next()
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Nodes => "Nodes",
            View::Alerts => "Alerts",
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub show_detail_overlay: bool,

    // Data
    source: Box<dyn DataSource>,
    clock: Box<dyn Clock>,
    pub monitor: Monitor,
    pub source_error: Option<String>,
    tick_interval: Duration,
    last_tick: Option<Instant>,
    last_datagram: Option<Instant>,

    // Navigation state
    pub selected_node_index: usize,
    pub alert_scroll: usize,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create an App reading from `source`, with liveness re-evaluated every
    /// `tick_interval` of `clock` time.
    pub fn new(
        source: Box<dyn DataSource>,
        monitor: Monitor,
        clock: Box<dyn Clock>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            running: true,
            current_view: View::Nodes,
            show_help: false,
            show_detail_overlay: false,
            source,
            clock,
            monitor,
            source_error: None,
            tick_interval,
            last_tick: None,
            last_datagram: None,
            selected_node_index: 0,
            alert_scroll: 0,
            filter_text: String::new(),
            filter_active: false,
            theme: Theme::dark(),
            status_message: None,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    /// Drain pending datagrams into the monitor.
    ///
    /// Returns the number of datagrams processed.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while processed < MAX_DATAGRAMS_PER_PUMP {
            let Some(datagram) = self.source.poll() else {
                break;
            };
            let now = self.clock.now();
            self.monitor.ingest(&datagram.bytes, datagram.from, now);
            self.last_datagram = Some(now.mono);
            processed += 1;
        }
        self.source_error = self.source.error().map(str::to_string);
        self.clamp_selection();
        processed
    }

    /// Run the liveness tick if a full interval of monotonic time has passed
    /// since the last one. Returns true if it ran.
    pub fn maybe_tick(&mut self) -> bool {
        let now = self.clock.now();
        let due = self
            .last_tick
            .is_none_or(|last| now.mono.saturating_duration_since(last) >= self.tick_interval);
        if due {
            self.monitor.tick(now);
            self.last_tick = Some(now.mono);
        }
        due
    }

    /// One iteration of the event-processing path: ingest, then tick.
    pub fn update(&mut self) {
        self.pump();
        self.maybe_tick();
    }

    /// Time since any datagram (valid or not) was received.
    pub fn since_last_datagram(&self) -> Option<Duration> {
        let now = self.clock.instant();
        self.last_datagram.map(|at| now.saturating_duration_since(at))
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Nodes that pass the current filter, in slot order.
    pub fn visible_nodes(&self) -> Vec<&NodeState> {
        self.monitor
            .nodes()
            .iter()
            .filter(|n| self.matches_filter(&n.display_id))
            .collect()
    }

    /// The node under the cursor in the Nodes view.
    pub fn selected_node(&self) -> Option<&NodeState> {
        self.visible_nodes().get(self.selected_node_index).copied()
    }

    fn list_len(&self) -> usize {
        match self.current_view {
            View::Nodes => self.visible_nodes().len(),
            View::Alerts => self.monitor.alerts().len(),
        }
    }

    fn cursor_mut(&mut self) -> &mut usize {
        match self.current_view {
            View::Nodes => &mut self.selected_node_index,
            View::Alerts => &mut self.alert_scroll,
        }
    }

    fn clamp_selection(&mut self) {
        let max = self.visible_nodes().len().saturating_sub(1);
        self.selected_node_index = self.selected_node_index.min(max);
        let max = self.monitor.alerts().len().saturating_sub(1);
        self.alert_scroll = self.alert_scroll.min(max);
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.list_len().saturating_sub(1);
        let cursor = self.cursor_mut();
        *cursor = (*cursor + n).min(max);
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        let cursor = self.cursor_mut();
        *cursor = cursor.saturating_sub(n);
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        *self.cursor_mut() = 0;
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        let last = self.list_len().saturating_sub(1);
        *self.cursor_mut() = last;
    }

    /// Open the detail overlay for the selected node.
    pub fn enter_detail(&mut self) {
        if self.current_view == View::Nodes && self.selected_node().is_some() {
            self.show_detail_overlay = true;
        }
    }

    /// Navigate back: close overlay first, then return to the Nodes view.
    pub fn go_back(&mut self) {
        if self.show_detail_overlay {
            self.show_detail_overlay = false;
        } else if self.current_view != View::Nodes {
            self.current_view = View::Nodes;
        }
    }

    /// Close the detail overlay if open.
    pub fn close_overlay(&mut self) {
        self.show_detail_overlay = false;
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.clamp_selection();
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Check if a node identifier matches the current filter.
    pub fn matches_filter(&self, name: &str) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        name.to_lowercase().contains(&self.filter_text.to_lowercase())
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the registry and alert log to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let nodes = self.monitor.nodes();
        if nodes.is_empty() {
            anyhow::bail!("No nodes to export");
        }

        let now = self.clock.now();
        let count = |status: NodeStatus| nodes.iter().filter(|n| n.status == status).count();
        let stats = self.monitor.stats();

        let export = json!({
            "exported_at": now.wall.to_rfc3339(),
            "layout": self.monitor.layout(),
            "summary": {
                "total_nodes": nodes.len(),
                "synced": count(NodeStatus::Synced),
                "not_synced": count(NodeStatus::NotSynced),
                "awol": count(NodeStatus::Awol),
                "datagrams": {
                    "received": stats.received,
                    "applied": stats.applied,
                    "rejected": stats.rejected,
                    "truncated": stats.truncated,
                    "dropped": stats.dropped,
                },
            },
            "nodes": nodes.iter().map(|n| node_json(n, now)).collect::<Vec<_>>(),
            "alerts": self.monitor.alerts().lines(),
        });

        let json = serde_json::to_string_pretty(&export)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn node_json(node: &NodeState, now: Timestamp) -> serde_json::Value {
    let mut value = json!({
        "slot": node.slot,
        "id": node.display_id,
        "public_key": hex::encode(node.key.as_bytes()),
        "status": node.status.label(),
        "packets": node.packets,
        "warnings": node.warnings.iter().map(|w| w.label()).collect::<Vec<_>>(),
        "first_seen": node.first_seen_at.wall.to_rfc3339(),
        "last_seen": node.last_seen_at.map(|t| t.wall.to_rfc3339()),
        "silent_ms": node.silence(now).map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
    });

    if let Some(obs) = node.current.as_deref() {
        let s = &obs.snapshot;
        value["telemetry"] = json!({
            "version": s.version,
            "version_string": s.version_string,
            "network_id": s.network_id,
            "server_state": s.server_state.label(),
            "peers": s.peer_count,
            "ledger_seq": s.ledger_seq,
            "ledger_hash": hex::encode(s.ledger_hash),
            "uptime_secs": s.uptime,
            "io_latency_us": s.io_latency_us,
            "load_factor": s.load_factor,
            "cpu_cores": s.cpu_cores,
            "load_avg": [s.load_avg.one, s.load_avg.five, s.load_avg.fifteen],
            "memory": { "total": s.system.mem_total, "used": s.system.mem_used },
            "disk": { "total": s.system.disk_total, "used": s.system.disk_used },
            "complete_ledgers": obs.ranges.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
            "source": obs.source.map(|a| a.to_string()),
        });
    }

    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clock::test_time;
    use crate::data::ManualClock;
    use crate::source::{ChannelSource, Datagram};
    use crate::wire::testutil::PacketBuilder;
    use crate::wire::LayoutVersion;
    use chrono::TimeDelta;
    use tokio::sync::mpsc;

    fn app_with_clock() -> (mpsc::Sender<Datagram>, ManualClock, App) {
        let (tx, source) = ChannelSource::create("test");
        let clock = ManualClock::new(test_time(12, 0, 0));
        let app = App::new(
            Box::new(source),
            Monitor::new(LayoutVersion::Current),
            Box::new(clock.clone()),
            Duration::from_secs(1),
        );
        (tx, clock, app)
    }

    fn send(tx: &mpsc::Sender<Datagram>, node: u8, flags: u32) {
        let bytes = PacketBuilder::new(LayoutVersion::Current)
            .node_index(node)
            .warning_flags(flags)
            .build();
        tx.try_send(Datagram::new(bytes, None)).unwrap();
    }

    #[test]
    fn test_view_cycling() {
        assert_eq!(View::Nodes.next(), View::Alerts);
        assert_eq!(View::Alerts.next(), View::Nodes);
        assert_eq!(View::Nodes.prev(), View::Alerts);
    }

    #[test]
    fn test_pump_ingests_all_pending() {
        let (tx, _clock, mut app) = app_with_clock();
        send(&tx, 1, 0);
        send(&tx, 2, 0);
        send(&tx, 1, 0);

        assert_eq!(app.pump(), 3);
        assert_eq!(app.monitor.nodes().len(), 2);
        assert_eq!(app.pump(), 0);
    }

    #[test]
    fn test_tick_runs_once_per_interval() {
        let (_tx, clock, mut app) = app_with_clock();

        assert!(app.maybe_tick());
        assert!(!app.maybe_tick());
        clock.advance(TimeDelta::milliseconds(999));
        assert!(!app.maybe_tick());
        clock.advance(TimeDelta::milliseconds(1));
        assert!(app.maybe_tick());
    }

    #[test]
    fn test_silent_node_goes_awol_without_packets() {
        let (tx, clock, mut app) = app_with_clock();
        send(&tx, 1, 0);
        app.update();
        assert_eq!(app.monitor.nodes()[0].status, NodeStatus::Synced);

        clock.advance(TimeDelta::milliseconds(2_500));
        app.update();
        assert_eq!(app.monitor.nodes()[0].status, NodeStatus::Awol);
        assert_eq!(app.monitor.alerts().len(), 1);
    }

    #[test]
    fn test_wall_clock_step_back_still_expires_nodes() {
        let (tx, clock, mut app) = app_with_clock();
        send(&tx, 1, 0);
        app.update();

        clock.set_wall(test_time(11, 0, 0).wall);
        for _ in 0..3 {
            clock.advance(TimeDelta::seconds(1));
            app.update();
        }

        assert_eq!(app.monitor.nodes()[0].status, NodeStatus::Awol);
        assert_eq!(app.monitor.alerts().len(), 1);
        assert_eq!(app.since_last_datagram(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_wall_clock_step_forward_keeps_nodes_alive() {
        let (tx, clock, mut app) = app_with_clock();
        send(&tx, 1, 0);
        app.update();

        clock.set_wall(test_time(13, 0, 0).wall);
        clock.advance(TimeDelta::seconds(1));
        app.update();

        assert_eq!(app.monitor.nodes()[0].status, NodeStatus::Synced);
        assert!(app.monitor.alerts().is_empty());
    }

    #[test]
    fn test_selection_is_clamped() {
        let (tx, _clock, mut app) = app_with_clock();
        for i in 0..3 {
            send(&tx, i, 0);
        }
        app.pump();

        app.select_next_n(10);
        assert_eq!(app.selected_node_index, 2);
        app.select_prev();
        assert_eq!(app.selected_node_index, 1);
        app.select_first();
        assert_eq!(app.selected_node_index, 0);
        app.select_last();
        assert_eq!(app.selected_node_index, 2);
    }

    #[test]
    fn test_alert_view_scrolls_alert_log() {
        let (tx, _clock, mut app) = app_with_clock();
        send(&tx, 1, 0b1111);
        app.pump();

        app.set_view(View::Alerts);
        app.select_last();
        assert_eq!(app.alert_scroll, 3);
        assert_eq!(app.selected_node_index, 0);
    }

    #[test]
    fn test_filter_matches_display_id() {
        let (_tx, _clock, mut app) = app_with_clock();
        assert!(app.matches_filter("nHUabc"));

        app.filter_push('H');
        app.filter_push('u');
        assert!(app.matches_filter("nHUabc"));
        assert!(!app.matches_filter("n9xyz"));

        app.clear_filter();
        assert!(app.filter_text.is_empty());
        assert!(!app.filter_active);
    }

    #[test]
    fn test_detail_requires_a_node() {
        let (tx, _clock, mut app) = app_with_clock();
        app.enter_detail();
        assert!(!app.show_detail_overlay);

        send(&tx, 1, 0);
        app.pump();
        app.enter_detail();
        assert!(app.show_detail_overlay);

        app.go_back();
        assert!(!app.show_detail_overlay);
    }

    #[test]
    fn test_go_back_returns_to_nodes() {
        let (_tx, _clock, mut app) = app_with_clock();
        app.set_view(View::Alerts);
        app.go_back();
        assert_eq!(app.current_view, View::Nodes);
    }

    #[test]
    fn test_export_without_nodes_fails() {
        let (_tx, _clock, app) = app_with_clock();
        let dir = tempfile::tempdir().unwrap();
        assert!(app.export_state(&dir.path().join("out.json")).is_err());
    }

    #[test]
    fn test_export_writes_registry_and_alerts() {
        let (tx, _clock, mut app) = app_with_clock();
        send(&tx, 1, 0b1000);
        send(&tx, 2, 0);
        app.pump();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        app.export_state(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["summary"]["total_nodes"], 2);
        assert_eq!(value["summary"]["not_synced"], 1);
        assert_eq!(value["layout"], "current");
        assert_eq!(value["nodes"][0]["status"], "NOT SYNCED");
        assert_eq!(value["nodes"][0]["warnings"][0], "NOT SYNCED");
        assert_eq!(value["nodes"][1]["slot"], 1);
        assert_eq!(value["alerts"].as_array().unwrap().len(), 1);
    }
}
