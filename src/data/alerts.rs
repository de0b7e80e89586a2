//! Alerts raised by node state transitions and the bounded log holding them.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Local};

use super::warnings::{Warning, WarningSet};

/// Maximum number of alerts kept in the log.
pub const ALERT_LOG_CAPACITY: usize = 100;

/// What triggered an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertKind {
    /// A warning appeared that was not present in the previous packet.
    NewWarning(Warning),
    /// Warnings still present after the reminder window elapsed.
    PersistentWarnings(WarningSet),
    /// No packet within the liveness timeout.
    Awol,
}

/// One alert, attributed to a node by its display identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub at: DateTime<Local>,
    pub node: String,
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn new(at: DateTime<Local>, node: &str, kind: AlertKind) -> Self {
        let message = match &kind {
            AlertKind::NewWarning(w) => format!("{}", w),
            AlertKind::PersistentWarnings(set) => format!("still {}", set.labels()),
            AlertKind::Awol => "AWOL: no telemetry received".to_string(),
        };
        Self {
            at,
            node: node.to_string(),
            kind,
            message,
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.at.format("%H:%M:%S"), self.node, self.message)
    }
}

/// Bounded newest-first alert log. Appending past capacity drops the oldest.
#[derive(Debug, Clone)]
pub struct AlertLog {
    entries: VecDeque<Alert>,
    capacity: usize,
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertLog {
    pub fn new() -> Self {
        Self::with_capacity(ALERT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, alert: Alert) {
        tracing::info!(node = %alert.node, message = %alert.message, "alert");
        self.entries.push_front(alert);
        self.entries.truncate(self.capacity);
    }

    /// Append alerts in the order they were raised.
    pub fn extend(&mut self, alerts: impl IntoIterator<Item = Alert>) {
        for alert in alerts {
            self.push(alert);
        }
    }

    /// Alerts, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.entries.iter()
    }

    /// Rendered `"[HH:MM:SS] node: message"` lines, newest first.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(Alert::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clock::test_time;

    #[test]
    fn line_format() {
        let alert = Alert::new(
            test_time(9, 5, 7).wall,
            "nHUabc",
            AlertKind::NewWarning(Warning::NotSynced),
        );
        assert_eq!(alert.to_string(), "[09:05:07] nHUabc: NOT SYNCED");
    }

    #[test]
    fn persistent_message_lists_warnings() {
        let set = WarningSet::from_bits(0b0011);
        let alert = Alert::new(test_time(9, 0, 0).wall, "n1", AlertKind::PersistentWarnings(set));
        assert_eq!(alert.message, "still AMENDMENT BLOCKED, UNL BLOCKED");
    }

    #[test]
    fn newest_first() {
        let mut log = AlertLog::new();
        log.push(Alert::new(test_time(10, 0, 0).wall, "a", AlertKind::Awol));
        log.push(Alert::new(test_time(10, 0, 1).wall, "b", AlertKind::Awol));

        let nodes: Vec<&str> = log.iter().map(|a| a.node.as_str()).collect();
        assert_eq!(nodes, vec!["b", "a"]);
    }

    #[test]
    fn drops_oldest_past_capacity() {
        let mut log = AlertLog::new();
        for i in 0..(ALERT_LOG_CAPACITY + 5) {
            log.push(Alert::new(test_time(10, 0, 0).wall, &format!("n{i}"), AlertKind::Awol));
        }

        assert_eq!(log.len(), ALERT_LOG_CAPACITY);
        assert_eq!(log.iter().next().unwrap().node, format!("n{}", ALERT_LOG_CAPACITY + 4));
        assert_eq!(log.iter().last().unwrap().node, "n5");
    }

    #[test]
    fn lines_are_rendered_newest_first() {
        let mut log = AlertLog::with_capacity(2);
        log.extend([
            Alert::new(test_time(1, 2, 3).wall, "x", AlertKind::Awol),
            Alert::new(test_time(1, 2, 4).wall, "y", AlertKind::Awol),
            Alert::new(test_time(1, 2, 5).wall, "z", AlertKind::Awol),
        ]);
        assert_eq!(
            log.lines(),
            vec![
                "[01:02:05] z: AWOL: no telemetry received".to_string(),
                "[01:02:04] y: AWOL: no telemetry received".to_string(),
            ]
        );
    }
}
