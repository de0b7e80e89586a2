//! Per-node liveness and warning state.
//!
//! A [`NodeState`] evolves through two inputs only: [`NodeState::apply`] when
//! a packet arrives and [`NodeState::tick`] on the periodic timer. Both take
//! the current time as an argument and return the alerts the transition
//! raised; neither touches the display.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::alerts::{Alert, AlertKind};
use super::clock::Timestamp;
use super::warnings::{Warning, WarningSet};
use crate::wire::{DebugCounters, LedgerRange, NodeKey, ObjectCount, TelemetryPacket, TelemetrySnapshot};

/// Silence longer than this marks a node AWOL.
pub const AWOL_TIMEOUT: Duration = Duration::from_millis(2_000);
/// Minimum spacing between repeated alerts of one kind for a node.
pub const ALERT_THROTTLE: Duration = Duration::from_secs(5 * 60);

/// Derived liveness and sync status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeStatus {
    /// Registered but no snapshot applied yet.
    Initializing,
    Synced,
    NotSynced,
    /// No packet within [`AWOL_TIMEOUT`]. Cleared by the next packet.
    Awol,
}

impl NodeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            NodeStatus::Initializing => "INIT",
            NodeStatus::Synced => "SYNCED",
            NodeStatus::NotSynced => "NOT SYNCED",
            NodeStatus::Awol => "AWOL",
        }
    }
}

/// The latest packet from a node, shared cheaply with the display.
#[derive(Debug, Clone)]
pub struct Observation {
    pub snapshot: TelemetrySnapshot,
    pub ranges: Vec<LedgerRange>,
    pub objects: Vec<ObjectCount>,
    pub debug: Option<DebugCounters>,
    pub source: Option<SocketAddr>,
}

/// Tracked state of one node.
#[derive(Debug, Clone)]
pub struct NodeState {
    /// Registration order, used for stable display ordering.
    pub slot: usize,
    pub key: NodeKey,
    /// Identifier shown to the operator.
    pub display_id: String,
    pub status: NodeStatus,
    pub current: Option<Arc<Observation>>,
    pub first_seen_at: Timestamp,
    pub last_seen_at: Option<Timestamp>,
    pub packets: u64,
    /// Warnings from the most recent packet.
    pub warnings: WarningSet,
    pub last_awol_alert_at: Option<Instant>,
    pub last_warning_alert_at: Option<Instant>,
}

impl NodeState {
    pub fn new(slot: usize, key: NodeKey, display_id: String, now: Timestamp) -> Self {
        Self {
            slot,
            key,
            display_id,
            status: NodeStatus::Initializing,
            current: None,
            first_seen_at: now,
            last_seen_at: None,
            packets: 0,
            warnings: WarningSet::default(),
            last_awol_alert_at: None,
            last_warning_alert_at: None,
        }
    }

    pub fn snapshot(&self) -> Option<&TelemetrySnapshot> {
        self.current.as_deref().map(|o| &o.snapshot)
    }

    /// Monotonic time since the last packet, if any arrived.
    pub fn silence(&self, now: Timestamp) -> Option<Duration> {
        self.last_seen_at.map(|seen| now.since(&seen))
    }

    /// Record a packet that arrived at `now`.
    ///
    /// Emits one alert per warning that appeared since the previous packet,
    /// provided no warning cleared at the same time. Warnings carried over
    /// from the previous packet are re-announced at most once per
    /// [`ALERT_THROTTLE`].
    pub fn apply(
        &mut self,
        packet: TelemetryPacket,
        source: Option<SocketAddr>,
        now: Timestamp,
    ) -> Vec<Alert> {
        let warnings = WarningSet::from_bits(packet.snapshot.warning_flags);
        let previous = self.warnings;
        let mut alerts = Vec::new();

        if warnings.is_strict_superset_of(previous) {
            alerts.extend(
                warnings
                    .difference(previous)
                    .iter()
                    .map(|w| Alert::new(now.wall, &self.display_id, AlertKind::NewWarning(w))),
            );
            // The reminder window opens with the first announcement.
            self.last_warning_alert_at.get_or_insert(now.mono);
        } else if warnings.is_empty() {
            self.last_warning_alert_at = None;
        }

        let carried = WarningSet::from_bits(warnings.bits() & previous.bits());
        if !carried.is_empty() && throttle_elapsed(self.last_warning_alert_at, now.mono) {
            alerts.push(Alert::new(
                now.wall,
                &self.display_id,
                AlertKind::PersistentWarnings(carried),
            ));
            self.last_warning_alert_at = Some(now.mono);
        }

        self.warnings = warnings;
        self.status = if warnings.contains(Warning::NotSynced) {
            NodeStatus::NotSynced
        } else {
            NodeStatus::Synced
        };
        self.current = Some(Arc::new(Observation {
            snapshot: packet.snapshot,
            ranges: packet.ranges,
            objects: packet.objects,
            debug: packet.debug,
            source,
        }));
        self.last_seen_at = Some(now);
        self.packets += 1;

        alerts
    }

    /// Re-evaluate liveness at `now`.
    ///
    /// A node silent for longer than [`AWOL_TIMEOUT`] becomes AWOL whatever
    /// its last warnings were. The AWOL alert is raised at most once per
    /// [`ALERT_THROTTLE`].
    pub fn tick(&mut self, now: Timestamp) -> Vec<Alert> {
        let Some(silence) = self.silence(now) else {
            return Vec::new();
        };
        if silence <= AWOL_TIMEOUT {
            return Vec::new();
        }

        self.status = NodeStatus::Awol;
        if !throttle_elapsed(self.last_awol_alert_at, now.mono) {
            return Vec::new();
        }

        self.last_awol_alert_at = Some(now.mono);
        vec![Alert::new(now.wall, &self.display_id, AlertKind::Awol)]
    }
}

fn throttle_elapsed(last: Option<Instant>, now: Instant) -> bool {
    last.is_none_or(|at| now.saturating_duration_since(at) >= ALERT_THROTTLE)
}
