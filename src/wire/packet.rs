//! Decoded telemetry types.
//!
//! Everything here is a plain value produced by [`decode`](super::decode).
//! None of it is mutated after decoding.

use std::fmt;

/// Length of a node public key on the wire.
pub const NODE_KEY_LEN: usize = 33;

/// Raw 33-byte node public key, used as the node identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub [u8; NODE_KEY_LEN]);

impl NodeKey {
    pub fn as_bytes(&self) -> &[u8; NODE_KEY_LEN] {
        &self.0
    }

    /// True when every byte is zero, which is what an unfilled header yields.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Debug for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeKey({})", hex::encode(self.0))
    }
}

/// Operating mode a node reports for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Disconnected,
    Connected,
    Syncing,
    Tracking,
    Full,
    Validating,
    Proposing,
    Unknown(u32),
}

impl From<u32> for ServerState {
    fn from(ordinal: u32) -> Self {
        match ordinal {
            0 => ServerState::Disconnected,
            1 => ServerState::Connected,
            2 => ServerState::Syncing,
            3 => ServerState::Tracking,
            4 => ServerState::Full,
            5 => ServerState::Validating,
            6 => ServerState::Proposing,
            other => ServerState::Unknown(other),
        }
    }
}

impl ServerState {
    pub fn label(&self) -> &'static str {
        match self {
            ServerState::Disconnected => "disconnected",
            ServerState::Connected => "connected",
            ServerState::Syncing => "syncing",
            ServerState::Tracking => "tracking",
            ServerState::Full => "full",
            ServerState::Validating => "validating",
            ServerState::Proposing => "proposing",
            ServerState::Unknown(_) => "unknown",
        }
    }
}

/// Host resource counters reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SystemMetrics {
    /// Resident memory of the server process, in pages.
    pub process_mem_pages: u64,
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_used: u64,
    pub disk_total: u64,
    pub disk_free: u64,
    pub disk_used: u64,
    pub io_wait_time: u64,
}

/// 1, 5 and 15 minute load averages.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// Operating modes tracked by state accounting, in wire order.
pub const ACCOUNTED_STATES: [&str; 5] = ["Disconnect", "Connect", "Syncing", "Tracking", "Full"];

/// Per-mode transition counts and time spent, in [`ACCOUNTED_STATES`] order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateAccounting {
    pub transitions: [u64; 5],
    pub durations_us: [u64; 5],
    pub initial_sync_us: u64,
}

/// Rolling throughput for one I/O channel, in bytes per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RateStat {
    pub one_minute: f64,
    pub five_minutes: f64,
    pub one_hour: f64,
    pub one_day: f64,
}

/// The four rate blocks carried by every layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IoRates {
    pub net_in: RateStat,
    pub net_out: RateStat,
    pub disk_read: RateStat,
    pub disk_write: RateStat,
}

/// One decoded datagram's fixed header.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub version: u32,
    pub network_id: u32,
    pub server_state: ServerState,
    pub peer_count: u32,
    pub node_size: u32,
    pub cpu_cores: u32,
    pub warning_flags: u32,
    pub timestamp: u64,
    /// Seconds since the server process started.
    pub uptime: u64,
    pub io_latency_us: u64,
    pub validation_quorum: u64,
    pub fetch_pack_size: u64,
    pub proposer_count: u64,
    pub converge_time_ms: u64,
    pub load_factor: u64,
    pub load_base: u64,
    pub reserve_base: u64,
    pub reserve_inc: u64,
    pub ledger_seq: u64,
    pub ledger_hash: [u8; 32],
    pub node_public_key: NodeKey,
    pub version_string: Option<String>,
    pub system: SystemMetrics,
    pub load_avg: LoadAverage,
    /// Absent in layouts that predate state accounting.
    pub state_accounting: Option<StateAccounting>,
    pub rates: IoRates,
}

/// Closed interval of contiguous ledger sequences held by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerRange {
    pub start: u32,
    pub end: u32,
}

impl fmt::Display for LedgerRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Named counter from the trailing object table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCount {
    pub name: String,
    pub count: u64,
}

/// Storage engine internals, only carried by the current layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DebugCounters {
    pub db_kb_total: u64,
    pub db_kb_ledger: u64,
    pub db_kb_transaction: u64,
    pub local_txs: u64,
    pub write_load: u64,
    pub historical_per_minute: u64,
    pub sle_hit_rate: f64,
    pub ledger_hit_rate: f64,
    pub accepted_ledger_size: u64,
    pub accepted_ledger_hit_rate: f64,
    pub full_below_size: u64,
    pub tree_node_cache_size: u64,
    pub tree_node_track_size: u64,
    pub node_read_bytes: u64,
    pub node_reads_total: u64,
    pub node_reads_hit: u64,
    pub node_writes: u64,
    pub node_written_bytes: u64,
    pub node_read_duration_us: u64,
    pub node_writes_delayed: u64,
    pub read_queue: u64,
    pub read_request_bundle: u64,
    pub read_threads_running: u64,
    pub read_threads_total: u64,
    pub cache_hit_rate: f64,
}

/// Everything decoded from one datagram.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryPacket {
    pub snapshot: TelemetrySnapshot,
    pub ranges: Vec<LedgerRange>,
    pub objects: Vec<ObjectCount>,
    pub debug: Option<DebugCounters>,
    /// False when the buffer was shorter than the layout's fixed header and
    /// the snapshot was filled with zeros past the end.
    pub header_complete: bool,
}
