//! Offset tables for the wire layouts a node may emit.
//!
//! The three layouts share field order but differ in field widths, optional
//! sections and alignment padding. Nothing on the wire reliably tells them
//! apart, so the layout to decode with is chosen by configuration.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Value of the leading magic word, little-endian bytes `XLTM`.
pub const MAGIC: u32 = 0x4D54_4C58;

/// Size of one ledger range pair.
pub const RANGE_LEN: usize = 8;
/// Size of the padded name in an object table record.
pub const OBJECT_NAME_LEN: usize = 56;
/// Size of one object table record.
pub const OBJECT_RECORD_LEN: usize = OBJECT_NAME_LEN + 8;
/// Size of the version string field.
pub const VERSION_STRING_LEN: usize = 32;
/// Number of 8-byte slots in the debug counter block.
pub const DEBUG_COUNTER_SLOTS: usize = 25;

/// Width of the warning bitmask field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagWidth {
    U16,
    U32,
}

/// Wire layout variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutVersion {
    /// Canonical layout: magic, range count, version string, debug counters.
    #[default]
    Current,
    /// Magic and range count, but no version string and no debug counters.
    Compact,
    /// No magic, 16-bit warning flags, a single trailing ledger range.
    Legacy,
}

impl LayoutVersion {
    pub const ALL: [LayoutVersion; 3] =
        [LayoutVersion::Current, LayoutVersion::Compact, LayoutVersion::Legacy];

    /// Offset table for this layout.
    pub fn offsets(self) -> &'static FieldOffsets {
        match self {
            LayoutVersion::Current => &CURRENT,
            LayoutVersion::Compact => &COMPACT,
            LayoutVersion::Legacy => &LEGACY,
        }
    }

    /// Minimum buffer length holding the complete fixed header.
    pub fn header_len(self) -> usize {
        self.offsets().header_len
    }

    pub fn name(self) -> &'static str {
        match self {
            LayoutVersion::Current => "current",
            LayoutVersion::Compact => "compact",
            LayoutVersion::Legacy => "legacy",
        }
    }
}

impl fmt::Display for LayoutVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayoutVersion::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown layout '{}' (expected current, compact or legacy)", s))
    }
}

/// Byte offsets of every fixed-header field for one layout.
///
/// Consecutive 64-bit groups are given by their first offset:
/// `counters` holds timestamp through ledger_seq (12 values), `system` holds
/// the 8 memory/disk/io values, `load_avg` 3 doubles, `rates` 4 blocks of 4
/// doubles, and `state_accounting` 5 transitions, 5 durations and the initial
/// sync duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOffsets {
    pub magic: Option<usize>,
    pub accepted_versions: Option<RangeInclusive<u32>>,
    pub version: usize,
    pub network_id: usize,
    pub server_state: usize,
    pub peer_count: usize,
    pub node_size: usize,
    pub cpu_cores: usize,
    pub ledger_range_count: Option<usize>,
    pub warning_flags: usize,
    pub warning_width: FlagWidth,
    pub counters: usize,
    pub ledger_hash: usize,
    pub node_public_key: usize,
    pub version_string: Option<usize>,
    pub system: usize,
    pub load_avg: usize,
    pub state_accounting: Option<usize>,
    pub rates: usize,
    pub debug_counters: Option<usize>,
    pub object_table: bool,
    pub header_len: usize,
}

const CURRENT: FieldOffsets = FieldOffsets {
    magic: Some(0),
    accepted_versions: Some(2..=3),
    version: 4,
    network_id: 8,
    server_state: 12,
    peer_count: 16,
    node_size: 20,
    cpu_cores: 24,
    ledger_range_count: Some(28),
    warning_flags: 32,
    warning_width: FlagWidth::U32,
    counters: 40,
    ledger_hash: 136,
    node_public_key: 168,
    version_string: Some(208),
    system: 240,
    load_avg: 304,
    state_accounting: Some(328),
    rates: 416,
    debug_counters: Some(544),
    object_table: true,
    header_len: 744,
};

const COMPACT: FieldOffsets = FieldOffsets {
    magic: Some(0),
    accepted_versions: Some(2..=2),
    version: 4,
    network_id: 8,
    server_state: 12,
    peer_count: 16,
    node_size: 20,
    cpu_cores: 24,
    ledger_range_count: Some(28),
    warning_flags: 32,
    warning_width: FlagWidth::U32,
    counters: 40,
    ledger_hash: 136,
    node_public_key: 168,
    version_string: None,
    system: 208,
    load_avg: 272,
    state_accounting: Some(296),
    rates: 384,
    debug_counters: None,
    object_table: true,
    header_len: 512,
};

const LEGACY: FieldOffsets = FieldOffsets {
    magic: None,
    accepted_versions: None,
    version: 0,
    network_id: 4,
    server_state: 8,
    peer_count: 12,
    node_size: 16,
    cpu_cores: 20,
    ledger_range_count: None,
    warning_flags: 24,
    warning_width: FlagWidth::U16,
    counters: 32,
    ledger_hash: 128,
    node_public_key: 160,
    version_string: None,
    system: 200,
    load_avg: 264,
    state_accounting: None,
    rates: 288,
    debug_counters: None,
    object_table: false,
    header_len: 416,
};
