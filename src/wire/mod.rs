//! Binary telemetry wire format.
//!
//! Nodes broadcast one fixed-size header per datagram, followed by a variable
//! list of ledger ranges and an optional table of named object counts:
//!
//! ```text
//! ┌──────────────────────────┬────────────────────┬──────────────────────────┐
//! │ fixed header             │ ledger ranges      │ object counts            │
//! │ (layout-specific size)   │ count × (u32, u32) │ n × (56-byte name, u64)  │
//! └──────────────────────────┴────────────────────┴──────────────────────────┘
//! ```
//!
//! All integers are little-endian; 64-bit integers are sent as a low and a
//! high 32-bit half. The header has changed shape over time, see
//! [`LayoutVersion`].

mod decode;
mod error;
mod layout;
mod packet;

#[cfg(test)]
pub(crate) mod testutil;

pub use decode::decode;
pub use error::DecodeError;
pub use layout::{FieldOffsets, FlagWidth, LayoutVersion, MAGIC};
pub use packet::{
    DebugCounters, IoRates, LedgerRange, LoadAverage, NodeKey, ObjectCount, RateStat,
    ServerState, StateAccounting, SystemMetrics, TelemetryPacket, TelemetrySnapshot,
    ACCOUNTED_STATES, NODE_KEY_LEN,
};
