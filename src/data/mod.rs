//! Per-node state built from decoded telemetry.
//!
//! ## Submodules
//!
//! - [`classify`]: Severity tiers and formatting for raw metric values
//! - [`warnings`]: The node warning bitmask
//! - [`node`]: Per-node liveness and warning state machine ([`NodeState`])
//! - [`registry`]: Bounded set of tracked nodes ([`Registry`])
//! - [`alerts`]: Alerts and the bounded [`AlertLog`]
//! - [`monitor`]: Ingestion path tying the decoder to the registry ([`Monitor`])
//! - [`identity`]: Display identifiers derived from node public keys
//! - [`clock`]: Injected time source
//! - [`duration`]: Parsing and formatting of durations
//!
//! ## Data Flow
//!
//! ```text
//! datagram bytes
//!        │
//!        ▼
//! Monitor::ingest() ──▶ wire::decode()
//!        │
//!        ▼
//! Registry::upsert() ──▶ NodeState::apply() ──▶ Vec<Alert>
//!        │                                          │
//!        │            Monitor::tick()               ▼
//!        └──────────▶ NodeState::tick() ──────▶ AlertLog
//! ```

pub mod alerts;
pub mod classify;
pub mod clock;
pub mod duration;
pub mod identity;
pub mod monitor;
pub mod node;
pub mod registry;
pub mod warnings;

pub use alerts::{Alert, AlertKind, AlertLog, ALERT_LOG_CAPACITY};
pub use classify::{Classified, Severity};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use identity::{display_id, Base58NodeEncoder, IdentityError, NodeIdEncoder};
pub use monitor::{Ingest, IngestStats, Monitor};
pub use node::{NodeState, NodeStatus, Observation};
pub use registry::{Registry, REGISTRY_CAPACITY};
pub use warnings::{Warning, WarningSet};
