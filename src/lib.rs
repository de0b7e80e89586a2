//! # nodewatch
//!
//! A terminal dashboard for the UDP telemetry that distributed-ledger server
//! nodes broadcast about themselves.
//!
//! Each datagram is a fixed little-endian header followed by variable
//! sections. The crate decodes it, classifies the numbers into severity
//! tiers, and folds it into a per-node state machine that tracks liveness,
//! sync status and warning transitions, raising throttled alerts.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌──────────┐    ┌─────────┐  │
//! │  │  app    │───▶│   data   │───▶│    ui    │───▶│Terminal │  │
//! │  │ (state) │    │ (nodes)  │    │(rendering│    │         │  │
//! │  └────┬────┘    └────┬─────┘    └──────────┘    └─────────┘  │
//! │       │              │                                       │
//! │       ▼              ▼                                       │
//! │  ┌─────────┐    ┌──────────┐                                 │
//! │  │ source  │    │   wire   │                                 │
//! │  │ (bytes) │    │ (decode) │                                 │
//! │  └─────────┘    └──────────┘                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`wire`]**: Layout tables and the best-effort datagram decoder
//! - **[`data`]**: Classification, node state machine, registry and alert log
//! - **[`source`]**: Where datagrams come from ([`DataSource`] trait, UDP and
//!   channel implementations)
//! - **[`app`]**: Application state, view navigation, and the ingest/tick loop body
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]**: Layered settings
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Listen on the default port with the current layout
//! nodewatch
//!
//! # Older fleet, custom port
//! nodewatch --listen 0.0.0.0:7000 --layout legacy
//! ```
//!
//! ### As a library
//!
//! ```
//! use nodewatch::{Clock, LayoutVersion, Monitor, SystemClock};
//!
//! let mut monitor = Monitor::new(LayoutVersion::Current);
//! let outcome = monitor.ingest(&[0u8; 16], None, SystemClock.now());
//! assert!(monitor.nodes().is_empty());
//! # let _ = outcome;
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod logging;
pub mod source;
pub mod ui;
pub mod wire;

pub use app::App;
pub use config::{Overrides, Settings};
pub use data::{
    Alert, AlertLog, Clock, Monitor, NodeState, NodeStatus, Registry, Severity, SystemClock,
    Timestamp,
};
pub use source::{ChannelSource, DataSource, Datagram, UdpSource};
pub use wire::{decode, DecodeError, LayoutVersion, TelemetryPacket, TelemetrySnapshot};
