//! Packet ingestion and periodic liveness evaluation.
//!
//! [`Monitor`] is the single writer for all node state: each datagram is
//! decoded, applied and logged to completion before the next one is looked
//! at, and [`Monitor::tick`] runs on the same path.

use std::net::SocketAddr;

use tracing::{debug, warn};

use super::alerts::AlertLog;
use super::clock::Timestamp;
use super::identity::NodeIdEncoder;
use super::node::NodeState;
use super::registry::Registry;
use crate::wire::{decode, DecodeError, LayoutVersion};

/// What happened to one datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingest {
    /// Applied to a tracked node; carries the node's slot.
    Applied(usize),
    /// Rejected by the decoder (wrong magic or version).
    Rejected(DecodeError),
    /// Too short to hold a complete header, so the sender is unknown.
    Truncated,
    /// From an unseen node while the registry is full.
    Dropped,
}

/// Running totals over every datagram seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub received: u64,
    pub applied: u64,
    pub rejected: u64,
    pub truncated: u64,
    pub dropped: u64,
}

/// Decoder, registry and alert log behind one event-processing path.
#[derive(Debug)]
pub struct Monitor {
    layout: LayoutVersion,
    registry: Registry,
    alerts: AlertLog,
    stats: IngestStats,
}

impl Monitor {
    pub fn new(layout: LayoutVersion) -> Self {
        Self::with_registry(layout, Registry::new())
    }

    pub fn with_encoder(layout: LayoutVersion, encoder: Box<dyn NodeIdEncoder>) -> Self {
        Self::with_registry(layout, Registry::with_encoder(encoder))
    }

    fn with_registry(layout: LayoutVersion, registry: Registry) -> Self {
        Self {
            layout,
            registry,
            alerts: AlertLog::new(),
            stats: IngestStats::default(),
        }
    }

    /// Decode one datagram and apply it to the node that sent it.
    pub fn ingest(&mut self, bytes: &[u8], source: Option<SocketAddr>, now: Timestamp) -> Ingest {
        self.stats.received += 1;

        let packet = match decode(bytes, self.layout) {
            Ok(packet) => packet,
            Err(err) => {
                warn!(%err, ?source, len = bytes.len(), "rejected telemetry datagram");
                self.stats.rejected += 1;
                return Ingest::Rejected(err);
            }
        };

        if !packet.header_complete {
            debug!(?source, len = bytes.len(), "dropping truncated datagram");
            self.stats.truncated += 1;
            return Ingest::Truncated;
        }

        match self.registry.upsert(packet, source, now) {
            Some((node, alerts)) => {
                let slot = node.slot;
                self.alerts.extend(alerts);
                self.stats.applied += 1;
                Ingest::Applied(slot)
            }
            None => {
                self.stats.dropped += 1;
                Ingest::Dropped
            }
        }
    }

    /// Re-evaluate liveness of every tracked node.
    pub fn tick(&mut self, now: Timestamp) {
        let alerts = self.registry.tick(now);
        self.alerts.extend(alerts);
    }

    pub fn layout(&self) -> LayoutVersion {
        self.layout
    }

    pub fn nodes(&self) -> &[NodeState] {
        self.registry.list()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn alerts(&self) -> &AlertLog {
        &self.alerts
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }
}
