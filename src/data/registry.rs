//! Bounded registry of tracked nodes.

use std::collections::HashMap;
use std::net::SocketAddr;

use tracing::{info, trace};

use super::alerts::Alert;
use super::clock::Timestamp;
use super::identity::{display_id, Base58NodeEncoder, NodeIdEncoder};
use super::node::NodeState;
use crate::wire::{NodeKey, TelemetryPacket};

/// Maximum number of nodes tracked at once.
pub const REGISTRY_CAPACITY: usize = 20;

/// Nodes keyed by raw public key, held in registration order.
///
/// Slots are handed out in arrival order and never reused. Once every slot is
/// taken, packets from unseen nodes are ignored; idle nodes are never evicted,
/// so a node keeps its position on screen for the life of the process.
#[derive(Debug)]
pub struct Registry {
    nodes: Vec<NodeState>,
    index: HashMap<NodeKey, usize>,
    capacity: usize,
    encoder: Box<dyn NodeIdEncoder>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_encoder(Box::new(Base58NodeEncoder))
    }

    pub fn with_encoder(encoder: Box<dyn NodeIdEncoder>) -> Self {
        Self {
            nodes: Vec::with_capacity(REGISTRY_CAPACITY),
            index: HashMap::with_capacity(REGISTRY_CAPACITY),
            capacity: REGISTRY_CAPACITY,
            encoder,
        }
    }

    /// Apply a packet to the node it came from, registering the node first
    /// if it is new.
    ///
    /// Returns `None` when the node is unseen and the registry is full.
    pub fn upsert(
        &mut self,
        packet: TelemetryPacket,
        source: Option<SocketAddr>,
        now: Timestamp,
    ) -> Option<(&NodeState, Vec<Alert>)> {
        let key = packet.snapshot.node_public_key;

        let slot = match self.index.get(&key).copied() {
            Some(slot) => slot,
            None => {
                if self.nodes.len() >= self.capacity {
                    trace!(?key, "registry full, ignoring unseen node");
                    return None;
                }
                let slot = self.nodes.len();
                let id = display_id(self.encoder.as_ref(), &key);
                info!(node = %id, slot, ?source, "tracking new node");
                self.nodes.push(NodeState::new(slot, key, id, now));
                self.index.insert(key, slot);
                slot
            }
        };

        let node = &mut self.nodes[slot];
        let alerts = node.apply(packet, source, now);
        Some((&*node, alerts))
    }

    /// Re-evaluate liveness of every node.
    pub fn tick(&mut self, now: Timestamp) -> Vec<Alert> {
        self.nodes.iter_mut().flat_map(|n| n.tick(now)).collect()
    }

    /// All tracked nodes in slot order.
    pub fn list(&self) -> &[NodeState] {
        &self.nodes
    }

    pub fn get(&self, key: &NodeKey) -> Option<&NodeState> {
        self.index.get(key).map(|&slot| &self.nodes[slot])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.nodes.len() >= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clock::test_time;
    use crate::data::identity::IdentityError;
    use crate::data::node::NodeStatus;
    use crate::wire::testutil::PacketBuilder;
    use crate::wire::{decode, LayoutVersion};
    use chrono::TimeDelta;

    fn packet_from(i: u8) -> TelemetryPacket {
        let buf = PacketBuilder::new(LayoutVersion::Current).node_index(i).build();
        decode(&buf, LayoutVersion::Current).unwrap()
    }

    #[test]
    fn first_packet_registers_node() {
        let mut reg = Registry::new();
        let (node, alerts) = reg.upsert(packet_from(1), None, test_time(12, 0, 0)).unwrap();

        assert_eq!(node.slot, 0);
        assert_eq!(node.status, NodeStatus::Synced);
        assert!(node.display_id.starts_with('n'));
        assert!(alerts.is_empty());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn repeat_packets_update_same_slot() {
        let mut reg = Registry::new();
        let t0 = test_time(12, 0, 0);
        reg.upsert(packet_from(1), None, t0);
        reg.upsert(packet_from(2), None, t0);
        let (node, _) = reg.upsert(packet_from(1), None, t0 + TimeDelta::seconds(1)).unwrap();

        assert_eq!(node.slot, 0);
        assert_eq!(node.packets, 2);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn capacity_is_twenty() {
        let mut reg = Registry::new();
        let t0 = test_time(12, 0, 0);
        for i in 0..21 {
            reg.upsert(packet_from(i), None, t0);
        }

        assert_eq!(reg.list().len(), REGISTRY_CAPACITY);
        assert!(reg.is_full());
        let late = packet_from(20).snapshot.node_public_key;
        assert!(reg.get(&late).is_none());
        assert!(reg.list().iter().all(|n| n.key != late));
    }

    #[test]
    fn known_nodes_still_update_when_full() {
        let mut reg = Registry::new();
        let t0 = test_time(12, 0, 0);
        for i in 0..20 {
            reg.upsert(packet_from(i), None, t0);
        }
        assert!(reg.upsert(packet_from(99), None, t0).is_none());
        assert!(reg.upsert(packet_from(3), None, t0).is_some());
    }

    #[test]
    fn list_is_in_slot_order() {
        let mut reg = Registry::new();
        let t0 = test_time(12, 0, 0);
        for i in [5, 3, 9] {
            reg.upsert(packet_from(i), None, t0);
        }
        let slots: Vec<usize> = reg.list().iter().map(|n| n.slot).collect();
        assert_eq!(slots, vec![0, 1, 2]);
        assert_eq!(reg.list()[1].key, packet_from(3).snapshot.node_public_key);
    }

    #[test]
    fn tick_marks_silent_nodes_awol() {
        let mut reg = Registry::new();
        let t0 = test_time(12, 0, 0);
        reg.upsert(packet_from(1), None, t0);
        reg.upsert(packet_from(2), None, t0 + TimeDelta::milliseconds(1_000));

        let alerts = reg.tick(t0 + TimeDelta::milliseconds(2_500));
        assert_eq!(alerts.len(), 1);
        assert_eq!(reg.list()[0].status, NodeStatus::Awol);
        assert_eq!(reg.list()[1].status, NodeStatus::Synced);
    }

    #[derive(Debug)]
    struct FailingEncoder;

    impl NodeIdEncoder for FailingEncoder {
        fn encode(&self, key: &NodeKey) -> Result<String, IdentityError> {
            Err(IdentityError::UnknownKeyType(key.as_bytes()[0]))
        }
    }

    #[test]
    fn encoder_failure_uses_hex_fallback() {
        let mut reg = Registry::with_encoder(Box::new(FailingEncoder));
        let (node, _) = reg.upsert(packet_from(7), None, test_time(12, 0, 0)).unwrap();
        assert_eq!(node.display_id, "ed07000000000000…");
    }
}
