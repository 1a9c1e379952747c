//! 3-hop circuit selection.
//!
//! A circuit is drawn from a snapshot of the key directory by uniform
//! rejection sampling: pick any relay at random, keep it only if its node id
//! is not already in the circuit, repeat until three are collected. There is
//! no weighting or diversity constraint.

use std::collections::HashSet;

use rand::rngs::ThreadRng;
use rand::Rng;
use shallot_types::network::NodeIdentity;
use shallot_types::NodeId;
use tracing::debug;

use crate::{OnionError, Result, CIRCUIT_HOPS};

/// An ordered path of three distinct relays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Circuit {
    /// The three hops in order (entry, middle, exit).
    hops: [NodeIdentity; CIRCUIT_HOPS],
}

impl Circuit {
    /// Build a circuit from an explicit hop list.
    ///
    /// Fails unless the node ids are distinct.
    pub fn from_hops(hops: [NodeIdentity; CIRCUIT_HOPS]) -> Result<Self> {
        let distinct = distinct_ids(&hops);
        if distinct != CIRCUIT_HOPS {
            return Err(OnionError::InsufficientNodes {
                need: CIRCUIT_HOPS,
                have: distinct,
            });
        }
        Ok(Self { hops })
    }

    /// Return the hops in this circuit.
    pub fn hops(&self) -> &[NodeIdentity; CIRCUIT_HOPS] {
        &self.hops
    }

    /// Return the entry (first) hop.
    pub fn entry_hop(&self) -> &NodeIdentity {
        let [entry, _, _] = &self.hops;
        entry
    }

    /// Return the middle (second) hop.
    pub fn middle_hop(&self) -> &NodeIdentity {
        let [_, middle, _] = &self.hops;
        middle
    }

    /// Return the exit (third) hop.
    pub fn exit_hop(&self) -> &NodeIdentity {
        let [_, _, exit] = &self.hops;
        exit
    }

    /// Node ids in hop order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.hops.iter().map(|h| h.node_id).collect()
    }
}

/// Samples circuits from directory snapshots.
pub struct CircuitBuilder<R> {
    rng: R,
}

impl CircuitBuilder<ThreadRng> {
    /// Create a builder backed by the thread-local RNG.
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for CircuitBuilder<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> CircuitBuilder<R> {
    /// Create a builder with a caller-supplied RNG.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Select three distinct relays from `nodes`.
    ///
    /// Returns `[entry, middle, exit]`. Relays are compared by node id, so a
    /// snapshot listing the same id twice still yields distinct hops.
    pub fn build(&mut self, nodes: &[NodeIdentity]) -> Result<Circuit> {
        let distinct = distinct_ids(nodes);
        if distinct < CIRCUIT_HOPS {
            return Err(OnionError::InsufficientNodes {
                need: CIRCUIT_HOPS,
                have: distinct,
            });
        }

        let mut hops: Vec<NodeIdentity> = Vec::with_capacity(CIRCUIT_HOPS);
        while hops.len() < CIRCUIT_HOPS {
            let candidate = &nodes[self.rng.gen_range(0..nodes.len())];
            if hops.iter().any(|h| h.node_id == candidate.node_id) {
                continue;
            }
            hops.push(candidate.clone());
        }

        let hops = <[NodeIdentity; CIRCUIT_HOPS]>::try_from(hops).map_err(|picked| {
            OnionError::InsufficientNodes {
                need: CIRCUIT_HOPS,
                have: picked.len(),
            }
        })?;
        let circuit = Circuit { hops };
        debug!("Selected circuit {:?}", circuit.node_ids());
        Ok(circuit)
    }
}

/// Select a circuit using the thread-local RNG.
pub fn build_circuit(nodes: &[NodeIdentity]) -> Result<Circuit> {
    CircuitBuilder::new().build(nodes)
}

fn distinct_ids(nodes: &[NodeIdentity]) -> usize {
    nodes.iter().map(|n| n.node_id).collect::<HashSet<_>>().len()
}
