// Confirmation accounting - weighted, idempotent-per-path counting
//
// Two independent relay paths deliver every message. Each path may count
// toward the threshold once; the reported "count" is the weighted sum over
// the distinct paths that have confirmed, so one path can never inflate the
// count by resubmitting.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An independent relay path delivering inbound messages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelayPath {
    /// The dedicated hotpoter relayer
    Hotpoter,
    /// The secondary cross-chain network
    Network,
}

/// Per-path confirmation weights and the execution threshold
///
/// The default split follows the deployed system: hotpoter counts 1, the
/// secondary network counts 2, and execution requires 3 — both paths. The
/// weighting is configurable so a deployment can derive its own split from
/// an authoritative source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmPolicy {
    hotpoter_weight: u32,
    network_weight: u32,
    threshold: u32,
}

impl ConfirmPolicy {
    /// Create a policy with explicit weights and threshold
    pub fn new(hotpoter_weight: u32, network_weight: u32, threshold: u32) -> Self {
        Self {
            hotpoter_weight,
            network_weight,
            threshold,
        }
    }

    /// Get the weight a path contributes once it has confirmed
    pub fn weight_of(&self, path: RelayPath) -> u32 {
        match path {
            RelayPath::Hotpoter => self.hotpoter_weight,
            RelayPath::Network => self.network_weight,
        }
    }

    /// Get the execution threshold
    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

impl Default for ConfirmPolicy {
    fn default() -> Self {
        Self {
            hotpoter_weight: 1,
            network_weight: 2,
            threshold: 3,
        }
    }
}

/// The set of relay paths that have confirmed one message
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmSet {
    paths: HashSet<RelayPath>,
}

impl ConfirmSet {
    /// Record a path's confirmation; returns false when it already counted
    pub fn insert(&mut self, path: RelayPath) -> bool {
        self.paths.insert(path)
    }

    /// Whether a path has confirmed
    pub fn contains(&self, path: RelayPath) -> bool {
        self.paths.contains(&path)
    }

    /// The weighted confirmation count under a policy
    pub fn weight(&self, policy: &ConfirmPolicy) -> u32 {
        self.paths
            .iter()
            .map(|path| policy.weight_of(*path))
            .sum()
    }
}
