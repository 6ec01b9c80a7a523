//! Per-node timing recorded by the tree under `nodeDurations`.

use std::collections::BTreeMap;

use avatar_core::{keys, Blackboard, NodeId, Scope, TreeId};

#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    pub node_count: usize,
    pub total_ms: f64,
    pub average_ms: f64,
    pub slowest: Option<(NodeId, f64)>,
}

/// Milliseconds the node spent in its last execution.
pub fn node_duration(blackboard: &Blackboard, tree: TreeId, node: NodeId) -> Option<f64> {
    blackboard
        .get(keys::NODE_DURATIONS, Scope::Tree(tree))?
        .get(node.to_string())?
        .as_f64()
}

pub fn all_durations(blackboard: &Blackboard, tree: TreeId) -> BTreeMap<NodeId, f64> {
    let Some(map) = blackboard
        .get(keys::NODE_DURATIONS, Scope::Tree(tree))
        .and_then(|v| v.as_object())
    else {
        return BTreeMap::new();
    };

    map.iter()
        .filter_map(|(id, ms)| Some((id.parse().ok()?, ms.as_f64()?)))
        .collect()
}

/// Totals over the last tick. Durations of parents include their children, so `total_ms`
/// counts nested time more than once. `None` when the tree has not been ticked.
pub fn tick_summary(blackboard: &Blackboard, tree: TreeId) -> Option<TickSummary> {
    let durations = all_durations(blackboard, tree);
    if durations.is_empty() {
        return None;
    }

    let total_ms: f64 = durations.values().sum();
    let slowest = durations
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(id, ms)| (*id, *ms));

    Some(TickSummary {
        node_count: durations.len(),
        total_ms,
        average_ms: total_ms / durations.len() as f64,
        slowest,
    })
}
