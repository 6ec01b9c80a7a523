//! Blackboard keys owned by the tree runtime itself.
//!
//! Node-scoped keys live under (tree, node); everything else here is tree-scoped.

/// Node scope: whether the node is in an active activation.
pub const IS_OPEN: &str = "isOpen";

/// Tree scope: ids of the nodes left open by the previous tick, root first.
pub const OPEN_NODES: &str = "openNodes";
/// Tree scope: number of node executions during the previous tick.
pub const NODE_COUNT: &str = "nodeCount";
/// Tree scope: node id -> status code of its last execution.
pub const NODE_STATUSES: &str = "nodeStatuses";
/// Tree scope: node id -> duration in milliseconds of its last execution.
pub const NODE_DURATIONS: &str = "nodeDurations";
/// Tree scope: number of completed ticks.
pub const TICK_COUNT: &str = "tickCount";
