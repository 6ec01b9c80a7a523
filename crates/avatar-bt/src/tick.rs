use std::any::Any;
use std::collections::BTreeMap;
use std::time::Duration;

use futures::task::Spawn;
use serde::de::DeserializeOwned;
use serde_json::Value;

use avatar_core::{
    keys, Blackboard, Clock, NodeId, Scope, Status, SystemClock, TokioSpawner, TreeId,
};
use avatar_tools::{emit as trace_emit, TraceEvent};

static SYSTEM_CLOCK: SystemClock = SystemClock;
static TOKIO_SPAWNER: TokioSpawner = TokioSpawner;

/// Per-tick context handed to every node.
///
/// Built fresh for each `BehaviorTree::tick`; nothing here outlives the tick except what the
/// tree copies into the blackboard afterwards.
pub struct Tick<'a> {
    tree: TreeId,
    number: u64,
    blackboard: &'a mut Blackboard,
    target: Option<&'a dyn Any>,
    clock: &'a dyn Clock,
    spawner: &'a dyn Spawn,
    open_nodes: Vec<NodeId>,
    node_count: u64,
    statuses: BTreeMap<NodeId, Status>,
    durations: BTreeMap<NodeId, f64>,
}

pub(crate) struct TickReport {
    pub open_nodes: Vec<NodeId>,
    pub node_count: u64,
    pub statuses: BTreeMap<NodeId, Status>,
    pub durations: BTreeMap<NodeId, f64>,
}

impl<'a> Tick<'a> {
    pub fn new(tree: TreeId, blackboard: &'a mut Blackboard) -> Self {
        Self {
            tree,
            number: 0,
            blackboard,
            target: None,
            clock: &SYSTEM_CLOCK,
            spawner: &TOKIO_SPAWNER,
            open_nodes: Vec::new(),
            node_count: 0,
            statuses: BTreeMap::new(),
            durations: BTreeMap::new(),
        }
    }

    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_spawner(mut self, spawner: &'a dyn Spawn) -> Self {
        self.spawner = spawner;
        self
    }

    pub fn with_target(mut self, target: &'a dyn Any) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_number(mut self, number: u64) -> Self {
        self.number = number;
        self
    }

    pub fn tree_id(&self) -> TreeId {
        self.tree
    }

    /// Index of this tick within the tree's lifetime.
    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn blackboard(&self) -> &Blackboard {
        &*self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut *self.blackboard
    }

    pub fn target<T: 'static>(&self) -> Option<&T> {
        self.target?.downcast_ref::<T>()
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn spawner(&self) -> &dyn Spawn {
        self.spawner
    }

    pub fn tree_scope(&self) -> Scope {
        Scope::Tree(self.tree)
    }

    pub fn node_scope(&self, node: NodeId) -> Scope {
        Scope::Node(self.tree, node)
    }

    pub fn node_get(&self, node: NodeId, key: &str) -> Option<&Value> {
        self.blackboard.get(key, self.node_scope(node))
    }

    pub fn node_get_as<T: DeserializeOwned>(&self, node: NodeId, key: &str) -> Option<T> {
        self.blackboard.get_as(key, self.node_scope(node))
    }

    pub fn node_f64(&self, node: NodeId, key: &str) -> Option<f64> {
        self.blackboard.get_f64(key, self.node_scope(node))
    }

    pub fn node_set(&mut self, node: NodeId, key: &str, value: impl Into<Value>) {
        let scope = self.node_scope(node);
        self.blackboard.set(key, value, scope);
    }

    pub fn node_remove(&mut self, node: NodeId, key: &str) -> Option<Value> {
        let scope = self.node_scope(node);
        self.blackboard.remove(key, scope)
    }

    /// Nodes entered and not yet closed during this tick, in entry order.
    pub fn open_nodes(&self) -> &[NodeId] {
        &self.open_nodes
    }

    /// Number of node executions so far this tick.
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    pub fn status_of(&self, node: NodeId) -> Option<Status> {
        self.statuses.get(&node).copied()
    }

    pub(crate) fn enter_node(&mut self, node: NodeId) {
        self.open_nodes.push(node);
        self.node_count += 1;
    }

    /// Removes `node` from the open stack and returns whatever was entered after it.
    pub(crate) fn pop_open(&mut self, node: NodeId) -> Vec<NodeId> {
        match self.open_nodes.iter().rposition(|id| *id == node) {
            Some(pos) => {
                let rest = self.open_nodes.split_off(pos + 1);
                self.open_nodes.truncate(pos);
                rest
            }
            None => Vec::new(),
        }
    }

    pub(crate) fn is_open(&self, node: NodeId) -> bool {
        self.blackboard
            .get_bool(keys::IS_OPEN, self.node_scope(node))
    }

    pub(crate) fn mark_open(&mut self, node: NodeId) {
        self.node_set(node, keys::IS_OPEN, true);
        self.trace("bt.open", node, None);
    }

    pub(crate) fn mark_closed(&mut self, node: NodeId) {
        self.node_set(node, keys::IS_OPEN, false);
        let status = self.status_of(node);
        self.trace("bt.close", node, status);
    }

    pub(crate) fn record_status(&mut self, node: NodeId, status: Status) {
        self.statuses.insert(node, status);
    }

    pub(crate) fn record_duration(&mut self, node: NodeId, elapsed: Duration) {
        self.durations
            .insert(node, elapsed.as_secs_f64() * 1000.0);
    }

    fn trace(&mut self, tag: &'static str, node: NodeId, status: Option<Status>) {
        let mut event = TraceEvent::new(self.number, tag).with_node(node);
        if let Some(status) = status {
            event = event.with_status(status);
        }
        trace_emit(&mut *self.blackboard, event);
    }

    pub(crate) fn into_report(self) -> TickReport {
        TickReport {
            open_nodes: self.open_nodes,
            node_count: self.node_count,
            statuses: self.statuses,
            durations: self.durations,
        }
    }
}
