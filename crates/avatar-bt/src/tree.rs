use std::any::Any;
use std::rc::Rc;
use std::sync::Arc;

use futures::task::Spawn;
use serde_json::{Map, Value};

use avatar_core::{keys, Blackboard, Clock, NodeId, Scope, Status, SystemClock, TokioSpawner, TreeId};

use crate::node::{close_one, execute, find_node, Node};
use crate::tick::Tick;

/// Owns a root node and ticks it once per frame.
///
/// The tree itself holds no per-tick state: what it needs between ticks (the nodes left open,
/// counters, per-node statuses and timings) is written under its tree scope in the blackboard, so
/// one tree value can drive any number of independent blackboards.
pub struct BehaviorTree {
    id: TreeId,
    pub title: String,
    pub description: String,
    pub properties: Map<String, Value>,
    root: Option<Box<dyn Node>>,
    clock: Arc<dyn Clock>,
    spawner: Rc<dyn Spawn>,
}

impl BehaviorTree {
    pub fn new(root: Box<dyn Node>) -> Self {
        let mut tree = Self::empty();
        tree.root = Some(root);
        tree
    }

    pub fn empty() -> Self {
        Self {
            id: TreeId::new(),
            title: "Untitled Tree".to_string(),
            description: String::new(),
            properties: Map::new(),
            root: None,
            clock: Arc::new(SystemClock),
            spawner: Rc::new(TokioSpawner),
        }
    }

    pub fn with_id(mut self, id: TreeId) -> Self {
        self.id = id;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_spawner(mut self, spawner: impl Spawn + 'static) -> Self {
        self.spawner = Rc::new(spawner);
        self
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn root(&self) -> Option<&dyn Node> {
        self.root.as_deref()
    }

    pub fn set_root(&mut self, root: Box<dyn Node>) {
        self.root = Some(root);
    }

    pub fn find_node(&self, id: NodeId) -> Option<&dyn Node> {
        find_node(self.root()?, id)
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    /// Ticks the root once, then closes every node that was open after the previous tick but
    /// was not reached this time.
    pub fn tick(&self, target: Option<&dyn Any>, blackboard: &mut Blackboard) -> Status {
        let Some(root) = self.root.as_deref() else {
            tracing::error!(tree = %self.id, title = %self.title, "behavior tree has no root");
            return Status::Error;
        };

        let scope = Scope::Tree(self.id);
        let number = blackboard
            .get(keys::TICK_COUNT, scope)
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let previous: Vec<NodeId> = blackboard
            .get_as(keys::OPEN_NODES, scope)
            .unwrap_or_default();

        let mut tick = Tick::new(self.id, blackboard)
            .with_clock(&*self.clock)
            .with_spawner(&*self.spawner)
            .with_number(number);
        if let Some(target) = target {
            tick = tick.with_target(target);
        }

        let status = execute(root, &mut tick);

        let current = tick.open_nodes().to_vec();
        let common = previous
            .iter()
            .zip(&current)
            .take_while(|(a, b)| a == b)
            .count();
        for id in previous[common..].iter().rev() {
            if current.contains(id) {
                continue;
            }
            if let Some(node) = find_node(root, *id) {
                tracing::debug!(node = %node.meta().title, "closing abandoned node");
                close_one(node, &mut tick);
            }
        }

        let report = tick.into_report();
        let open: Vec<Value> = report
            .open_nodes
            .iter()
            .map(|id| Value::String(id.to_string()))
            .collect();
        let statuses: Map<String, Value> = report
            .statuses
            .iter()
            .map(|(id, status)| (id.to_string(), Value::from(status.code())))
            .collect();
        let durations: Map<String, Value> = report
            .durations
            .iter()
            .map(|(id, ms)| (id.to_string(), Value::from(*ms)))
            .collect();

        blackboard.set(keys::OPEN_NODES, open, scope);
        blackboard.set(keys::NODE_COUNT, report.node_count, scope);
        blackboard.set(keys::NODE_STATUSES, statuses, scope);
        blackboard.set(keys::NODE_DURATIONS, durations, scope);
        blackboard.set(keys::TICK_COUNT, number + 1, scope);

        status
    }
}
