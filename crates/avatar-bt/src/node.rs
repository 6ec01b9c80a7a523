use std::borrow::Cow;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use avatar_core::{NodeId, Scope, Status};

use crate::tick::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Action,
    Condition,
    Composite,
    Decorator,
}

/// Scope selector carried in node properties (`"global"`, `"tree"`, `"node"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BbScope {
    Global,
    #[default]
    Tree,
    Node,
}

impl BbScope {
    pub fn resolve(self, tick: &Tick<'_>, node: NodeId) -> Scope {
        match self {
            BbScope::Global => Scope::Global,
            BbScope::Tree => Scope::Tree(tick.tree_id()),
            BbScope::Node => Scope::Node(tick.tree_id(), node),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BbScope::Global => "global",
            BbScope::Tree => "tree",
            BbScope::Node => "node",
        }
    }
}

/// Identity and descriptive data shared by every node.
#[derive(Debug, Clone)]
pub struct NodeMeta {
    pub id: NodeId,
    pub category: Category,
    /// Registry key used when the node is serialized.
    pub name: Cow<'static, str>,
    pub title: String,
    pub description: String,
    pub properties: Map<String, Value>,
}

impl NodeMeta {
    pub fn new(category: Category, name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        Self {
            id: NodeId::new(),
            category,
            title: name.to_string(),
            name,
            description: String::new(),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }
}

/// A behavior tree node.
///
/// Implementations keep no per-activation state in `self`; `open` is where that state is
/// (re)initialized in the blackboard, `close` is where it is torn down. The lifecycle is driven
/// by [`execute`], never by calling these hooks directly.
pub trait Node: 'static {
    fn meta(&self) -> &NodeMeta;

    fn meta_mut(&mut self) -> &mut NodeMeta;

    fn children(&self) -> &[Box<dyn Node>] {
        &[]
    }

    fn enter(&self, _tick: &mut Tick<'_>) {}

    fn open(&self, _tick: &mut Tick<'_>) {}

    fn tick(&self, tick: &mut Tick<'_>) -> Status;

    fn close(&self, _tick: &mut Tick<'_>) {}

    fn exit(&self, _tick: &mut Tick<'_>) {}

    fn id(&self) -> NodeId {
        self.meta().id
    }
}

/// Builder helpers available on every concrete node.
pub trait NodeExt: Node + Sized {
    fn titled(mut self, title: impl Into<String>) -> Self {
        self.meta_mut().title = title.into();
        self
    }

    fn described(mut self, description: impl Into<String>) -> Self {
        self.meta_mut().description = description.into();
        self
    }

    fn with_id(mut self, id: NodeId) -> Self {
        self.meta_mut().id = id;
        self
    }

    fn boxed(self) -> Box<dyn Node> {
        Box::new(self)
    }
}

impl<N: Node> NodeExt for N {}

/// Implements `meta`/`meta_mut` for a node struct with a `meta: NodeMeta` field.
#[macro_export]
macro_rules! node_meta {
    () => {
        fn meta(&self) -> &$crate::NodeMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut $crate::NodeMeta {
            &mut self.meta
        }
    };
}

/// Runs one node through enter, open (first tick of an activation only), tick, close (unless
/// running) and exit, and records its status and duration on the tick.
pub fn execute(node: &dyn Node, tick: &mut Tick<'_>) -> Status {
    let started = Instant::now();
    let id = node.id();

    tick.enter_node(id);
    node.enter(tick);

    if !tick.is_open(id) {
        tick.mark_open(id);
        node.open(tick);
    }

    let status = node.tick(tick);
    tracing::trace!(node = %node.meta().title, %status, "ticked");
    tick.record_status(id, status);

    if status != Status::Running {
        close(node, tick);
    }

    node.exit(tick);
    tick.record_duration(id, started.elapsed());
    status
}

/// Closes `node` and any of its descendants still open on this tick's stack, deepest first.
pub(crate) fn close(node: &dyn Node, tick: &mut Tick<'_>) {
    let abandoned = tick.pop_open(node.id());
    for id in abandoned.into_iter().rev() {
        if let Some(descendant) = find_node(node, id) {
            close_one(descendant, tick);
        }
    }
    close_one(node, tick);
}

/// Closes a single node. Does nothing if the node is not open.
pub(crate) fn close_one(node: &dyn Node, tick: &mut Tick<'_>) {
    let id = node.id();
    if !tick.is_open(id) {
        return;
    }
    tick.mark_closed(id);
    node.close(tick);
}

/// Depth-first search below (and including) `root`.
pub fn find_node(root: &dyn Node, id: NodeId) -> Option<&dyn Node> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.id() == id {
            return Some(node);
        }
        stack.extend(node.children().iter().map(|c| c.as_ref()));
    }
    None
}

/// Every node below (and including) `root`, parents before children, siblings in order.
pub fn walk(root: &dyn Node) -> Vec<&dyn Node> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(node.children().iter().rev().map(|c| c.as_ref()));
    }
    out
}
