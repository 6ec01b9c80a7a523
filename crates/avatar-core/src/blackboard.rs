use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::{NodeId, TreeId};

/// Typed key for runtime handles (channels, sinks, caches) that do not fit in a JSON value.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BbKey<T: 'static> {
    name: &'static str,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for BbKey<T> {}

impl<T: 'static> Clone for BbKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> fmt::Debug for BbKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BbKey").field(&self.name).finish()
    }
}

impl<T: 'static> BbKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _phantom: PhantomData,
        }
    }

    pub fn name(self) -> &'static str {
        self.name
    }
}

/// Which memory a read or write addresses. Scopes never see each other's keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Tree(TreeId),
    Node(TreeId, NodeId),
}

#[derive(Default)]
struct Memory {
    values: BTreeMap<String, Value>,
    handles: BTreeMap<&'static str, Box<dyn Any>>,
}

#[derive(Default)]
struct TreeMemory {
    memory: Memory,
    nodes: BTreeMap<NodeId, Memory>,
}

/// Scoped key/value memory shared by the host and every tree it ticks.
///
/// Data is untyped JSON; typed reads return `None` instead of panicking when the stored value
/// has the wrong shape. Nothing is evicted automatically, see [`Blackboard::clear_tree`].
#[derive(Default)]
pub struct Blackboard {
    global: Memory,
    trees: BTreeMap<TreeId, TreeMemory>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.global = Memory::default();
        self.trees.clear();
    }

    /// Drops the tree memory and every node memory of `tree`.
    pub fn clear_tree(&mut self, tree: TreeId) {
        self.trees.remove(&tree);
    }

    fn memory(&self, scope: Scope) -> Option<&Memory> {
        match scope {
            Scope::Global => Some(&self.global),
            Scope::Tree(tree) => self.trees.get(&tree).map(|t| &t.memory),
            Scope::Node(tree, node) => self.trees.get(&tree)?.nodes.get(&node),
        }
    }

    fn memory_mut(&mut self, scope: Scope) -> &mut Memory {
        match scope {
            Scope::Global => &mut self.global,
            Scope::Tree(tree) => &mut self.trees.entry(tree).or_default().memory,
            Scope::Node(tree, node) => self
                .trees
                .entry(tree)
                .or_default()
                .nodes
                .entry(node)
                .or_default(),
        }
    }

    pub fn contains(&self, key: &str, scope: Scope) -> bool {
        self.memory(scope)
            .is_some_and(|m| m.values.contains_key(key))
    }

    pub fn get(&self, key: &str, scope: Scope) -> Option<&Value> {
        self.memory(scope)?.values.get(key)
    }

    /// Deserializes the stored value; `None` when missing or of another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str, scope: Scope) -> Option<T> {
        let value = self.get(key, scope)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// `true` only when the key holds the boolean `true`.
    pub fn get_bool(&self, key: &str, scope: Scope) -> bool {
        self.get(key, scope)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn get_f64(&self, key: &str, scope: Scope) -> Option<f64> {
        self.get(key, scope)?.as_f64()
    }

    pub fn get_str(&self, key: &str, scope: Scope) -> Option<&str> {
        self.get(key, scope)?.as_str()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>, scope: Scope) {
        self.memory_mut(scope)
            .values
            .insert(key.into(), value.into());
    }

    pub fn set_as<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
        scope: Scope,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.set(key, value, scope);
        Ok(())
    }

    pub fn remove(&mut self, key: &str, scope: Scope) -> Option<Value> {
        match scope {
            Scope::Global => self.global.values.remove(key),
            Scope::Tree(tree) => self.trees.get_mut(&tree)?.memory.values.remove(key),
            Scope::Node(tree, node) => self
                .trees
                .get_mut(&tree)?
                .nodes
                .get_mut(&node)?
                .values
                .remove(key),
        }
    }

    /// Resolves `key` with node > tree > global precedence.
    ///
    /// Plain `get` never falls back across scopes; this is the only place that does.
    pub fn lookup(&self, key: &str, tree: Option<TreeId>, node: Option<NodeId>) -> Option<&Value> {
        if let (Some(tree), Some(node)) = (tree, node) {
            if let Some(v) = self.get(key, Scope::Node(tree, node)) {
                return Some(v);
            }
        }
        if let Some(tree) = tree {
            if let Some(v) = self.get(key, Scope::Tree(tree)) {
                return Some(v);
            }
        }
        self.get(key, Scope::Global)
    }

    /// Every node of `tree` that has `key` in its node memory.
    pub fn node_values<'a>(
        &'a self,
        tree: TreeId,
        key: &'a str,
    ) -> impl Iterator<Item = (NodeId, &'a Value)> + 'a {
        self.trees
            .get(&tree)
            .into_iter()
            .flat_map(|t| t.nodes.iter())
            .filter_map(move |(id, memory)| memory.values.get(key).map(|v| (*id, v)))
    }

    pub fn contains_handle<T: 'static>(&self, key: BbKey<T>, scope: Scope) -> bool {
        self.memory(scope)
            .is_some_and(|m| m.handles.contains_key(key.name))
    }

    pub fn set_handle<T: 'static>(&mut self, key: BbKey<T>, value: T, scope: Scope) {
        self.memory_mut(scope)
            .handles
            .insert(key.name, Box::new(value));
    }

    pub fn handle<T: 'static>(&self, key: BbKey<T>, scope: Scope) -> Option<&T> {
        self.memory(scope)?.handles.get(key.name)?.downcast_ref::<T>()
    }

    pub fn handle_mut<T: 'static>(&mut self, key: BbKey<T>, scope: Scope) -> Option<&mut T> {
        let memory = match scope {
            Scope::Global => &mut self.global,
            Scope::Tree(tree) => &mut self.trees.get_mut(&tree)?.memory,
            Scope::Node(tree, node) => self.trees.get_mut(&tree)?.nodes.get_mut(&node)?,
        };
        memory.handles.get_mut(key.name)?.downcast_mut::<T>()
    }

    /// Removes and returns the handle. A handle of another type is left in place.
    pub fn take_handle<T: 'static>(&mut self, key: BbKey<T>, scope: Scope) -> Option<T> {
        let memory = match scope {
            Scope::Global => &mut self.global,
            Scope::Tree(tree) => &mut self.trees.get_mut(&tree)?.memory,
            Scope::Node(tree, node) => self.trees.get_mut(&tree)?.nodes.get_mut(&node)?,
        };
        let boxed = memory.handles.remove(key.name)?;
        match boxed.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(other) => {
                memory.handles.insert(key.name, other);
                None
            }
        }
    }
}
