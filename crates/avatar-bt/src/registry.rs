use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use avatar_core::NodeId;

use crate::composites::{IfThenElse, MemSequence, Parallel, ParallelPolicy, Priority, ReactiveSequence, Sequence};
use crate::decorators::{BlackboardGuard, Comparison, Inverter, Remap, Repeat, Retry, StatusToBlackboard, Timeout};
use crate::leaves::{AlwaysFailure, AlwaysSuccess, CheckBlackboardCondition, Wait};
use crate::node::{BbScope, Node};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("unknown node type \"{0}\"; make sure it is registered")]
    UnknownNode(String),

    #[error("node \"{node}\": missing property \"{property}\"")]
    MissingProperty { node: String, property: String },

    #[error("node \"{node}\": invalid property \"{property}\": {reason}")]
    InvalidProperty {
        node: String,
        property: String,
        reason: String,
    },
}

/// Everything a factory needs to build one node: its recorded identity, its properties and its
/// already-built children.
pub struct NodeSpec {
    pub id: Option<NodeId>,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub properties: Map<String, Value>,
    pub children: Vec<Box<dyn Node>>,
    pub child: Option<Box<dyn Node>>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            title: None,
            description: None,
            properties: Map::new(),
            children: Vec::new(),
            child: None,
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Box<dyn Node>>) -> Self {
        self.children = children;
        self
    }

    pub fn with_child(mut self, child: Box<dyn Node>) -> Self {
        self.child = Some(child);
        self
    }

    /// `Ok(None)` when absent (or null), an error when present with the wrong shape.
    pub fn prop<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, BuildError> {
        match self.properties.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|err| BuildError::InvalidProperty {
                    node: self.name.clone(),
                    property: key.to_string(),
                    reason: err.to_string(),
                }),
        }
    }

    pub fn prop_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, BuildError> {
        Ok(self.prop(key)?.unwrap_or(default))
    }

    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, BuildError> {
        self.prop(key)?.ok_or_else(|| BuildError::MissingProperty {
            node: self.name.clone(),
            property: key.to_string(),
        })
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn take_child(&mut self) -> Option<Box<dyn Node>> {
        self.child.take()
    }

    pub fn take_children(&mut self) -> Vec<Box<dyn Node>> {
        std::mem::take(&mut self.children)
    }

    /// Stamps the registry name, recorded id, title and description onto `node` and keeps any
    /// property the node did not set itself.
    pub fn finish<N: Node>(self, mut node: N) -> Box<dyn Node> {
        let meta = node.meta_mut();
        meta.name = self.name.into();
        if let Some(id) = self.id {
            meta.id = id;
        }
        if let Some(title) = self.title {
            meta.title = title;
        }
        if let Some(description) = self.description {
            meta.description = description;
        }
        for (key, value) in self.properties {
            meta.properties.entry(key).or_insert(value);
        }
        Box::new(node)
    }
}

pub type NodeFactory = Box<dyn Fn(NodeSpec) -> Result<Box<dyn Node>, BuildError>>;

/// Name -> factory table used to rebuild trees from documents.
#[derive(Default)]
pub struct NodeRegistry {
    factories: BTreeMap<String, NodeFactory>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that knows every composite, decorator and leaf in this crate.
    pub fn with_core_nodes() -> Self {
        let mut registry = Self::new();
        registry.register_core_nodes();
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(NodeSpec) -> Result<Box<dyn Node>, BuildError> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn build(&self, spec: NodeSpec) -> Result<Box<dyn Node>, BuildError> {
        let factory = self
            .factories
            .get(&spec.name)
            .ok_or_else(|| BuildError::UnknownNode(spec.name.clone()))?;
        factory(spec)
    }

    fn register_core_nodes(&mut self) {
        self.register("Sequence", |mut spec| {
            let children = spec.take_children();
            Ok(spec.finish(Sequence::new(children)))
        });
        self.register("MemSequence", |mut spec| {
            let children = spec.take_children();
            Ok(spec.finish(MemSequence::new(children)))
        });
        self.register("ReactiveSequence", |mut spec| {
            let children = spec.take_children();
            Ok(spec.finish(ReactiveSequence::new(children)))
        });
        self.register("Priority", |mut spec| {
            let children = spec.take_children();
            Ok(spec.finish(Priority::new(children)))
        });
        self.register("Parallel", |mut spec| {
            let policy: ParallelPolicy = spec.prop_or("policy", ParallelPolicy::default())?;
            let children = spec.take_children();
            Ok(spec.finish(Parallel::new(policy, children)))
        });
        self.register("IfThenElse", |mut spec| {
            let children = spec.take_children();
            Ok(spec.finish(IfThenElse::new(children)))
        });

        self.register("Inverter", |mut spec| {
            let child = spec.take_child();
            Ok(spec.finish(Inverter::new(child)))
        });
        self.register("FailureIsSuccess", |mut spec| {
            let child = spec.take_child();
            Ok(spec.finish(Remap::failure_is_success(child)))
        });
        self.register("SuccessIsFailure", |mut spec| {
            let child = spec.take_child();
            Ok(spec.finish(Remap::success_is_failure(child)))
        });
        self.register("RunningIsFailure", |mut spec| {
            let child = spec.take_child();
            Ok(spec.finish(Remap::running_is_failure(child)))
        });
        self.register("RunningIsSuccess", |mut spec| {
            let child = spec.take_child();
            Ok(spec.finish(Remap::running_is_success(child)))
        });
        self.register("Retry", |mut spec| {
            let max_attempts = spec.prop_or("maxAttempts", 3u64)?;
            let child = spec.take_child();
            Ok(spec.finish(Retry::new(max_attempts, child)))
        });
        self.register("Repeat", |mut spec| {
            let count = spec.prop_or("count", 1u64)?;
            let child = spec.take_child();
            Ok(spec.finish(Repeat::new(count, child)))
        });
        self.register("Timeout", |mut spec| {
            let timeout = spec.prop_or("timeout", 5000.0)?;
            let child = spec.take_child();
            Ok(spec.finish(Timeout::new(timeout, child)))
        });
        self.register("BlackboardGuard", |mut spec| {
            let key: String = spec.require("key")?;
            let value = spec.raw("value").cloned().unwrap_or(Value::Bool(true));
            let scope = spec.prop_or("scope", BbScope::Tree)?;
            let op: String = spec.prop_or("op", "eq".to_string())?;
            let comparison = Comparison::parse(&op).ok_or_else(|| BuildError::InvalidProperty {
                node: spec.name.clone(),
                property: "op".to_string(),
                reason: format!("unsupported comparison \"{op}\""),
            })?;
            let child = spec.take_child();
            let guard = BlackboardGuard::new(key, value, scope, child).with_comparison(comparison);
            Ok(spec.finish(guard))
        });
        self.register("StatusToBlackboard", |mut spec| {
            let key: String = spec.require("key")?;
            let scope = spec.prop_or("scope", BbScope::Node)?;
            let child = spec.take_child();
            Ok(spec.finish(StatusToBlackboard::new(key, scope, child)))
        });

        self.register("AlwaysSuccess", |spec| Ok(spec.finish(AlwaysSuccess::new())));
        self.register("AlwaysFailure", |spec| Ok(spec.finish(AlwaysFailure::new())));
        self.register("Wait", |spec| {
            let milliseconds = spec.prop_or("milliseconds", 1000.0)?;
            Ok(spec.finish(Wait::new(milliseconds)))
        });
        self.register("CheckBlackboardCondition", |spec| {
            let key: String = spec.require("key")?;
            let value = spec.raw("value").cloned().unwrap_or(Value::Bool(true));
            let scope = spec.prop_or("scope", BbScope::Tree)?;
            Ok(spec.finish(CheckBlackboardCondition::new(key, value, scope)))
        });
    }
}
