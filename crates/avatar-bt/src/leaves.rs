use serde_json::Value;

use avatar_core::Status;

use crate::decorators::values_equal;
use crate::node::{BbScope, Category, Node, NodeMeta};
use crate::node_meta;
use crate::tick::Tick;

const START_TIME: &str = "startTime";

pub struct AlwaysSuccess {
    meta: NodeMeta,
}

impl AlwaysSuccess {
    pub fn new() -> Self {
        Self {
            meta: NodeMeta::new(Category::Action, "AlwaysSuccess"),
        }
    }
}

impl Default for AlwaysSuccess {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for AlwaysSuccess {
    node_meta!();

    fn tick(&self, _tick: &mut Tick<'_>) -> Status {
        Status::Success
    }
}

pub struct AlwaysFailure {
    meta: NodeMeta,
}

impl AlwaysFailure {
    pub fn new() -> Self {
        Self {
            meta: NodeMeta::new(Category::Action, "AlwaysFailure"),
        }
    }
}

impl Default for AlwaysFailure {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for AlwaysFailure {
    node_meta!();

    fn tick(&self, _tick: &mut Tick<'_>) -> Status {
        Status::Failure
    }
}

/// Running until `milliseconds` have passed since the activation opened.
pub struct Wait {
    meta: NodeMeta,
    milliseconds: f64,
}

impl Wait {
    pub fn new(milliseconds: f64) -> Self {
        Self {
            meta: NodeMeta::new(Category::Action, "Wait")
                .with_property("milliseconds", milliseconds),
            milliseconds,
        }
    }
}

impl Node for Wait {
    node_meta!();

    fn open(&self, tick: &mut Tick<'_>) {
        let now = tick.now_ms();
        tick.node_set(self.id(), START_TIME, now);
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let now = tick.now_ms();
        let started = tick.node_f64(self.id(), START_TIME).unwrap_or(now);
        if now - started >= self.milliseconds {
            Status::Success
        } else {
            Status::Running
        }
    }
}

/// Succeeds when the blackboard value at `key` equals `value`.
pub struct CheckBlackboardCondition {
    meta: NodeMeta,
    key: String,
    value: Value,
    scope: BbScope,
}

impl CheckBlackboardCondition {
    pub fn new(key: impl Into<String>, value: impl Into<Value>, scope: BbScope) -> Self {
        let key = key.into();
        let value = value.into();
        let mut meta = NodeMeta::new(Category::Condition, "CheckBlackboardCondition")
            .with_property("key", key.clone())
            .with_property("value", value.clone())
            .with_property("scope", scope.as_str());
        meta.title = format!("Check {key}");
        Self {
            meta,
            key,
            value,
            scope,
        }
    }
}

impl Node for CheckBlackboardCondition {
    node_meta!();

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let scope = self.scope.resolve(tick, self.id());
        match tick.blackboard().get(&self.key, scope) {
            Some(stored) if values_equal(stored, &self.value) => Status::Success,
            _ => Status::Failure,
        }
    }
}

/// Condition backed by a closure. Not serializable beyond its name.
pub struct Condition<F> {
    meta: NodeMeta,
    cond: F,
}

impl<F> Condition<F>
where
    F: Fn(&Tick<'_>) -> bool + 'static,
{
    pub fn new(cond: F) -> Self {
        Self {
            meta: NodeMeta::new(Category::Condition, "Condition"),
            cond,
        }
    }
}

impl<F> Node for Condition<F>
where
    F: Fn(&Tick<'_>) -> bool + 'static,
{
    node_meta!();

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        if (self.cond)(tick) {
            Status::Success
        } else {
            Status::Failure
        }
    }
}
