use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use avatar_core::Status;

use crate::node::{execute, BbScope, Category, Node, NodeMeta};
use crate::node_meta;
use crate::tick::Tick;

const RETRY_COUNT: &str = "retry_count";
const REPEAT_COUNT: &str = "count";
const START_TIME: &str = "startTime";

fn missing_child(meta: &NodeMeta) -> Status {
    tracing::error!(node = %meta.title, id = %meta.id, "decorator has no child");
    Status::Error
}

/// Swaps success and failure.
pub struct Inverter {
    meta: NodeMeta,
    child: Option<Box<dyn Node>>,
}

impl Inverter {
    pub fn new(child: impl Into<Option<Box<dyn Node>>>) -> Self {
        Self {
            meta: NodeMeta::new(Category::Decorator, "Inverter"),
            child: child.into(),
        }
    }
}

impl Node for Inverter {
    node_meta!();

    fn children(&self) -> &[Box<dyn Node>] {
        self.child.as_slice()
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let Some(child) = self.child.as_deref() else {
            return missing_child(&self.meta);
        };
        match execute(child, tick) {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
            other => other,
        }
    }
}

/// Rewrites one child status into another and passes everything else through.
pub struct Remap {
    meta: NodeMeta,
    child: Option<Box<dyn Node>>,
    from: Status,
    to: Status,
}

impl Remap {
    fn with(
        name: &'static str,
        from: Status,
        to: Status,
        child: impl Into<Option<Box<dyn Node>>>,
    ) -> Self {
        Self {
            meta: NodeMeta::new(Category::Decorator, name),
            child: child.into(),
            from,
            to,
        }
    }

    pub fn failure_is_success(child: impl Into<Option<Box<dyn Node>>>) -> Self {
        Self::with("FailureIsSuccess", Status::Failure, Status::Success, child)
    }

    pub fn success_is_failure(child: impl Into<Option<Box<dyn Node>>>) -> Self {
        Self::with("SuccessIsFailure", Status::Success, Status::Failure, child)
    }

    pub fn running_is_failure(child: impl Into<Option<Box<dyn Node>>>) -> Self {
        Self::with("RunningIsFailure", Status::Running, Status::Failure, child)
    }

    pub fn running_is_success(child: impl Into<Option<Box<dyn Node>>>) -> Self {
        Self::with("RunningIsSuccess", Status::Running, Status::Success, child)
    }
}

impl Node for Remap {
    node_meta!();

    fn children(&self) -> &[Box<dyn Node>] {
        self.child.as_slice()
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let Some(child) = self.child.as_deref() else {
            return missing_child(&self.meta);
        };
        let status = execute(child, tick);
        if status == self.from {
            self.to
        } else {
            status
        }
    }
}

/// Re-runs a failing child within the same tick, up to `max_attempts` times per activation.
pub struct Retry {
    meta: NodeMeta,
    child: Option<Box<dyn Node>>,
    max_attempts: u64,
}

impl Retry {
    pub fn new(max_attempts: u64, child: impl Into<Option<Box<dyn Node>>>) -> Self {
        Self {
            meta: NodeMeta::new(Category::Decorator, "Retry")
                .with_property("maxAttempts", max_attempts),
            child: child.into(),
            max_attempts,
        }
    }
}

impl Node for Retry {
    node_meta!();

    fn children(&self) -> &[Box<dyn Node>] {
        self.child.as_slice()
    }

    fn open(&self, tick: &mut Tick<'_>) {
        tick.node_set(self.id(), RETRY_COUNT, 0);
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let Some(child) = self.child.as_deref() else {
            return missing_child(&self.meta);
        };

        let mut attempts = tick
            .node_get(self.id(), RETRY_COUNT)
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        while attempts < self.max_attempts {
            match execute(child, tick) {
                Status::Success => return Status::Success,
                Status::Failure => {
                    attempts += 1;
                    tick.node_set(self.id(), RETRY_COUNT, attempts);
                }
                other => return other,
            }
        }

        tracing::debug!(node = %self.meta.title, attempts, "retries exhausted");
        Status::Failure
    }
}

/// Runs the child to completion `count` times, one completion per tick at most.
pub struct Repeat {
    meta: NodeMeta,
    child: Option<Box<dyn Node>>,
    count: u64,
}

impl Repeat {
    pub fn new(count: u64, child: impl Into<Option<Box<dyn Node>>>) -> Self {
        Self {
            meta: NodeMeta::new(Category::Decorator, "Repeat").with_property("count", count),
            child: child.into(),
            count,
        }
    }
}

impl Node for Repeat {
    node_meta!();

    fn children(&self) -> &[Box<dyn Node>] {
        self.child.as_slice()
    }

    fn open(&self, tick: &mut Tick<'_>) {
        tick.node_set(self.id(), REPEAT_COUNT, 0);
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let Some(child) = self.child.as_deref() else {
            return missing_child(&self.meta);
        };

        let done = tick
            .node_get(self.id(), REPEAT_COUNT)
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        if done >= self.count {
            return Status::Success;
        }

        match execute(child, tick) {
            Status::Success | Status::Failure => {
                let done = done + 1;
                tick.node_set(self.id(), REPEAT_COUNT, done);
                if done < self.count {
                    Status::Running
                } else {
                    Status::Success
                }
            }
            other => other,
        }
    }
}

/// Fails once more than `timeout_ms` has elapsed since the activation opened.
pub struct Timeout {
    meta: NodeMeta,
    child: Option<Box<dyn Node>>,
    timeout_ms: f64,
}

impl Timeout {
    pub fn new(timeout_ms: f64, child: impl Into<Option<Box<dyn Node>>>) -> Self {
        Self {
            meta: NodeMeta::new(Category::Decorator, "Timeout")
                .with_property("timeout", timeout_ms),
            child: child.into(),
            timeout_ms,
        }
    }
}

impl Node for Timeout {
    node_meta!();

    fn children(&self) -> &[Box<dyn Node>] {
        self.child.as_slice()
    }

    fn open(&self, tick: &mut Tick<'_>) {
        let now = tick.now_ms();
        tick.node_set(self.id(), START_TIME, now);
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let Some(child) = self.child.as_deref() else {
            return missing_child(&self.meta);
        };

        let started = tick.node_f64(self.id(), START_TIME).unwrap_or_else(|| tick.now_ms());
        if tick.now_ms() - started > self.timeout_ms {
            tracing::debug!(node = %self.meta.title, timeout_ms = self.timeout_ms, "timed out");
            return Status::Failure;
        }

        execute(child, tick)
    }
}

/// How [`BlackboardGuard`] compares the stored value against its expected value.
#[derive(Clone)]
pub enum Comparison {
    /// JSON equality; integers and floats with the same numeric value are equal.
    Equals,
    /// Stored number >= expected number.
    AtLeast,
    /// Stored number <= expected number.
    AtMost,
    /// Arbitrary check on the stored value. Cannot be serialized.
    Predicate(Rc<dyn Fn(Option<&Value>) -> bool>),
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Equals => "eq",
            Comparison::AtLeast => "gte",
            Comparison::AtMost => "lte",
            Comparison::Predicate(_) => "predicate",
        }
    }

    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "eq" => Some(Comparison::Equals),
            "gte" => Some(Comparison::AtLeast),
            "lte" => Some(Comparison::AtMost),
            _ => None,
        }
    }

    pub fn matches(&self, stored: Option<&Value>, expected: &Value) -> bool {
        match self {
            Comparison::Equals => stored.is_some_and(|v| values_equal(v, expected)),
            Comparison::AtLeast => numbers(stored, expected).is_some_and(|(s, e)| s >= e),
            Comparison::AtMost => numbers(stored, expected).is_some_and(|(s, e)| s <= e),
            Comparison::Predicate(check) => check(stored),
        }
    }
}

impl fmt::Debug for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn values_equal(stored: &Value, expected: &Value) -> bool {
    match (stored.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => stored == expected,
    }
}

fn numbers(stored: Option<&Value>, expected: &Value) -> Option<(f64, f64)> {
    Some((stored?.as_f64()?, expected.as_f64()?))
}

/// Ticks the child only while a blackboard value matches; otherwise fails without touching the
/// child at all.
pub struct BlackboardGuard {
    meta: NodeMeta,
    child: Option<Box<dyn Node>>,
    key: String,
    value: Value,
    scope: BbScope,
    comparison: Comparison,
}

impl BlackboardGuard {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<Value>,
        scope: BbScope,
        child: impl Into<Option<Box<dyn Node>>>,
    ) -> Self {
        let key = key.into();
        let value = value.into();
        let meta = NodeMeta::new(Category::Decorator, "BlackboardGuard")
            .with_property("key", key.clone())
            .with_property("value", value.clone())
            .with_property("scope", scope.as_str())
            .with_property("op", Comparison::Equals.as_str());
        let mut guard = Self {
            meta,
            child: child.into(),
            key,
            value,
            scope,
            comparison: Comparison::Equals,
        };
        guard.meta.title = format!("Check: {}", guard.key);
        guard
    }

    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.meta
            .properties
            .insert("op".to_string(), comparison.as_str().into());
        self.comparison = comparison;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Node for BlackboardGuard {
    node_meta!();

    fn children(&self) -> &[Box<dyn Node>] {
        self.child.as_slice()
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let Some(child) = self.child.as_deref() else {
            return missing_child(&self.meta);
        };

        let scope = self.scope.resolve(tick, self.id());
        let stored = tick.blackboard().get(&self.key, scope);
        if !self.comparison.matches(stored, &self.value) {
            return Status::Failure;
        }

        execute(child, tick)
    }
}

/// Writes the child's raw status code under `key` and passes the status through.
pub struct StatusToBlackboard {
    meta: NodeMeta,
    child: Option<Box<dyn Node>>,
    key: String,
    scope: BbScope,
}

impl StatusToBlackboard {
    pub fn new(
        key: impl Into<String>,
        scope: BbScope,
        child: impl Into<Option<Box<dyn Node>>>,
    ) -> Self {
        let key = key.into();
        Self {
            meta: NodeMeta::new(Category::Decorator, "StatusToBlackboard")
                .with_property("key", key.clone())
                .with_property("scope", scope.as_str()),
            child: child.into(),
            key,
            scope,
        }
    }
}

impl Node for StatusToBlackboard {
    node_meta!();

    fn children(&self) -> &[Box<dyn Node>] {
        self.child.as_slice()
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let Some(child) = self.child.as_deref() else {
            return missing_child(&self.meta);
        };

        let status = execute(child, tick);
        let scope = self.scope.resolve(tick, self.id());
        tick.blackboard_mut()
            .set(self.key.as_str(), status.code(), scope);
        status
    }
}
