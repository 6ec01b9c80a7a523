use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use avatar_core::Status;

use crate::node::{execute, Category, Node, NodeMeta};
use crate::node_meta;
use crate::tick::Tick;

const RUNNING_CHILD: &str = "runningChild";
const SUCCEEDED_CHILDREN: &str = "succeededChildren";

/// Ticks children in order from the first one every tick; the first non-success is returned.
pub struct Sequence {
    meta: NodeMeta,
    children: Vec<Box<dyn Node>>,
}

impl Sequence {
    pub fn new(children: Vec<Box<dyn Node>>) -> Self {
        Self {
            meta: NodeMeta::new(Category::Composite, "Sequence"),
            children,
        }
    }
}

impl Node for Sequence {
    node_meta!();

    fn children(&self) -> &[Box<dyn Node>] {
        &self.children
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        for child in &self.children {
            let status = execute(child.as_ref(), tick);
            if status != Status::Success {
                return status;
            }
        }
        Status::Success
    }
}

/// Sequence that resumes at the child that was running on the previous tick, without
/// re-checking the children before it.
pub struct MemSequence {
    meta: NodeMeta,
    children: Vec<Box<dyn Node>>,
}

impl MemSequence {
    pub fn new(children: Vec<Box<dyn Node>>) -> Self {
        Self {
            meta: NodeMeta::new(Category::Composite, "MemSequence"),
            children,
        }
    }
}

impl Node for MemSequence {
    node_meta!();

    fn children(&self) -> &[Box<dyn Node>] {
        &self.children
    }

    fn open(&self, tick: &mut Tick<'_>) {
        tick.node_set(self.id(), RUNNING_CHILD, 0);
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let start = tick
            .node_get(self.id(), RUNNING_CHILD)
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;

        for (index, child) in self.children.iter().enumerate().skip(start) {
            let status = execute(child.as_ref(), tick);
            if status != Status::Success {
                if status == Status::Running {
                    tick.node_set(self.id(), RUNNING_CHILD, index);
                }
                return status;
            }
        }
        Status::Success
    }
}

/// Re-evaluates every child from the first on each tick. A child that stops succeeding aborts
/// whatever later child was running; the tree closes the abandoned branch.
pub struct ReactiveSequence {
    meta: NodeMeta,
    children: Vec<Box<dyn Node>>,
}

impl ReactiveSequence {
    pub fn new(children: Vec<Box<dyn Node>>) -> Self {
        Self {
            meta: NodeMeta::new(Category::Composite, "ReactiveSequence"),
            children,
        }
    }
}

impl Node for ReactiveSequence {
    node_meta!();

    fn children(&self) -> &[Box<dyn Node>] {
        &self.children
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        for child in &self.children {
            match execute(child.as_ref(), tick) {
                Status::Success => continue,
                other => return other,
            }
        }
        Status::Success
    }
}

/// Selector: the first child that does not fail wins.
pub struct Priority {
    meta: NodeMeta,
    children: Vec<Box<dyn Node>>,
}

impl Priority {
    pub fn new(children: Vec<Box<dyn Node>>) -> Self {
        Self {
            meta: NodeMeta::new(Category::Composite, "Priority"),
            children,
        }
    }
}

impl Node for Priority {
    node_meta!();

    fn children(&self) -> &[Box<dyn Node>] {
        &self.children
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        for child in &self.children {
            let status = execute(child.as_ref(), tick);
            if status != Status::Failure {
                return status;
            }
        }
        Status::Failure
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParallelPolicy {
    /// Succeed once every child has succeeded at least once during the activation; fail as soon
    /// as any child fails.
    #[default]
    SuccessOnAll,
    /// Succeed as soon as one child succeeds; fail when every child failed on the same tick.
    SuccessOnOne,
}

/// Ticks all children every tick regardless of their individual outcomes.
pub struct Parallel {
    meta: NodeMeta,
    children: Vec<Box<dyn Node>>,
    policy: ParallelPolicy,
}

impl Parallel {
    pub fn new(policy: ParallelPolicy, children: Vec<Box<dyn Node>>) -> Self {
        let policy_name = match policy {
            ParallelPolicy::SuccessOnAll => "SuccessOnAll",
            ParallelPolicy::SuccessOnOne => "SuccessOnOne",
        };
        Self {
            meta: NodeMeta::new(Category::Composite, "Parallel").with_property("policy", policy_name),
            children,
            policy,
        }
    }

    pub fn policy(&self) -> ParallelPolicy {
        self.policy
    }
}

impl Node for Parallel {
    node_meta!();

    fn children(&self) -> &[Box<dyn Node>] {
        &self.children
    }

    fn open(&self, tick: &mut Tick<'_>) {
        tick.node_set(self.id(), SUCCEEDED_CHILDREN, serde_json::Value::Array(Vec::new()));
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let mut succeeded: BTreeSet<usize> = tick
            .node_get_as(self.id(), SUCCEEDED_CHILDREN)
            .unwrap_or_default();
        let mut successes = 0;
        let mut failures = 0;
        let mut errored = false;

        for (index, child) in self.children.iter().enumerate() {
            match execute(child.as_ref(), tick) {
                Status::Success => {
                    successes += 1;
                    succeeded.insert(index);
                }
                Status::Failure => failures += 1,
                Status::Error => errored = true,
                Status::Running => {}
            }
        }

        if errored {
            return Status::Error;
        }

        match self.policy {
            ParallelPolicy::SuccessOnOne => {
                if successes > 0 {
                    Status::Success
                } else if failures == self.children.len() {
                    Status::Failure
                } else {
                    Status::Running
                }
            }
            ParallelPolicy::SuccessOnAll => {
                if failures > 0 {
                    Status::Failure
                } else if succeeded.len() == self.children.len() {
                    Status::Success
                } else {
                    let list: Vec<usize> = succeeded.into_iter().collect();
                    tick.node_set(self.id(), SUCCEEDED_CHILDREN, list);
                    Status::Running
                }
            }
        }
    }
}

/// Children are `[condition, then, else?]`.
pub struct IfThenElse {
    meta: NodeMeta,
    children: Vec<Box<dyn Node>>,
}

impl IfThenElse {
    pub fn new(children: Vec<Box<dyn Node>>) -> Self {
        Self {
            meta: NodeMeta::new(Category::Composite, "IfThenElse"),
            children,
        }
    }
}

impl Node for IfThenElse {
    node_meta!();

    fn children(&self) -> &[Box<dyn Node>] {
        &self.children
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let [condition, then_branch, rest @ ..] = self.children.as_slice() else {
            return Status::Failure;
        };

        match execute(condition.as_ref(), tick) {
            Status::Success => execute(then_branch.as_ref(), tick),
            Status::Failure => match rest.first() {
                Some(else_branch) => execute(else_branch.as_ref(), tick),
                None => Status::Failure,
            },
            other => other,
        }
    }
}
