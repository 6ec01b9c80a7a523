//! Behavior tree runtime built on `avatar-core`.
//!
//! Nodes are immutable once built; everything that changes between ticks lives in the
//! [`Blackboard`](avatar_core::Blackboard) under the node's own scope. That is what lets a
//! composite resume a running child on the next frame, and what lets the tree close nodes it
//! stopped visiting.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod async_action;
pub mod composites;
pub mod decorators;
pub mod leaves;
pub mod node;
pub mod registry;
pub mod serialization;
pub mod tick;
pub mod tree;

pub use async_action::{AsyncAction, AsyncState, AsyncTask};
pub use composites::{
    IfThenElse, MemSequence, Parallel, ParallelPolicy, Priority, ReactiveSequence, Sequence,
};
pub use decorators::{
    BlackboardGuard, Comparison, Inverter, Remap, Repeat, Retry, StatusToBlackboard, Timeout,
};
pub use leaves::{AlwaysFailure, AlwaysSuccess, CheckBlackboardCondition, Condition, Wait};
pub use node::{execute, find_node, walk, BbScope, Category, Node, NodeExt, NodeMeta};
pub use registry::{BuildError, NodeRegistry, NodeSpec};
pub use serialization::{NodeDocument, SerializationError, TreeDocument};
pub use tick::Tick;
pub use tree::BehaviorTree;
