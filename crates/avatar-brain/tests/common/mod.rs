#![allow(dead_code)]

use avatar_bt::{BehaviorTree, Node};
use avatar_core::{Blackboard, ManualClock, Scope};
use serde_json::Value;

/// A tree with `root` as its only node, driven by `clock`.
pub fn single(root: Box<dyn Node>, clock: &ManualClock) -> BehaviorTree {
    BehaviorTree::new(root).with_clock(clock.clone())
}

pub fn global<'a>(bb: &'a Blackboard, key: &str) -> Option<&'a Value> {
    bb.get(key, Scope::Global)
}

pub fn global_str<'a>(bb: &'a Blackboard, key: &str) -> Option<&'a str> {
    bb.get_str(key, Scope::Global)
}

pub fn position(bb: &Blackboard, key: &str) -> Option<[f64; 3]> {
    bb.get_as(key, Scope::Global)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
