mod common;

use avatar_bt::{BbScope, BehaviorTree, BlackboardGuard, NodeExt, Priority, Sequence};
use avatar_core::{keys, Blackboard, ManualClock, NodeId, Scope, Status};
use avatar_tools::{tick_summary, TraceLog, TRACE_LOG};
use serde_json::json;

use common::Scripted;

use Status::{Running, Success};

#[test]
fn open_and_close_once_per_activation() {
    let (child, probe) = Scripted::new(&[Running, Running, Success, Running]);
    let tree = BehaviorTree::new(Sequence::new(vec![child]).boxed()).with_clock(ManualClock::new(0.0));
    let mut bb = Blackboard::new();

    tree.tick(None, &mut bb);
    tree.tick(None, &mut bb);
    assert_eq!(probe.counts().open, 1);
    assert_eq!(probe.counts().close, 0);

    assert_eq!(tree.tick(None, &mut bb), Success);
    assert_eq!(probe.counts().close, 1);

    tree.tick(None, &mut bb);
    assert_eq!(probe.counts().open, 2);
}

#[test]
fn abandoned_branch_is_closed_exactly_once() {
    let (a, a_probe) = Scripted::always(Running);
    let (b, b_probe) = Scripted::always(Running);
    let guard = BlackboardGuard::new("flag", true, BbScope::Global, a).boxed();
    let tree = BehaviorTree::new(Priority::new(vec![guard, b]).boxed());
    let mut bb = Blackboard::new();

    bb.set("flag", true, Scope::Global);
    assert_eq!(tree.tick(None, &mut bb), Running);
    assert_eq!(a_probe.ticks(), 1);

    bb.set("flag", false, Scope::Global);
    assert_eq!(tree.tick(None, &mut bb), Running);
    assert_eq!(a_probe.closes(), 1);
    assert_eq!(b_probe.ticks(), 1);

    assert_eq!(tree.tick(None, &mut bb), Running);
    assert_eq!(a_probe.closes(), 1);
    assert_eq!(b_probe.closes(), 0);
    assert_eq!(b_probe.opens(), 1);
}

#[test]
fn tree_persists_open_nodes_statuses_and_counts() {
    let (a, _) = Scripted::always(Running);
    let root = Sequence::new(vec![a]);
    let tree = BehaviorTree::new(root.boxed());
    let root_id = tree.root().unwrap().id();
    let leaf_id = tree.root().unwrap().children()[0].id();
    let mut bb = Blackboard::new();

    tree.tick(None, &mut bb);

    let scope = Scope::Tree(tree.id());
    let open: Vec<NodeId> = bb.get_as(keys::OPEN_NODES, scope).unwrap();
    assert_eq!(open, vec![root_id, leaf_id]);
    assert_eq!(bb.get(keys::NODE_COUNT, scope), Some(&json!(2)));
    assert_eq!(bb.get(keys::TICK_COUNT, scope), Some(&json!(1)));

    let statuses = bb.get(keys::NODE_STATUSES, scope).unwrap();
    assert_eq!(statuses[leaf_id.to_string()], json!(3));

    let summary = tick_summary(&bb, tree.id()).unwrap();
    assert_eq!(summary.node_count, 2);
    assert!(summary.slowest.is_some());
}

#[test]
fn tree_without_root_reports_error() {
    let tree = BehaviorTree::empty();
    let mut bb = Blackboard::new();
    assert_eq!(tree.tick(None, &mut bb), Status::Error);
}

#[test]
fn two_blackboards_keep_independent_state() {
    let (a, _) = Scripted::always(Running);
    let tree = BehaviorTree::new(Sequence::new(vec![a]).boxed());
    let mut first = Blackboard::new();
    let mut second = Blackboard::new();

    tree.tick(None, &mut first);
    tree.tick(None, &mut first);
    tree.tick(None, &mut second);

    let scope = Scope::Tree(tree.id());
    assert_eq!(first.get(keys::TICK_COUNT, scope), Some(&json!(2)));
    assert_eq!(second.get(keys::TICK_COUNT, scope), Some(&json!(1)));
}

#[test]
fn lifecycle_events_reach_the_trace_log() {
    let (a, _) = Scripted::new(&[Running, Success]);
    let tree = BehaviorTree::new(Sequence::new(vec![a]).boxed());
    let mut bb = Blackboard::new();
    bb.set_handle(TRACE_LOG, TraceLog::default(), Scope::Global);

    tree.tick(None, &mut bb);
    tree.tick(None, &mut bb);

    let log = bb.handle(TRACE_LOG, Scope::Global).unwrap();
    assert_eq!(log.tagged("bt.open").count(), 2);
    assert_eq!(log.tagged("bt.close").count(), 2);
    let last = log.events.last().unwrap();
    assert_eq!(last.tick, 1);
    assert_eq!(last.status, Some(Success));
}

#[test]
fn target_is_visible_to_nodes() {
    use avatar_bt::Condition;

    let condition = Condition::new(|tick: &avatar_bt::Tick<'_>| tick.target::<u32>() == Some(&7));
    let tree = BehaviorTree::new(condition.boxed());
    let mut bb = Blackboard::new();

    assert_eq!(tree.tick(Some(&7u32), &mut bb), Success);
    assert_eq!(tree.tick(Some(&"other"), &mut bb), Status::Failure);
    assert_eq!(tree.tick(None, &mut bb), Status::Failure);
}
