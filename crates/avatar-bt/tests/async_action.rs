use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use avatar_bt::{AsyncAction, AsyncState, AsyncTask, BbScope, BehaviorTree, BlackboardGuard, NodeExt, Priority, Tick};
use avatar_core::{Blackboard, NodeId, Scope, Status};
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::json;

type Reply = anyhow::Result<u32>;

/// Each start takes the next queued receiver; the test resolves it whenever it likes.
#[derive(Clone, Default)]
struct Gate {
    queue: Rc<RefCell<VecDeque<oneshot::Receiver<Reply>>>>,
    starts: Rc<Cell<usize>>,
}

impl Gate {
    fn arm(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.queue.borrow_mut().push_back(rx);
        tx
    }
}

struct Answer {
    gate: Gate,
}

impl AsyncTask for Answer {
    type Output = u32;

    fn start(&self, _tick: &mut Tick<'_>, _node: NodeId) -> Option<BoxFuture<'static, Reply>> {
        let rx = self.gate.queue.borrow_mut().pop_front()?;
        self.gate.starts.set(self.gate.starts.get() + 1);
        Some(
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("gate dropped")))
            }
            .boxed(),
        )
    }

    fn complete(&self, tick: &mut Tick<'_>, _node: NodeId, output: u32) -> Status {
        let scope = tick.tree_scope();
        tick.blackboard_mut().set("answer", output, scope);
        Status::Success
    }
}

fn answer_node(gate: &Gate) -> AsyncAction<Answer> {
    AsyncAction::new("Answer", Answer { gate: gate.clone() }).with_status_key("answer_status")
}

fn node_state(bb: &Blackboard, tree: &BehaviorTree) -> Option<String> {
    bb.node_values(tree.id(), "answer_status")
        .next()
        .and_then(|(_, v)| v.as_str().map(str::to_string))
}

#[test]
fn fires_once_and_completes_on_a_later_tick() {
    let mut pool = LocalPool::new();
    let gate = Gate::default();
    let reply = gate.arm();
    let tree = BehaviorTree::new(answer_node(&gate).boxed()).with_spawner(pool.spawner());
    let mut bb = Blackboard::new();

    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(gate.starts.get(), 1);
    assert_eq!(node_state(&bb, &tree).as_deref(), Some("processing"));

    pool.run_until_stalled();
    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(gate.starts.get(), 1);

    reply.send(Ok(42)).unwrap();
    pool.run_until_stalled();
    assert_eq!(tree.tick(None, &mut bb), Status::Success);
    assert_eq!(bb.get("answer", Scope::Tree(tree.id())), Some(&json!(42)));
    assert_eq!(node_state(&bb, &tree).as_deref(), Some(AsyncState::Idle.as_str()));
}

#[test]
fn failure_is_reported_and_state_resets() {
    let mut pool = LocalPool::new();
    let gate = Gate::default();
    let reply = gate.arm();
    let tree = BehaviorTree::new(answer_node(&gate).boxed()).with_spawner(pool.spawner());
    let mut bb = Blackboard::new();

    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    reply.send(Err(anyhow::anyhow!("model unavailable"))).unwrap();
    pool.run_until_stalled();

    assert_eq!(tree.tick(None, &mut bb), Status::Failure);
    assert_eq!(node_state(&bb, &tree).as_deref(), Some("idle"));
    let errors: Vec<_> = bb.node_values(tree.id(), "async_error").collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1, &json!("model unavailable"));
}

#[test]
fn unmet_preconditions_fail_without_firing() {
    let pool = LocalPool::new();
    let gate = Gate::default();
    let tree = BehaviorTree::new(answer_node(&gate).boxed()).with_spawner(pool.spawner());
    let mut bb = Blackboard::new();

    assert_eq!(tree.tick(None, &mut bb), Status::Failure);
    assert_eq!(gate.starts.get(), 0);
}

#[test]
fn result_of_abandoned_activation_is_discarded() {
    let mut pool = LocalPool::new();
    let gate = Gate::default();
    let first = gate.arm();
    let _second = gate.arm();

    let guarded = BlackboardGuard::new("enabled", true, BbScope::Global, answer_node(&gate).boxed());
    let root = Priority::new(vec![guarded.boxed(), avatar_bt::AlwaysSuccess::new().boxed()]);
    let tree = BehaviorTree::new(root.boxed()).with_spawner(pool.spawner());
    let mut bb = Blackboard::new();

    bb.set("enabled", true, Scope::Global);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);

    bb.set("enabled", false, Scope::Global);
    assert_eq!(tree.tick(None, &mut bb), Status::Success);

    let _ = first.send(Ok(1));
    pool.run_until_stalled();

    bb.set("enabled", true, Scope::Global);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    pool.run_until_stalled();
    assert_eq!(tree.tick(None, &mut bb), Status::Running);

    assert_eq!(gate.starts.get(), 2);
    assert_eq!(bb.get("answer", Scope::Tree(tree.id())), None);
}

#[test]
fn spawning_without_a_runtime_fails() {
    let gate = Gate::default();
    let _reply = gate.arm();
    let tree = BehaviorTree::new(answer_node(&gate).boxed());
    let mut bb = Blackboard::new();

    assert_eq!(tree.tick(None, &mut bb), Status::Failure);
}

#[tokio::test]
async fn completes_on_tokio_runtime() {
    let gate = Gate::default();
    let reply = gate.arm();
    let tree = BehaviorTree::new(answer_node(&gate).boxed());
    let mut bb = Blackboard::new();

    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    reply.send(Ok(7)).unwrap();

    let mut status = Status::Running;
    for _ in 0..16 {
        tokio::task::yield_now().await;
        status = tree.tick(None, &mut bb);
        if status != Status::Running {
            break;
        }
    }
    assert_eq!(status, Status::Success);
    assert_eq!(bb.get("answer", Scope::Tree(tree.id())), Some(&json!(7)));
}
