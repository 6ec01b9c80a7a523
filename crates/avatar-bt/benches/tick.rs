use avatar_bt::{BehaviorTree, Condition, Node, NodeExt, ReactiveSequence, Tick};
use avatar_core::{Blackboard, ManualClock};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn always_true(_tick: &Tick<'_>) -> bool {
    true
}

fn bench_bt_tick(c: &mut Criterion) {
    let conditions = (0..32)
        .map(|_| Condition::new(always_true).boxed())
        .collect::<Vec<Box<dyn Node>>>();

    let tree = BehaviorTree::new(ReactiveSequence::new(conditions).boxed())
        .with_clock(ManualClock::new(0.0));
    let mut blackboard = Blackboard::new();

    c.bench_function("avatar-bt/tick(conditions=32)", |b| {
        b.iter(|| {
            let status = tree.tick(None, &mut blackboard);
            black_box(status);
        })
    });
}

criterion_group!(benches, bench_bt_tick);
criterion_main!(benches);
