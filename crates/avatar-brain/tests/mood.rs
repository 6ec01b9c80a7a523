mod common;

use avatar_brain::keys;
use avatar_brain::{MoodConfig, UpdateInternalStatesAction};
use avatar_bt::{BehaviorTree, NodeExt};
use avatar_core::{Blackboard, ManualClock, NodeId, Scope, Status};

use common::{assert_close, single};

fn mood_tree(clock: &ManualClock) -> BehaviorTree {
    single(UpdateInternalStatesAction::new(MoodConfig::default()).boxed(), clock)
}

fn boredom(bb: &Blackboard) -> f64 {
    bb.get_f64(keys::BOREDOM, Scope::Global).unwrap()
}

fn energy(bb: &Blackboard) -> f64 {
    bb.get_f64(keys::ENERGY, Scope::Global).unwrap()
}

#[test]
fn boredom_grows_with_elapsed_time() {
    let clock = ManualClock::new(0.0);
    let tree = mood_tree(&clock);
    let mut bb = Blackboard::new();

    assert_eq!(tree.tick(None, &mut bb), Status::Success);
    assert_close(boredom(&bb), 0.0);
    assert_close(energy(&bb), 100.0);

    clock.advance_ms(10_000.0);
    tree.tick(None, &mut bb);
    assert_close(boredom(&bb), 10.0);

    clock.advance_ms(500_000.0);
    tree.tick(None, &mut bb);
    assert_close(boredom(&bb), 100.0);
}

#[test]
fn energy_recovers_only_while_sleeping() {
    let clock = ManualClock::new(0.0);
    let tree = mood_tree(&clock);
    let mut bb = Blackboard::new();
    bb.set(keys::ENERGY, 10.0, Scope::Global);
    tree.tick(None, &mut bb);

    clock.advance_ms(2_000.0);
    tree.tick(None, &mut bb);
    assert_close(energy(&bb), 10.0);

    bb.set(keys::OUTPUT_ACTION, "SLEEP", Scope::Global);
    clock.advance_ms(2_000.0);
    tree.tick(None, &mut bb);
    assert_close(energy(&bb), 20.0);
}

#[test]
fn zero_energy_stays_zero() {
    let clock = ManualClock::new(0.0);
    let tree = mood_tree(&clock);
    let mut bb = Blackboard::new();
    bb.set(keys::ENERGY, 0.0, Scope::Global);

    tree.tick(None, &mut bb);
    clock.advance_ms(1_000.0);
    tree.tick(None, &mut bb);
    assert_close(energy(&bb), 0.0);
}

#[test]
fn interaction_resets_boredom() {
    let clock = ManualClock::new(0.0);
    let tree = mood_tree(&clock);
    let mut bb = Blackboard::new();
    bb.set(keys::BOREDOM, 50.0, Scope::Global);
    bb.set(keys::IS_CLICKED, true, Scope::Global);

    tree.tick(None, &mut bb);
    assert_close(boredom(&bb), 0.0);
}

#[test]
fn busy_animation_resets_boredom_but_idling_does_not() {
    let clock = ManualClock::new(0.0);
    let tree = mood_tree(&clock);
    let mut bb = Blackboard::new();
    bb.set(keys::BOREDOM, 50.0, Scope::Global);
    bb.set(keys::CURRENT_ACTION, "IDLE", Scope::Global);

    tree.tick(None, &mut bb);
    assert_close(boredom(&bb), 50.0);

    bb.set(keys::CURRENT_ACTION, "DANCE", Scope::Global);
    tree.tick(None, &mut bb);
    assert_close(boredom(&bb), 0.0);
}

#[test]
fn pending_llm_call_in_the_same_tree_resets_boredom() {
    let clock = ManualClock::new(0.0);
    let tree = mood_tree(&clock);
    let mut bb = Blackboard::new();
    bb.set(keys::BOREDOM, 50.0, Scope::Global);
    bb.set(keys::LLM_STATUS, "processing", Scope::Node(tree.id(), NodeId::new()));

    tree.tick(None, &mut bb);
    assert_close(boredom(&bb), 0.0);
}
