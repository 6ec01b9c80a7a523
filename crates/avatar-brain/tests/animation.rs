mod common;

use std::sync::Arc;

use avatar_brain::keys;
use avatar_brain::{BrainConfig, ExecuteActionSequence, PlayAnimationAction, PlayExpressionAction};
use avatar_bt::NodeExt;
use avatar_core::{Blackboard, ManualClock, Scope, Status};
use serde_json::json;

use common::{global_str, single};

#[test]
fn play_animation_holds_for_its_duration() {
    let clock = ManualClock::new(1_000.0);
    let tree = single(PlayAnimationAction::new("DAZZLE", 2.0).boxed(), &clock);
    let mut bb = Blackboard::new();

    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(global_str(&bb, keys::OUTPUT_ACTION), Some("DAZZLE"));

    clock.advance_ms(1_999.0);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);

    clock.advance_ms(1.0);
    assert_eq!(tree.tick(None, &mut bb), Status::Success);
}

#[test]
fn play_animation_without_duration_succeeds_at_once() {
    let clock = ManualClock::new(0.0);
    let tree = single(PlayAnimationAction::new("IDLE", 0.0).boxed(), &clock);
    let mut bb = Blackboard::new();

    assert_eq!(tree.tick(None, &mut bb), Status::Success);
    assert_eq!(global_str(&bb, keys::OUTPUT_ACTION), Some("IDLE"));
}

#[test]
fn play_expression_prefers_expression_key() {
    let clock = ManualClock::new(0.0);
    let node = PlayExpressionAction::new("NEUTRAL", 1.0).with_expression_key("mood");
    let tree = single(node.boxed(), &clock);
    let mut bb = Blackboard::new();

    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(global_str(&bb, keys::OUTPUT_EXPRESSION), Some("NEUTRAL"));

    bb.set("mood", "LOVING", Scope::Tree(tree.id()));
    clock.advance_ms(1_000.0);
    assert_eq!(tree.tick(None, &mut bb), Status::Success);
    assert_eq!(global_str(&bb, keys::OUTPUT_EXPRESSION), Some("LOVING"));
}

#[test]
fn action_sequence_plays_queue_in_order() {
    let clock = ManualClock::new(0.0);
    let tree = single(ExecuteActionSequence::new().boxed(), &clock);
    let scope = Scope::Tree(tree.id());
    let mut bb = Blackboard::new();
    bb.set(keys::PENDING_ACTIONS, json!(["JUMP", "WAVE"]), scope);
    bb.set(keys::PENDING_EMOTION, "HAPPY", scope);

    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(global_str(&bb, keys::OUTPUT_ACTION), Some("JUMP"));
    assert_eq!(global_str(&bb, keys::OUTPUT_EXPRESSION), Some("HAPPY"));

    // JUMP lasts 1.5 s.
    clock.advance_ms(1_499.0);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(global_str(&bb, keys::OUTPUT_ACTION), Some("JUMP"));

    clock.advance_ms(1.0);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(global_str(&bb, keys::OUTPUT_ACTION), Some("WAVE"));

    clock.advance_ms(2_000.0);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(tree.tick(None, &mut bb), Status::Success);
    assert_eq!(bb.get(keys::PENDING_ACTIONS, scope), Some(&json!([])));
    assert_eq!(bb.get(keys::PENDING_EMOTION, scope), None);

    assert_eq!(tree.tick(None, &mut bb), Status::Failure);
}

#[test]
fn action_sequence_fails_on_empty_queue() {
    let clock = ManualClock::new(0.0);
    let tree = single(ExecuteActionSequence::new().boxed(), &clock);
    let mut bb = Blackboard::new();

    assert_eq!(tree.tick(None, &mut bb), Status::Failure);
    assert_eq!(global_str(&bb, keys::OUTPUT_ACTION), None);
}

#[test]
fn unknown_actions_play_for_the_default_duration() {
    let clock = ManualClock::new(0.0);
    let tree = single(ExecuteActionSequence::new().boxed(), &clock);
    let mut bb = Blackboard::new();
    bb.set(keys::PENDING_ACTIONS, json!(["TWIRL"]), Scope::Tree(tree.id()));

    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    clock.advance_ms(2_999.0);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    clock.advance_ms(1.0);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(tree.tick(None, &mut bb), Status::Success);
}

#[test]
fn action_sequence_uses_configured_durations() {
    let mut config = BrainConfig::default();
    config.action_durations.insert("JUMP".to_string(), 0.5);
    config.default_action_duration = 1.0;
    assert_eq!(config.action_duration_ms("JUMP"), 500.0);

    let clock = ManualClock::new(0.0);
    let tree = single(
        ExecuteActionSequence::from_config(Arc::new(config)).boxed(),
        &clock,
    );
    let scope = Scope::Tree(tree.id());
    let mut bb = Blackboard::new();
    bb.set(keys::PENDING_ACTIONS, json!(["JUMP", "ZIGZAG"]), scope);

    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    clock.advance_ms(500.0);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(global_str(&bb, keys::OUTPUT_ACTION), Some("ZIGZAG"));

    clock.advance_ms(1_000.0);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(tree.tick(None, &mut bb), Status::Success);
}
