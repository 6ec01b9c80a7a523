use avatar_bt::{node_meta, Category, Node, NodeMeta, Tick};
use avatar_core::Status;

use crate::board;
use crate::config::MotionConfig;
use crate::keys;
use crate::types::{add_scaled, distance, read_vec3, sub, Vec3};

const ENERGY_CONSUMED: &str = "energyConsumed";
const ARRIVE_DISTANCE: f64 = 0.1;
/// Fixed frame step the walking speed is normalized against.
const FRAME_SECONDS: f64 = 1.0 / 60.0;

fn penguin_position(tick: &Tick<'_>) -> Option<Vec3> {
    board::global(tick, keys::PENGUIN_POSITION).and_then(read_vec3)
}

fn emit_position(tick: &mut Tick<'_>, position: Vec3) {
    board::set_global(tick, keys::OUTPUT_POSITION, position.to_vec());
}

/// Pins the penguin to the pointer while it is being dragged.
pub struct FollowPointerNode {
    meta: NodeMeta,
}

impl FollowPointerNode {
    pub fn new() -> Self {
        Self {
            meta: NodeMeta::new(Category::Action, "FollowPointerNode"),
        }
    }
}

impl Default for FollowPointerNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for FollowPointerNode {
    node_meta!();

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        if !board::global_bool(tick, keys::IS_DRAGGING) {
            return Status::Success;
        }
        match board::global(tick, keys::POINTER_POSITION).and_then(read_vec3) {
            Some(pointer) => {
                emit_position(tick, pointer);
                Status::Running
            }
            None => Status::Success,
        }
    }
}

/// Eases the penguin back to its origin after a drag.
///
/// Fails when the position is unknown or already home, so a priority selector falls through.
pub struct ReturnToOriginAction {
    meta: NodeMeta,
    origin: Vec3,
    factor: f64,
    tolerance: f64,
}

impl ReturnToOriginAction {
    pub fn new(origin: Vec3, factor: f64, tolerance: f64) -> Self {
        Self {
            meta: NodeMeta::new(Category::Action, "ReturnToOriginAction")
                .with_property("origin", origin.to_vec())
                .with_property("factor", factor)
                .with_property("tolerance", tolerance),
            origin,
            factor,
            tolerance,
        }
    }

    pub fn from_config(config: &MotionConfig) -> Self {
        Self::new(config.origin, config.return_factor, config.arrive_tolerance)
    }
}

impl Node for ReturnToOriginAction {
    node_meta!();

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let Some(current) = penguin_position(tick) else {
            return Status::Failure;
        };
        if distance(current, self.origin) < self.tolerance {
            return Status::Failure;
        }
        let next = add_scaled(current, sub(self.origin, current), self.factor);
        emit_position(tick, next);
        Status::Running
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveTarget {
    /// Global key holding `[x, y, z]`.
    Key(String),
    Position(Vec3),
}

/// Walks towards a target at a constant speed, paying energy once per walk.
pub struct MoveToTargetAction {
    meta: NodeMeta,
    target: MoveTarget,
    speed: f64,
    energy_cost: f64,
    origin: Vec3,
}

impl MoveToTargetAction {
    pub fn new(target: MoveTarget, speed: f64) -> Self {
        let meta = NodeMeta::new(Category::Action, "MoveToTargetAction").with_property("speed", speed);
        let meta = match &target {
            MoveTarget::Key(key) => meta.with_property("targetKey", key.clone()),
            MoveTarget::Position(pos) => meta.with_property("targetPos", pos.to_vec()),
        };
        let defaults = MotionConfig::default();
        Self {
            meta,
            target,
            speed,
            energy_cost: defaults.move_energy_cost,
            origin: defaults.origin,
        }
    }

    pub fn with_motion(mut self, config: &MotionConfig) -> Self {
        self.energy_cost = config.move_energy_cost;
        self.origin = config.origin;
        self
    }

    fn target(&self, tick: &Tick<'_>) -> Option<Vec3> {
        match &self.target {
            MoveTarget::Key(key) => board::global(tick, key).and_then(read_vec3),
            MoveTarget::Position(pos) => Some(*pos),
        }
    }

    fn spend_energy(&self, tick: &mut Tick<'_>) {
        let id = self.id();
        let spent = tick
            .node_get(id, ENERGY_CONSUMED)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if spent {
            return;
        }
        let energy = board::global_f64(tick, keys::ENERGY).unwrap_or(100.0);
        board::set_global(tick, keys::ENERGY, (energy - self.energy_cost).max(0.0));
        tick.node_set(id, ENERGY_CONSUMED, true);
    }
}

impl Node for MoveToTargetAction {
    node_meta!();

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let Some(target) = self.target(tick) else {
            tracing::debug!(node = %self.meta.title, "no move target");
            return Status::Failure;
        };
        let current = penguin_position(tick).unwrap_or(self.origin);
        let remaining = distance(current, target);
        if remaining < ARRIVE_DISTANCE {
            return Status::Success;
        }

        self.spend_energy(tick);

        let step = self.speed * FRAME_SECONDS * 10.0;
        let next = add_scaled(current, sub(target, current), step / remaining);
        board::set_global(tick, keys::OUTPUT_ACTION, "WALK");
        emit_position(tick, next);
        Status::Running
    }

    fn close(&self, tick: &mut Tick<'_>) {
        tick.node_set(self.id(), ENERGY_CONSUMED, false);
    }
}
