use std::sync::Arc;

use avatar_bt::{node_meta, Category, Node, NodeMeta, Tick};
use avatar_core::{NodeId, Status};

use crate::board;
use crate::config::BrainConfig;
use crate::keys;

const START_TIME: &str = "startTime";
const EXPRESSION_START_TIME: &str = "expressionStartTime";
const SEQUENCE_INDEX: &str = "currentSequenceIdx";
const SEQUENCE_START_TIME: &str = "sequenceStartTime";

/// `true` while less than `duration_secs` have passed since `key` was stamped.
fn still_playing(tick: &Tick<'_>, node: NodeId, key: &str, duration_secs: f64) -> bool {
    if duration_secs <= 0.0 {
        return false;
    }
    let now = tick.now_ms();
    let started = tick.node_f64(node, key).unwrap_or(now);
    now - started < duration_secs * 1000.0
}

/// Sets the body animation, holding it for `duration` seconds when one is given.
pub struct PlayAnimationAction {
    meta: NodeMeta,
    action: String,
    duration: f64,
}

impl PlayAnimationAction {
    pub fn new(action: impl Into<String>, duration: f64) -> Self {
        let action = action.into();
        let mut meta = NodeMeta::new(Category::Action, "PlayAnimationAction")
            .with_property("action", action.clone())
            .with_property("duration", duration);
        meta.title = format!("Play {action}");
        Self {
            meta,
            action,
            duration,
        }
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

impl Node for PlayAnimationAction {
    node_meta!();

    fn open(&self, tick: &mut Tick<'_>) {
        let now = tick.now_ms();
        tick.node_set(self.id(), START_TIME, now);
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        board::set_global(tick, keys::OUTPUT_ACTION, self.action.as_str());
        if still_playing(tick, self.id(), START_TIME, self.duration) {
            Status::Running
        } else {
            Status::Success
        }
    }
}

/// Sets the facial expression, independently of the body animation.
///
/// With an `expressionKey` the expression is read from that tree-scope key when present.
pub struct PlayExpressionAction {
    meta: NodeMeta,
    expression: String,
    duration: f64,
    expression_key: Option<String>,
}

impl PlayExpressionAction {
    pub fn new(expression: impl Into<String>, duration: f64) -> Self {
        let expression = expression.into();
        let mut meta = NodeMeta::new(Category::Action, "PlayExpressionAction")
            .with_property("expression", expression.clone())
            .with_property("duration", duration);
        meta.title = format!("Expression {expression}");
        Self {
            meta,
            expression,
            duration,
            expression_key: None,
        }
    }

    pub fn with_expression_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.meta
            .properties
            .insert("expressionKey".to_string(), key.clone().into());
        self.expression_key = Some(key);
        self
    }
}

impl Node for PlayExpressionAction {
    node_meta!();

    fn open(&self, tick: &mut Tick<'_>) {
        let now = tick.now_ms();
        tick.node_set(self.id(), EXPRESSION_START_TIME, now);
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let expression = self
            .expression_key
            .as_deref()
            .and_then(|key| board::tree_as::<String>(tick, key))
            .unwrap_or_else(|| self.expression.clone());
        board::set_global(tick, keys::OUTPUT_EXPRESSION, expression);

        if still_playing(tick, self.id(), EXPRESSION_START_TIME, self.duration) {
            Status::Running
        } else {
            Status::Success
        }
    }
}

/// Plays the queued `pendingActions` one after another.
///
/// The position in the queue is node memory and survives an interruption; the interrupted
/// action restarts from the beginning when the branch resumes. Fails on an empty queue so the
/// selector above moves on.
pub struct ExecuteActionSequence {
    meta: NodeMeta,
    config: Arc<BrainConfig>,
}

impl ExecuteActionSequence {
    pub fn new() -> Self {
        Self::from_config(Arc::new(BrainConfig::default()))
    }

    /// Plays each action for its `action_durations` entry.
    pub fn from_config(config: Arc<BrainConfig>) -> Self {
        Self {
            meta: NodeMeta::new(Category::Action, "ExecuteActionSequence"),
            config,
        }
    }

    fn finish(&self, tick: &mut Tick<'_>) -> Status {
        let id = self.id();
        board::set_tree(tick, keys::PENDING_ACTIONS, Vec::<String>::new());
        let scope = tick.tree_scope();
        tick.blackboard_mut().remove(keys::PENDING_EMOTION, scope);
        tick.node_set(id, SEQUENCE_INDEX, 0);
        tick.node_remove(id, SEQUENCE_START_TIME);
        tracing::debug!("action sequence finished");
        Status::Success
    }
}

impl Default for ExecuteActionSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for ExecuteActionSequence {
    node_meta!();

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let id = self.id();
        let actions: Vec<String> = board::tree_as(tick, keys::PENDING_ACTIONS).unwrap_or_default();
        if actions.is_empty() {
            return Status::Failure;
        }

        let index = tick
            .node_get(id, SEQUENCE_INDEX)
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;
        let Some(action) = actions.get(index) else {
            return self.finish(tick);
        };

        let now = tick.now_ms();
        let Some(started) = tick.node_f64(id, SEQUENCE_START_TIME) else {
            if index == 0 {
                if let Some(emotion) = board::tree_as::<String>(tick, keys::PENDING_EMOTION) {
                    board::set_global(tick, keys::OUTPUT_EXPRESSION, emotion);
                }
            }
            tracing::debug!(%action, index, total = actions.len(), "playing queued action");
            board::set_global(tick, keys::OUTPUT_ACTION, action.as_str());
            tick.node_set(id, SEQUENCE_START_TIME, now);
            return Status::Running;
        };

        if now - started >= self.config.action_duration_ms(action) {
            tick.node_set(id, SEQUENCE_INDEX, index as u64 + 1);
            tick.node_remove(id, SEQUENCE_START_TIME);
        }
        Status::Running
    }

    fn close(&self, tick: &mut Tick<'_>) {
        tick.node_remove(self.id(), SEQUENCE_START_TIME);
    }
}
