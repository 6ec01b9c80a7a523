//! The penguin's tree and the registry entries for every domain leaf.

use std::sync::Arc;

use avatar_bt::{
    BbScope, BehaviorTree, BlackboardGuard, BuildError, CheckBlackboardCondition, Comparison,
    MemSequence, Node, NodeExt, NodeRegistry, Parallel, ParallelPolicy, Priority, Remap, Retry,
    Sequence, Timeout,
};

use crate::animation::{ExecuteActionSequence, PlayAnimationAction, PlayExpressionAction};
use crate::config::{BrainConfig, MoodConfig};
use crate::conversation::{DropCommandNode, FunctionExecNode, LlmCall, ProactiveLlm};
use crate::keys;
use crate::llm::SharedLlm;
use crate::mood::UpdateInternalStatesAction;
use crate::motion::{FollowPointerNode, MoveTarget, MoveToTargetAction, ReturnToOriginAction};
use crate::types::Vec3;

/// What the domain leaves need from outside the tree.
#[derive(Clone)]
pub struct BrainDeps {
    pub llm: SharedLlm,
    pub config: Arc<BrainConfig>,
}

impl BrainDeps {
    pub fn new(llm: SharedLlm, config: BrainConfig) -> Self {
        Self {
            llm,
            config: Arc::new(config),
        }
    }
}

/// Registers every leaf of this crate under the name it serializes with.
pub fn register_brain_nodes(registry: &mut NodeRegistry, deps: &BrainDeps) {
    registry.register("PlayAnimationAction", |spec| {
        let action: String = spec.prop_or("action", "IDLE".to_string())?;
        let duration = spec.prop_or("duration", 0.0)?;
        Ok(spec.finish(PlayAnimationAction::new(action, duration)))
    });
    registry.register("PlayExpressionAction", |spec| {
        let expression: String = spec.prop_or("expression", "NEUTRAL".to_string())?;
        let duration = spec.prop_or("duration", 0.0)?;
        let key: Option<String> = spec.prop("expressionKey")?;
        let mut node = PlayExpressionAction::new(expression, duration);
        if let Some(key) = key {
            node = node.with_expression_key(key);
        }
        Ok(spec.finish(node))
    });
    registry.register("FollowPointerNode", |spec| {
        Ok(spec.finish(FollowPointerNode::new()))
    });

    let motion = deps.config.motion.clone();
    registry.register("ReturnToOriginAction", move |spec| {
        let origin: Vec3 = spec.prop_or("origin", motion.origin)?;
        let factor = spec.prop_or("factor", motion.return_factor)?;
        let tolerance = spec.prop_or("tolerance", motion.arrive_tolerance)?;
        Ok(spec.finish(ReturnToOriginAction::new(origin, factor, tolerance)))
    });

    let motion = deps.config.motion.clone();
    registry.register("MoveToTargetAction", move |spec| {
        let key: Option<String> = spec.prop("targetKey")?;
        let position: Option<Vec3> = spec.prop("targetPos")?;
        let target = match (key, position) {
            (Some(key), _) => MoveTarget::Key(key),
            (None, Some(position)) => MoveTarget::Position(position),
            (None, None) => {
                return Err(BuildError::MissingProperty {
                    node: spec.name.clone(),
                    property: "targetKey".to_string(),
                })
            }
        };
        let speed = spec.prop_or("speed", motion.move_speed)?;
        Ok(spec.finish(MoveToTargetAction::new(target, speed).with_motion(&motion)))
    });

    let config = deps.config.clone();
    registry.register("ExecuteActionSequence", move |spec| {
        Ok(spec.finish(ExecuteActionSequence::from_config(config.clone())))
    });

    let mood = deps.config.mood.clone();
    registry.register("UpdateInternalStatesAction", move |spec| {
        let config = MoodConfig {
            boredom_per_second: spec.prop_or("boredomPerSecond", mood.boredom_per_second)?,
            energy_recovery_per_second: spec
                .prop_or("energyRecoveryPerSecond", mood.energy_recovery_per_second)?,
            ..mood.clone()
        };
        Ok(spec.finish(UpdateInternalStatesAction::new(config)))
    });

    let (llm, settings) = (deps.llm.clone(), deps.config.llm.clone());
    registry.register("LLMCallNode", move |spec| {
        Ok(spec.finish(LlmCall::node(llm.clone(), settings.clone())))
    });

    let (llm, settings) = (deps.llm.clone(), deps.config.llm.clone());
    registry.register("ProactiveLLMNode", move |spec| {
        Ok(spec.finish(ProactiveLlm::node(llm.clone(), settings.clone())))
    });

    registry.register("FunctionExecNode", |spec| {
        Ok(spec.finish(FunctionExecNode::new()))
    });
    registry.register("DropCommandNode", |spec| {
        Ok(spec.finish(DropCommandNode::new()))
    });
}

/// Core nodes plus the penguin's leaves.
pub fn penguin_registry(deps: &BrainDeps) -> NodeRegistry {
    let mut registry = NodeRegistry::with_core_nodes();
    register_brain_nodes(&mut registry, deps);
    registry
}

/// The penguin's behavior, highest priority first:
///
/// 1. mood bookkeeping (never wins the selector)
/// 2. follow the pointer while dragged
/// 3. walk back home after a drag
/// 4. react to a click
/// 5. play actions queued by the LLM
/// 6. answer a new chat message, dropping it once the LLM has failed too often
/// 7. sleep when tired
/// 8. start a conversation when bored
/// 9. idle
pub fn build_penguin_tree(deps: &BrainDeps) -> BehaviorTree {
    let config = &deps.config;

    let mood = Remap::success_is_failure(
        UpdateInternalStatesAction::new(config.mood.clone()).boxed(),
    )
    .titled("Update Mood");

    let drag = BlackboardGuard::new(
        keys::IS_DRAGGING,
        true,
        BbScope::Global,
        FollowPointerNode::new().boxed(),
    )
    .titled("Dragging");

    let click = MemSequence::new(vec![
        CheckBlackboardCondition::new(keys::IS_CLICKED, true, BbScope::Global).boxed(),
        PlayAnimationAction::new("DAZZLE", 2.0).boxed(),
        PlayAnimationAction::new("IDLE", 0.0).boxed(),
    ])
    .titled("Clicked");

    let answer = Sequence::new(vec![
        Retry::new(
            config.llm_retry_attempts,
            LlmCall::node(deps.llm.clone(), config.llm.clone()).boxed(),
        )
        .boxed(),
        FunctionExecNode::new().boxed(),
    ])
    .titled("Answer");

    let command = MemSequence::new(vec![
        CheckBlackboardCondition::new(keys::HAS_NEW_INPUT, true, BbScope::Global).boxed(),
        Priority::new(vec![answer.boxed(), DropCommandNode::new().boxed()]).boxed(),
    ])
    .titled("Chat Command");

    let sleep = BlackboardGuard::new(
        keys::ENERGY,
        config.mood.sleep_threshold,
        BbScope::Global,
        Parallel::new(
            ParallelPolicy::SuccessOnAll,
            vec![
                PlayAnimationAction::new("SLEEP", config.mood.sleep_duration).boxed(),
                PlayExpressionAction::new("SLEEPY", config.mood.sleep_duration).boxed(),
            ],
        )
        .boxed(),
    )
    .with_comparison(Comparison::AtMost)
    .titled("Tired");

    let proactive = BlackboardGuard::new(
        keys::BOREDOM,
        config.mood.proactive_threshold,
        BbScope::Global,
        MemSequence::new(vec![
            Timeout::new(
                config.proactive_timeout_ms,
                ProactiveLlm::node(deps.llm.clone(), config.llm.clone()).boxed(),
            )
            .boxed(),
            FunctionExecNode::new().boxed(),
        ])
        .boxed(),
    )
    .with_comparison(Comparison::AtLeast)
    .titled("Bored");

    let children: Vec<Box<dyn Node>> = vec![
        mood.boxed(),
        drag.boxed(),
        ReturnToOriginAction::from_config(&config.motion).boxed(),
        click.boxed(),
        ExecuteActionSequence::from_config(config.clone()).boxed(),
        command.boxed(),
        sleep.boxed(),
        proactive.boxed(),
        PlayAnimationAction::new("IDLE", 0.0).boxed(),
    ];

    let mut tree = BehaviorTree::new(Priority::new(children).titled("Penguin").boxed())
        .with_title("Penguin");
    tree.description = "Interactive stage penguin".to_string();
    tree
}
