use avatar_bt::{node_meta, Category, Node, NodeMeta, Tick};
use avatar_core::Status;

use crate::board;
use crate::config::MoodConfig;
use crate::keys;
use crate::types::RESTING_ACTIONS;

/// Advances boredom and energy by the time since the previous frame.
///
/// Always succeeds; wrap it in `SuccessIsFailure` to run it as the first child of a selector.
pub struct UpdateInternalStatesAction {
    meta: NodeMeta,
    config: MoodConfig,
}

impl UpdateInternalStatesAction {
    pub fn new(config: MoodConfig) -> Self {
        Self {
            meta: NodeMeta::new(Category::Action, "UpdateInternalStatesAction")
                .with_property("boredomPerSecond", config.boredom_per_second)
                .with_property("energyRecoveryPerSecond", config.energy_recovery_per_second),
            config,
        }
    }

    /// The user is interacting or the penguin is in the middle of something.
    fn engaged(&self, tick: &Tick<'_>) -> bool {
        if board::global_bool(tick, keys::HAS_NEW_INPUT)
            || board::global_bool(tick, keys::IS_DRAGGING)
            || board::global_bool(tick, keys::IS_CLICKED)
        {
            return true;
        }

        let thinking = tick
            .blackboard()
            .node_values(tick.tree_id(), keys::LLM_STATUS)
            .any(|(_, status)| status.as_str() == Some("processing"));
        if thinking {
            return true;
        }

        board::global_str(tick, keys::CURRENT_ACTION)
            .is_some_and(|action| !RESTING_ACTIONS.contains(&action))
    }
}

impl Default for UpdateInternalStatesAction {
    fn default() -> Self {
        Self::new(MoodConfig::default())
    }
}

impl Node for UpdateInternalStatesAction {
    node_meta!();

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let now = tick.now_ms();
        let last = board::tree_as::<f64>(tick, keys::LAST_STATE_TICK).unwrap_or(now);
        let dt = ((now - last) / 1000.0).max(0.0);

        let mut boredom = board::global_f64(tick, keys::BOREDOM).unwrap_or(0.0);
        let mut energy = board::global_f64(tick, keys::ENERGY).unwrap_or(100.0);

        boredom += dt * self.config.boredom_per_second;
        if board::global_str(tick, keys::OUTPUT_ACTION) == Some("SLEEP") {
            energy += dt * self.config.energy_recovery_per_second;
        }
        if self.engaged(tick) {
            boredom = 0.0;
        }

        board::set_global(tick, keys::BOREDOM, boredom.clamp(0.0, 100.0));
        board::set_global(tick, keys::ENERGY, energy.clamp(0.0, 100.0));
        board::set_tree(tick, keys::LAST_STATE_TICK, now);
        Status::Success
    }
}
