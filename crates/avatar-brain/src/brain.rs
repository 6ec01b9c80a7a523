use futures::task::Spawn;
use serde_json::Value;

use avatar_bt::BehaviorTree;
use avatar_core::{Blackboard, Clock, Scope, Status};

use crate::config::BrainConfig;
use crate::keys;
use crate::penguin::{build_penguin_tree, BrainDeps};
use crate::types::{read_vec3, ChatMessage, LlmSettings, PointerPosition, Vec3};

/// What the host should render after one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    pub status: Status,
    pub action: Option<String>,
    pub expression: Option<String>,
    pub position: Option<Vec3>,
    /// Chat records produced this frame, already appended to the history.
    pub chat: Vec<ChatMessage>,
}

/// Owns a tree and its blackboard and exposes the host contract as plain methods.
pub struct AvatarBrain {
    pub config: BrainConfig,
    tree: BehaviorTree,
    blackboard: Blackboard,
    frames: u64,
}

impl AvatarBrain {
    pub fn new(tree: BehaviorTree, config: BrainConfig) -> Self {
        let mut blackboard = Blackboard::new();
        blackboard.set(keys::ENERGY, 100.0, Scope::Global);
        blackboard.set(keys::BOREDOM, 0.0, Scope::Global);
        blackboard.set(keys::CHAT_HISTORY, Vec::<Value>::new(), Scope::Global);
        if let Err(err) = blackboard.set_as(keys::LLM_SETTINGS, &config.llm, Scope::Global) {
            tracing::warn!(error = %err, "could not seed LLM settings");
        }
        Self {
            config,
            tree,
            blackboard,
            frames: 0,
        }
    }

    /// The standard penguin tree.
    pub fn penguin(deps: BrainDeps) -> Self {
        let tree = build_penguin_tree(&deps);
        Self::new(tree, (*deps.config).clone())
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.tree = self.tree.with_clock(clock);
        self
    }

    pub fn with_spawner(mut self, spawner: impl Spawn + 'static) -> Self {
        self.tree = self.tree.with_spawner(spawner);
        self
    }

    pub fn tree(&self) -> &BehaviorTree {
        &self.tree
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    /// Frames ticked so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.blackboard.set(key, value, Scope::Global);
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.set(keys::IS_DRAGGING, dragging);
    }

    pub fn set_clicked(&mut self, clicked: bool) {
        self.set(keys::IS_CLICKED, clicked);
    }

    pub fn set_pointer(&mut self, pointer: PointerPosition) {
        if let Err(err) = self
            .blackboard
            .set_as(keys::POINTER_POSITION, &pointer, Scope::Global)
        {
            tracing::warn!(error = %err, "could not store pointer position");
        }
    }

    pub fn set_penguin_position(&mut self, position: Vec3) {
        self.set(keys::PENGUIN_POSITION, position.to_vec());
    }

    /// The animation the host is really playing.
    pub fn set_current_action(&mut self, action: &str) {
        self.set(keys::CURRENT_ACTION, action);
    }

    pub fn set_llm_settings(&mut self, settings: &LlmSettings) {
        if let Err(err) = self
            .blackboard
            .set_as(keys::LLM_SETTINGS, settings, Scope::Global)
        {
            tracing::warn!(error = %err, "could not store LLM settings");
        }
    }

    pub fn chat_history(&self) -> Vec<ChatMessage> {
        self.blackboard
            .get_as(keys::CHAT_HISTORY, Scope::Global)
            .unwrap_or_default()
    }

    /// Hands a user message to the tree. The history gets the message right away; the tree picks
    /// it up on the next frame.
    pub fn submit_user_input(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.append_chat(&[ChatMessage::user(text.clone())]);
        self.set(keys::LAST_USER_INPUT, text);
        self.set(keys::HAS_NEW_INPUT, true);
    }

    fn append_chat(&mut self, messages: &[ChatMessage]) {
        if messages.is_empty() {
            return;
        }
        let mut history = self.chat_history();
        history.extend_from_slice(messages);
        if let Err(err) = self
            .blackboard
            .set_as(keys::CHAT_HISTORY, &history, Scope::Global)
        {
            tracing::warn!(error = %err, "could not store chat history");
        }
    }

    /// Ticks the tree once and collects its outputs.
    pub fn tick(&mut self) -> FrameOutput {
        let status = self.tree.tick(None, &mut self.blackboard);
        self.frames += 1;

        let chat: Vec<ChatMessage> = self
            .blackboard
            .remove(keys::OUTPUT_CHAT_MESSAGES, Scope::Global)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();
        self.append_chat(&chat);

        let bb = &self.blackboard;
        FrameOutput {
            status,
            action: bb.get_str(keys::OUTPUT_ACTION, Scope::Global).map(str::to_string),
            expression: bb
                .get_str(keys::OUTPUT_EXPRESSION, Scope::Global)
                .map(str::to_string),
            position: bb.get(keys::OUTPUT_POSITION, Scope::Global).and_then(read_vec3),
            chat,
        }
    }

    pub fn energy(&self) -> f64 {
        self.blackboard
            .get_f64(keys::ENERGY, Scope::Global)
            .unwrap_or(100.0)
    }

    pub fn boredom(&self) -> f64 {
        self.blackboard
            .get_f64(keys::BOREDOM, Scope::Global)
            .unwrap_or(0.0)
    }
}
