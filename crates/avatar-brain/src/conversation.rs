//! Leaves that talk to the LLM and turn its replies into queued actions and chat lines.

use futures::future::BoxFuture;
use futures::FutureExt;

use avatar_bt::{node_meta, AsyncAction, AsyncTask, Category, Node, NodeMeta, Tick};
use avatar_core::{NodeId, Scope, Status};

use crate::board;
use crate::keys;
use crate::llm::SharedLlm;
use crate::types::{ChatMessage, LlmResponse, LlmSettings};

pub type LlmCallNode = AsyncAction<LlmCall>;
pub type ProactiveLlmNode = AsyncAction<ProactiveLlm>;

fn llm_settings(tick: &Tick<'_>, fallback: &LlmSettings) -> LlmSettings {
    board::global_as(tick, keys::LLM_SETTINGS).unwrap_or_else(|| fallback.clone())
}

fn store_result(tick: &mut Tick<'_>, response: &LlmResponse) -> Status {
    match board::set_tree_as(tick, keys::LAST_LLM_RESULT, response) {
        Ok(()) => Status::Success,
        Err(err) => {
            tracing::warn!(error = %err, "could not store LLM result");
            Status::Failure
        }
    }
}

/// Sends the user's latest message, with the chat history, to the LLM.
pub struct LlmCall {
    client: SharedLlm,
    settings: LlmSettings,
}

impl LlmCall {
    pub fn new(client: SharedLlm, settings: LlmSettings) -> Self {
        Self { client, settings }
    }

    pub fn node(client: SharedLlm, settings: LlmSettings) -> LlmCallNode {
        AsyncAction::new("LLMCallNode", Self::new(client, settings))
            .with_status_key(keys::LLM_STATUS)
    }
}

impl AsyncTask for LlmCall {
    type Output = LlmResponse;

    fn start(
        &self,
        tick: &mut Tick<'_>,
        _node: NodeId,
    ) -> Option<BoxFuture<'static, anyhow::Result<LlmResponse>>> {
        let input = board::global_str(tick, keys::LAST_USER_INPUT)
            .filter(|s| !s.trim().is_empty())?
            .to_string();
        let history: Vec<ChatMessage> =
            board::global_as(tick, keys::CHAT_HISTORY).unwrap_or_default();
        let settings = llm_settings(tick, &self.settings);

        tracing::debug!(input = %input, history = history.len(), "calling LLM");
        let client = self.client.clone();
        Some(
            async move {
                client
                    .send(history, input, settings)
                    .await
                    .map_err(anyhow::Error::from)
            }
            .boxed(),
        )
    }

    fn complete(&self, tick: &mut Tick<'_>, _node: NodeId, output: LlmResponse) -> Status {
        let status = store_result(tick, &output);
        if status == Status::Success {
            tick.blackboard_mut()
                .remove(keys::LAST_USER_INPUT, Scope::Global);
        }
        status
    }
}

/// Lets the penguin start a conversation when it has been left alone for too long.
pub struct ProactiveLlm {
    client: SharedLlm,
    settings: LlmSettings,
}

impl ProactiveLlm {
    pub fn new(client: SharedLlm, settings: LlmSettings) -> Self {
        Self { client, settings }
    }

    pub fn node(client: SharedLlm, settings: LlmSettings) -> ProactiveLlmNode {
        AsyncAction::new("ProactiveLLMNode", Self::new(client, settings))
            .with_status_key(keys::PROACTIVE_LLM_STATUS)
    }

    /// The self-prompt describing how the penguin feels right now.
    pub fn prompt(boredom: f64, energy: f64) -> String {
        let mood = if boredom > 70.0 {
            "lonely and bored"
        } else {
            "active"
        };
        format!(
            "[INTERNAL STATE MONITOR]\n\
             Boredom: {boredom:.0}/100\n\
             Energy: {energy:.0}/100\n\
             User status: Silent for a while.\n\
             \n\
             [INSTRUCTION]\n\
             You are feeling a bit {mood}.\n\
             Proactively say something cute to the user to get their attention, \
             or perform an action. Don't mention these numbers, just act natural."
        )
    }
}

impl AsyncTask for ProactiveLlm {
    type Output = LlmResponse;

    fn start(
        &self,
        tick: &mut Tick<'_>,
        _node: NodeId,
    ) -> Option<BoxFuture<'static, anyhow::Result<LlmResponse>>> {
        let boredom = board::global_f64(tick, keys::BOREDOM).unwrap_or(0.0);
        let energy = board::global_f64(tick, keys::ENERGY).unwrap_or(100.0);
        let prompt = Self::prompt(boredom, energy);
        let settings = llm_settings(tick, &self.settings);

        tracing::debug!(boredom, energy, "proactive thought");
        let client = self.client.clone();
        Some(
            async move {
                client
                    .send(Vec::new(), prompt, settings)
                    .await
                    .map_err(anyhow::Error::from)
            }
            .boxed(),
        )
    }

    fn complete(&self, tick: &mut Tick<'_>, _node: NodeId, output: LlmResponse) -> Status {
        let status = store_result(tick, &output);
        if status == Status::Success {
            board::set_global(tick, keys::BOREDOM, 0.0);
        }
        status
    }
}

/// Applies `lastLLMResult`: chat text for the host, actions for [`ExecuteActionSequence`].
///
/// [`ExecuteActionSequence`]: crate::animation::ExecuteActionSequence
pub struct FunctionExecNode {
    meta: NodeMeta,
}

impl FunctionExecNode {
    pub fn new() -> Self {
        Self {
            meta: NodeMeta::new(Category::Action, "FunctionExecNode"),
        }
    }
}

impl Default for FunctionExecNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for FunctionExecNode {
    node_meta!();

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        let Some(result) = board::tree_as::<LlmResponse>(tick, keys::LAST_LLM_RESULT) else {
            return Status::Failure;
        };

        if !result.text.is_empty() {
            board::push_chat(tick, ChatMessage::model(result.text.clone()));
        }

        if let Some(tool) = result.tool_result.filter(|t| !t.actions.is_empty()) {
            tracing::debug!(actions = ?tool.actions, emotion = ?tool.emotion, "queueing actions");
            board::set_tree(tick, keys::PENDING_ACTIONS, tool.actions.clone());
            board::set_tree(
                tick,
                keys::PENDING_EMOTION,
                tool.emotion.clone().unwrap_or_else(|| "NEUTRAL".to_string()),
            );
            board::push_chat(tick, ChatMessage::performing(&tool.actions));
            if let Some(call_id) = tool.tool_call_id {
                let content = serde_json::json!({ "status": "ok", "actions": tool.actions });
                board::push_chat(tick, ChatMessage::tool_result(call_id, content.to_string()));
            }
        }

        let scope = tick.tree_scope();
        tick.blackboard_mut().remove(keys::LAST_LLM_RESULT, scope);
        board::set_global(tick, keys::HAS_NEW_INPUT, false);
        Status::Success
    }
}

/// Gives up on the pending user command: clears `hasNewInput` and `lastUserInput`.
///
/// Placed behind the LLM call so a failing backend is asked at most `Retry`'s attempts per
/// command. Always fails, leaving the frame to the branches after it.
pub struct DropCommandNode {
    meta: NodeMeta,
}

impl DropCommandNode {
    pub fn new() -> Self {
        Self {
            meta: NodeMeta::new(Category::Action, "DropCommandNode"),
        }
    }
}

impl Default for DropCommandNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for DropCommandNode {
    node_meta!();

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        if board::global_bool(tick, keys::HAS_NEW_INPUT) {
            tracing::warn!(
                input = board::global_str(tick, keys::LAST_USER_INPUT).unwrap_or_default(),
                "dropping user command"
            );
        }
        tick.blackboard_mut()
            .remove(keys::LAST_USER_INPUT, Scope::Global);
        board::set_global(tick, keys::HAS_NEW_INPUT, false);
        Status::Failure
    }
}
