mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use avatar_brain::keys;
use avatar_brain::{
    ChatMessage, DropCommandNode, FunctionExecNode, KeywordLlm, LlmCall, LlmClient, LlmError,
    LlmResponse, LlmSettings, ProactiveLlm, Role, SharedLlm,
};
use avatar_bt::{AsyncState, NodeExt};
use avatar_core::{Blackboard, ManualClock, Scope, Status};
use futures::executor::LocalPool;
use serde_json::json;

use common::{global, single};

/// Records every request and answers with a fixed reply, or fails when told to.
#[derive(Default)]
struct Recorder {
    requests: Mutex<Vec<(usize, String)>>,
    fail: bool,
}

#[async_trait]
impl LlmClient for Recorder {
    async fn send(
        &self,
        history: Vec<ChatMessage>,
        message: String,
        _settings: LlmSettings,
    ) -> Result<LlmResponse, LlmError> {
        self.requests
            .lock()
            .unwrap()
            .push((history.len(), message));
        if self.fail {
            return Err(LlmError::Request("offline".to_string()));
        }
        Ok(LlmResponse {
            text: "Hello!".to_string(),
            ..LlmResponse::default()
        })
    }
}

#[test]
fn llm_call_stores_result_and_consumes_input() {
    let clock = ManualClock::new(0.0);
    let mut pool = LocalPool::new();
    let node = LlmCall::node(KeywordLlm::shared(), LlmSettings::default());
    let tree = single(node.boxed(), &clock).with_spawner(pool.spawner());
    let mut bb = Blackboard::new();
    bb.set(keys::LAST_USER_INPUT, "please dance", Scope::Global);

    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(tree.tick(None, &mut bb), Status::Running);

    pool.run_until_stalled();
    assert_eq!(tree.tick(None, &mut bb), Status::Success);

    let result: LlmResponse = bb
        .get_as(keys::LAST_LLM_RESULT, Scope::Tree(tree.id()))
        .unwrap();
    assert_eq!(result.tool_result.unwrap().actions, vec!["DANCE".to_string()]);
    assert_eq!(global(&bb, keys::LAST_USER_INPUT), None);
}

#[test]
fn llm_call_without_input_fails_without_calling() {
    let clock = ManualClock::new(0.0);
    let pool = LocalPool::new();
    let recorder = Arc::new(Recorder::default());
    let llm: SharedLlm = recorder.clone();
    let tree = single(LlmCall::node(llm, LlmSettings::default()).boxed(), &clock)
        .with_spawner(pool.spawner());
    let mut bb = Blackboard::new();
    bb.set(keys::LAST_USER_INPUT, "   ", Scope::Global);

    assert_eq!(tree.tick(None, &mut bb), Status::Failure);
    assert!(recorder.requests.lock().unwrap().is_empty());
}

#[test]
fn llm_call_sends_history_and_reports_errors() {
    let clock = ManualClock::new(0.0);
    let mut pool = LocalPool::new();
    let recorder = Arc::new(Recorder {
        fail: true,
        ..Recorder::default()
    });
    let llm: SharedLlm = recorder.clone();
    let node = LlmCall::node(llm, LlmSettings::default());
    let tree = single(node.boxed(), &clock).with_spawner(pool.spawner());
    let root = tree.root().unwrap().id();
    let mut bb = Blackboard::new();
    bb.set(keys::LAST_USER_INPUT, "wave", Scope::Global);
    bb.set(
        keys::CHAT_HISTORY,
        json!([{ "role": "user", "content": "hi" }, { "role": "model", "content": "hello" }]),
        Scope::Global,
    );

    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    assert_eq!(
        bb.get_str(keys::LLM_STATUS, Scope::Node(tree.id(), root)),
        Some(AsyncState::Processing.as_str())
    );

    pool.run_until_stalled();
    assert_eq!(tree.tick(None, &mut bb), Status::Failure);
    assert_eq!(
        recorder.requests.lock().unwrap().clone(),
        vec![(2, "wave".to_string())]
    );
    assert_eq!(
        bb.get_str("async_error", Scope::Node(tree.id(), root)),
        Some("LLM request failed: offline")
    );
    assert_eq!(global(&bb, keys::LAST_USER_INPUT), Some(&json!("wave")));
}

#[test]
fn proactive_thought_resets_boredom() {
    let clock = ManualClock::new(0.0);
    let mut pool = LocalPool::new();
    let recorder = Arc::new(Recorder::default());
    let llm: SharedLlm = recorder.clone();
    let node = ProactiveLlm::node(llm, LlmSettings::default());
    let tree = single(node.boxed(), &clock).with_spawner(pool.spawner());
    let mut bb = Blackboard::new();
    bb.set(keys::BOREDOM, 90.0, Scope::Global);
    bb.set(keys::ENERGY, 60.0, Scope::Global);

    assert_eq!(tree.tick(None, &mut bb), Status::Running);
    pool.run_until_stalled();
    assert_eq!(tree.tick(None, &mut bb), Status::Success);

    assert_eq!(bb.get_f64(keys::BOREDOM, Scope::Global), Some(0.0));
    let result: LlmResponse = bb
        .get_as(keys::LAST_LLM_RESULT, Scope::Tree(tree.id()))
        .unwrap();
    assert_eq!(result.text, "Hello!");

    let requests = recorder.requests.lock().unwrap();
    let (history, prompt) = &requests[0];
    assert_eq!(*history, 0);
    assert!(prompt.contains("Boredom: 90/100"));
    assert!(prompt.contains("Energy: 60/100"));
    assert!(prompt.contains("lonely and bored"));
}

#[test]
fn proactive_prompt_reflects_mood() {
    assert!(ProactiveLlm::prompt(40.0, 80.0).contains("feeling a bit active"));
    assert!(ProactiveLlm::prompt(71.0, 80.0).contains("feeling a bit lonely and bored"));
}

#[test]
fn function_exec_queues_actions_and_chat_records() {
    let clock = ManualClock::new(0.0);
    let tree = single(FunctionExecNode::new().boxed(), &clock);
    let scope = Scope::Tree(tree.id());
    let mut bb = Blackboard::new();
    bb.set(keys::HAS_NEW_INPUT, true, Scope::Global);
    bb.set(
        keys::LAST_LLM_RESULT,
        json!({
            "text": "Here I go!",
            "toolResult": { "actions": ["JUMP", "SPIN"], "toolCallId": "call_7" }
        }),
        scope,
    );

    assert_eq!(tree.tick(None, &mut bb), Status::Success);

    assert_eq!(bb.get(keys::PENDING_ACTIONS, scope), Some(&json!(["JUMP", "SPIN"])));
    assert_eq!(bb.get_str(keys::PENDING_EMOTION, scope), Some("NEUTRAL"));
    assert_eq!(bb.get(keys::LAST_LLM_RESULT, scope), None);
    assert_eq!(global(&bb, keys::HAS_NEW_INPUT), Some(&json!(false)));

    let chat: Vec<ChatMessage> = bb
        .get_as(keys::OUTPUT_CHAT_MESSAGES, Scope::Global)
        .unwrap();
    assert_eq!(chat.len(), 3);
    assert_eq!(chat[0], ChatMessage::model("Here I go!"));
    assert_eq!(chat[1].content, "[Performing: JUMP, SPIN]");
    assert!(chat[1].is_tool_call);
    assert_eq!(chat[2].role, Role::Tool);
    assert_eq!(chat[2].tool_call_id.as_deref(), Some("call_7"));
}

#[test]
fn function_exec_with_text_only_reply() {
    let clock = ManualClock::new(0.0);
    let tree = single(FunctionExecNode::new().boxed(), &clock);
    let scope = Scope::Tree(tree.id());
    let mut bb = Blackboard::new();
    bb.set(keys::LAST_LLM_RESULT, json!({ "text": "Brr, it's cold." }), scope);

    assert_eq!(tree.tick(None, &mut bb), Status::Success);
    assert_eq!(bb.get(keys::PENDING_ACTIONS, scope), None);

    let chat: Vec<ChatMessage> = bb
        .get_as(keys::OUTPUT_CHAT_MESSAGES, Scope::Global)
        .unwrap();
    assert_eq!(chat, vec![ChatMessage::model("Brr, it's cold.")]);
}

#[test]
fn function_exec_without_result_fails() {
    let clock = ManualClock::new(0.0);
    let tree = single(FunctionExecNode::new().boxed(), &clock);
    let mut bb = Blackboard::new();
    bb.set(keys::HAS_NEW_INPUT, true, Scope::Global);

    assert_eq!(tree.tick(None, &mut bb), Status::Failure);
    assert_eq!(global(&bb, keys::HAS_NEW_INPUT), Some(&json!(true)));
}

#[test]
fn drop_command_clears_the_pending_input() {
    let clock = ManualClock::new(0.0);
    let tree = single(DropCommandNode::new().boxed(), &clock);
    let mut bb = Blackboard::new();
    bb.set(keys::LAST_USER_INPUT, "dance", Scope::Global);
    bb.set(keys::HAS_NEW_INPUT, true, Scope::Global);

    assert_eq!(tree.tick(None, &mut bb), Status::Failure);
    assert_eq!(global(&bb, keys::LAST_USER_INPUT), None);
    assert_eq!(global(&bb, keys::HAS_NEW_INPUT), Some(&json!(false)));
}
